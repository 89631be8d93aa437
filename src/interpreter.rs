//! Tree‑walking evaluator.
//!
//! Statements return a [`Flow`] so `return` can unwind through nested blocks
//! and loops as an ordinary value; only a function call consumes it.  Runtime
//! errors travel as `Err` all the way out of [`Interpreter::interpret`] and are
//! never caught on the way.
//!
//! Variable, assignment, `this` and `super` nodes find their binding by the
//! distance the resolver recorded; nodes without an entry are globals.

use std::collections::HashMap;
use std::io::Write;
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::callable::{self, LoxFunction};
use crate::class::{LoxClass, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Grow the host stack when less than this remains.
const RED_ZONE: usize = 256 * 1024;

/// Size of each additional stack segment.
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

/// How a statement finished.
#[derive(Debug)]
pub enum Flow<'a> {
    Normal,

    /// A `return` is unwinding towards the enclosing call.
    Return(Value<'a>),
}

pub struct Interpreter<'a> {
    globals: EnvRef<'a>,
    environment: EnvRef<'a>,
    locals: Locals,
    out: Box<dyn Write + 'a>,
}

impl<'a> Interpreter<'a> {
    /// Interpreter printing to `out`.  Defines the native `clock`.
    pub fn with_output(out: Box<dyn Write + 'a>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new().into_ref();

        debug!("Defining native function 'clock'");

        globals
            .borrow_mut()
            .define("clock", Value::Native(callable::clock()));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            out,
        }
    }

    /// Runs a program.  `locals` must come from a successful resolver pass
    /// over the same statements.
    ///
    /// # Panics
    ///
    /// If a `return` escapes to top level or a `super` is used outside a
    /// subclass method, both of which the resolver rules out.
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>], locals: Locals) -> Result<()> {
        info!("Interpreting {} statements", statements.len());

        self.locals = locals;

        let result = self.execute_all(statements);
        self.out.flush()?;

        match result? {
            Flow::Normal => {
                info!("Interpretation completed successfully");
                Ok(())
            }
            Flow::Return(_) => unreachable!("'return' escaped past the outermost call"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    /// Executes one statement.  Every nested statement and expression goes
    /// back through [`execute`](Self::execute) or
    /// [`evaluate`](Self::evaluate), which grow the host stack on demand, so
    /// script recursion depth is bounded by memory rather than the thread's
    /// stack.
    pub fn execute(&mut self, stmt: &'a Stmt<'a>) -> Result<Flow<'a>> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &'a Stmt<'a>) -> Result<Flow<'a>> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));
                return self.execute_block(statements, environment.into_ref());
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = LoxFunction::new(declaration, Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(declaration.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);

                return Ok(Flow::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.class_declaration(name, superclass.as_ref(), methods)?,
        }

        Ok(Flow::Normal)
    }

    /// Runs `statements` with `environment` as the current frame.  The previous
    /// frame is restored however the block ends.
    pub fn execute_block(
        &mut self,
        statements: &'a [Stmt<'a>],
        environment: EnvRef<'a>,
    ) -> Result<Flow<'a>> {
        let previous = mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &'a [Stmt<'a>]) -> Result<Flow<'a>> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn class_declaration(
        &mut self,
        name: &'a Token<'a>,
        superclass: Option<&'a Expr<'a>>,
        methods: &'a [FunctionDecl<'a>],
    ) -> Result<()> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass = match superclass {
            Some(expr) => Some(self.evaluate_superclass(name, expr)?),
            None => None,
        };

        // Methods of a subclass close over a frame holding `super`.
        let enclosing = superclass.as_ref().map(|superclass| {
            let mut environment = Environment::with_enclosing(Rc::clone(&self.environment));
            environment.define("super", Value::Class(Rc::clone(superclass)));
            mem::replace(&mut self.environment, environment.into_ref())
        });

        let methods: HashMap<&'a str, Rc<LoxFunction<'a>>> = methods
            .iter()
            .map(|method| {
                let is_initializer = method.name.lexeme == INITIALIZER;
                let function =
                    LoxFunction::new(method, Rc::clone(&self.environment), is_initializer);
                (method.name.lexeme, Rc::new(function))
            })
            .collect();

        if let Some(previous) = enclosing {
            self.environment = previous;
        }

        let class = LoxClass::new(name.lexeme, superclass, methods);
        self.environment
            .borrow_mut()
            .define(name.lexeme, Value::Class(Rc::new(class)));

        info!("Class '{}' defined", name.lexeme);

        Ok(())
    }

    fn evaluate_superclass(
        &mut self,
        class_name: &'a Token<'a>,
        expr: &'a Expr<'a>,
    ) -> Result<Rc<LoxClass<'a>>> {
        match self.evaluate(expr)? {
            Value::Class(class) => Ok(class),
            _ => {
                let token = match expr {
                    Expr::Variable { name, .. } => *name,
                    _ => class_name,
                };
                Err(LoxError::runtime(token, "Superclass must be a class."))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        if !Environment::assign_at(
                            &self.environment,
                            distance,
                            name.lexeme,
                            value.clone(),
                        ) {
                            return Err(undefined_variable(name));
                        }
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &'a Token<'a>, right: &'a Expr<'a>) -> Result<Value<'a>> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &'a Expr<'a>,
        operator: &'a Token<'a>,
        right: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        debug!("Binary {} on {} and {}", operator.lexeme, left, right);

        let value = match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                (Value::String(a), Value::String(b)) => Value::String(a + &b),
                _ => {
                    return Err(LoxError::runtime(
                        operator,
                        "Operands must be two numbers or two strings.",
                    ))
                }
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Number(a - b)
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Number(a * b)
            }

            // IEEE semantics: x / 0 is ±inf or NaN.
            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Number(a / b)
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a > b)
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a >= b)
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a < b)
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Value::Bool(a <= b)
            }

            TokenType::EQUAL_EQUAL => Value::Bool(left == right),

            TokenType::BANG_EQUAL => Value::Bool(left != right),

            _ => return Err(LoxError::runtime(operator, "Invalid binary operator.")),
        };

        Ok(value)
    }

    fn evaluate_call(
        &mut self,
        callee: &'a Expr<'a>,
        paren: &'a Token<'a>,
        arguments: &'a [Expr<'a>],
    ) -> Result<Value<'a>> {
        let callee = self.evaluate(callee)?;

        let arguments = arguments
            .iter()
            .map(|argument| self.evaluate(argument))
            .collect::<Result<Vec<_>>>()?;

        let Some(function) = callee.as_callable() else {
            debug!("Call target is a {}", callee.type_name());
            return Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if arguments.len() != function.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    function.arity(),
                    arguments.len()
                ),
            ));
        }

        function.call(self, arguments, paren)
    }

    /// `super.method`: the method is looked up on the superclass stored one
    /// frame outside the method's `this` frame, then bound to `this`.
    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &'a Token<'a>,
        method: &'a Token<'a>,
    ) -> Result<Value<'a>> {
        // The resolver only accepts `super` inside a subclass method, where
        // the `this` frame sits directly inside the `super` frame.
        let superclass = self.locals.get(&id).and_then(|&distance| {
            let superclass = Environment::get_at(&self.environment, distance, "super")?;
            let instance = Environment::get_at(&self.environment, distance.checked_sub(1)?, "this")?;
            Some((superclass, instance))
        });

        let Some((Value::Class(superclass), Value::Instance(instance))) = superclass else {
            unreachable!("'super' at line {} was not resolved to a method", keyword.line);
        };

        let Some(found) = superclass.find_method(method.lexeme) else {
            return Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            ));
        };

        Ok(Value::Function(Rc::new(found.bind(instance))))
    }

    fn look_up_variable(&self, id: ExprId, name: &'a Token<'a>) -> Result<Value<'a>> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name.lexeme)
                .ok_or_else(|| undefined_variable(name)),
            None => self.globals.borrow().get(name),
        }
    }
}

fn literal_value<'a>(literal: &LiteralValue) -> Value<'a> {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn number_operands(operator: &Token<'_>, left: &Value<'_>, right: &Value<'_>) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    }
}

fn undefined_variable(name: &Token<'_>) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

