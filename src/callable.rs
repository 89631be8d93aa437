//! Everything a call expression can invoke.
//!
//! [`Callable`] is implemented by native functions, user functions and
//! classes (see [`crate::class`]).  The interpreter checks arity before it
//! calls [`Callable::call`], so implementations may assume the argument count
//! matches.

use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::FunctionDecl;
use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

pub trait Callable<'a> {
    /// Number of arguments a call must supply.
    fn arity(&self) -> usize;

    /// Invokes the callee.  `paren` is the call's closing parenthesis, used to
    /// locate errors raised by the callee itself.
    fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
        paren: &Token<'a>,
    ) -> Result<Value<'a>>;
}

/// A function implemented by the host.
#[derive(Clone, Copy)]
pub struct NativeFunction<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value<'a>]) -> std::result::Result<Value<'a>, String>,
}

impl<'a> Callable<'a> for NativeFunction<'a> {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
        paren: &Token<'a>,
    ) -> Result<Value<'a>> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(|message| LoxError::runtime(paren, message))
    }
}

/// `clock()`: seconds since the Unix epoch, with millisecond precision.
pub fn clock<'a>() -> NativeFunction<'a> {
    NativeFunction {
        name: "clock",
        arity: 0,
        func: |_arguments| {
            let millis = Utc::now().timestamp_millis();
            Ok(Value::Number(millis as f64 / 1000.0))
        },
    }
}

/// A function or method declared in the script, together with the frame
/// that was active where it was declared.
pub struct LoxFunction<'a> {
    declaration: &'a FunctionDecl<'a>,
    closure: EnvRef<'a>,
    is_initializer: bool,
}

impl<'a> LoxFunction<'a> {
    pub fn new(declaration: &'a FunctionDecl<'a>, closure: EnvRef<'a>, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.name.lexeme
    }

    /// A copy of this method whose closure gains a frame defining `this`.
    /// Methods of a subclass already see `super` one frame further out.
    pub fn bind(&self, instance: Rc<LoxInstance<'a>>) -> LoxFunction<'a> {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: self.declaration,
            closure: environment.into_ref(),
            is_initializer: self.is_initializer,
        }
    }
}

impl<'a> Callable<'a> for LoxFunction<'a> {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
        _paren: &Token<'a>,
    ) -> Result<Value<'a>> {
        debug!("Calling user-defined function '{}'", self.name());

        let declaration: &'a FunctionDecl<'a> = self.declaration;

        // Parented at the closure, not the caller: scoping is lexical.
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in declaration.params.iter().zip(arguments) {
            environment.define(param.lexeme, argument);
        }

        let flow = interpreter.execute_block(&declaration.body, environment.into_ref())?;

        if self.is_initializer {
            return Environment::get_at(&self.closure, 0, "this").ok_or_else(|| {
                LoxError::runtime(declaration.name, "Initializer called without an instance.")
            });
        }

        let result = match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        };

        info!("Function '{}' returned: {}", self.name(), result);

        Ok(result)
    }
}
