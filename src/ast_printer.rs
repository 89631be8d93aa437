use crate::ast::{Expr, LiteralValue};

/// Renders an expression in parenthesised prefix form, e.g.
/// `(* (- 123) (group 45.67))`.  Used by the `parse` command.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr<'_>) -> String {
        match expr {
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3.0 stays "3.0"
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Variable { name, .. } => name.lexeme.to_string(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", Self::print(callee));
                for argument in arguments {
                    out.push(' ');
                    out.push_str(&Self::print(argument));
                }
                out.push(')');
                out
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scan_tokens;

    fn print_source(source: &str) -> String {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty());

        let expr = Parser::new(&tokens)
            .parse_expression()
            .unwrap_or_else(|errs| panic!("parse failed: {:?}", errs));

        AstPrinter::print(&expr)
    }

    #[test]
    fn prints_precedence_as_nesting() {
        assert_eq!(print_source("-123 * (45.67)"), "(* (- 123.0) (group 45.67))");
        assert_eq!(print_source("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
    }

    #[test]
    fn prints_calls_properties_and_assignment() {
        assert_eq!(print_source("a.b(1, c)"), "(call (. a b) 1.0 c)");
        assert_eq!(print_source("a.b = x or y"), "(= (. a b) (or x y))");
        assert_eq!(print_source("x = !true"), "(= x (! true))");
    }
}
