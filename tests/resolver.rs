#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{Expr, Stmt};
    use rox::parser::Parser;
    use rox::resolver::{Locals, Resolver};
    use rox::scan_tokens;

    /// Resolves `source`, returning the rendered errors (empty on success).
    fn resolve_errors(source: &str) -> Vec<String> {
        let (tokens, lex_errors) = scan_tokens(source);
        assert!(lex_errors.is_empty());

        let statements = Parser::new(&tokens).parse().expect("valid program");

        match Resolver::new().resolve(&statements) {
            Ok(_) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    fn assert_resolve_error(source: &str, expected: &str) {
        assert_eq!(resolve_errors(source), vec![expected.to_string()]);
    }

    #[test]
    fn test_resolver_01_own_initializer() {
        assert_resolve_error(
            "{ var a = a; }",
            "[line 1] Error at 'a': Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_resolver_02_global_self_reference_is_left_to_runtime() {
        assert_eq!(resolve_errors("var a = a;"), Vec::<String>::new());
    }

    #[test]
    fn test_resolver_03_shadowing_outer_in_initializer() {
        assert_resolve_error(
            "var a = 1; { var a = a + 1; }",
            "[line 1] Error at 'a': Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_resolver_04_this_outside_class() {
        assert_resolve_error(
            "print this;",
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
        );
        assert_resolve_error(
            "fun f() { return this; }",
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
        );
    }

    #[test]
    fn test_resolver_05_super_misuse() {
        assert_resolve_error(
            "print super.x;",
            "[line 1] Error at 'super': Can't use 'super' outside of a class.",
        );
        assert_resolve_error(
            "class A { m() { super.m(); } }",
            "[line 1] Error at 'super': Can't use 'super' in a class with no superclass.",
        );
    }

    #[test]
    fn test_resolver_06_self_inheritance() {
        assert_resolve_error(
            "class A < A {}",
            "[line 1] Error at 'A': A class can't inherit from itself.",
        );
    }

    #[test]
    fn test_resolver_07_return_rules() {
        assert_resolve_error(
            "return 1;",
            "[line 1] Error at 'return': Can't return from top-level code.",
        );
        assert_resolve_error(
            "class A { init() { return 1; } }",
            "[line 1] Error at 'return': Can't return a value from an initializer.",
        );

        // A bare return is allowed in an initializer.
        assert_eq!(
            resolve_errors("class A { init() { return; } }"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_resolver_08_redeclaration_in_same_scope_is_allowed() {
        assert_eq!(resolve_errors("{ var a = 1; var a = 2; }"), Vec::<String>::new());
    }

    #[test]
    fn test_all_errors_are_reported_in_one_pass() {
        let source = "\
print this;
{ var b = b; }
class C < C {}
return;";

        assert_eq!(
            resolve_errors(source),
            vec![
                "[line 1] Error at 'this': Can't use 'this' outside of a class.",
                "[line 2] Error at 'b': Can't read local variable in its own initializer.",
                "[line 3] Error at 'C': A class can't inherit from itself.",
                "[line 4] Error at 'return': Can't return from top-level code.",
            ]
        );
    }

    /// Distances recorded for every `Variable` node in a statement list, in
    /// source order.  `None` marks a global.
    fn variable_distances(statements: &[Stmt<'_>], locals: &Locals, out: &mut Vec<Option<usize>>) {
        fn walk_expr(expr: &Expr<'_>, locals: &Locals, out: &mut Vec<Option<usize>>) {
            match expr {
                Expr::Variable { id, .. } => out.push(locals.get(id).copied()),
                Expr::Binary { left, right, .. } => {
                    walk_expr(left, locals, out);
                    walk_expr(right, locals, out);
                }
                Expr::Call {
                    callee, arguments, ..
                } => {
                    walk_expr(callee, locals, out);
                    for argument in arguments {
                        walk_expr(argument, locals, out);
                    }
                }
                _ => {}
            }
        }

        for stmt in statements {
            match stmt {
                Stmt::Print(expr) | Stmt::Expression(expr) => walk_expr(expr, locals, out),
                Stmt::Var {
                    initializer: Some(expr),
                    ..
                } => walk_expr(expr, locals, out),
                Stmt::Block(inner) => variable_distances(inner, locals, out),
                Stmt::Function(function) => variable_distances(&function.body, locals, out),
                Stmt::Return {
                    value: Some(expr), ..
                } => walk_expr(expr, locals, out),
                _ => {}
            }
        }
    }

    #[test]
    fn test_distances_count_scopes_between_use_and_declaration() {
        let source = "
var g = 0;
{
    var a = 1;
    {
        var b = 2;
        print a + b + g;
    }
    fun f(p) { return p + a; }
}";
        let (tokens, _) = scan_tokens(source);
        let statements = Parser::new(&tokens).parse().expect("valid program");
        let locals = Resolver::new().resolve(&statements).expect("resolves");

        let mut distances = Vec::new();
        variable_distances(&statements, &locals, &mut distances);

        // a, b, g inside the inner block; then p, a inside f.
        assert_eq!(distances, vec![Some(1), Some(0), None, Some(0), Some(1)]);
    }
}
