#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;

    use rox::RunError;

    /// Runs `source` and returns everything it printed.
    fn run(source: &str) -> String {
        let mut out = Vec::new();
        if let Err(e) = rox::run(source, &mut out) {
            panic!("program failed: {}", e);
        }
        String::from_utf8(out).expect("output is UTF-8")
    }

    /// Runs `source`, expecting failure; returns the output printed before
    /// the failure and the error.
    fn run_failing(source: &str) -> (String, RunError) {
        let mut out = Vec::new();
        let error = rox::run(source, &mut out).expect_err("program should fail");
        (String::from_utf8(out).expect("output is UTF-8"), error)
    }

    fn lines(output: &str) -> Vec<&str> {
        output.lines().collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_interpreter_01_arithmetic_and_formatting() {
        let output = run("print 1 + 2 * 3; print 7 / 2; print -0.5 * 4; print 10 - 12;");
        assert_eq!(lines(&output), vec!["7", "3.5", "-2", "-2"]);
    }

    #[test]
    fn test_interpreter_02_string_concatenation() {
        let output = run("var a = \"foo\"; print a + \"bar\";");
        assert_eq!(output, "foobar\n");
    }

    #[test]
    fn test_interpreter_03_truthiness() {
        let output = run("
print !nil;
print !false;
print !0;
print !\"\";
if (0) print \"zero is true\"; else print \"zero is false\";
if (nil) print \"nil is true\"; else print \"nil is false\";");

        assert_eq!(
            lines(&output),
            vec!["true", "true", "false", "false", "zero is true", "nil is false"]
        );
    }

    #[test]
    fn test_interpreter_04_equality() {
        let output = run("
print nil == nil;
print nil == false;
print 1 == 1;
print \"a\" == \"a\";
print 1 == \"1\";
print 1 != 2;");

        assert_eq!(
            lines(&output),
            vec!["true", "false", "true", "true", "false", "true"]
        );
    }

    #[test]
    fn test_interpreter_05_logical_operators_short_circuit() {
        let output = run("
var calls = 0;
fun touch() { calls = calls + 1; return true; }
print nil or \"right\";
print \"left\" or touch();
print false and touch();
print 1 and 2;
print calls;");

        assert_eq!(lines(&output), vec!["right", "left", "false", "2", "0"]);
    }

    #[test]
    fn test_interpreter_06_division_by_zero_is_ieee() {
        let output = run("print 1 / 0; print -1 / 0;");
        assert_eq!(lines(&output), vec!["inf", "-inf"]);
    }

    #[test]
    fn test_interpreter_07_comparison() {
        let output = run("print 1 < 2; print 2 <= 2; print 3 > 4; print 4 >= 5;");
        assert_eq!(lines(&output), vec!["true", "true", "false", "false"]);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements and scope
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_scope_shadowing_restores_outer_binding() {
        let output = run("var a = 1; { var a = 2; print a; } print a;");
        assert_eq!(lines(&output), vec!["2", "1"]);
    }

    #[test]
    fn test_assignment_reaches_enclosing_scope() {
        let output = run("var a = 1; { a = 2; { a = a + 1; } } print a;");
        assert_eq!(output, "3\n");
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_eq!(run("var a; print a;"), "nil\n");
    }

    #[test]
    fn test_if_runs_the_matching_branch() {
        let output = run("
if (true) print \"then\"; else print \"else\";
if (false) print \"then\"; else print \"else\";
if (false) print \"skipped\";");

        assert_eq!(lines(&output), vec!["then", "else"]);
    }

    #[test]
    fn test_while_and_for_loops() {
        let output = run("
var i = 0;
while (i < 3) { print i; i = i + 1; }
for (var j = 10; j < 13; j = j + 1) print j;");

        assert_eq!(lines(&output), vec!["0", "1", "2", "10", "11", "12"]);
    }

    #[test]
    fn test_for_loop_variable_is_scoped_to_the_loop() {
        let (_, error) = run_failing("for (var k = 0; k < 1; k = k + 1) {} print k;");
        assert_eq!(error.to_string(), "Undefined variable 'k'.\n[line 1]");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Functions and closures
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_functions_return_values() {
        let output = run("
fun add(a, b) { return a + b; }
fun nothing() {}
fun early(x) { while (true) { if (x) return \"early\"; return \"late\"; } }
print add(1, 2);
print nothing();
print early(true);
print early(false);");

        assert_eq!(lines(&output), vec!["3", "nil", "early", "late"]);
    }

    #[test]
    fn test_recursion() {
        let output = run("
fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
print fib(15);");

        assert_eq!(output, "610\n");
    }

    #[test]
    fn test_deep_recursion_completes() {
        let output = run("
fun depth(n) { if (n == 0) return 0; return 1 + depth(n - 1); }
print depth(10000);");

        assert_eq!(output, "10000\n");
    }

    #[test]
    fn test_deep_method_recursion_completes() {
        let output = run("
class Counter {
    down(n) { if (n == 0) return \"done\"; return this.down(n - 1); }
}
print Counter().down(10000);");

        assert_eq!(output, "done\n");
    }

    #[test]
    fn test_closures_keep_independent_state() {
        let output = run("
fun makeCounter() {
    var count = 0;
    fun increment() { count = count + 1; return count; }
    return increment;
}
var first = makeCounter();
var second = makeCounter();
print first();
print first();
print second();
print first();");

        assert_eq!(lines(&output), vec!["1", "2", "1", "3"]);
    }

    #[test]
    fn test_closures_bind_lexically() {
        let output = run("
var a = \"global\";
{
    fun show() { print a; }
    show();
    var a = \"block\";
    show();
}");

        assert_eq!(lines(&output), vec!["global", "global"]);
    }

    #[test]
    fn test_callable_display() {
        let output = run("fun f() {} print f; print clock; class K {} print K; print K();");
        assert_eq!(lines(&output), vec!["<fn f>", "<native fn>", "K", "K instance"]);
    }

    #[test]
    fn test_clock_returns_seconds() {
        let output = run("var t = clock(); print t > 1000000000; print t == t;");
        assert_eq!(lines(&output), vec!["true", "true"]);
    }

    #[test]
    fn test_identity_equality_for_heap_values() {
        let output = run("
class A {}
var a = A();
var b = a;
fun f() {}
print a == b;
print a == A();
print f == f;
print A == A;");

        assert_eq!(lines(&output), vec!["true", "false", "true", "true"]);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Classes
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        let output = run("
class Point {
    init(x, y) { this.x = x; this.y = y; }
    sum() { return this.x + this.y; }
}
var p = Point(2, 3);
print p.sum();
p.x = 10;
print p.sum();
p.label = \"tagged\";
print p.label;");

        assert_eq!(lines(&output), vec!["5", "13", "tagged"]);
    }

    #[test]
    fn test_bound_method_remembers_its_instance() {
        let output = run("
class Person {
    init(name) { this.name = name; }
    hello() { return \"hi \" + this.name; }
}
var greet = Person(\"ada\").hello;
print greet();");

        assert_eq!(output, "hi ada\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let output = run("
class A { m() { return \"method\"; } }
var a = A();
fun replacement() { return \"field\"; }
a.m = replacement;
print a.m();");

        assert_eq!(output, "field\n");
    }

    #[test]
    fn test_initializer_always_yields_instance() {
        let output = run("
class Box {
    init(v) {
        this.v = v;
        if (v) return;
        this.v = \"fallback\";
    }
}
var a = Box(true);
var b = Box(false);
print a.v;
print b.v;
print a.init(nil) == a;");

        assert_eq!(lines(&output), vec!["true", "fallback", "true"]);
    }

    #[test]
    fn test_inheritance_and_overriding() {
        let output = run("
class A { greet() { return \"A\"; } }
class B < A {}
class C < A { greet() { return \"C\"; } }
print B().greet();
print C().greet();
print A().greet();");

        assert_eq!(lines(&output), vec!["A", "C", "A"]);
    }

    #[test]
    fn test_super_calls_the_superclass_method() {
        let output = run("
class A {
    init(n) { this.n = n; }
    describe() { return \"A\" + this.n; }
}
class B < A {
    init(n) { super.init(n + \"!\"); }
    describe() { return \"B/\" + super.describe(); }
}
class C < B {}
print B(\"1\").describe();
print C(\"2\").describe();");

        assert_eq!(lines(&output), vec!["B/A1!", "B/A2!"]);
    }

    #[test]
    fn test_class_arity_comes_from_inherited_init() {
        let output = run("
class A { init(a, b) { this.total = a + b; } }
class B < A {}
print B(1, 2).total;");

        assert_eq!(output, "3\n");
    }

    #[test]
    fn test_each_property_access_binds_a_new_method() {
        let output = run("
class A { m() { return \"method\"; } }
var a = A();
print a.m == a.m;
var m = a.m;
print m == m;
a.m = 1;
print m();
print a.m;");

        assert_eq!(lines(&output), vec!["false", "true", "method", "1"]);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Failures
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_runtime_error_stops_at_the_failing_statement() {
        let (output, error) = run_failing("print 1;\nprint -\"x\";\nprint 2;");

        assert_eq!(output, "1\n");
        assert_eq!(error.exit_code(), 70);
        assert_eq!(error.to_string(), "Operand must be a number.\n[line 2]");
    }

    #[test]
    fn test_runtime_error_messages() {
        let cases = [
            ("print 1 - \"a\";", "Operands must be numbers."),
            ("print 1 < nil;", "Operands must be numbers."),
            ("print 1 + \"a\";", "Operands must be two numbers or two strings."),
            ("print missing;", "Undefined variable 'missing'."),
            ("missing = 1;", "Undefined variable 'missing'."),
            ("\"text\"();", "Can only call functions and classes."),
            ("fun f(a) {} f(1, 2);", "Expected 1 arguments but got 2."),
            ("class A {} A(1);", "Expected 0 arguments but got 1."),
            ("var x = 1; print x.y;", "Only instances have properties."),
            ("var x = 1; x.y = 2;", "Only instances have fields."),
            ("class A {} print A().nope;", "Undefined property 'nope'."),
            ("var NotAClass = 1; class B < NotAClass {}", "Superclass must be a class."),
        ];

        for (source, message) in cases {
            let (_, error) = run_failing(source);
            assert!(
                matches!(error, RunError::Runtime(_)),
                "{} should fail at runtime",
                source
            );
            assert_eq!(error.to_string(), format!("{}\n[line 1]", message), "{}", source);
        }
    }

    #[test]
    fn test_arity_mismatch_does_not_run_the_body() {
        let (output, _) = run_failing("fun f(a) { print \"ran\"; } f();");
        assert_eq!(output, "");
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let (output, error) = run_failing("print \"before\";\n{ var a = a; }");

        assert_eq!(output, "");
        assert_eq!(error.exit_code(), 65);
        assert_eq!(
            error.to_string(),
            "[line 2] Error at 'a': Can't read local variable in its own initializer."
        );
    }

    #[test]
    fn test_lexical_and_syntax_errors_are_reported_together() {
        let (output, error) = run_failing("print 1 @;\nvar = 2;");

        assert_eq!(output, "");
        assert_eq!(error.exit_code(), 65);
        assert_eq!(
            error.to_string(),
            "[line 1] Error: Unexpected character: @\n[line 2] Error at '=': Expect variable name."
        );
    }

    #[test]
    fn test_same_program_prints_the_same_output() {
        let source = "
class Node { init(v) { this.v = v; } }
var total = 0;
for (var i = 0; i < 5; i = i + 1) total = total + Node(i).v;
print total;";

        assert_eq!(run(source), run(source));
        assert_eq!(run(source), "10\n");
    }

    #[test]
    fn test_evaluate_single_expression() {
        assert_eq!(rox::evaluate("(1 + 2) * 3").unwrap(), "9");
        assert_eq!(rox::evaluate("\"a\" + \"b\"").unwrap(), "ab");
        assert_eq!(rox::evaluate("nil == false").unwrap(), "false");

        let error = rox::evaluate("-true").unwrap_err();
        assert_eq!(error.exit_code(), 70);
    }
}
