use std::fs;

use patlang::{interpreter::evaluator::core::Interp, run_source};
use walkdir::WalkDir;

/// Runs a program and returns everything it printed. Panics on any parse or
/// runtime error.
fn run(source: &str) -> String {
    let mut out = Vec::new();
    let mut interp = Interp::new(&mut out);
    if let Err(e) = run_source(source, &mut interp) {
        panic!("Script failed: {e}\n--- source ---\n{source}");
    }
    String::from_utf8(out).expect("program output was not UTF-8")
}

/// Runs a program that must fail; returns the error message.
fn fails(source: &str) -> String {
    let mut out = Vec::new();
    let mut interp = Interp::new(&mut out);
    match run_source(source, &mut interp) {
        Ok(_) => panic!("Script succeeded but was expected to fail:\n{source}"),
        Err(e) => e.to_string(),
    }
}

#[test]
fn arithmetic_and_print() {
    assert_eq!(run("print(1 + 2 * 3)"), "7\n");
    assert_eq!(run("print((1 + 2) * 3)"), "9\n");
    assert_eq!(run("print(7 / 2)"), "3\n");
    assert_eq!(run("print(7.0 / 2)"), "3.5\n");
    assert_eq!(run("print(7 % 3)"), "1\n");
}

#[test]
fn function_with_named_return() {
    let source = "fn sq(x:i32):(r:i32) { r = x * x }\nprint(sq(7).r)";
    assert_eq!(run(source), "49\n");
}

#[test]
fn pattern_instantiation_and_member_access() {
    let source = "pat P { pub var a:i32; pub var b:i32 }\nvar p = P(3, 4)\nprint(p.a + p.b)";
    assert_eq!(run(source), "7\n");
}

#[test]
fn switch_with_default() {
    let source = r#"
fn cls(n:i32):(s:string) {
  s = switch (n % 2) { case 0: { yield "even" } break; default: { yield "odd" } break }
}
print(cls(9).s)
print(cls(8).s)
"#;
    assert_eq!(run(source), "odd\neven\n");
}

#[test]
fn smart_newline_inside_parens() {
    let source = "var x = (\n  1 +\n  2 +\n  3\n)\nprint(x)";
    assert_eq!(run(source), "6\n");
}

#[test]
fn module_import() {
    let dir = std::env::temp_dir().join(format!("patlang_modules_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("util.lang"), "pub fn dbl(n:i32):(r:i32) { r = n + n }\n").unwrap();

    let mut out = Vec::new();
    let mut interp = Interp::new(&mut out);
    interp.set_module_root(&dir);
    run_source("import util of dbl\nprint(dbl(21).r)", &mut interp).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "42\n");

    // Whole-module binding with an alias; the second import hits the cache.
    let mut out = Vec::new();
    let mut interp = Interp::new(&mut out);
    interp.set_module_root(&dir);
    run_source("import util as u\nimport util as v\nprint(u.dbl(2).r + v.dbl(3).r)",
               &mut interp).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "10\n");
}

#[test]
fn missing_module_binds_null() {
    let source = "import no_such_module as m\nprint(is_null(m))";
    assert_eq!(run(source), "true\n");
}

#[test]
fn division_boundaries() {
    assert!(fails("print(1 / 0)").contains("division by zero"));
    assert!(fails("print(1 % 0)").contains("modulo by zero"));
    // A float operand follows IEEE instead of raising.
    assert_eq!(run("print(1.0 / 0)"), "inf\n");
    assert_eq!(run("print(1 / 0.0)"), "inf\n");
}

#[test]
fn substr_clamps() {
    assert_eq!(run("print(substr('hello', -5, 2))"), "he\n");
    assert_eq!(run("print(substr('hello', 10, 2))"), "\n");
    assert_eq!(run("print(substr('hello', 3, 99))"), "lo\n");
    assert_eq!(run("print(substr('hello', 1, -1))"), "\n");
}

#[test]
fn tuple_indexing_wraps_once() {
    assert_eq!(run("var t = (10, 20, 30)\nprint(t[-1])\nprint(t[1])"), "30\n20\n");
    assert!(fails("var t = (1, 2)\nprint(t[5])").contains("tuple index out of range"));
    assert!(fails("var t = (1, 2)\nprint(t[-3])").contains("tuple index out of range"));
}

#[test]
fn for_over_zero_is_null() {
    assert_eq!(run("print(for (i:0) { yield i })"), "null\n");
}

#[test]
fn loops_yield_and_break() {
    // yield overwrites the loop result and keeps iterating.
    assert_eq!(run("print(for (i:5) { yield i * i })"), "16\n");
    // break exits with the accumulated result.
    assert_eq!(run("print(for (i:10) { i == 3 ? { break } : { yield i } })"), "2\n");
    // Iterating a tuple binds its elements.
    assert_eq!(run("var total = 0\nfor (n : (1, 2, 3)) { total = total + n }\nprint(total)"),
               "6\n");
}

#[test]
fn while_loop_forms() {
    assert_eq!(run("var i = 0\nwhile (i < 3) { i = i + 1 }\nprint(i)"), "3\n");
    // Trailing-condition form runs the body before the first check.
    assert_eq!(run("var i = 0\n{ i = i + 1 } while (i < 4)\nprint(i)"), "4\n");
    assert_eq!(run("var i = 9\n{ i = i + 1 } while (i < 4)\nprint(i)"), "10\n");
    // Both conditions together.
    assert_eq!(run("var i = 0\nwhile (i < 5) { i = i + 1 } while (i != 3)\nprint(i)"), "3\n");
}

#[test]
fn optional_expression() {
    assert_eq!(run("print(1 ? 'yes' : 'no')"), "yes\n");
    assert_eq!(run("print(0 ? 'yes' : 'no')"), "no\n");
    assert_eq!(run("print(0 ? 'yes')"), "null\n");
    assert_eq!(run("print(2 < 3 ? 'lt' : 'ge')"), "lt\n");
}

#[test]
fn truthiness() {
    assert_eq!(run("print(bool(''), bool('x'), bool(0), bool(0.0), bool(null))"),
               "false true false false false\n");
}

#[test]
fn equality_promotes_numerics() {
    assert_eq!(run("print(1 == 1.0)"), "true\n");
    assert_eq!(run("print(1 == '1')"), "false\n");
    assert_eq!(run("print(null == null)"), "true\n");
    assert_eq!(run("print('ab' == 'ab')"), "true\n");
}

#[test]
fn bitwise_and_shifts() {
    assert_eq!(run("print(6 & 3, 6 | 3, 6 ^ 3)"), "2 7 5\n");
    assert_eq!(run("print(1 << 4, 256 >> 4)"), "16 16\n");
    assert_eq!(run("print(~0)"), "-1\n");
    assert!(fails("print(1 << 64)").contains("shift amount out of range"));
}

#[test]
fn string_concatenation() {
    assert_eq!(run("print('foo' + 'bar')"), "foobar\n");
    assert!(fails("print(1 + 'a')").contains("unsupported binary operation"));
}

#[test]
fn scope_is_an_expression() {
    assert_eq!(run("var x = { 1; 2; 3 }\nprint(x)"), "3\n");
    assert_eq!(run("print({ var a = 2\na * a })"), "4\n");
}

#[test]
fn scopes_shadow_across_frames() {
    assert_eq!(run("var x = 1\n{ var x = 2\nprint(x) }\nprint(x)"), "2\n1\n");
    // Assignment without a declaration reaches the outer binding.
    assert_eq!(run("var x = 1\n{ x = 2 }\nprint(x)"), "2\n");
}

#[test]
fn assignment_is_an_expression() {
    assert_eq!(run("var x = 0\nprint(x = 5)"), "5\n");
    assert!(fails("1 = 2").contains("invalid assignment target"));
    assert!(fails("var t = (1, 2)\nt[0] = 9").contains("index assignment"));
}

#[test]
fn member_assignment_on_pattern_instance() {
    let source = "pat P { pub var a:i32; pub var b:i32 }\nvar p = P(1, 2)\np.a = 10\nprint(p.a + p.b)";
    assert_eq!(run(source), "12\n");
}

#[test]
fn named_tuples() {
    assert_eq!(run("var t = (x: 1, y: 2)\nprint(t.x + t.y)"), "3\n");
    // Assignment-shaped elements name the element without touching the
    // environment.
    assert_eq!(run("var t = (a = 1, b = 2)\nprint(t.b)"), "2\n");
    assert_eq!(run("var a = 9\nvar t = (a = 1)\nprint(a)"), "9\n");
    assert_eq!(run("print((x: 1, y: 2))"), "(x: 1, y: 2)\n");
}

#[test]
fn closures_capture_their_environment() {
    assert_eq!(run("var n = 10\nfn add(x:i32) { return x + n }\nprint(add(5))"), "15\n");
    // The inner function keeps the call frame alive after `make` returns.
    let source = "fn make(n:i32) { fn inner() { return n }\nreturn inner }\nvar f = make(7)\nprint(f())";
    assert_eq!(run(source), "7\n");
}

#[test]
fn recursion() {
    let source = "fn fib(n:i32) { return n < 2 ? n : fib(n - 1) + fib(n - 2) }\nprint(fib(10))";
    assert_eq!(run(source), "55\n");
}

#[test]
fn missing_arguments_become_null() {
    assert_eq!(run("fn f(a, b) { return is_null(b) }\nprint(f(1))"), "true\n");
}

#[test]
fn pattern_methods_and_reflection() {
    let source = r"
pat Point {
    pub var x:i32
    pub var y:i32

    fn manhattan(p) {
        return abs(p.x) + abs(p.y)
    }
}
var p = Point(3, -4)
print(Point.manhattan(p))
var t = type(p)
print(t.name)
print(t.is_pat)
print(t.fields)
print(type_of(p))
";
    assert_eq!(run(source), "7\nPoint\ntrue\n(x: x, y: y)\npat_inst\n");
}

#[test]
fn missing_pattern_fields_are_null() {
    let source = "pat P { pub var a:i32; pub var b:i32 }\nvar p = P(1)\nprint(is_null(p.b))";
    assert_eq!(run(source), "true\n");
}

#[test]
fn type_of_names() {
    assert_eq!(run("print(type_of(1), type_of(1.5), type_of('s'), type_of(null))"),
               "int float string null\n");
}

#[test]
fn template_application_converts() {
    assert_eq!(run("print(<i32>(3.9))"), "3\n");
    assert_eq!(run("print(<f64>(2))"), "2\n");
    assert_eq!(run("print(<string>(42) + '!')"), "42!\n");
    assert_eq!(run("print(<i32>('17 years'))"), "17\n");
}

#[test]
fn speculative_template_backtracks_to_comparison() {
    // `a < b` must stay a comparison even though it starts like `a<T>`.
    assert_eq!(run("var a = 1\nvar b = 2\nprint(a < b)"), "true\n");
    assert_eq!(run("fn f(n:i32) { return n < 2 ? 'small' : 'big' }\nprint(f(1))"), "small\n");
}

#[test]
fn conversion_round_trips() {
    assert_eq!(run("print(int(string(9223372036854775807)))"), "9223372036854775807\n");
    assert_eq!(run("print(int(string(-42)))"), "-42\n");
    assert_eq!(run("print(float(string(2.5)))"), "2.5\n");
    assert_eq!(run("print(int('42 apples'), int('apples'))"), "42 0\n");
}

#[test]
fn move_takes_the_binding() {
    assert_eq!(run("var a = 5\nvar b = move a\nprint(b)\nprint(is_null(a))"), "5\ntrue\n");
    assert_eq!(run("print(move 5)"), "5\n");
}

#[test]
fn copy_shares_composites() {
    assert_eq!(run("var a = 3\nvar b = copy a\nb = 4\nprint(a, b)"), "3 4\n");
}

#[test]
fn custom_operator_declaration_parses() {
    assert_eq!(run("fn \"+>\"(a, b) { return a + b }\nprint('ok')"), "ok\n");
}

#[test]
fn return_forms() {
    // Explicit `return expr` bypasses named-return collection.
    assert_eq!(run("fn f(x:i32):(r:i32) { return x }\nprint(f(3))"), "3\n");
    // Even when the returned expression is the null literal.
    assert_eq!(run("fn f(x:i32):(r:i32) { r = 9\nreturn null }\nprint(is_null(f(3)))"),
               "true\n");
    // A bare `return` still collects the named slots.
    assert_eq!(run("fn f(x:i32):(r:i32) { r = x * 2\nreturn }\nprint(f(3).r)"), "6\n");
    // Without an annotation a bare `return` is null.
    assert_eq!(run("fn f() { return }\nprint(is_null(f()))"), "true\n");
    // Without an annotation the body's last value is the result.
    assert_eq!(run("fn f(x:i32) { x + 1 }\nprint(f(3))"), "4\n");
}

#[test]
fn switch_without_match_is_null() {
    assert_eq!(run("print(switch (5) { case 1: yield 'a' break; })"), "null\n");
    assert_eq!(run("print(switch (5) { case 5: yield 'a' break; })"), "a\n");
}

#[test]
fn runtime_errors_carry_positions() {
    let message = fails("var x = 1\nprint(nope)");
    assert!(message.contains("undefined variable 'nope'"), "{message}");
    assert!(message.contains("line 2"), "{message}");
}

#[test]
fn parse_errors() {
    assert!(fails("pub import foo").contains("import cannot be pub"));
    assert!(fails("var x ::").contains("type omitted with '::'"));
    assert!(fails("pub 1 + 2").contains("expected declaration after 'pub'"));
    assert!(fails("print(").contains("end of input"));
    assert!(fails("fn 1()").contains("expected function name"));
}

#[test]
fn not_callable() {
    assert!(fails("var x = 1\nx()").contains("not a callable value"));
}

#[test]
fn assert_builtin() {
    assert_eq!(run("assert(1 == 1)\nprint('ok')"), "ok\n");
    assert!(fails("assert(false)").contains("Assertion failed"));
    assert!(fails("assert(1 == 2, 'math is broken')").contains("math is broken"));
}

#[test]
fn demo_scripts_run_clean() {
    let mut count = 0;
    for entry in WalkDir::new("demos").into_iter()
                                      .filter_map(Result::ok)
                                      .filter(|e| {
                                          e.path().extension().is_some_and(|ext| ext == "lang")
                                      })
    {
        count += 1;
        let source = fs::read_to_string(entry.path())
            .unwrap_or_else(|e| panic!("Failed to read {:?}: {e}", entry.path()));
        let mut out = Vec::new();
        let mut interp = Interp::new(&mut out);
        if let Err(e) = run_source(&source, &mut interp) {
            panic!("Demo {:?} failed: {e}", entry.path());
        }
    }
    assert!(count > 0, "No demo scripts found in demos/");
}
