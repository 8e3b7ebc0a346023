use std::io;

use dynlisp::{evaluator, parser, LispError, Value};

/// Parse and run a program with output discarded and an empty input source
fn run_str(input: &str) -> Result<Value, LispError> {
    let program = parser::parse(input)?;
    let mut out = io::sink();
    let mut source = io::empty();
    evaluator::run(&program, &mut out, &mut source)
}

/// Parse and run a program, capturing everything it printed
fn run_capturing_output(input: &str) -> String {
    let program = parser::parse(input).expect("program should parse");
    let mut out = Vec::new();
    let mut source = io::empty();
    evaluator::run(&program, &mut out, &mut source).expect("program should run");
    String::from_utf8(out).expect("output should be UTF-8")
}

#[test]
fn test_arithmetic() {
    assert_eq!(run_str("(+ 1 2)").unwrap(), Value::Int(3));
    assert_eq!(run_str("(* 2 3)").unwrap(), Value::Int(6));
    assert_eq!(run_str("(/ 4 2)").unwrap(), Value::Int(2));
    assert_eq!(run_str("(- 9 4)").unwrap(), Value::Int(5));
    assert_eq!(run_str("(+ (+ 1  1) (+ 1 1))").unwrap(), Value::Int(4));
}

#[test]
fn test_whitespace_insensitive_source() {
    let program = "
(+ 1


\t(*
\t\t1
\t\t2)


\t)
";
    assert_eq!(run_str(program).unwrap(), Value::Int(3));
}

#[test]
fn test_literals_and_symbols() {
    assert_eq!(run_str("1").unwrap(), Value::Int(1));
    assert_eq!(run_str("-1").unwrap(), Value::Int(-1));
    // An unbound symbol evaluates to nil rather than erroring
    assert_eq!(run_str("yoloswag").unwrap(), Value::Nil);
    assert_eq!(run_str("nil").unwrap(), Value::Nil);
}

#[test]
fn test_string_coercion() {
    assert_eq!(
        run_str(r#"(+ "a" "bc")"#).unwrap(),
        Value::Str("abc".to_string())
    );
    // Int-to-string coercion only on the right side of a string-led +
    assert_eq!(
        run_str(r##"(+ "#" (+ "yolo" (* (* 20 7) 3)))"##).unwrap(),
        Value::Str("#yolo420".to_string())
    );
    assert!(run_str(r#"(+ 1 "a")"#).is_err());
}

#[test]
fn test_string_escapes() {
    assert_eq!(run_str(r#""\"""#).unwrap(), Value::Str("\"".to_string()));
    assert_eq!(run_str(r#""\\""#).unwrap(), Value::Str("\\".to_string()));
}

#[test]
fn test_scope() {
    assert_eq!(
        run_str("(scope (set a 1) a)").unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        run_str("(scope (set lol 1) (set hello 4) (+ lol hello))").unwrap(),
        Value::Int(5)
    );
}

#[test]
fn test_scope_explicit_return() {
    // _return overrides the last-expression value
    assert_eq!(
        run_str("(scope (set _return 4) (set hello 1337))").unwrap(),
        Value::Int(4)
    );
}

#[test]
fn test_top_level_set_persists() {
    assert_eq!(run_str("(set a 1)\na").unwrap(), Value::Int(1));
}

#[test]
fn test_dynamic_scoping() {
    // The trailing bare symbol sees the latest top-level binding
    assert_eq!(
        run_str("(set a 1) (defun lol a) (set a 2) a").unwrap(),
        Value::Int(2)
    );
    // A call observes whatever a is bound to at call time, not defun time
    assert_eq!(
        run_str("(set a 1) (defun lol a) (set a 2) (lol)").unwrap(),
        Value::Int(2)
    );
    assert_eq!(
        run_str("(set a 1) (defun lol a) (set a 7) (lol)").unwrap(),
        Value::Int(7)
    );
    // Free names in a body resolve against the caller's chain
    assert_eq!(
        run_str("(defun addn x (+ x n)) (set n 100) (addn 5)").unwrap(),
        Value::Int(105)
    );
}

#[test]
fn test_if() {
    assert_eq!(run_str("(if 1 1 0)").unwrap(), Value::Int(1));
    assert_eq!(run_str("(if 1 0 1)").unwrap(), Value::Int(0));
    assert_eq!(run_str("(if 0 1 0)").unwrap(), Value::Int(0));
    assert_eq!(run_str("(if (== 1 1) 1 0)").unwrap(), Value::Int(1));
    assert_eq!(run_str("(if (== 1 2) 0 1)").unwrap(), Value::Int(1));
}

#[test]
fn test_while() {
    let program = "
(set total 0)
(set i 0)
(while (- 5 i)
\t(stat
\t\t(set total (+ total i))
\t\t(set i (+ i 1))))
total
";
    assert_eq!(run_str(program).unwrap(), Value::Int(10));
}

#[test]
fn test_user_functions() {
    assert_eq!(
        run_str("(defun double x (* x 2)) (double 21)").unwrap(),
        Value::Int(42)
    );
    assert_eq!(
        run_str("(defun fact n (if (== n 0) 1 (* n (fact (- n 1))))) (fact 5)").unwrap(),
        Value::Int(120)
    );
    // Parameters shadow outer bindings without mutating them
    assert_eq!(
        run_str("(set x 1) (defun id x x) (id 9) x").unwrap(),
        Value::Int(1)
    );
}

#[test]
fn test_print_output() {
    assert_eq!(run_capturing_output(r#"(print "hello")"#), "hello");
    assert_eq!(
        run_capturing_output("(defun p2 a (print a))\n(p2 \"a\")"),
        "a"
    );
    assert_eq!(run_capturing_output("(print 123)"), "123");
    assert_eq!(
        run_capturing_output("(defun println line (print line \"\\n\"))\n(println \"yoloswag\")"),
        "yoloswag\n"
    );
    // Arguments are concatenated with no separator
    assert_eq!(run_capturing_output(r#"(print "a" 1 "b")"#), "a1b");
}

#[test]
fn test_getline_feeds_from_input_source() {
    let program = parser::parse(r#"(print "hi " (getline))"#).unwrap();
    let mut out = Vec::new();
    let mut source = io::Cursor::new("bob\n");
    evaluator::run(&program, &mut out, &mut source).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "hi bob");
}

#[test]
fn test_int_builtin_roundtrip() {
    // A printed integer can be concatenated and parsed back
    assert_eq!(run_str(r#"(int (+ "" 42))"#).unwrap(), Value::Int(42));
    assert_eq!(run_str(r#"(+ (int "40") 2)"#).unwrap(), Value::Int(42));
}

#[test]
fn test_parse_errors() {
    // Unterminated string
    assert!(matches!(run_str("\""), Err(LispError::ParseError(_))));
    // Unterminated call
    assert!(matches!(run_str("(+ 1 1"), Err(LispError::ParseError(_))));
}

#[test]
fn test_empty_input() {
    assert_eq!(run_str("").unwrap(), Value::Nil);
}

#[test]
fn test_runtime_errors() {
    assert!(matches!(
        run_str("(nosuch 1)"),
        Err(LispError::FunctionNotFound(_))
    ));
    assert!(matches!(
        run_str("(defun f a b (+ a b)) (f 1)"),
        Err(LispError::ArityError { .. })
    ));
    assert!(matches!(
        run_str(r#"(- "a" 1)"#),
        Err(LispError::TypeError(_))
    ));
    assert!(matches!(
        run_str(r#"(int "xyz")"#),
        Err(LispError::EvalError(_))
    ));
}
