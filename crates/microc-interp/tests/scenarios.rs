//! End-to-end pipeline tests: source text through the lexer, parser, and
//! interpreter, asserting on the framed sink output.

use microc_interp::Interpreter;
use microc_lex::tokenize;
use microc_par::parse;
use microc_util::{BufferSink, Handler, SharedBufferSink};

#[test]
fn collatz_count() {
    let src = "{ int n = 343; int count = 0; while (n > 1) { count = count + 1; int temp = n % 2; if (temp - 1) { n = n / 2; } if (temp) { n = 3 * n; n = n + 1; } } print(count); }";
    let sink = SharedBufferSink::new();
    let handler = Handler::new(Box::new(sink.clone()));
    let tokens = tokenize(src);
    let block = parse(&tokens, &handler).unwrap();
    let mut interpreter = Interpreter::new(&handler);
    interpreter.run(&block).unwrap();
    assert_eq!(sink.contents(), "__P__125\n__P__");
}

#[test]
fn recursive_fibonacci_sequence() {
    let src = "{ int fib(int n) { if (n == 0) { return 0; } else if (n == 1) { return 1; } else { return fib(n-1) + fib(n-2); } } for (int i = 0; i < 10; i = i + 1) { print(fib(i)); } }";
    let sink = SharedBufferSink::new();
    let handler = Handler::new(Box::new(sink.clone()));
    let tokens = tokenize(src);
    let block = parse(&tokens, &handler).unwrap();
    let mut interpreter = Interpreter::new(&handler);
    assert!(interpreter.run(&block).is_ok());
    let expected: String = [0, 1, 1, 2, 3, 5, 8, 13, 21, 34]
        .iter()
        .map(|n| format!("__P__{n}\n__P__"))
        .collect();
    assert_eq!(sink.contents(), expected);
}

#[test]
fn mixed_type_promotion_divides_as_float() {
    let src = "{ int a = 3; float b = 2.0; print(a / b); }";
    let sink = SharedBufferSink::new();
    let handler = Handler::new(Box::new(sink.clone()));
    let tokens = tokenize(src);
    let block = parse(&tokens, &handler).unwrap();
    let mut interpreter = Interpreter::new(&handler);
    assert!(interpreter.run(&block).is_ok());
    assert_eq!(sink.contents(), "__P__1.5\n__P__");
}

#[test]
fn logical_operators_never_short_circuit() {
    let src = "{ int x = 0; int y = 5; print((x) && (y)); print((x) || (y)); }";
    let sink = SharedBufferSink::new();
    let handler = Handler::new(Box::new(sink.clone()));
    let tokens = tokenize(src);
    let block = parse(&tokens, &handler).unwrap();
    let mut interpreter = Interpreter::new(&handler);
    assert!(interpreter.run(&block).is_ok());
    assert_eq!(sink.contents(), "__P__0\n__P____P__1\n__P__");
}

#[test]
fn calls_do_not_see_caller_locals() {
    let src = "{ int x = 1; int f() { return x; } print(f()); }";
    let handler = Handler::new(Box::new(BufferSink::new()));
    let tokens = tokenize(src);
    let block = parse(&tokens, &handler).unwrap();
    let mut interpreter = Interpreter::new(&handler);
    assert!(interpreter.run(&block).is_err());
    assert!(handler.should_stop());
    assert!(!handler.diagnostics().is_empty());
}

#[test]
fn empty_source_runs_clean() {
    let handler = Handler::new(Box::new(BufferSink::new()));
    let tokens = tokenize("");
    let block = parse(&tokens, &handler).unwrap();
    let mut interpreter = Interpreter::new(&handler);
    assert!(interpreter.run(&block).is_ok());
    assert!(handler.diagnostics().is_empty());
}

#[test]
fn recursion_past_soft_cap_is_a_runtime_error() {
    let src = "{ int f(int n) { return f(n + 1); } print(f(0)); }";
    let handler = Handler::new(Box::new(BufferSink::new()));
    let tokens = tokenize(src);
    let block = parse(&tokens, &handler).unwrap();
    let mut interpreter = Interpreter::new(&handler);
    assert!(interpreter.run(&block).is_err());
}
