// ABOUTME: Integration tests for REPL-supporting functionality (continuation
// detection, evaluation through the same pool/env the REPL drives).
//
// The interactive loop itself (readline, history file, Ctrl-C/Ctrl-D) is
// exercised manually; what's testable here is everything it's built from.

use tree_lisp::parser::{parens_are_balanced, parse_all};
use tree_lisp::pool::Pool;

#[test]
fn incomplete_form_requests_continuation() {
    assert!(!parens_are_balanced("(define (f x)"));
    assert!(!parens_are_balanced("(+ 1 (* 2"));
}

#[test]
fn complete_form_does_not_request_continuation() {
    assert!(parens_are_balanced("(+ 1 2)"));
    assert!(parens_are_balanced("(define x 1) (define y 2)"));
}

#[test]
fn parens_inside_strings_and_comments_are_ignored() {
    assert!(parens_are_balanced("(display \"(unbalanced\")"));
    assert!(parens_are_balanced("(+ 1 2) ; trailing (comment"));
}

#[test]
fn a_multi_line_buffer_assembled_like_the_repl_does_evaluates_once_balanced() {
    let mut pool = Pool::new();
    let env = pool.root();

    let mut buffer = String::from("(define (double x)");
    assert!(!parens_are_balanced(&buffer));
    buffer.push('\n');
    buffer.push_str("  (* x 2))");
    assert!(parens_are_balanced(&buffer));

    let forms = parse_all(&mut pool, &buffer, "<repl>").unwrap();
    for form in forms {
        tree_lisp::eval::eval(&mut pool, env, form).unwrap();
    }

    let forms = parse_all(&mut pool, "(double 21)", "<repl>").unwrap();
    let result = tree_lisp::eval::eval(&mut pool, env, forms[0]).unwrap();
    assert_eq!(pool.display(result), "42");
}
