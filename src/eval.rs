// ABOUTME: The recursive evaluator — dispatches between special forms, applying
// procedures, and self-evaluating atoms.

use crate::error::LispError;
use crate::pool::Pool;
use crate::special_forms;
use crate::value::{EnvHandle, Value, ValueHandle};

/// Evaluate `expr` in `env`.
///
/// A symbol in head position that names a special form is never looked up as a
/// variable — `define`, `if`, and friends are reserved words, not rebindable
/// bindings, even though user code is free to `(define if ...)` a shadowing binding
/// that only takes effect when `if` appears in a non-head position. A non-symbol
/// head (e.g. the result of `(if ... f g)`) is evaluated like any other operand.
pub fn eval(pool: &mut Pool, env: EnvHandle, expr: ValueHandle) -> Result<ValueHandle, LispError> {
    match pool.get(expr).clone() {
        Value::Symbol(name) => pool
            .env_lookup(env, &name)
            .ok_or_else(|| LispError::value_at(format!("Undefined variable: {name}"), pool.loc(expr))),
        Value::Pair { .. } => eval_pair(pool, env, expr),
        _ => Ok(expr),
    }
}

fn eval_pair(pool: &mut Pool, env: EnvHandle, expr: ValueHandle) -> Result<ValueHandle, LispError> {
    let items = pool.proper_list(expr, "eval")?;
    if items.is_empty() {
        return Err(LispError::value_at("Cannot evaluate an empty list", pool.loc(expr)));
    }
    let (head, operands) = (items[0], &items[1..]);

    if let Value::Symbol(name) = pool.get(head).clone() {
        if let Some(form) = special_forms::lookup(&name) {
            return form(operands, env, pool);
        }
    }

    let proc = eval(pool, env, head)?;
    let mut args = Vec::with_capacity(operands.len());
    for op in operands {
        args.push(eval(pool, env, *op)?);
    }
    apply(pool, proc, &args)
}

/// Apply an already-evaluated procedure to already-evaluated arguments.
pub fn apply(pool: &mut Pool, proc: ValueHandle, args: &[ValueHandle]) -> Result<ValueHandle, LispError> {
    match pool.get(proc).clone() {
        Value::Builtin { func, .. } => func(args, pool),
        Value::Lambda { params, body, env } => {
            if params.len() != args.len() {
                return Err(LispError::value(format!(
                    "Expected {} argument(s), got {}",
                    params.len(),
                    args.len()
                )));
            }
            let call_env = pool.make_env(Some(env));
            for (param, arg) in params.iter().zip(args.iter()) {
                pool.env_define(call_env, param.clone(), *arg);
            }
            let mut result = pool.nil();
            for expr in &body {
                result = eval(pool, call_env, *expr)?;
            }
            Ok(result)
        }
        _ => Err(LispError::type_err("Only functions can be applied")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_one;

    fn eval_src(pool: &mut Pool, env: EnvHandle, src: &str) -> Result<ValueHandle, LispError> {
        let expr = parse_one(pool, src, "test")?;
        eval(pool, env, expr)
    }

    #[test]
    fn self_evaluating_atoms() {
        let mut pool = Pool::new();
        let root = pool.root();
        assert_eq!(pool.display(eval_src(&mut pool, root, "42").unwrap()), "42");
        assert_eq!(pool.display(eval_src(&mut pool, root, "\"hi\"").unwrap()), "\"hi\"");
        assert_eq!(pool.display(eval_src(&mut pool, root, "#t").unwrap()), "#t");
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let mut pool = Pool::new();
        let root = pool.root();
        let err = eval_src(&mut pool, root, "nope").unwrap_err();
        assert!(err.message.contains("Undefined variable"));
    }

    #[test]
    fn empty_application_is_an_error() {
        let mut pool = Pool::new();
        let root = pool.root();
        let err = eval_src(&mut pool, root, "()").unwrap_err();
        assert!(err.message.contains("Cannot evaluate an empty list"));
    }

    #[test]
    fn applying_a_non_procedure_is_an_error() {
        let mut pool = Pool::new();
        let root = pool.root();
        let err = eval_src(&mut pool, root, "(1 2 3)").unwrap_err();
        assert!(err.message.contains("Only functions can be applied"));
    }

    #[test]
    fn lambda_application_and_closures() {
        let mut pool = Pool::new();
        let root = pool.root();
        eval_src(&mut pool, root, "(define adder (lambda (x) (lambda (y) (+ x y))))").unwrap();
        let v = eval_src(&mut pool, root, "((adder 3) 4)").unwrap();
        assert_eq!(pool.display(v), "7");
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let mut pool = Pool::new();
        let root = pool.root();
        eval_src(&mut pool, root, "(define f (lambda (x y) x))").unwrap();
        let err = eval_src(&mut pool, root, "(f 1)").unwrap_err();
        assert!(err.message.contains("Expected 2"));
    }

    #[test]
    fn nested_calls_and_arithmetic() {
        let mut pool = Pool::new();
        let root = pool.root();
        let v = eval_src(&mut pool, root, "(* (+ 1 2) 3)").unwrap();
        assert_eq!(pool.display(v), "9");
    }

    #[test]
    fn define_function_sugar() {
        let mut pool = Pool::new();
        let root = pool.root();
        eval_src(&mut pool, root, "(define (square x) (* x x))").unwrap();
        let v = eval_src(&mut pool, root, "(square 5)").unwrap();
        assert_eq!(pool.display(v), "25");
    }

    #[test]
    fn recursive_function_via_define() {
        let mut pool = Pool::new();
        let root = pool.root();
        eval_src(
            &mut pool,
            root,
            "(define (sum n acc) (if (<= n 0) acc (sum (- n 1) (+ acc n))))",
        )
        .unwrap();
        let v = eval_src(&mut pool, root, "(sum 100 0)").unwrap();
        assert_eq!(pool.display(v), "5050");
    }
}
