//! Relational builtins: `=`, `<`, `>`, `<=`, `>=`, each accepting one or two
//! numeric arguments (one argument treats the left operand as 0).

use crate::error::LispError;
use crate::pool::Pool;
use crate::value::ValueHandle;

fn number_of(pool: &Pool, handle: ValueHandle, builtin: &str) -> Result<f64, LispError> {
    pool.get(handle)
        .as_number()
        .ok_or_else(|| LispError::type_err_at(format!("{builtin}: expected a number"), pool.loc(handle)))
}

fn relop(
    args: &[ValueHandle],
    pool: &mut Pool,
    name: &str,
    f: fn(f64, f64) -> bool,
) -> Result<ValueHandle, LispError> {
    let (a, b) = match args {
        [a] => (0.0, number_of(pool, *a, name)?),
        [a, b] => (number_of(pool, *a, name)?, number_of(pool, *b, name)?),
        _ => return Err(LispError::value(format!("{name}: expected 1 or 2 arguments"))),
    };
    Ok(pool.bool_value(f(a, b)))
}

fn eq_(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    relop(args, pool, "=", |a, b| a == b)
}

fn lt(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    relop(args, pool, "<", |a, b| a < b)
}

fn gt(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    relop(args, pool, ">", |a, b| a > b)
}

fn le(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    relop(args, pool, "<=", |a, b| a <= b)
}

fn ge(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    relop(args, pool, ">=", |a, b| a >= b)
}

pub fn register(pool: &mut Pool) {
    let root = pool.root();
    let mut install = |name: &'static str, func: fn(&[ValueHandle], &mut Pool) -> Result<ValueHandle, LispError>| {
        let b = pool.builtin(name, func);
        pool.env_define(root, name, b);
    };
    install("=", eq_);
    install("<", lt);
    install(">", gt);
    install("<=", le);
    install(">=", ge);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn call(pool: &mut Pool, name: &str, args: &[ValueHandle]) -> Result<ValueHandle, LispError> {
        let root = pool.root();
        let proc = pool.env_lookup(root, name).unwrap();
        match pool.get(proc).clone() {
            Value::Builtin { func, .. } => func(args, pool),
            _ => panic!("{name} is not a builtin"),
        }
    }

    #[test]
    fn two_arg_comparisons() {
        let mut pool = Pool::new();
        let one = pool.number(1.0);
        let two = pool.number(2.0);
        assert_eq!(pool.display(call(&mut pool, "<", &[one, two]).unwrap()), "#t");
        assert_eq!(pool.display(call(&mut pool, ">", &[one, two]).unwrap()), "#f");
        assert_eq!(pool.display(call(&mut pool, "=", &[one, one]).unwrap()), "#t");
    }

    #[test]
    fn one_arg_treats_left_as_zero() {
        let mut pool = Pool::new();
        let neg = pool.number(-1.0);
        assert_eq!(pool.display(call(&mut pool, "<", &[neg]).unwrap()), "#f");
        let pos = pool.number(1.0);
        assert_eq!(pool.display(call(&mut pool, "<", &[pos]).unwrap()), "#t");
    }
}
