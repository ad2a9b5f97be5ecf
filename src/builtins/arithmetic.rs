//! Arithmetic builtins: variadic `+`/`*`, one-or-two-argument `-`/`/`, and the
//! numeric miscellany (`abs`, `expt`, `quotient`, `modulo`, `remainder`,
//! `even?`/`odd?`/`zero?`).

use crate::error::LispError;
use crate::pool::Pool;
use crate::value::{Value, ValueHandle};

const INT_TOLERANCE: f64 = 1e-7;

fn number_of(pool: &Pool, handle: ValueHandle, builtin: &str) -> Result<f64, LispError> {
    pool.get(handle)
        .as_number()
        .ok_or_else(|| LispError::type_err_at(format!("{builtin}: expected a number"), pool.loc(handle)))
}

fn add(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let mut sum = 0.0;
    for arg in args {
        sum += number_of(pool, *arg, "+")?;
    }
    Ok(pool.number(sum))
}

fn mul(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let mut product = 1.0;
    for arg in args {
        product *= number_of(pool, *arg, "*")?;
    }
    Ok(pool.number(product))
}

/// `-`: one argument negates (left operand treated as 0); two subtracts.
fn sub(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    match args {
        [a] => Ok(pool.number(-number_of(pool, *a, "-")?)),
        [a, b] => Ok(pool.number(number_of(pool, *a, "-")? - number_of(pool, *b, "-")?)),
        _ => Err(LispError::value("-: expected 1 or 2 arguments")),
    }
}

/// `/`: one argument reciprocates (left operand treated as 1); two divides.
fn div(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    match args {
        [a] => Ok(pool.number(1.0 / number_of(pool, *a, "/")?)),
        [a, b] => Ok(pool.number(number_of(pool, *a, "/")? / number_of(pool, *b, "/")?)),
        _ => Err(LispError::value("/: expected 1 or 2 arguments")),
    }
}

fn abs_(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a] = args else {
        return Err(LispError::value("abs: expected 1 argument"));
    };
    Ok(pool.number(number_of(pool, *a, "abs")?.abs()))
}

fn expt(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [base, exp] = args else {
        return Err(LispError::value("expt: expected 2 arguments"));
    };
    let base = number_of(pool, *base, "expt")?;
    let exp = number_of(pool, *exp, "expt")?;
    Ok(pool.number(base.powf(exp)))
}

/// Truncate-toward-zero integer division.
fn quotient(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a, b] = args else {
        return Err(LispError::value("quotient: expected 2 arguments"));
    };
    let a = number_of(pool, *a, "quotient")?;
    let b = number_of(pool, *b, "quotient")?;
    Ok(pool.number((a / b).trunc()))
}

/// Result has the sign of `b`.
fn modulo(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a, b] = args else {
        return Err(LispError::value("modulo: expected 2 arguments"));
    };
    let a = number_of(pool, *a, "modulo")?;
    let b = number_of(pool, *b, "modulo")?;
    let r = a % b;
    let r = if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r };
    Ok(pool.number(r))
}

/// Result has the sign of `a`.
fn remainder(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a, b] = args else {
        return Err(LispError::value("remainder: expected 2 arguments"));
    };
    let a = number_of(pool, *a, "remainder")?;
    let b = number_of(pool, *b, "remainder")?;
    Ok(pool.number(a % b))
}

fn even_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a] = args else {
        return Err(LispError::value("even?: expected 1 argument"));
    };
    let n = number_of(pool, *a, "even?")?;
    Ok(pool.bool_value(n.round().rem_euclid(2.0) < INT_TOLERANCE))
}

fn odd_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a] = args else {
        return Err(LispError::value("odd?: expected 1 argument"));
    };
    let n = number_of(pool, *a, "odd?")?;
    Ok(pool.bool_value((n.round().rem_euclid(2.0) - 1.0).abs() < INT_TOLERANCE))
}

fn zero_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a] = args else {
        return Err(LispError::value("zero?: expected 1 argument"));
    };
    let n = number_of(pool, *a, "zero?")?;
    Ok(pool.bool_value(n.abs() < INT_TOLERANCE))
}

pub fn register(pool: &mut Pool) {
    let root = pool.root();
    let mut install = |name: &'static str, func: fn(&[ValueHandle], &mut Pool) -> Result<ValueHandle, LispError>| {
        let b = pool.builtin(name, func);
        pool.env_define(root, name, b);
    };
    install("+", add);
    install("-", sub);
    install("*", mul);
    install("/", div);
    install("abs", abs_);
    install("expt", expt);
    install("quotient", quotient);
    install("modulo", modulo);
    install("remainder", remainder);
    install("even?", even_p);
    install("odd?", odd_p);
    install("zero?", zero_p);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(pool: &mut Pool, name: &str, args: &[ValueHandle]) -> Result<ValueHandle, LispError> {
        let root = pool.root();
        let proc = pool.env_lookup(root, name).unwrap();
        match pool.get(proc).clone() {
            Value::Builtin { func, .. } => func(args, pool),
            _ => panic!("{name} is not a builtin"),
        }
    }

    #[test]
    fn add_is_variadic_with_zero_identity() {
        let mut pool = Pool::new();
        assert_eq!(pool.display(call(&mut pool, "+", &[]).unwrap()), "0");
        let a = pool.number(1.0);
        let b = pool.number(2.0);
        let c = pool.number(3.0);
        assert_eq!(pool.display(call(&mut pool, "+", &[a, b, c]).unwrap()), "6");
    }

    #[test]
    fn sub_one_arg_negates() {
        let mut pool = Pool::new();
        let three = pool.number(3.0);
        assert_eq!(pool.display(call(&mut pool, "-", &[three]).unwrap()), "-3");
    }

    #[test]
    fn div_one_arg_reciprocates() {
        let mut pool = Pool::new();
        let three = pool.number(3.0);
        assert_eq!(pool.display(call(&mut pool, "/", &[three]).unwrap()), "0.3333333333333333");
    }

    #[test]
    fn modulo_takes_sign_of_divisor() {
        let mut pool = Pool::new();
        let a = pool.number(-7.0);
        let b = pool.number(3.0);
        assert_eq!(pool.display(call(&mut pool, "modulo", &[a, b]).unwrap()), "2");
    }

    #[test]
    fn remainder_takes_sign_of_dividend() {
        let mut pool = Pool::new();
        let a = pool.number(-7.0);
        let b = pool.number(3.0);
        assert_eq!(pool.display(call(&mut pool, "remainder", &[a, b]).unwrap()), "-1");
    }

    #[test]
    fn zero_even_odd_predicates() {
        let mut pool = Pool::new();
        let zero = pool.number(0.0);
        let two = pool.number(2.0);
        let three = pool.number(3.0);
        assert_eq!(pool.display(call(&mut pool, "zero?", &[zero]).unwrap()), "#t");
        assert_eq!(pool.display(call(&mut pool, "even?", &[two]).unwrap()), "#t");
        assert_eq!(pool.display(call(&mut pool, "odd?", &[three]).unwrap()), "#t");
    }
}
