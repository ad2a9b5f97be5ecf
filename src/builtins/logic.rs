//! The single builtin logical operator. `and`/`or` are special forms (they
//! short-circuit without evaluating their operands ahead of time) and live in
//! [`crate::special_forms`].

use crate::error::LispError;
use crate::pool::Pool;
use crate::value::ValueHandle;

/// Non-boolean values are truthy, so `not` only ever returns `#t` for literal `#f`.
fn not(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a] = args else {
        return Err(LispError::value("not: expected 1 argument"));
    };
    Ok(pool.bool_value(!pool.get(*a).is_truthy()))
}

pub fn register(pool: &mut Pool) {
    let root = pool.root();
    let b = pool.builtin("not", not);
    pool.env_define(root, "not", b);
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
    fn not_inverts_only_literal_false() {
        let mut pool = Pool::new();
        let f = pool.bool_value(false);
        assert_eq!(pool.display(call(&mut pool, "not", &[f]).unwrap()), "#t");
        let n = pool.number(0.0);
        assert_eq!(pool.display(call(&mut pool, "not", &[n]).unwrap()), "#f");
    }
}
