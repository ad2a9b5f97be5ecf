//! Type predicates (`atom?`, `boolean?`, `integer?`, `list?`, `number?`, `null?`,
//! `pair?`, `procedure?`, `string?`, `symbol?`) and the two equality builtins
//! (`eq?`, `equal?`).

use crate::error::LispError;
use crate::pool::Pool;
use crate::value::{Value, ValueHandle};

fn one_arg(args: &[ValueHandle], name: &str) -> Result<ValueHandle, LispError> {
    match args {
        [a] => Ok(*a),
        _ => Err(LispError::value(format!("{name}: expected 1 argument"))),
    }
}

fn atom_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let a = one_arg(args, "atom?")?;
    Ok(pool.bool_value(pool.get(a).is_atom()))
}

fn boolean_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let a = one_arg(args, "boolean?")?;
    Ok(pool.bool_value(matches!(pool.get(a), Value::Boolean(_))))
}

fn integer_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let a = one_arg(args, "integer?")?;
    let is_int = matches!(pool.get(a), Value::Number(n) if (n - n.round()).abs() < 1e-7);
    Ok(pool.bool_value(is_int))
}

/// `nil` or a proper list: the pair chain's terminal cdr is nil.
fn list_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let a = one_arg(args, "list?")?;
    let is_list = match pool.get(a) {
        Value::Nil => true,
        Value::Pair { .. } => {
            let items = pool.pair_to_vector(a);
            matches!(pool.get(*items.last().unwrap()), Value::Nil)
        }
        _ => false,
    };
    Ok(pool.bool_value(is_list))
}

fn number_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let a = one_arg(args, "number?")?;
    Ok(pool.bool_value(matches!(pool.get(a), Value::Number(_))))
}

fn null_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let a = one_arg(args, "null?")?;
    Ok(pool.bool_value(matches!(pool.get(a), Value::Nil)))
}

fn pair_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let a = one_arg(args, "pair?")?;
    Ok(pool.bool_value(matches!(pool.get(a), Value::Pair { .. })))
}

fn procedure_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let a = one_arg(args, "procedure?")?;
    Ok(pool.bool_value(matches!(
        pool.get(a),
        Value::Builtin { .. } | Value::Lambda { .. }
    )))
}

fn string_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let a = one_arg(args, "string?")?;
    Ok(pool.bool_value(matches!(pool.get(a), Value::String(_))))
}

fn symbol_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let a = one_arg(args, "symbol?")?;
    Ok(pool.bool_value(matches!(pool.get(a), Value::Symbol(_))))
}

fn eq_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a, b] = args else {
        return Err(LispError::value("eq?: expected 2 arguments"));
    };
    Ok(pool.bool_value(pool.identity_equal(*a, *b)))
}

fn equal_p(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a, b] = args else {
        return Err(LispError::value("equal?: expected 2 arguments"));
    };
    Ok(pool.bool_value(pool.structurally_equal(*a, *b)))
}

pub fn register(pool: &mut Pool) {
    let root = pool.root();
    let mut install = |name: &'static str, func: fn(&[ValueHandle], &mut Pool) -> Result<ValueHandle, LispError>| {
        let b = pool.builtin(name, func);
        pool.env_define(root, name, b);
    };
    install("atom?", atom_p);
    install("boolean?", boolean_p);
    install("integer?", integer_p);
    install("list?", list_p);
    install("number?", number_p);
    install("null?", null_p);
    install("pair?", pair_p);
    install("procedure?", procedure_p);
    install("string?", string_p);
    install("symbol?", symbol_p);
    install("eq?", eq_p);
    install("equal?", equal_p);
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
    fn list_p_accepts_nil_and_proper_lists_only() {
        let mut pool = Pool::new();
        let nil = pool.nil();
        assert_eq!(pool.display(call(&mut pool, "list?", &[nil]).unwrap()), "#t");
        let one = pool.number(1.0);
        let two = pool.number(2.0);
        let proper = pool.list_from_vec(vec![one, two]);
        assert_eq!(pool.display(call(&mut pool, "list?", &[proper]).unwrap()), "#t");
        let dotted = pool.cons(one, two);
        assert_eq!(pool.display(call(&mut pool, "list?", &[dotted]).unwrap()), "#f");
    }

    #[test]
    fn eq_vs_equal_on_structurally_equal_pairs() {
        let mut pool = Pool::new();
        let a1 = pool.number(1.0);
        let list_a = pool.list_from_vec(vec![a1]);
        let a2 = pool.number(1.0);
        let list_b = pool.list_from_vec(vec![a2]);
        assert_eq!(pool.display(call(&mut pool, "equal?", &[list_a, list_b]).unwrap()), "#t");
        assert_eq!(pool.display(call(&mut pool, "eq?", &[list_a, list_b]).unwrap()), "#f");
        assert_eq!(pool.display(call(&mut pool, "eq?", &[list_a, list_a]).unwrap()), "#t");
    }

    #[test]
    fn procedure_p_accepts_builtins_and_lambdas() {
        let mut pool = Pool::new();
        let root = pool.root();
        let plus = pool.env_lookup(root, "+").unwrap();
        assert_eq!(pool.display(call(&mut pool, "procedure?", &[plus]).unwrap()), "#t");
    }
}
