//! Pair and list builtins: `car`, `cdr`, `cons`, `list`, `length`, `append`,
//! `map`, `filter`, `reduce`.

use crate::error::LispError;
use crate::eval::apply;
use crate::pool::Pool;
use crate::value::{Value, ValueHandle};

fn pair_of(pool: &Pool, handle: ValueHandle, builtin: &str) -> Result<(ValueHandle, ValueHandle), LispError> {
    match pool.get(handle) {
        Value::Pair { car, cdr } => Ok((*car, *cdr)),
        _ => Err(LispError::type_err_at(
            format!("{builtin}: expected a pair"),
            pool.loc(handle),
        )),
    }
}

fn car(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a] = args else {
        return Err(LispError::value("car: expected 1 argument"));
    };
    Ok(pair_of(pool, *a, "car")?.0)
}

fn cdr(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a] = args else {
        return Err(LispError::value("cdr: expected 1 argument"));
    };
    Ok(pair_of(pool, *a, "cdr")?.1)
}

fn cons(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a, b] = args else {
        return Err(LispError::value("cons: expected 2 arguments"));
    };
    Ok(pool.cons(*a, *b))
}

/// Variadic; an empty call returns nil.
fn list(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    Ok(pool.list_from_vec(args.to_vec()))
}

fn length(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a] = args else {
        return Err(LispError::value("length: expected 1 argument"));
    };
    let items = pool.proper_list(*a, "length")?;
    Ok(pool.number(items.len() as f64))
}

fn append(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let mut all = Vec::new();
    for a in args {
        all.extend(pool.proper_list(*a, "append")?);
    }
    Ok(pool.list_from_vec(all))
}

fn map(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [f, list_handle] = args else {
        return Err(LispError::value("map: expected 2 arguments"));
    };
    let items = pool.proper_list(*list_handle, "map")?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(apply(pool, *f, &[item])?);
    }
    Ok(pool.list_from_vec(out))
}

fn filter(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [pred, list_handle] = args else {
        return Err(LispError::value("filter: expected 2 arguments"));
    };
    let items = pool.proper_list(*list_handle, "filter")?;
    let mut out = Vec::new();
    for item in items {
        let kept = apply(pool, *pred, &[item])?;
        match pool.get(kept) {
            Value::Boolean(b) => {
                if *b {
                    out.push(item);
                }
            }
            _ => return Err(LispError::type_err("filter: predicate must return a boolean")),
        }
    }
    Ok(pool.list_from_vec(out))
}

/// Right fold: `f(x1, reduce(f, rest))`; a single-element list returns that element.
fn reduce(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [f, list_handle] = args else {
        return Err(LispError::value("reduce: expected 2 arguments"));
    };
    let items = pool.proper_list(*list_handle, "reduce")?;
    reduce_items(pool, *f, &items)
}

fn reduce_items(pool: &mut Pool, f: ValueHandle, items: &[ValueHandle]) -> Result<ValueHandle, LispError> {
    match items {
        [] => Err(LispError::value("reduce: expected a non-empty list")),
        [only] => Ok(*only),
        [first, rest @ ..] => {
            let rest_reduced = reduce_items(pool, f, rest)?;
            apply(pool, f, &[*first, rest_reduced])
        }
    }
}

pub fn register(pool: &mut Pool) {
    let root = pool.root();
    let mut install = |name: &'static str, func: fn(&[ValueHandle], &mut Pool) -> Result<ValueHandle, LispError>| {
        let b = pool.builtin(name, func);
        pool.env_define(root, name, b);
    };
    install("car", car);
    install("cdr", cdr);
    install("cons", cons);
    install("list", list);
    install("length", length);
    install("append", append);
    install("map", map);
    install("filter", filter);
    install("reduce", reduce);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_one;

    fn eval_src(pool: &mut Pool, src: &str) -> ValueHandle {
        let root = pool.root();
        let expr = parse_one(pool, src, "test").unwrap();
        crate::eval::eval(pool, root, expr).unwrap()
    }

    #[test]
    fn cons_car_cdr_roundtrip() {
        let mut pool = Pool::new();
        let v = eval_src(&mut pool, "(car (cons 1 (list 2 3)))");
        assert_eq!(pool.display(v), "1");
        let v = eval_src(&mut pool, "(cdr (cons 1 (list 2 3)))");
        assert_eq!(pool.display(v), "(2 3)");
    }

    #[test]
    fn append_concatenates_proper_lists() {
        let mut pool = Pool::new();
        let v = eval_src(&mut pool, "(append (list 1 2) (list 3 4))");
        assert_eq!(pool.display(v), "(1 2 3 4)");
    }

    #[test]
    fn map_filter_reduce() {
        let mut pool = Pool::new();
        let v = eval_src(&mut pool, "(map (lambda (x) (* x x)) (list 1 2 3))");
        assert_eq!(pool.display(v), "(1 4 9)");
        let v = eval_src(&mut pool, "(filter (lambda (x) (> x 1)) (list 1 2 3))");
        assert_eq!(pool.display(v), "(2 3)");
        let v = eval_src(&mut pool, "(reduce + (list 1 2 3 4))");
        assert_eq!(pool.display(v), "10");
    }

    #[test]
    fn length_rejects_improper_lists() {
        let mut pool = Pool::new();
        let one = pool.number(1.0);
        let two = pool.number(2.0);
        let dotted = pool.cons(one, two);
        let root = pool.root();
        let len = pool.env_lookup(root, "length").unwrap();
        let err = crate::eval::apply(&mut pool, len, &[dotted]).unwrap_err();
        assert!(err.message.contains("proper list"));
    }
}
