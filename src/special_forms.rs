// ABOUTME: The fixed registry of special forms — operators whose operands are not
// evaluated before the operator runs.

use crate::error::LispError;
use crate::eval::eval;
use crate::loader::require;
use crate::pool::Pool;
use crate::value::{EnvHandle, Value, ValueHandle};

pub type SpecialFormFn = fn(&[ValueHandle], EnvHandle, &mut Pool) -> Result<ValueHandle, LispError>;

/// Look up a special form by name. Returns `None` for anything not in the fixed set —
/// callers fall back to evaluating the head as an ordinary procedure.
pub fn lookup(name: &str) -> Option<SpecialFormFn> {
    match name {
        "define" => Some(define_form),
        "quote" => Some(quote_form),
        "if" => Some(if_form),
        "and" => Some(and_form),
        "or" => Some(or_form),
        "lambda" => Some(lambda_form),
        "eval" => Some(eval_form),
        "cond" => Some(cond_form),
        "begin" => Some(begin_form),
        "let" => Some(let_form),
        "quasiquote" => Some(quasiquote_form),
        "require" => Some(require_form),
        _ => None,
    }
}

fn loc_of(pool: &Pool, operands: &[ValueHandle]) -> Option<crate::location::SourceLoc> {
    let locs: Vec<_> = operands.iter().map(|h| pool.loc(*h)).collect();
    crate::location::SourceLoc::from_range(&locs)
}

/// `(define sym expr)` or `(define (fname p1 ... pn) body...)`.
fn define_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.is_empty() {
        return Err(LispError::value_at(
            "define: expected at least 1 argument",
            loc_of(pool, operands),
        ));
    }
    match pool.get(operands[0]).clone() {
        Value::Symbol(name) => {
            if operands.len() != 2 {
                return Err(LispError::value_at(
                    "define: expected 2 arguments",
                    loc_of(pool, operands),
                ));
            }
            let value = eval(pool, env, operands[1])?;
            pool.env_define(env, name, value);
        }
        Value::Pair { .. } => {
            let parts = pool.pair_to_vector(operands[0]);
            let (fname_handle, params_handle) = (parts[0], {
                // parts[1..] form the dotted remainder; rebuild the parameter pair chain
                // by re-consing everything after the function name.
                let rest = &parts[1..];
                rebuild_list(pool, rest)
            });
            let fname = pool
                .get(fname_handle)
                .as_symbol_name()
                .map(|s| s.to_string())
                .ok_or_else(|| LispError::value_at("define: expected a symbol in function position", loc_of(pool, operands)))?;
            let mut lambda_operands = vec![params_handle];
            lambda_operands.extend_from_slice(&operands[1..]);
            let lambda = lambda_form(&lambda_operands, env, pool)?;
            pool.env_define(env, fname, lambda);
        }
        Value::Nil => {
            return Err(LispError::value_at(
                "define: expected a symbol or a pair as the first argument",
                loc_of(pool, operands),
            ));
        }
        _ => {
            return Err(LispError::value_at(
                "define: first argument must be a symbol",
                loc_of(pool, operands),
            ));
        }
    }
    Ok(pool.nil())
}

/// `(h1 h2 ... hn)` -> the proper list built from those elements (last item is
/// usually the trailing nil/dotted cdr of a sub-range already-exploded pair chain).
fn rebuild_list(pool: &mut Pool, handles: &[ValueHandle]) -> ValueHandle {
    if handles.is_empty() {
        return pool.nil();
    }
    // `handles` came from `pair_to_vector`, so its last element is the terminal cdr
    // (nil for a proper parameter list). Reconstruct by consing everything but that
    // terminal cdr back onto it.
    let (last, init) = handles.split_last().unwrap();
    let mut tail = *last;
    for h in init.iter().rev() {
        tail = pool.cons(*h, tail);
    }
    tail
}

fn quote_form(operands: &[ValueHandle], _env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.len() != 1 {
        return Err(LispError::value_at(
            "quote: expected 1 argument",
            loc_of(pool, operands),
        ));
    }
    Ok(operands[0])
}

fn if_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.len() != 3 {
        return Err(LispError::value_at(
            "if: expected 3 arguments",
            loc_of(pool, operands),
        ));
    }
    let cond = eval(pool, env, operands[0])?;
    if pool.get(cond).is_truthy() {
        eval(pool, env, operands[1])
    } else {
        eval(pool, env, operands[2])
    }
}

fn and_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.is_empty() {
        return Ok(pool.bool_value(true));
    }
    let mut last = pool.nil();
    for op in operands {
        last = eval(pool, env, *op)?;
        if !pool.get(last).is_truthy() {
            return Ok(pool.bool_value(false));
        }
    }
    Ok(last)
}

fn or_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    for op in operands {
        let value = eval(pool, env, *op)?;
        if pool.get(value).is_truthy() {
            return Ok(value);
        }
    }
    Ok(pool.bool_value(false))
}

/// `(lambda (p1 ... pn) body...)`. `()` denotes no parameters.
pub(crate) fn lambda_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.is_empty() {
        return Err(LispError::value_at(
            "lambda: expected at least 1 argument",
            loc_of(pool, operands),
        ));
    }
    if operands.len() < 2 {
        return Err(LispError::value_at(
            "lambda: body must be a non-empty sequence of expressions",
            loc_of(pool, operands),
        ));
    }
    let params_vec = pool.proper_list(operands[0], "lambda")?;
    let mut params = Vec::with_capacity(params_vec.len());
    for p in params_vec {
        match pool.get(p).as_symbol_name() {
            Some(name) => params.push(name.to_string()),
            None => {
                return Err(LispError::value_at(
                    "lambda: expected a list of symbols as parameters",
                    loc_of(pool, operands),
                ))
            }
        }
    }
    let body = operands[1..].to_vec();
    Ok(pool.make_value(Value::Lambda { params, body, env }))
}

/// `(eval x)` evaluates `x` twice: once to produce a value, then evaluates that value.
fn eval_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.len() != 1 {
        return Err(LispError::value_at(
            "eval: expected 1 argument",
            loc_of(pool, operands),
        ));
    }
    let once = eval(pool, env, operands[0])?;
    eval(pool, env, once)
}

fn cond_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.is_empty() {
        return Err(LispError::value_at(
            "cond: expected at least 1 clause",
            loc_of(pool, operands),
        ));
    }
    let n = operands.len();
    for (i, clause) in operands.iter().enumerate() {
        let clause_vec = pool.proper_list(*clause, "cond")?;
        if clause_vec.is_empty() {
            return Err(LispError::value_at("cond: empty clause", pool.loc(*clause)));
        }
        let is_else = i == n - 1 && pool.get(clause_vec[0]).as_symbol_name() == Some("else");
        let test_value = if is_else {
            pool.bool_value(true)
        } else {
            eval(pool, env, clause_vec[0])?
        };
        if pool.get(test_value).is_truthy() {
            if clause_vec.len() == 1 {
                return Ok(test_value);
            }
            let mut result = test_value;
            for expr in &clause_vec[1..] {
                result = eval(pool, env, *expr)?;
            }
            return Ok(result);
        }
    }
    Ok(pool.nil())
}

fn begin_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.is_empty() {
        return Ok(pool.nil());
    }
    let mut result = pool.nil();
    for op in operands {
        result = eval(pool, env, *op)?;
    }
    Ok(result)
}

/// `((name expr)...) body...`: every `expr` evaluates in the enclosing environment,
/// then a child environment holds the bindings for evaluating `body...` (non-recursive
/// scoping — a binding cannot refer to a sibling binding's new value).
fn let_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.is_empty() {
        return Err(LispError::value_at(
            "let: expected at least 1 argument",
            loc_of(pool, operands),
        ));
    }
    let bindings_vec = pool.proper_list(operands[0], "let")?;
    let mut names = Vec::with_capacity(bindings_vec.len());
    let mut values = Vec::with_capacity(bindings_vec.len());
    for binding in bindings_vec {
        let pair = pool.proper_list(binding, "let")?;
        if pair.len() != 2 {
            return Err(LispError::value_at(
                "let: expected (name expr) bindings",
                pool.loc(binding),
            ));
        }
        let name = pool
            .get(pair[0])
            .as_symbol_name()
            .map(|s| s.to_string())
            .ok_or_else(|| LispError::value_at("let: expected a symbol as binding name", pool.loc(pair[0])))?;
        let value = eval(pool, env, pair[1])?;
        names.push(name);
        values.push(value);
    }

    let child = pool.make_env(Some(env));
    for (name, value) in names.into_iter().zip(values.into_iter()) {
        pool.env_define(child, name, value);
    }

    let mut result = pool.nil();
    for body_expr in &operands[1..] {
        result = eval(pool, child, *body_expr)?;
    }
    Ok(result)
}

/// `` `(...) ``: replace each `(unquote x)` element with `env.eval(x)`; keep everything
/// else verbatim. Nested quasiquote is not required.
fn quasiquote_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.len() != 1 {
        return Err(LispError::value_at(
            "quasiquote: expected 1 argument",
            loc_of(pool, operands),
        ));
    }
    quasiquote_walk(operands[0], env, pool)
}

fn quasiquote_walk(expr: ValueHandle, env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let items = pool.pair_to_vector(expr);
    let (last, elems) = match items.split_last() {
        Some(pair) => pair,
        None => return Ok(expr),
    };
    if !matches!(pool.get(*last), Value::Nil) {
        // Not a proper list (e.g. an atom or dotted pair) — return unchanged.
        return Ok(expr);
    }
    if elems.is_empty() {
        return Ok(expr);
    }
    let mut result = Vec::with_capacity(elems.len());
    for elem in elems {
        if let Value::Pair { car, cdr } = pool.get(*elem).clone() {
            if pool.get(car).as_symbol_name() == Some("unquote") {
                let rest = pool.pair_to_vector(cdr);
                if rest.len() != 2 || !matches!(pool.get(rest[1]), Value::Nil) {
                    return Err(LispError::value_at("quasiquote: malformed unquote", pool.loc(*elem)));
                }
                result.push(eval(pool, env, rest[0])?);
                continue;
            }
        }
        result.push(*elem);
    }
    Ok(pool.list_from_vec(result))
}

fn require_form(operands: &[ValueHandle], env: EnvHandle, pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if operands.len() != 1 {
        return Err(LispError::value_at(
            "require: expected 1 argument",
            loc_of(pool, operands),
        ));
    }
    let name = match pool.get(operands[0]) {
        Value::String(s) => s.clone(),
        _ => {
            return Err(LispError::type_err_at(
                "require: expected a string module name",
                pool.loc(operands[0]),
            ))
        }
    };
    require(pool, env, &name)?;
    Ok(pool.nil())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::eval;
    use crate::parser::parse_one;

    fn eval_src(pool: &mut Pool, env: EnvHandle, src: &str) -> ValueHandle {
        let expr = parse_one(pool, src, "test").unwrap();
        eval(pool, env, expr).unwrap()
    }

    #[test]
    fn if_picks_the_right_branch() {
        let mut pool = Pool::new();
        let root = pool.root();
        let v = eval_src(&mut pool, root, "(if (= 1 1) 'yes 'no)");
        assert_eq!(pool.display(v), "yes");
    }

    #[test]
    fn let_does_not_leak_bindings() {
        let mut pool = Pool::new();
        let root = pool.root();
        let v = eval_src(&mut pool, root, "(let ((x 1) (y 2)) (+ x y))");
        assert_eq!(pool.display(v), "3");
        assert!(pool.env_lookup(root, "x").is_none());
    }

    #[test]
    fn cond_selects_first_truthy_clause() {
        let mut pool = Pool::new();
        let root = pool.root();
        let v = eval_src(
            &mut pool,
            root,
            "(cond ((= 1 2) 'a) ((= 2 2) 'b) (else 'c))",
        );
        assert_eq!(pool.display(v), "b");
    }

    #[test]
    fn and_or_short_circuit() {
        let mut pool = Pool::new();
        let root = pool.root();
        assert_eq!(pool.display(eval_src(&mut pool, root, "(and)")), "#t");
        assert_eq!(pool.display(eval_src(&mut pool, root, "(or)")), "#f");
        assert_eq!(pool.display(eval_src(&mut pool, root, "(and 1 2 3)")), "3");
        assert_eq!(pool.display(eval_src(&mut pool, root, "(or #f #f 5)")), "5");
    }

    #[test]
    fn quasiquote_splices_unquote() {
        let mut pool = Pool::new();
        let root = pool.root();
        let v = eval_src(&mut pool, root, "`(1 ,(+ 1 1) 3)");
        assert_eq!(pool.display(v), "(1 2 3)");
    }

    #[test]
    fn define_does_not_let_user_redefine_special_form_name() {
        let mut pool = Pool::new();
        let root = pool.root();
        eval_src(&mut pool, root, "(define if +)");
        // `if` the special form still wins over the user binding.
        let v = eval_src(&mut pool, root, "(if #t 'yes 'no)");
        assert_eq!(pool.display(v), "yes");
        // But a non-symbol head is evaluated first, so this calls the rebound `if`.
        let v2 = eval_src(&mut pool, root, "((if #t + *) 1 2)");
        assert_eq!(pool.display(v2), "3");
    }
}
