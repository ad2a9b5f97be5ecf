//! Control and side-effect builtins: `apply`, `display`, `displayln`, `print`,
//! `newline`, `error`, `exit`.

use crate::error::LispError;
use crate::eval;
use crate::pool::Pool;
use crate::value::ValueHandle;

fn apply_builtin(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [proc, list_handle] = args else {
        return Err(LispError::value("apply: expected 2 arguments"));
    };
    let call_args = pool.proper_list(*list_handle, "apply")?;
    eval::apply(pool, *proc, &call_args)
}

/// Prints with quotes/escapes preserved on strings; no trailing newline.
fn display(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a] = args else {
        return Err(LispError::value("display: expected 1 argument"));
    };
    print!("{}", pool.display(*a));
    Ok(pool.nil())
}

fn displayln(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let [a] = args else {
        return Err(LispError::value("displayln: expected 1 argument"));
    };
    println!("{}", pool.display(*a));
    Ok(pool.nil())
}

/// Variadic; arguments are space-separated and followed by a single newline.
fn print(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let rendered: Vec<String> = args.iter().map(|a| pool.display(*a)).collect();
    println!("{}", rendered.join(" "));
    Ok(pool.nil())
}

fn newline(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    if !args.is_empty() {
        return Err(LispError::value("newline: expected 0 arguments"));
    }
    println!();
    Ok(pool.nil())
}

fn exit_code(args: &[ValueHandle], pool: &Pool, name: &str) -> Result<i32, LispError> {
    match args {
        [] => Ok(0),
        [a] => {
            let n = pool
                .get(*a)
                .as_number()
                .ok_or_else(|| LispError::type_err_at(format!("{name}: expected a number"), pool.loc(*a)))?;
            Ok(n as i32)
        }
        _ => Err(LispError::value(format!("{name}: expected 0 or 1 arguments"))),
    }
}

fn error(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let code = match args {
        [] => 1,
        _ => exit_code(args, pool, "error")?,
    };
    std::process::exit(code);
}

fn exit(args: &[ValueHandle], pool: &mut Pool) -> Result<ValueHandle, LispError> {
    let code = exit_code(args, pool, "exit")?;
    std::process::exit(code);
}

pub fn register(pool: &mut Pool) {
    let root = pool.root();
    let mut install = |name: &'static str, func: fn(&[ValueHandle], &mut Pool) -> Result<ValueHandle, LispError>| {
        let b = pool.builtin(name, func);
        pool.env_define(root, name, b);
    };
    install("apply", apply_builtin);
    install("display", display);
    install("displayln", displayln);
    install("print", print);
    install("newline", newline);
    install("error", error);
    install("exit", exit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_one;

    #[test]
    fn apply_calls_a_procedure_with_a_list_of_arguments() {
        let mut pool = Pool::new();
        let root = pool.root();
        let expr = parse_one(&mut pool, "(apply + (list 1 2 3))", "test").unwrap();
        let v = eval::eval(&mut pool, root, expr).unwrap();
        assert_eq!(pool.display(v), "6");
    }

    #[test]
    fn display_returns_nil() {
        let mut pool = Pool::new();
        let n = pool.number(5.0);
        let v = display(&[n], &mut pool).unwrap();
        assert!(matches!(pool.get(v), crate::value::Value::Nil));
    }
}
