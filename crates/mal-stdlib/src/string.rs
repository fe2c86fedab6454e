use std::io::Write;

use mal_core::{check_arity, pr_str, MalError, Value};

use crate::register_fn;

fn join(args: &[Value], readably: bool, sep: &str) -> String {
    args.iter()
        .map(|v| pr_str(v, readably))
        .collect::<Vec<_>>()
        .join(sep)
}

pub fn register(env: &mal_core::Env) {
    register_fn(env, "pr-str", |args| Ok(Value::string(&join(args, true, " "))));

    register_fn(env, "str", |args| Ok(Value::string(&join(args, false, ""))));

    register_fn(env, "prn", |args| {
        println!("{}", join(args, true, " "));
        Ok(Value::Nil)
    });

    register_fn(env, "println", |args| {
        println!("{}", join(args, false, " "));
        Ok(Value::Nil)
    });

    register_fn(env, "print", |args| {
        print!("{}", join(args, false, " "));
        std::io::stdout()
            .flush()
            .map_err(|e| MalError::Io(format!("print: {e}")))?;
        Ok(Value::Nil)
    });

    register_fn(env, "read-string", |args| {
        check_arity!(args, "read-string", 1);
        let src = args[0]
            .as_str()
            .ok_or_else(|| MalError::type_error("string", args[0].type_name()))?;
        mal_reader::read(src)
    });

    register_fn(env, "slurp", |args| {
        check_arity!(args, "slurp", 1);
        let path = args[0]
            .as_str()
            .ok_or_else(|| MalError::type_error("string", args[0].type_name()))?;
        tracing::debug!(path, "slurp");
        let content = std::fs::read_to_string(path)
            .map_err(|e| MalError::Io(format!("slurp {path}: {e}")))?;
        Ok(Value::string(&content))
    });
}
