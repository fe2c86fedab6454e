use mal_core::{check_arity, MalError, Value};

use crate::register_fn;

fn register_pred(env: &mal_core::Env, name: &'static str, f: fn(&Value) -> bool) {
    register_fn(env, name, move |args| {
        check_arity!(args, name, 1);
        Ok(Value::Bool(f(&args[0])))
    });
}

pub fn register(env: &mal_core::Env) {
    register_pred(env, "nil?", |v| matches!(v, Value::Nil));
    register_pred(env, "true?", |v| matches!(v, Value::Bool(true)));
    register_pred(env, "false?", |v| matches!(v, Value::Bool(false)));
    register_pred(env, "symbol?", |v| matches!(v, Value::Symbol(_)));
    register_pred(env, "keyword?", |v| matches!(v, Value::Keyword(_)));
    register_pred(env, "string?", |v| matches!(v, Value::String(_)));
    register_pred(env, "number?", |v| matches!(v, Value::Number(_)));
    register_pred(env, "fn?", Value::is_callable);
    register_pred(env, "macro?", |v| matches!(v, Value::Macro(_)));

    register_fn(env, "symbol", |args| {
        check_arity!(args, "symbol", 1);
        match &args[0] {
            Value::String(s) => Ok(Value::symbol(s)),
            sym @ Value::Symbol(_) => Ok(sym.clone()),
            other => Err(MalError::type_error("string", other.type_name())),
        }
    });

    register_fn(env, "keyword", |args| {
        check_arity!(args, "keyword", 1);
        match &args[0] {
            Value::String(s) => Ok(Value::keyword(s)),
            kw @ Value::Keyword(_) => Ok(kw.clone()),
            other => Err(MalError::type_error("string", other.type_name())),
        }
    });
}
