use mal_core::{MalError, Value};

use crate::register_fn;

fn num_cmp(args: &[Value], op: &str, f: impl Fn(f64, f64) -> bool) -> Result<Value, MalError> {
    if args.len() < 2 {
        return Err(MalError::arity(op, "2+", args.len()));
    }
    let to_f64 = |v: &Value| -> Result<f64, MalError> {
        v.as_number()
            .ok_or_else(|| MalError::type_error("number", v.type_name()))
    };
    for pair in args.windows(2) {
        let a = to_f64(&pair[0])?;
        let b = to_f64(&pair[1])?;
        if !f(a, b) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn equal(args: &[Value], op: &str) -> Result<Value, MalError> {
    if args.len() < 2 {
        return Err(MalError::arity(op, "2+", args.len()));
    }
    Ok(Value::Bool(args.windows(2).all(|pair| pair[0] == pair[1])))
}

pub fn register(env: &mal_core::Env) {
    register_fn(env, "<", |args| num_cmp(args, "<", |a, b| a < b));
    register_fn(env, ">", |args| num_cmp(args, ">", |a, b| a > b));
    register_fn(env, "<=", |args| num_cmp(args, "<=", |a, b| a <= b));
    register_fn(env, ">=", |args| num_cmp(args, ">=", |a, b| a >= b));

    register_fn(env, "=", |args| equal(args, "="));
    register_fn(env, "==", |args| equal(args, "=="));
}
