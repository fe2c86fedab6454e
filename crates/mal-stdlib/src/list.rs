use mal_core::{call_callback, check_arity, MalError, Value};

use crate::{get_sequence, register_fn, register_fn_ctx};

fn index(v: &Value) -> Result<usize, MalError> {
    match v.as_number() {
        Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
        _ => Err(MalError::type_error("non-negative integer", v.type_name())),
    }
}

pub fn register(env: &mal_core::Env) {
    register_fn(env, "list", |args| Ok(Value::list(args.to_vec())));

    register_fn(env, "list?", |args| {
        check_arity!(args, "list?", 1);
        Ok(Value::Bool(matches!(&args[0], Value::List(_))))
    });

    register_fn(env, "vector", |args| Ok(Value::vector(args.to_vec())));

    register_fn(env, "vector?", |args| {
        check_arity!(args, "vector?", 1);
        Ok(Value::Bool(matches!(&args[0], Value::Vector(_))))
    });

    register_fn(env, "sequential?", |args| {
        check_arity!(args, "sequential?", 1);
        Ok(Value::Bool(args[0].as_seq().is_some()))
    });

    register_fn(env, "vec", |args| {
        check_arity!(args, "vec", 1);
        match &args[0] {
            v @ Value::Vector(_) => Ok(v.clone()),
            Value::List(items) => Ok(Value::Vector(items.clone())),
            Value::Nil => Ok(Value::vector(vec![])),
            other => Err(MalError::type_error("list or vector", other.type_name())),
        }
    });

    // Both build fresh lists; their inputs are shared, never modified.
    register_fn(env, "cons", |args| {
        check_arity!(args, "cons", 2);
        let tail = get_sequence(&args[1])?;
        let mut items = Vec::with_capacity(tail.len() + 1);
        items.push(args[0].clone());
        items.extend_from_slice(tail);
        Ok(Value::list(items))
    });

    register_fn(env, "concat", |args| {
        let mut items = Vec::new();
        for arg in args {
            items.extend_from_slice(get_sequence(arg)?);
        }
        Ok(Value::list(items))
    });

    register_fn(env, "count", |args| {
        check_arity!(args, "count", 1);
        let n = match &args[0] {
            Value::Nil => 0,
            Value::List(items) | Value::Vector(items) => items.len(),
            Value::HashMap(map) => map.len(),
            Value::String(s) => s.chars().count(),
            other => return Err(MalError::type_error("collection", other.type_name())),
        };
        Ok(Value::Number(n as f64))
    });

    register_fn(env, "empty?", |args| {
        check_arity!(args, "empty?", 1);
        match &args[0] {
            Value::Nil => Ok(Value::Bool(true)),
            Value::List(items) | Value::Vector(items) => Ok(Value::Bool(items.is_empty())),
            Value::HashMap(map) => Ok(Value::Bool(map.is_empty())),
            Value::String(s) => Ok(Value::Bool(s.is_empty())),
            other => Err(MalError::type_error("collection", other.type_name())),
        }
    });

    register_fn(env, "nth", |args| {
        check_arity!(args, "nth", 2);
        let items = get_sequence(&args[0])?;
        let i = index(&args[1])?;
        items.get(i).cloned().ok_or_else(|| {
            MalError::eval(format!("nth: index {i} out of range for length {}", items.len()))
        })
    });

    register_fn(env, "first", |args| {
        check_arity!(args, "first", 1);
        Ok(get_sequence(&args[0])?.first().cloned().unwrap_or(Value::Nil))
    });

    register_fn(env, "rest", |args| {
        check_arity!(args, "rest", 1);
        let items = get_sequence(&args[0])?;
        Ok(Value::list(items.get(1..).unwrap_or(&[]).to_vec()))
    });

    register_fn_ctx(env, "map", |ctx, env, args| {
        check_arity!(args, "map", 2);
        let items = get_sequence(&args[1])?;
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            result.push(call_callback(ctx, &args[0], std::slice::from_ref(item), env)?);
        }
        Ok(Value::list(result))
    });

    register_fn_ctx(env, "apply", |ctx, env, args| {
        check_arity!(args, "apply", 2..);
        let func = &args[0];
        // Last arg must be a sequence; anything between is prepended
        let last_items = get_sequence(&args[args.len() - 1])?;
        let mut all_args: Vec<Value> = args[1..args.len() - 1].to_vec();
        all_args.extend_from_slice(last_items);
        call_callback(ctx, func, &all_args, env)
    });
}
