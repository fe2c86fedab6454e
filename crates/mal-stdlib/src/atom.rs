use mal_core::{call_callback, check_arity, MalError, Value};

use crate::{register_fn, register_fn_ctx};

fn get_atom(v: &Value) -> Result<&std::rc::Rc<std::cell::RefCell<Value>>, MalError> {
    v.as_atom()
        .ok_or_else(|| MalError::type_error("atom", v.type_name()))
}

pub fn register(env: &mal_core::Env) {
    register_fn(env, "atom", |args| {
        check_arity!(args, "atom", 1);
        Ok(Value::atom(args[0].clone()))
    });

    register_fn(env, "atom?", |args| {
        check_arity!(args, "atom?", 1);
        Ok(Value::Bool(matches!(&args[0], Value::Atom(_))))
    });

    register_fn(env, "deref", |args| {
        check_arity!(args, "deref", 1);
        Ok(get_atom(&args[0])?.borrow().clone())
    });

    register_fn(env, "reset!", |args| {
        check_arity!(args, "reset!", 2);
        let cell = get_atom(&args[0])?;
        *cell.borrow_mut() = args[1].clone();
        Ok(args[1].clone())
    });

    // (swap! a f x y) sets a to (f @a x y). The borrow is released before
    // calling f, which may itself read or reset the same atom.
    register_fn_ctx(env, "swap!", |ctx, env, args| {
        check_arity!(args, "swap!", 2..);
        let cell = get_atom(&args[0])?;
        let mut call_args = Vec::with_capacity(args.len() - 1);
        call_args.push(cell.borrow().clone());
        call_args.extend_from_slice(&args[2..]);
        let new_val = call_callback(ctx, &args[1], &call_args, env)?;
        *cell.borrow_mut() = new_val.clone();
        Ok(new_val)
    });
}
