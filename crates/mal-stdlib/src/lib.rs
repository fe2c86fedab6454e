#![allow(clippy::mutable_key_type)]
mod arithmetic;
mod atom;
mod comparison;
mod list;
mod map;
mod meta;
mod predicates;
mod string;

use mal_core::{EvalContext, Env, MalError, NativeFn, Value};

/// Install every builtin into `env` (normally the root environment).
pub fn register_stdlib(env: &Env) {
    arithmetic::register(env);
    comparison::register(env);
    list::register(env);
    map::register(env);
    predicates::register(env);
    string::register(env);
    atom::register(env);
    meta::register(env);
}

fn register_fn(
    env: &Env,
    name: &str,
    f: impl Fn(&[Value]) -> Result<Value, MalError> + 'static,
) {
    env.set(
        mal_core::intern(name),
        Value::native_fn(NativeFn::simple(name, f)),
    );
}

/// Register a builtin that needs the evaluation context, for calling back into
/// the evaluator, or the caller's environment.
fn register_fn_ctx(
    env: &Env,
    name: &str,
    f: impl Fn(&EvalContext, &Env, &[Value]) -> Result<Value, MalError> + 'static,
) {
    env.set(
        mal_core::intern(name),
        Value::native_fn(NativeFn::with_ctx(name, f)),
    );
}

/// Borrow a list or vector argument, or fail with a type error.
fn get_sequence(v: &Value) -> Result<&[Value], MalError> {
    match v {
        Value::List(items) | Value::Vector(items) => Ok(items),
        Value::Nil => Ok(&[]),
        other => Err(MalError::type_error("list or vector", other.type_name())),
    }
}
