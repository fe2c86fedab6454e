use mal_core::{check_arity, eval_callback, MalError};

use crate::{register_fn, register_fn_ctx};

pub fn register(env: &mal_core::Env) {
    // `eval` always runs in the root environment, whatever the caller's scope.
    register_fn_ctx(env, "eval", |ctx, env, args| {
        check_arity!(args, "eval", 1);
        eval_callback(ctx, &args[0], &env.root())
    });

    register_fn(env, "with-meta", |args| {
        check_arity!(args, "with-meta", 2);
        args[0].with_meta(args[1].clone())
    });

    register_fn(env, "meta", |args| {
        check_arity!(args, "meta", 1);
        Ok(args[0].meta())
    });

    register_fn_ctx(env, "throw", |_ctx, _env, args| {
        check_arity!(args, "throw", 1);
        tracing::debug!(value = %args[0], "throw");
        Err(MalError::UserException(args[0].clone()))
    });
}
