use std::cell::Cell;

use crate::{Env, MalError, Value};

/// Evaluate `expr` in `env`.
pub type EvalFn = fn(&EvalContext, &Value, &Env) -> Result<Value, MalError>;

/// Apply a callable value to already-evaluated arguments. The env is the
/// caller's, handed on to builtins so they can reach the root scope.
pub type CallFn = fn(&EvalContext, &Value, &[Value], &Env) -> Result<Value, MalError>;

/// Per-interpreter evaluation state shared between the evaluator and builtins.
///
/// Builtins that need to run mal code (`eval`, `swap!`, `apply`, `map`) go
/// through the callbacks registered here, since the builtin crates sit below
/// the evaluator in the dependency graph.
pub struct EvalContext {
    eval_fn: Cell<Option<EvalFn>>,
    call_fn: Cell<Option<CallFn>>,
    pub eval_step_limit: Cell<usize>,
    pub eval_steps: Cell<usize>,
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext {
            eval_fn: Cell::new(None),
            call_fn: Cell::new(None),
            eval_step_limit: Cell::new(0),
            eval_steps: Cell::new(0),
        }
    }

    /// Cap the number of trampoline steps per top-level evaluation. 0 disables the cap.
    pub fn set_eval_step_limit(&self, limit: usize) {
        self.eval_step_limit.set(limit);
    }

    pub fn reset_steps(&self) {
        self.eval_steps.set(0);
    }

    /// Count one evaluation step, failing once the limit is exceeded.
    pub fn tick(&self) -> Result<(), MalError> {
        let limit = self.eval_step_limit.get();
        if limit == 0 {
            return Ok(());
        }
        let steps = self.eval_steps.get() + 1;
        self.eval_steps.set(steps);
        if steps > limit {
            return Err(MalError::eval(format!(
                "evaluation step limit exceeded ({limit} steps)"
            )));
        }
        Ok(())
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn set_eval_callback(ctx: &EvalContext, f: EvalFn) {
    ctx.eval_fn.set(Some(f));
}

pub fn set_call_callback(ctx: &EvalContext, f: CallFn) {
    ctx.call_fn.set(Some(f));
}

pub fn eval_callback(ctx: &EvalContext, expr: &Value, env: &Env) -> Result<Value, MalError> {
    match ctx.eval_fn.get() {
        Some(f) => f(ctx, expr, env),
        None => Err(MalError::eval("no evaluator registered")),
    }
}

pub fn call_callback(
    ctx: &EvalContext,
    func: &Value,
    args: &[Value],
    env: &Env,
) -> Result<Value, MalError> {
    match ctx.call_fn.get() {
        Some(f) => f(ctx, func, args, env),
        None => Err(MalError::eval("no evaluator registered")),
    }
}
