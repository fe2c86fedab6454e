//! mal: a small Lisp with closures, tail calls and macros.
//!
//! This module provides the embedding API for the interpreter.
//!
//! # Quick Start
//!
//! ```no_run
//! use mal::{Interpreter, Value};
//!
//! let interp = Interpreter::new();
//! let result = interp.eval_str("(+ 1 2)").unwrap();
//! assert_eq!(result, Value::Number(3.0));
//! ```

use std::rc::Rc;

pub use mal_core::{intern, pr_str, resolve, Env, MalError, NativeFn, Value};

/// Result of evaluating a mal expression.
pub type EvalResult = Result<Value>;

pub type Result<T> = std::result::Result<T, MalError>;

/// Builder for configuring and constructing an [`Interpreter`].
///
/// By default the builtins and the prelude are loaded and evaluation is unbounded.
pub struct InterpreterBuilder {
    stdlib: bool,
    prelude: bool,
    step_limit: usize,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            stdlib: true,
            prelude: true,
            step_limit: 0,
        }
    }

    /// Enable or disable the builtin functions (default: `true`).
    pub fn with_stdlib(mut self, enable: bool) -> Self {
        self.stdlib = enable;
        self
    }

    /// Enable or disable the prelude (`not`, `cond`; default: `true`).
    pub fn with_prelude(mut self, enable: bool) -> Self {
        self.prelude = enable;
        self
    }

    /// Cap the number of evaluation steps per top-level call. `0` means no limit.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn without_stdlib(self) -> Self {
        self.with_stdlib(false)
    }

    pub fn without_prelude(self) -> Self {
        self.with_prelude(false)
    }

    /// Build the [`Interpreter`] with the configured options.
    pub fn build(self) -> Interpreter {
        let inner = mal_eval::Interpreter::bare();

        if self.stdlib {
            mal_stdlib::register_stdlib(&inner.global_env);
        }

        if self.prelude {
            if let Err(e) = inner.load_prelude() {
                tracing::error!(error = %e, "prelude failed to load");
            }
        }

        // Set after the prelude so loading it never counts against the limit.
        inner.ctx.set_eval_step_limit(self.step_limit);
        tracing::debug!(
            stdlib = self.stdlib,
            prelude = self.prelude,
            step_limit = self.step_limit,
            "interpreter built"
        );

        Interpreter { inner }
    }
}

/// A mal interpreter instance.
///
/// Use [`InterpreterBuilder`] for fine-grained control, or call
/// [`Interpreter::new`] for a default interpreter.
pub struct Interpreter {
    inner: mal_eval::Interpreter,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Evaluate a single parsed [`Value`] expression.
    ///
    /// Definitions (`def!`) persist across calls.
    pub fn eval(&self, expr: &Value) -> EvalResult {
        self.inner.eval_in_global(expr)
    }

    /// Parse and evaluate a string containing zero or more expressions,
    /// returning the value of the last one.
    ///
    /// Definitions persist across calls, so you can define a function in one
    /// call and use it in the next.
    pub fn eval_str(&self, input: &str) -> EvalResult {
        self.inner.eval_str_in_global(input)
    }

    /// Read, evaluate and print: the result rendered readably.
    pub fn rep(&self, input: &str) -> Result<String> {
        self.eval_str(input).map(|v| pr_str(&v, true))
    }

    /// Register a native function that can be called from mal code.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mal::{Interpreter, MalError, Value};
    ///
    /// let interp = Interpreter::new();
    /// interp.register_fn("square", |args: &[Value]| match args {
    ///     [Value::Number(n)] => Ok(Value::Number(n * n)),
    ///     _ => Err(MalError::eval("square expects one number")),
    /// });
    /// ```
    pub fn register_fn<F>(&self, name: &str, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        let native = NativeFn::simple(name, f);
        self.inner
            .global_env
            .set_str(name, Value::NativeFn(Rc::new(native)));
    }

    /// Return a reference to the global environment.
    pub fn global_env(&self) -> &Rc<Env> {
        &self.inner.global_env
    }
}
