use std::rc::Rc;

use mal_core::{
    set_call_callback, set_eval_callback, suggest_similar, Env, EvalContext, Lambda, MalError,
    Spur, Value,
};

use crate::special_forms;

/// Trampoline for tail-call optimization.
pub enum Trampoline {
    Value(Value),
    Eval(Value, Env),
}

pub type EvalResult = Result<Value, MalError>;

/// The interpreter holds the global environment and state.
pub struct Interpreter {
    pub global_env: Rc<Env>,
    pub ctx: EvalContext,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with the builtin table and the prelude loaded.
    pub fn new() -> Self {
        let interp = Self::bare();
        mal_stdlib::register_stdlib(&interp.global_env);
        // The prelude is fixed source; failing to load it is a bug.
        if let Err(e) = interp.load_prelude() {
            tracing::error!(error = %e, "prelude failed to load");
        }
        interp
    }

    /// An interpreter with an empty global environment and the evaluator
    /// callbacks registered, so builtins added later can call back in.
    pub fn bare() -> Self {
        let ctx = EvalContext::new();
        set_eval_callback(&ctx, eval_value);
        set_call_callback(&ctx, call_value);
        Interpreter {
            global_env: Rc::new(Env::new()),
            ctx,
        }
    }

    pub fn load_prelude(&self) -> EvalResult {
        self.eval_str_in_global(crate::prelude::PRELUDE)
    }

    /// Evaluate directly in the global env, so definitions persist.
    pub fn eval_in_global(&self, expr: &Value) -> EvalResult {
        self.ctx.reset_steps();
        eval_value(&self.ctx, expr, &self.global_env)
    }

    /// Read and evaluate every form in `input` in the global env, returning
    /// the value of the last one (or nil for empty input).
    pub fn eval_str_in_global(&self, input: &str) -> EvalResult {
        self.ctx.reset_steps();
        eval_string(&self.ctx, input, &self.global_env)
    }
}

/// Evaluate a string containing one or more expressions.
pub fn eval_string(ctx: &EvalContext, input: &str, env: &Env) -> EvalResult {
    let exprs = mal_reader::read_many(input)?;
    let mut result = Value::Nil;
    for expr in &exprs {
        result = eval_value(ctx, expr, env)?;
    }
    Ok(result)
}

/// Evaluate with trampoline for TCO.
pub fn eval_value(ctx: &EvalContext, expr: &Value, env: &Env) -> EvalResult {
    let mut current_expr = expr.clone();
    let mut current_env = env.clone();

    loop {
        ctx.tick()?;
        match eval_step(ctx, &current_expr, &current_env)? {
            Trampoline::Value(v) => return Ok(v),
            Trampoline::Eval(next_expr, next_env) => {
                current_expr = next_expr;
                current_env = next_env;
            }
        }
    }
}

fn eval_step(ctx: &EvalContext, expr: &Value, env: &Env) -> Result<Trampoline, MalError> {
    let items = match expr {
        Value::List(items) if !items.is_empty() => items,
        // The empty list evaluates to itself.
        Value::List(_) => return Ok(Trampoline::Value(expr.clone())),
        other => return eval_ast(ctx, other, env).map(Trampoline::Value),
    };

    let head = &items[0];
    let args = &items[1..];

    if let Value::Symbol(name) = head {
        // Macro calls expand in place; the expansion is evaluated next turn
        // of the loop, which also expands it again if it is another macro call.
        if let Some(mac) = find_macro(*name, env) {
            let expanded = apply_macro(ctx, &mac, args)?;
            tracing::trace!(from = %expr, to = %expanded, "macro expansion");
            return Ok(Trampoline::Eval(expanded, env.clone()));
        }
        if let Some(result) = special_forms::try_eval_special(ctx, *name, args, env) {
            return result;
        }
    }

    let func = eval_value(ctx, head, env)?;
    let mut eval_args = Vec::with_capacity(args.len());
    for arg in args {
        eval_args.push(eval_value(ctx, arg, env)?);
    }

    match &func {
        Value::NativeFn(native) => (native.func)(ctx, env, &eval_args).map(Trampoline::Value),
        Value::Lambda(lambda) => {
            let call_env = Env::bind(&lambda.env, &lambda.params, lambda.rest_param, &eval_args)?;
            Ok(Trampoline::Eval(lambda.body.clone(), call_env))
        }
        other => Err(MalError::type_error("function", other.type_name())),
    }
}

/// Evaluate a form that is not a non-empty list: symbols are looked up,
/// collections evaluate their elements, everything else evaluates to itself.
fn eval_ast(ctx: &EvalContext, expr: &Value, env: &Env) -> EvalResult {
    match expr {
        Value::Symbol(name) => lookup(*name, env),
        Value::List(items) => Ok(Value::list(eval_all(ctx, items, env)?)),
        Value::Vector(items) => Ok(Value::vector(eval_all(ctx, items, env)?)),
        Value::HashMap(map) => {
            let mut result = hashbrown::HashMap::with_capacity(map.len());
            for (k, v) in map.iter() {
                result.insert(k.clone(), eval_value(ctx, v, env)?);
            }
            Ok(Value::HashMap(Rc::new(result)))
        }
        other => Ok(other.clone()),
    }
}

fn eval_all(ctx: &EvalContext, items: &[Value], env: &Env) -> Result<Vec<Value>, MalError> {
    items.iter().map(|item| eval_value(ctx, item, env)).collect()
}

fn lookup(name: Spur, env: &Env) -> EvalResult {
    env.get(name).map_err(|err| {
        let missing = mal_core::resolve(name);
        match suggest_similar(&missing, &env.visible_names()) {
            Some(close) => err.with_hint(format!("did you mean '{close}'?")),
            None => err,
        }
    })
}

/// The macro `name` is bound to, if any.
fn find_macro(name: Spur, env: &Env) -> Option<Rc<Lambda>> {
    match env.find(name) {
        Some(Value::Macro(mac)) => Some(mac),
        _ => None,
    }
}

/// Apply a callable to already-evaluated arguments.
///
/// This is the entry point builtins such as `map`, `apply` and `swap!` use.
/// A builtin callee sees `env`, the caller's environment. Closure bodies run
/// in their own trampoline, so only the call itself nests.
pub fn call_value(ctx: &EvalContext, func: &Value, args: &[Value], env: &Env) -> EvalResult {
    match func {
        Value::NativeFn(native) => (native.func)(ctx, env, args),
        Value::Lambda(lambda) => {
            let call_env = Env::bind(&lambda.env, &lambda.params, lambda.rest_param, args)?;
            eval_value(ctx, &lambda.body, &call_env)
        }
        other => Err(MalError::type_error("function", other.type_name())),
    }
}

/// Apply a macro: bind the unevaluated argument forms, evaluate the body to
/// produce the expansion.
pub fn apply_macro(ctx: &EvalContext, mac: &Lambda, args: &[Value]) -> EvalResult {
    let env = Env::bind(&mac.env, &mac.params, mac.rest_param, args)?;
    eval_value(ctx, &mac.body, &env)
}

/// Expand `form` until its head is no longer a macro, without evaluating the result.
pub fn macroexpand(ctx: &EvalContext, form: &Value, env: &Env) -> EvalResult {
    let mut form = form.clone();
    loop {
        let mac = match form.as_list() {
            Some([Value::Symbol(head), ..]) => find_macro(*head, env),
            _ => None,
        };
        match mac {
            Some(mac) => {
                let args = form.as_list().map(|items| items[1..].to_vec()).unwrap_or_default();
                form = apply_macro(ctx, &mac, &args)?;
            }
            None => return Ok(form),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(interp: &Interpreter, src: &str) -> Value {
        interp
            .eval_str_in_global(src)
            .unwrap_or_else(|e| panic!("{src} failed: {e}"))
    }

    #[test]
    fn test_self_evaluating() {
        let interp = Interpreter::new();
        assert_eq!(eval(&interp, "42"), Value::Number(42.0));
        assert_eq!(eval(&interp, "\"s\""), Value::string("s"));
        assert_eq!(eval(&interp, ":k"), Value::keyword("k"));
        assert_eq!(eval(&interp, "nil"), Value::Nil);
        assert_eq!(eval(&interp, "()"), Value::list(vec![]));
    }

    #[test]
    fn test_collections_evaluate_elements() {
        let interp = Interpreter::new();
        assert_eq!(
            eval(&interp, "[1 (+ 1 1)]"),
            Value::vector(vec![Value::Number(1.0), Value::Number(2.0)])
        );
        let m = eval(&interp, "{:a (+ 1 2)}");
        let Value::HashMap(map) = m else {
            panic!("expected a hash-map")
        };
        assert_eq!(map.get(&Value::keyword("a")), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_apply_closure() {
        let interp = Interpreter::new();
        assert_eq!(eval(&interp, "((fn* (a b) (+ a b)) 2 3)"), Value::Number(5.0));
        assert_eq!(
            eval(&interp, "((fn* (a & more) more) 1 2 3)"),
            Value::list(vec![Value::Number(2.0), Value::Number(3.0)])
        );
    }

    #[test]
    fn test_closure_arity_errors() {
        let interp = Interpreter::new();
        let err = interp.eval_str_in_global("((fn* (a) a))").unwrap_err();
        assert!(matches!(err, MalError::Arity { .. }));
        let err = interp.eval_str_in_global("((fn* (a b & c) a) 1)").unwrap_err();
        assert!(matches!(err, MalError::Arity { .. }));
    }

    #[test]
    fn test_surplus_args_are_ignored() {
        let interp = Interpreter::new();
        assert_eq!(eval(&interp, "((fn* (a) a) 1 2)"), Value::Number(1.0));
        assert_eq!(eval(&interp, "((fn* () 7) 1 2 3)"), Value::Number(7.0));
    }

    #[test]
    fn test_not_a_function() {
        let interp = Interpreter::new();
        let err = interp.eval_str_in_global("(1 2 3)").unwrap_err();
        assert!(matches!(err, MalError::Type { .. }));
    }

    #[test]
    fn test_unbound_symbol_hint() {
        let interp = Interpreter::new();
        let err = interp.eval_str_in_global("(coun (list 1))").unwrap_err();
        assert!(matches!(err.inner(), MalError::Unbound(name) if name == "coun"));
        assert_eq!(err.hint(), Some("did you mean 'count'?"));
    }

    #[test]
    fn test_deep_tail_recursion() {
        let interp = Interpreter::new();
        eval(
            &interp,
            "(def! count-down (fn* (n acc) (if (= n 0) acc (count-down (- n 1) (+ acc 1)))))",
        );
        assert_eq!(eval(&interp, "(count-down 100000 0)"), Value::Number(100000.0));
    }

    #[test]
    fn test_callbacks_reach_closures() {
        let interp = Interpreter::new();
        assert_eq!(
            eval(&interp, "(map (fn* (x) (* x x)) [1 2 3])"),
            Value::list(vec![
                Value::Number(1.0),
                Value::Number(4.0),
                Value::Number(9.0)
            ])
        );
        assert_eq!(eval(&interp, "(apply + 1 2 (list 3 4))"), Value::Number(10.0));
        assert_eq!(
            eval(&interp, "(let* (a (atom 1)) (do (swap! a + 10) @a))"),
            Value::Number(11.0)
        );
        assert_eq!(eval(&interp, "(eval (list + 1 2))"), Value::Number(3.0));
    }

    #[test]
    fn test_builtins_called_from_builtins_see_the_root_env() {
        let interp = Interpreter::new();
        assert_eq!(eval(&interp, "(apply eval (list '(+ 1 2)))"), Value::Number(3.0));
        assert_eq!(
            eval(&interp, "(map eval (list '(+ 1 2) '(* 2 3)))"),
            Value::list(vec![Value::Number(3.0), Value::Number(6.0)])
        );
        assert_eq!(
            eval(&interp, "(let* (a (atom '(+ 4 5))) (swap! a eval))"),
            Value::Number(9.0)
        );
    }

    #[test]
    fn test_eval_uses_root_env() {
        let interp = Interpreter::new();
        eval(&interp, "(def! x 1)");
        assert_eq!(eval(&interp, "(let* (x 2) (eval 'x))"), Value::Number(1.0));
    }

    #[test]
    fn test_step_limit() {
        let interp = Interpreter::new();
        eval(&interp, "(def! spin (fn* (n) (spin (+ n 1))))");
        interp.ctx.set_eval_step_limit(10_000);
        let err = interp.eval_str_in_global("(spin 0)").unwrap_err();
        assert!(err.to_string().contains("step limit"));
        // The counter starts over for each top-level evaluation.
        assert_eq!(eval(&interp, "(+ 1 2)"), Value::Number(3.0));
    }

    #[test]
    fn test_bare_interpreter_has_no_builtins() {
        let interp = Interpreter::bare();
        let err = interp.eval_str_in_global("(+ 1 2)").unwrap_err();
        assert!(matches!(err.inner(), MalError::Unbound(_)));
    }
}
