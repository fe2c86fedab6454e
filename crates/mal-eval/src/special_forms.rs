use std::cell::Cell;
use std::rc::Rc;

use mal_core::{
    check_arity, intern, split_params, Env, EvalContext, Lambda, MalError, Spur, Value,
};

use crate::eval::{self, Trampoline};

/// Pre-interned `Spur` handles for the special form names.
///
/// Every list whose head is a symbol checks these, so the names are compared
/// as integers rather than resolved back to strings.
struct SpecialFormSpurs {
    catch_star: Spur,
    def: Spur,
    defmacro: Spur,
    do_: Spur,
    fn_star: Spur,
    if_: Spur,
    let_star: Spur,
    macroexpand: Spur,
    quasiquote: Spur,
    quasiquoteexpand: Spur,
    quote: Spur,
    splice_unquote: Spur,
    try_star: Spur,
    unquote: Spur,
}

impl SpecialFormSpurs {
    fn init() -> Self {
        Self {
            catch_star: intern("catch*"),
            def: intern("def!"),
            defmacro: intern("defmacro!"),
            do_: intern("do"),
            fn_star: intern("fn*"),
            if_: intern("if"),
            let_star: intern("let*"),
            macroexpand: intern("macroexpand"),
            quasiquote: intern("quasiquote"),
            quasiquoteexpand: intern("quasiquoteexpand"),
            quote: intern("quote"),
            splice_unquote: intern("splice-unquote"),
            try_star: intern("try*"),
            unquote: intern("unquote"),
        }
    }
}

thread_local! {
    static SF: Cell<Option<&'static SpecialFormSpurs>> = const { Cell::new(None) };
}

fn special_forms() -> &'static SpecialFormSpurs {
    SF.with(|cell| match cell.get() {
        Some(sf) => sf,
        None => {
            let sf: &'static SpecialFormSpurs = Box::leak(Box::new(SpecialFormSpurs::init()));
            cell.set(Some(sf));
            sf
        }
    })
}

/// Every special form name the evaluator recognizes.
pub const SPECIAL_FORM_NAMES: &[&str] = &[
    "def!",
    "defmacro!",
    "do",
    "fn*",
    "if",
    "let*",
    "macroexpand",
    "quasiquote",
    "quasiquoteexpand",
    "quote",
    "try*",
];

/// Evaluate a special form. Returns Some(result) if the head is a special form, None otherwise.
pub fn try_eval_special(
    ctx: &EvalContext,
    head_spur: Spur,
    args: &[Value],
    env: &Env,
) -> Option<Result<Trampoline, MalError>> {
    let sf = special_forms();

    if head_spur == sf.if_ {
        Some(eval_if(ctx, args, env))
    } else if head_spur == sf.def {
        Some(eval_def(ctx, args, env))
    } else if head_spur == sf.let_star {
        Some(eval_let_star(ctx, args, env))
    } else if head_spur == sf.do_ {
        Some(eval_do(ctx, args, env))
    } else if head_spur == sf.fn_star {
        Some(eval_fn(args, env))
    } else if head_spur == sf.quote {
        Some(eval_quote(args))
    } else if head_spur == sf.quasiquote {
        Some(eval_quasiquote(args, env))
    } else if head_spur == sf.quasiquoteexpand {
        Some(eval_quasiquoteexpand(args))
    } else if head_spur == sf.defmacro {
        Some(eval_defmacro(ctx, args, env))
    } else if head_spur == sf.macroexpand {
        Some(eval_macroexpand(ctx, args, env))
    } else if head_spur == sf.try_star {
        Some(eval_try(ctx, args, env))
    } else {
        None
    }
}

fn symbol_arg(v: &Value, form: &str) -> Result<Spur, MalError> {
    v.as_symbol_spur()
        .ok_or_else(|| MalError::type_error(format!("symbol in {form}"), v.type_name()))
}

fn eval_quote(args: &[Value]) -> Result<Trampoline, MalError> {
    check_arity!(args, "quote", 1);
    Ok(Trampoline::Value(args[0].clone()))
}

fn eval_if(ctx: &EvalContext, args: &[Value], env: &Env) -> Result<Trampoline, MalError> {
    check_arity!(args, "if", 2..=3);
    let cond = eval::eval_value(ctx, &args[0], env)?;
    if cond.is_truthy() {
        Ok(Trampoline::Eval(args[1].clone(), env.clone()))
    } else if args.len() == 3 {
        Ok(Trampoline::Eval(args[2].clone(), env.clone()))
    } else {
        Ok(Trampoline::Value(Value::Nil))
    }
}

/// (def! name expr)
fn eval_def(ctx: &EvalContext, args: &[Value], env: &Env) -> Result<Trampoline, MalError> {
    check_arity!(args, "def!", 2);
    let name = symbol_arg(&args[0], "def!")?;
    let val = eval::eval_value(ctx, &args[1], env)?;
    tracing::debug!(name = %args[0], "def!");
    env.set(name, val.clone());
    Ok(Trampoline::Value(val))
}

/// (let* (name expr ...) body)
///
/// Each expression sees the names bound before it.
fn eval_let_star(ctx: &EvalContext, args: &[Value], env: &Env) -> Result<Trampoline, MalError> {
    check_arity!(args, "let*", 2);
    let bindings = args[0]
        .as_seq()
        .ok_or_else(|| MalError::type_error("list or vector of bindings", args[0].type_name()))?;
    if bindings.len() % 2 != 0 {
        return Err(MalError::arity(
            "let* bindings",
            "an even number of",
            bindings.len(),
        ));
    }

    let new_env = Env::with_parent(Rc::new(env.clone()));
    for pair in bindings.chunks(2) {
        let name = symbol_arg(&pair[0], "let*")?;
        let val = eval::eval_value(ctx, &pair[1], &new_env)?;
        new_env.set(name, val);
    }
    Ok(Trampoline::Eval(args[1].clone(), new_env))
}

fn eval_do(ctx: &EvalContext, args: &[Value], env: &Env) -> Result<Trampoline, MalError> {
    let Some((last, init)) = args.split_last() else {
        return Ok(Trampoline::Value(Value::Nil));
    };
    for expr in init {
        eval::eval_value(ctx, expr, env)?;
    }
    Ok(Trampoline::Eval(last.clone(), env.clone()))
}

/// (fn* (params ...) body)
fn eval_fn(args: &[Value], env: &Env) -> Result<Trampoline, MalError> {
    check_arity!(args, "fn*", 2);
    let param_list = args[0]
        .as_seq()
        .ok_or_else(|| MalError::type_error("list or vector of parameters", args[0].type_name()))?;
    let param_names: Vec<Spur> = param_list
        .iter()
        .map(|v| symbol_arg(v, "fn* parameters"))
        .collect::<Result<_, _>>()?;
    let (params, rest_param) = split_params(&param_names)?;
    tracing::trace!(params = params.len(), variadic = rest_param.is_some(), "fn*");
    Ok(Trampoline::Value(Value::Lambda(Rc::new(Lambda {
        params,
        rest_param,
        body: args[1].clone(),
        env: env.clone(),
        meta: Value::Nil,
    }))))
}

/// (defmacro! name (fn* ...)). The closure is stored flagged as a macro.
fn eval_defmacro(ctx: &EvalContext, args: &[Value], env: &Env) -> Result<Trampoline, MalError> {
    check_arity!(args, "defmacro!", 2);
    let name = symbol_arg(&args[0], "defmacro!")?;
    let mac = match eval::eval_value(ctx, &args[1], env)? {
        Value::Lambda(lambda) => Value::Macro(lambda),
        other => return Err(MalError::type_error("function", other.type_name())),
    };
    tracing::debug!(name = %args[0], "defmacro!");
    env.set(name, mac.clone());
    Ok(Trampoline::Value(mac))
}

fn eval_macroexpand(ctx: &EvalContext, args: &[Value], env: &Env) -> Result<Trampoline, MalError> {
    check_arity!(args, "macroexpand", 1);
    eval::macroexpand(ctx, &args[0], env).map(Trampoline::Value)
}

fn eval_quasiquote(args: &[Value], env: &Env) -> Result<Trampoline, MalError> {
    check_arity!(args, "quasiquote", 1);
    Ok(Trampoline::Eval(quasiquote(&args[0]), env.clone()))
}

fn eval_quasiquoteexpand(args: &[Value]) -> Result<Trampoline, MalError> {
    check_arity!(args, "quasiquoteexpand", 1);
    Ok(Trampoline::Value(quasiquote(&args[0])))
}

/// The argument of `(name x)` when `form` is exactly that shape.
fn unwrap_form(form: &Value, name: Spur) -> Option<&Value> {
    match form.as_list()? {
        [Value::Symbol(head), arg] if *head == name => Some(arg),
        _ => None,
    }
}

/// Rewrite a quasiquoted template into code that builds it.
///
/// This is a purely syntactic transform: nothing is evaluated here.
pub(crate) fn quasiquote(ast: &Value) -> Value {
    let sf = special_forms();
    match ast {
        Value::List(items) => match unwrap_form(ast, sf.unquote) {
            Some(x) => x.clone(),
            None => quasiquote_seq(items),
        },
        Value::Vector(items) => Value::list(vec![Value::symbol("vec"), quasiquote_seq(items)]),
        Value::HashMap(_) | Value::Symbol(_) => {
            Value::list(vec![Value::Symbol(sf.quote), ast.clone()])
        }
        _ => ast.clone(),
    }
}

/// Fold the elements from the right into nested `cons`/`concat` calls.
fn quasiquote_seq(items: &[Value]) -> Value {
    let sf = special_forms();
    items.iter().rev().fold(Value::list(vec![]), |acc, elt| {
        match unwrap_form(elt, sf.splice_unquote) {
            Some(spliced) => Value::list(vec![Value::symbol("concat"), spliced.clone(), acc]),
            None => Value::list(vec![Value::symbol("cons"), quasiquote(elt), acc]),
        }
    })
}

/// (try* expr (catch* name handler))
///
/// A value raised by `throw` is bound as-is; any other error is bound as its
/// message string.
fn eval_try(ctx: &EvalContext, args: &[Value], env: &Env) -> Result<Trampoline, MalError> {
    let sf = special_forms();
    check_arity!(args, "try*", 1..=2);
    if args.len() == 1 {
        return Ok(Trampoline::Eval(args[0].clone(), env.clone()));
    }

    let (catch_var, handler) = match args[1].as_list() {
        Some([Value::Symbol(head), var, handler]) if *head == sf.catch_star => {
            (symbol_arg(var, "catch*")?, handler)
        }
        _ => {
            return Err(MalError::eval(
                "try*: second argument must be (catch* name handler)",
            ))
        }
    };

    match eval::eval_value(ctx, &args[0], env) {
        Ok(val) => Ok(Trampoline::Value(val)),
        Err(err) => {
            tracing::debug!(error = %err, "caught by try*");
            let catch_env = Env::with_parent(Rc::new(env.clone()));
            catch_env.set(catch_var, err.to_value());
            Ok(Trampoline::Eval(handler.clone(), catch_env))
        }
    }
}
