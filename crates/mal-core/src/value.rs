use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use lasso::{Rodeo, Spur};

use crate::env::Env;
use crate::error::MalError;
use crate::printer::pr_str;
use crate::EvalContext;

thread_local! {
    static INTERNER: RefCell<Rodeo> = RefCell::new(Rodeo::default());
}

/// Intern a string, returning a Spur key.
pub fn intern(s: &str) -> Spur {
    INTERNER.with(|r| r.borrow_mut().get_or_intern(s))
}

/// Resolve a Spur key back to a String.
pub fn resolve(spur: Spur) -> String {
    INTERNER.with(|r| r.borrow().resolve(&spur).to_string())
}

/// Resolve a Spur and call f with the &str, avoiding allocation.
pub fn with_resolved<F, R>(spur: Spur, f: F) -> R
where
    F: FnOnce(&str) -> R,
{
    INTERNER.with(|r| {
        let interner = r.borrow();
        f(interner.resolve(&spur))
    })
}

/// A native function callable from mal.
///
/// Builtins receive the evaluation context (for calling back into the
/// evaluator) and the environment of the call site.
pub type NativeFnInner = dyn Fn(&EvalContext, &Env, &[Value]) -> Result<Value, MalError>;

pub struct NativeFn {
    pub name: String,
    pub func: Box<NativeFnInner>,
    pub meta: Value,
}

impl NativeFn {
    pub fn simple(
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, MalError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(move |_ctx, _env, args| f(args)),
            meta: Value::Nil,
        }
    }

    pub fn with_ctx(
        name: impl Into<String>,
        f: impl Fn(&EvalContext, &Env, &[Value]) -> Result<Value, MalError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(f),
            meta: Value::Nil,
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<builtin {}>", self.name)
    }
}

/// A user-defined closure created by `fn*`.
///
/// `params` holds the positional parameters; `rest_param` is the symbol that
/// followed `&`, if any. The split is validated once, when the closure is built.
#[derive(Clone)]
pub struct Lambda {
    pub params: Vec<Spur>,
    pub rest_param: Option<Spur>,
    pub body: Value,
    pub env: Env,
    /// Attached by `with-meta`; nil otherwise.
    pub meta: Value,
}

impl fmt::Debug for Lambda {
    // The captured env can reach this closure again, so it is never printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("params", &self.params.iter().map(|p| resolve(*p)).collect::<Vec<_>>())
            .field("rest_param", &self.rest_param.map(resolve))
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// The core Value type for all mal data.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<String>),
    Symbol(Spur),
    Keyword(Spur),
    List(Rc<Vec<Value>>),
    Vector(Rc<Vec<Value>>),
    HashMap(Rc<hashbrown::HashMap<Value, Value>>),
    Lambda(Rc<Lambda>),
    Macro(Rc<Lambda>),
    NativeFn(Rc<NativeFn>),
    Atom(Rc<RefCell<Value>>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Keyword(_) => "keyword",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::HashMap(_) => "hash-map",
            Value::Lambda(_) => "function",
            Value::Macro(_) => "macro",
            Value::NativeFn(_) => "builtin",
            Value::Atom(_) => "atom",
        }
    }

    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// True for values allowed as hash-map keys: no containers, no functions, no atoms.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Value::Nil
                | Value::Bool(_)
                | Value::Number(_)
                | Value::String(_)
                | Value::Symbol(_)
                | Value::Keyword(_)
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Lambda(_) | Value::NativeFn(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol_spur(&self) -> Option<Spur> {
        match self {
            Value::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<String> {
        self.as_symbol_spur().map(resolve)
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the elements of a list or a vector.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) | Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&Rc<RefCell<Value>>> {
        match self {
            Value::Atom(a) => Some(a),
            _ => None,
        }
    }

    /// Is this a list whose head is the symbol `name`?
    pub fn is_form(&self, name: &str) -> bool {
        match self.as_list() {
            Some(items) => items
                .first()
                .and_then(Value::as_symbol_spur)
                .is_some_and(|s| with_resolved(s, |n| n == name)),
            None => false,
        }
    }

    /// Metadata attached with `with-meta`. Only callables carry it.
    pub fn meta(&self) -> Value {
        match self {
            Value::Lambda(l) | Value::Macro(l) => l.meta.clone(),
            Value::NativeFn(f) => f.meta.clone(),
            _ => Value::Nil,
        }
    }

    /// A copy of this value with `meta` attached.
    ///
    /// Callables come back as a new function sharing the original's code.
    /// Collections are accepted and returned as they are, without the metadata.
    pub fn with_meta(&self, meta: Value) -> Result<Value, MalError> {
        match self {
            Value::Lambda(l) => Ok(Value::Lambda(Rc::new(Lambda {
                meta,
                ..(**l).clone()
            }))),
            Value::Macro(l) => Ok(Value::Macro(Rc::new(Lambda {
                meta,
                ..(**l).clone()
            }))),
            Value::NativeFn(f) => {
                let inner = Rc::clone(f);
                Ok(Value::NativeFn(Rc::new(NativeFn {
                    name: f.name.clone(),
                    func: Box::new(move |ctx, env, args| (inner.func)(ctx, env, args)),
                    meta,
                })))
            }
            Value::List(_) | Value::Vector(_) | Value::HashMap(_) => Ok(self.clone()),
            other => Err(MalError::type_error("function or collection", other.type_name())),
        }
    }

    pub fn number(n: f64) -> Value {
        Value::Number(n)
    }

    pub fn symbol(s: &str) -> Value {
        Value::Symbol(intern(s))
    }

    pub fn keyword(s: &str) -> Value {
        Value::Keyword(intern(s))
    }

    pub fn string(s: &str) -> Value {
        Value::String(Rc::new(s.to_string()))
    }

    pub fn list(v: Vec<Value>) -> Value {
        Value::List(Rc::new(v))
    }

    pub fn vector(v: Vec<Value>) -> Value {
        Value::Vector(Rc::new(v))
    }

    pub fn atom(v: Value) -> Value {
        Value::Atom(Rc::new(RefCell::new(v)))
    }

    pub fn native_fn(f: NativeFn) -> Value {
        Value::NativeFn(Rc::new(f))
    }

    /// Build a hash-map, rejecting keys that are not atomic.
    pub fn hashmap(entries: Vec<(Value, Value)>) -> Result<Value, MalError> {
        let mut map = hashbrown::HashMap::with_capacity(entries.len());
        for (k, v) in entries {
            if !k.is_atomic() {
                return Err(MalError::type_error("atomic hash-map key", k.type_name()));
            }
            map.insert(k, v);
        }
        Ok(Value::HashMap(Rc::new(map)))
    }
}

// Lists and vectors compare equal element-wise, so they share one hash tag.
const SEQ_TAG: u8 = 6;

/// Bit pattern used for number equality and hashing: `0` and `-0` are one key.
fn number_bits(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Nil => 0u8.hash(state),
            Value::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Value::Number(n) => {
                2u8.hash(state);
                number_bits(*n).hash(state);
            }
            Value::String(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            Value::Symbol(s) => {
                4u8.hash(state);
                s.hash(state);
            }
            Value::Keyword(s) => {
                5u8.hash(state);
                s.hash(state);
            }
            Value::List(items) | Value::Vector(items) => {
                SEQ_TAG.hash(state);
                items.hash(state);
            }
            Value::HashMap(map) => {
                7u8.hash(state);
                map.len().hash(state);
            }
            Value::Lambda(l) | Value::Macro(l) => (Rc::as_ptr(l) as usize).hash(state),
            Value::NativeFn(f) => (Rc::as_ptr(f) as *const u8 as usize).hash(state),
            Value::Atom(a) => (Rc::as_ptr(a) as usize).hash(state),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => number_bits(*a) == number_bits(*b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (
                Value::List(a) | Value::Vector(a),
                Value::List(b) | Value::Vector(b),
            ) => a == b,
            (Value::HashMap(a), Value::HashMap(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) | (Value::Macro(a), Value::Macro(b)) => {
                Rc::ptr_eq(a, b)
            }
            (Value::NativeFn(a), Value::NativeFn(b)) => Rc::ptr_eq(a, b),
            (Value::Atom(a), Value::Atom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pr_str(self, true))
    }
}
