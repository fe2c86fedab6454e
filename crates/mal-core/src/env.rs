use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap as SpurMap;
use lasso::Spur;

use crate::error::MalError;
use crate::value::{intern, resolve, Value};

/// A mal environment: a chain of scopes with bindings.
///
/// Cloning an `Env` is cheap and yields a handle to the *same* frame; closures
/// and active calls share frames this way, and a frame lives as long as any
/// handle to it does.
#[derive(Clone, Default)]
pub struct Env {
    pub bindings: Rc<RefCell<SpurMap<Spur, Value>>>,
    pub parent: Option<Rc<Env>>,
}

impl Env {
    pub fn new() -> Self {
        Env {
            bindings: Rc::new(RefCell::new(SpurMap::new())),
            parent: None,
        }
    }

    pub fn with_parent(parent: Rc<Env>) -> Self {
        Env {
            bindings: Rc::new(RefCell::new(SpurMap::new())),
            parent: Some(parent),
        }
    }

    /// Build the frame for a function call: positional `params` are bound in
    /// order, and when `rest` is present every remaining argument is collected
    /// into one list bound to it. Without `rest`, surplus arguments are ignored.
    pub fn bind(
        outer: &Env,
        params: &[Spur],
        rest: Option<Spur>,
        args: &[Value],
    ) -> Result<Env, MalError> {
        if args.len() < params.len() {
            let expected = match rest {
                Some(_) => format!("{}+", params.len()),
                None => params.len().to_string(),
            };
            return Err(MalError::arity("fn*", expected, args.len()));
        }
        let env = Env::with_parent(Rc::new(outer.clone()));
        if let Some(rest) = rest {
            env.set(rest, Value::list(args[params.len()..].to_vec()));
        }
        {
            let mut bindings = env.bindings.borrow_mut();
            for (param, arg) in params.iter().zip(args) {
                bindings.insert(*param, arg.clone());
            }
        }
        Ok(env)
    }

    /// Insert or overwrite a binding in this frame only.
    pub fn set(&self, name: Spur, val: Value) {
        self.bindings.borrow_mut().insert(name, val);
    }

    pub fn set_str(&self, name: &str, val: Value) {
        self.set(intern(name), val);
    }

    /// Look a symbol up, walking outward through the parent chain.
    pub fn find(&self, name: Spur) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(val) = env.bindings.borrow().get(&name) {
                return Some(val.clone());
            }
            match &env.parent {
                Some(parent) => env = parent.as_ref(),
                None => return None,
            }
        }
    }

    pub fn find_str(&self, name: &str) -> Option<Value> {
        self.find(intern(name))
    }

    /// Like [`Env::find`], but a missing symbol is an error.
    pub fn get(&self, name: Spur) -> Result<Value, MalError> {
        self.find(name)
            .ok_or_else(|| MalError::Unbound(resolve(name)))
    }

    /// The outermost frame of this chain.
    pub fn root(&self) -> Env {
        let mut env = self;
        while let Some(parent) = &env.parent {
            env = parent.as_ref();
        }
        env.clone()
    }

    /// Every name visible from this frame, innermost first, without duplicates.
    pub fn visible_names(&self) -> Vec<String> {
        let mut seen = hashbrown::HashSet::new();
        let mut names = Vec::new();
        let mut env = Some(self);
        while let Some(frame) = env {
            for name in frame.bindings.borrow().keys() {
                if seen.insert(*name) {
                    names.push(resolve(*name));
                }
            }
            env = frame.parent.as_deref();
        }
        names
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<env {} bindings", self.bindings.borrow().len())?;
        if self.parent.is_some() {
            write!(f, " +outer")?;
        }
        write!(f, ">")
    }
}

/// Split a `fn*` parameter list at the `&` marker.
///
/// `&` may appear at most once and must be followed by exactly one symbol.
pub fn split_params(names: &[Spur]) -> Result<(Vec<Spur>, Option<Spur>), MalError> {
    let amp = intern("&");
    match names.iter().position(|s| *s == amp) {
        None => Ok((names.to_vec(), None)),
        Some(pos) => match &names[pos + 1..] {
            [rest] if *rest != amp => Ok((names[..pos].to_vec(), Some(*rest))),
            [] => Err(MalError::eval("fn*: '&' must be followed by a rest parameter")),
            _ => Err(MalError::eval(
                "fn*: '&' must be followed by exactly one rest parameter",
            )),
        },
    }
}
