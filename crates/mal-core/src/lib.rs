#![allow(clippy::mutable_key_type)]
pub mod context;
pub mod env;
pub mod error;
pub mod printer;
pub mod value;

pub use context::{call_callback, eval_callback, set_call_callback, set_eval_callback, EvalContext};
pub use env::{split_params, Env};
pub use error::{suggest_similar, MalError, Span};
pub use lasso::Spur;
pub use printer::pr_str;
pub use value::{intern, resolve, with_resolved, Lambda, NativeFn, Value};
