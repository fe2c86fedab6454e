#![allow(clippy::mutable_key_type)]
mod eval;
mod prelude;
mod special_forms;

pub use eval::{
    apply_macro, call_value, eval_string, eval_value, macroexpand, EvalResult, Interpreter,
    Trampoline,
};
pub use prelude::PRELUDE;
pub use special_forms::SPECIAL_FORM_NAMES;
