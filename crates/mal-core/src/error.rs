use std::fmt;

use crate::value::Value;

/// Check arity of a native function's arguments, returning `MalError::Arity` on mismatch.
///
/// # Forms
///
/// ```ignore
/// check_arity!(args, "fn-name", 2);        // exactly 2
/// check_arity!(args, "fn-name", 1..=3);    // 1 to 3 inclusive
/// check_arity!(args, "fn-name", 2..);      // 2 or more
/// ```
#[macro_export]
macro_rules! check_arity {
    ($args:expr, $name:expr, $exact:literal) => {
        if $args.len() != $exact {
            return Err($crate::MalError::arity(
                $name,
                stringify!($exact),
                $args.len(),
            ));
        }
    };
    ($args:expr, $name:expr, $lo:literal ..= $hi:literal) => {
        if $args.len() < $lo || $args.len() > $hi {
            return Err($crate::MalError::arity(
                $name,
                concat!(stringify!($lo), "-", stringify!($hi)),
                $args.len(),
            ));
        }
    };
    ($args:expr, $name:expr, $lo:literal ..) => {
        if $args.len() < $lo {
            return Err($crate::MalError::arity(
                $name,
                concat!(stringify!($lo), "+"),
                $args.len(),
            ));
        }
    };
}

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn point(line: usize, col: usize) -> Self {
        Span { line, col }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MalError {
    #[error("Reader error at {span}: {message}")]
    Reader { message: String, span: Span },

    #[error("Eval error: {0}")]
    Eval(String),

    #[error("Type error: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("Arity error: {name} expects {expected} args, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("'{0}' not found")]
    Unbound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Exception: {0}")]
    UserException(Value),

    #[error("{inner}")]
    WithContext {
        inner: Box<MalError>,
        hint: Option<String>,
    },
}

/// Compute the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Find the most similar name from a list of candidates.
/// Returns `None` if no candidate is close enough.
pub fn suggest_similar(name: &str, candidates: &[String]) -> Option<String> {
    // roughly a third of the name, between 1 and 3 edits
    let threshold = (name.chars().count() / 3).clamp(1, 3);

    candidates
        .iter()
        .filter_map(|c| {
            let d = edit_distance(name, c);
            (d > 0 && d <= threshold).then_some((c, d))
        })
        .min_by(|(a, da), (b, db)| da.cmp(db).then_with(|| a.cmp(b)))
        .map(|(c, _)| c.clone())
}

impl MalError {
    pub fn eval(msg: impl Into<String>) -> Self {
        MalError::Eval(msg.into())
    }

    pub fn reader(msg: impl Into<String>, span: Span) -> Self {
        MalError::Reader {
            message: msg.into(),
            span,
        }
    }

    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        MalError::Type {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn arity(name: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        MalError::Arity {
            name: name.into(),
            expected: expected.into(),
            got,
        }
    }

    /// Attach a hint (actionable suggestion) to this error.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            MalError::WithContext { inner, .. } => MalError::WithContext {
                inner,
                hint: Some(hint.into()),
            },
            other => MalError::WithContext {
                inner: Box::new(other),
                hint: Some(hint.into()),
            },
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            MalError::WithContext { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    /// The error with any context wrappers removed.
    pub fn inner(&self) -> &MalError {
        match self {
            MalError::WithContext { inner, .. } => inner.inner(),
            other => other,
        }
    }

    /// The value a `catch*` handler sees: the thrown value for user
    /// exceptions, the message string for everything raised natively.
    pub fn to_value(&self) -> Value {
        match self.inner() {
            MalError::UserException(v) => v.clone(),
            other => Value::string(&other.to_string()),
        }
    }
}
