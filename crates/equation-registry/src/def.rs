//! Operator, unary-operator, and function definitions.
//!
//! A definition bundles what the compiler needs (precedence, associativity,
//! arity), what the renderer needs (canonical and LaTeX format templates),
//! and what the evaluator needs (the native callable).
//!
//! Format templates use `{0}`, `{1}`, ... as operand slots; function
//! templates receive all arguments comma-joined in `{0}`.

use std::fmt;
use std::sync::Arc;

use equation_core::{EvalError, Value};
use thiserror::Error;

/// The callable behind an operator or function.
///
/// The evaluator guarantees the slice length matches the definition's arity
/// before calling.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Operator associativity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assoc {
    /// `a ⊕ b ⊕ c` groups as `(a ⊕ b) ⊕ c`.
    Left,
    /// `a ⊕ b ⊕ c` groups as `a ⊕ (b ⊕ c)`.
    Right,
}

/// How many arguments a function accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// Any count from the listed set.
    OneOf(Vec<usize>),
    /// `n` or more arguments.
    AtLeast(usize),
}

impl Arity {
    /// Returns true if a call with `n` arguments is accepted.
    #[must_use]
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == *k,
            Arity::OneOf(ks) => ks.contains(&n),
            Arity::AtLeast(k) => n >= *k,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(k) => write!(out, "{k}"),
            Arity::OneOf(ks) => {
                let parts: Vec<String> = ks.iter().map(ToString::to_string).collect();
                write!(out, "{}", parts.join(" or "))
            }
            Arity::AtLeast(k) => write!(out, "at least {k}"),
        }
    }
}

/// A binary infix operator.
#[derive(Clone)]
pub struct OperatorDef {
    /// Canonical format template, e.g. `"({0} + {1})"`.
    pub canonical: String,
    /// LaTeX format template, e.g. `"\\left({0} + {1}\\right)"`.
    pub latex: String,
    /// Binding strength; higher binds tighter.
    pub precedence: u8,
    /// Grouping direction among equal precedence.
    pub assoc: Assoc,
    /// The callable; always receives exactly two values.
    pub apply: NativeFn,
}

/// A prefix unary operator.
///
/// Unary operators bind tighter than every binary operator.
#[derive(Clone)]
pub struct UnaryDef {
    /// Canonical format template, e.g. `"(-{0})"`.
    pub canonical: String,
    /// LaTeX format template, e.g. `"-{0}"`.
    pub latex: String,
    /// The callable; always receives exactly one value.
    pub apply: NativeFn,
}

/// A named function.
#[derive(Clone)]
pub struct FunctionDef {
    /// LaTeX format template; `{0}` receives the comma-joined arguments.
    pub latex: String,
    /// Accepted argument counts, checked at compile time.
    pub arity: Arity,
    /// The callable.
    pub apply: NativeFn,
}

impl fmt::Debug for OperatorDef {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        out.debug_struct("OperatorDef")
            .field("canonical", &self.canonical)
            .field("precedence", &self.precedence)
            .field("assoc", &self.assoc)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for UnaryDef {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        out.debug_struct("UnaryDef")
            .field("canonical", &self.canonical)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        out.debug_struct("FunctionDef")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Errors raised when registering definitions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The operator token contains characters the lexer cannot match.
    #[error("invalid operator token {token:?}: {reason}")]
    InvalidToken {
        /// The rejected token.
        token: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Function and constant names must be identifiers.
    #[error("invalid name {name:?}: expected an identifier")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}
