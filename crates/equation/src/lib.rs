//! Infix expression parsing, evaluation, and rendering.
//!
//! The crate compiles infix source like `"sin(x) + y^2"` into a postfix
//! program, evaluates it against variable bindings, and renders it back as
//! either a canonical re-parseable string or LaTeX.
//!
//! # Design Principles
//!
//! - **Compile once, call many times.** [`Expression`] holds a validated
//!   postfix program; evaluation is a single stack-machine pass with no
//!   re-parsing.
//! - **The registry is the language.** Operators, functions, and constants
//!   all come from a [`Registry`]; the grammar itself has no built-in
//!   vocabulary beyond parentheses, commas, and literals.
//! - **Errors carry position and names.** Parse errors point at the
//!   offending source fragment; evaluation errors name the variable or
//!   operation involved.
//!
//! # Quick start
//!
//! ```
//! use equation::Expression;
//!
//! let area = Expression::parse("pi * r^2").unwrap();
//! let v = area.bind().var("r", 2.0).eval().unwrap();
//! assert!((v.as_real().unwrap() - 4.0 * std::f64::consts::PI).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod expression;
mod render;

#[cfg(test)]
mod tests;

pub use expression::{standard_registry, Binding, CombineError, Expression, Operand};

pub use equation_core::{Complex64, EvalError, ParseError, Term, Value};
pub use equation_parse::compiler::{compile, Compiled};
pub use equation_registry::{
    Arity, Assoc, FunctionDef, NativeFn, OperatorDef, Registry, RegistryError, UnaryDef,
};

/// The common imports, for glob convenience.
pub mod prelude {
    pub use crate::{
        standard_registry, Arity, Assoc, Binding, CombineError, EvalError, Expression, Operand,
        ParseError, Registry, Value,
    };
}
