//! # equation-registry
//!
//! Operator, function, and constant tables for the equation engine.
//!
//! The [`Registry`] owns every binary operator, prefix operator, function,
//! and constant an expression may use, and is consulted by the lexer (token
//! matching), the compiler (precedence, arity), the renderer (format
//! templates), and the evaluator (native callables).
//!
//! [`Registry::standard`] loads the default deck; the `add_*` methods extend
//! or shadow it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builtins;
pub mod def;
pub mod registry;

pub use def::{Arity, Assoc, FunctionDef, NativeFn, OperatorDef, RegistryError, UnaryDef};
pub use registry::Registry;
