//! # equation-core
//!
//! Core types for the equation expression engine.
//!
//! This crate provides:
//! - The runtime numeric tower ([`Value`]: `i64` / `f64` / `Complex64`)
//! - The compiled RPN program representation ([`Term`])
//! - The parse- and eval-time error taxonomies
//!
//! ## Design Principles
//!
//! - **Exact where possible**: integer arithmetic is checked `i64` and only
//!   promotes to `f64` on overflow
//! - **Flat programs**: expressions compile to a postfix `Vec<Term>` walked
//!   with an explicit stack, so evaluation depth never tracks input nesting
//! - **Registry-keyed terms**: operator terms carry tokens, not callables,
//!   keeping programs comparable and cheap to clone

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod term;
pub mod value;

#[cfg(test)]
mod proptests;

pub use error::{EvalError, ParseError};
pub use term::{stack_depth, Term};
pub use value::Value;

// Re-exported so downstream crates name the same complex type.
pub use num_complex::Complex64;
