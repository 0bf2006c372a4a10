//! # equation-parse
//!
//! Lexing and compilation for the equation engine.
//!
//! Expression strings go through two registry-driven stages:
//! 1. [`lexer`] — a context-sensitive tokenizer (the same `-` is a sign, a
//!    unary operator, or subtraction depending on position)
//! 2. [`compiler`] — shunting-yard translation into a validated postfix
//!    program
//!
//! Neither stage recurses, so input nesting depth never threatens the call
//! stack.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod compiler;
pub mod lexer;

pub use compiler::{compile, Compiled};
pub use lexer::{Lexer, Token};
