//! Error taxonomies for parsing and evaluation.

use thiserror::Error;

/// Errors produced while tokenizing or compiling an expression string.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input was empty or all whitespace.
    #[error("empty expression")]
    Empty,

    /// No token matched at the given byte offset.
    #[error("unrecognized input at byte {offset}: {fragment:?}")]
    UnknownToken {
        /// Byte offset of the first unmatched character.
        offset: usize,
        /// A short fragment of the unmatched input.
        fragment: String,
    },

    /// Two value-like tokens were adjacent, e.g. `2(x+1)`.
    #[error("missing operator between {lhs:?} and {rhs:?}; did you mean `*`?")]
    MissingOperator {
        /// Text of the left token.
        lhs: String,
        /// Text of the right token.
        rhs: String,
    },

    /// A bare name was called like a function, e.g. `x(1)`.
    #[error("unknown function {name:?}")]
    UnknownFunction {
        /// The unregistered name.
        name: String,
    },

    /// A function was called with an argument count its signature rejects.
    #[error("{name} expects {expected} argument(s), got {got}")]
    FunctionArity {
        /// The function name.
        name: String,
        /// Human-readable description of the accepted counts.
        expected: String,
        /// The count that was supplied.
        got: usize,
    },

    /// A function name was not followed by an opening parenthesis.
    #[error("function {name:?} must be followed by `(`")]
    FunctionCallExpected {
        /// The function name.
        name: String,
    },

    /// A `,` appeared outside any function call.
    #[error("`,` outside of a function call")]
    SeparatorOutsideCall,

    /// A `)` had no matching `(`.
    #[error("closing `)` without a matching `(`")]
    UnbalancedClose,

    /// A `(` was never closed.
    #[error("missing closing `)`")]
    UnbalancedOpen,

    /// An operator was left without enough operands, e.g. `1 +`.
    #[error("operator {op:?} is missing an operand")]
    MissingOperand {
        /// The operator token.
        op: String,
    },

    /// The program does not reduce to exactly one value.
    #[error("expression does not reduce to a single value")]
    Unreduced,
}

/// Errors produced while evaluating a compiled expression.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A variable used by the expression was never bound.
    #[error("variable {name:?} is not defined")]
    UndefinedVariable {
        /// The unbound variable.
        name: String,
    },

    /// More positional arguments than the expression's argument order.
    #[error("expression takes at most {max} positional argument(s), got {got}")]
    TooManyArguments {
        /// Length of the argument order.
        max: usize,
        /// Number of positional arguments supplied.
        got: usize,
    },

    /// The same variable was bound both positionally and by name.
    #[error("variable {name:?} was bound more than once")]
    DuplicateBinding {
        /// The doubly-bound variable.
        name: String,
    },

    /// Division or modulo by an exact zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An operation was applied outside its domain.
    #[error("domain error: {message}")]
    Domain {
        /// What went wrong.
        message: String,
    },

    /// The program references an operator the registry does not know.
    ///
    /// Only reachable by combining expressions built against different
    /// registries.
    #[error("operator {token:?} is not registered")]
    UnknownOperator {
        /// The missing operator token.
        token: String,
    },

    /// The evaluation stack went out of balance.
    ///
    /// Compiled programs are validated, so this indicates a hand-assembled
    /// or corrupted program.
    #[error("corrupt program: evaluation stack out of balance")]
    CorruptProgram,
}

impl EvalError {
    /// Builds a [`EvalError::Domain`] from anything displayable.
    #[must_use]
    pub fn domain(message: impl Into<String>) -> Self {
        EvalError::Domain {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let e = ParseError::UnknownFunction {
            name: "frob".into(),
        };
        assert!(e.to_string().contains("frob"));

        let e = EvalError::UndefinedVariable { name: "x".into() };
        assert!(e.to_string().contains('x'));
    }
}
