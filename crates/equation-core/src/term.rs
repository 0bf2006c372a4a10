//! Compiled program representation.
//!
//! An expression compiles to a flat sequence of [`Term`]s in postfix (RPN)
//! order. Evaluation and rendering both walk the sequence left to right with
//! an explicit stack, so nothing here recurses.

use crate::value::Value;

/// One element of a compiled expression program.
///
/// Operator and function terms carry registry keys rather than callables,
/// which keeps programs cheap to clone and structurally comparable.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// A literal value.
    Value(Value),

    /// A variable reference, resolved at evaluation time.
    Variable(String),

    /// A binary operator application; pops two operands.
    Binary {
        /// Registry token of the operator, e.g. `"+"`.
        op: String,
    },

    /// A unary operator application; pops one operand.
    Unary {
        /// Registry token of the operator, e.g. `"-"`.
        op: String,
    },

    /// A function call; pops `argc` operands.
    Call {
        /// Registry name of the function.
        function: String,
        /// Number of arguments popped.
        argc: usize,
    },
}

impl Term {
    /// Returns true if this term pushes a value without popping any.
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Value(_) | Term::Variable(_))
    }

    /// Number of operands this term pops from the evaluation stack.
    #[must_use]
    pub fn pops(&self) -> usize {
        match self {
            Term::Value(_) | Term::Variable(_) => 0,
            Term::Unary { .. } => 1,
            Term::Binary { .. } => 2,
            Term::Call { argc, .. } => *argc,
        }
    }
}

/// Checks RPN stack discipline: no operand underflow and exactly one result.
///
/// Returns `Some(depth)` with the final stack depth when no term underflows,
/// `None` otherwise. A well-formed program yields `Some(1)`.
#[must_use]
pub fn stack_depth(program: &[Term]) -> Option<usize> {
    let mut depth = 0usize;
    for term in program {
        depth = depth.checked_sub(term.pops())?;
        depth += 1;
    }
    Some(depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Term {
        Term::Value(Value::Integer(v))
    }

    #[test]
    fn atoms_and_arity() {
        assert!(int(1).is_atom());
        assert!(Term::Variable("x".into()).is_atom());
        assert_eq!(Term::Binary { op: "+".into() }.pops(), 2);
        assert_eq!(
            Term::Call {
                function: "max".into(),
                argc: 3
            }
            .pops(),
            3
        );
    }

    #[test]
    fn stack_discipline() {
        // 1 2 +  => one result
        let ok = vec![int(1), int(2), Term::Binary { op: "+".into() }];
        assert_eq!(stack_depth(&ok), Some(1));

        // 1 +    => underflow
        let underflow = vec![int(1), Term::Binary { op: "+".into() }];
        assert_eq!(stack_depth(&underflow), None);

        // 1 2    => two results left behind
        let leftover = vec![int(1), int(2)];
        assert_eq!(stack_depth(&leftover), Some(2));
    }
}
