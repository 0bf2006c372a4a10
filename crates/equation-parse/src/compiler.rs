//! Shunting-yard compilation to RPN.
//!
//! The compiler consumes tokens one at a time, keeping an operator stack and
//! a per-parenthesis frame stack for function-call argument counting. The
//! result is a validated postfix program plus the variables it uses, in
//! order of first appearance.

use smallvec::SmallVec;

use equation_core::{stack_depth, ParseError, Term};
#[cfg(test)]
use equation_core::Value;
use equation_registry::{Assoc, Registry};

use crate::lexer::{Lexer, Token};

/// A compiled expression: the program and its variables.
#[derive(Clone, Debug, PartialEq)]
pub struct Compiled {
    /// The postfix program; validated to reduce to exactly one value.
    pub program: Vec<Term>,
    /// Variable names in order of first appearance.
    pub variables: Vec<String>,
}

/// What the compiler keeps on its operator stack.
enum StackOp {
    Open,
    Binary {
        token: String,
        precedence: u8,
    },
    Unary {
        token: String,
    },
    Function {
        name: String,
    },
}

/// One frame per open parenthesis: either a plain group or a function call
/// with its running argument count.
enum Frame {
    Group,
    Call { count: usize },
}

/// The previous significant token, for adjacency diagnostics.
#[derive(Clone, PartialEq)]
enum Prev {
    None,
    Open,
    Close,
    Separator,
    Literal(String),
    Name(String),
    Other,
}

/// Compiles an expression string against a registry.
///
/// # Errors
///
/// Returns a [`ParseError`] for lexical errors, implicit multiplication,
/// unknown functions, arity violations, unbalanced parentheses, misplaced
/// separators, and programs that do not reduce to a single value.
#[allow(clippy::too_many_lines)]
pub fn compile(registry: &Registry, src: &str) -> Result<Compiled, ParseError> {
    let mut lexer = Lexer::new(registry, src);
    let mut program: Vec<Term> = Vec::new();
    let mut stack: SmallVec<[StackOp; 16]> = SmallVec::new();
    let mut frames: Vec<Frame> = Vec::new();
    let mut variables: Vec<String> = Vec::new();
    let mut expect_op = false;
    let mut prev = Prev::None;
    let mut pending_call: Option<String> = None;

    while let Some(token) = lexer.next_token(expect_op)? {
        if pending_call.is_some() && token != Token::Open {
            return Err(ParseError::FunctionCallExpected {
                name: pending_call.take().unwrap_or_default(),
            });
        }

        match token {
            Token::Open => {
                match &prev {
                    Prev::Close | Prev::Literal(_) => {
                        return Err(ParseError::MissingOperator {
                            lhs: prev_text(&prev),
                            rhs: "(".to_string(),
                        });
                    }
                    Prev::Name(name) => {
                        // A bare name called like a function.
                        return Err(ParseError::UnknownFunction { name: name.clone() });
                    }
                    _ => {}
                }
                frames.push(if pending_call.take().is_some() {
                    Frame::Call { count: 1 }
                } else {
                    Frame::Group
                });
                stack.push(StackOp::Open);
                expect_op = false;
                prev = Prev::Open;
            }

            Token::Close => {
                if prev == Prev::Separator {
                    return Err(ParseError::MissingOperand { op: ",".to_string() });
                }
                drain_to_open(&mut stack, &mut program).ok_or(ParseError::UnbalancedClose)?;
                let frame = frames.pop().ok_or(ParseError::UnbalancedClose)?;
                if let Frame::Call { count } = frame {
                    let Some(StackOp::Function { name }) = stack.pop() else {
                        // A Call frame is always pushed right above its
                        // function.
                        return Err(ParseError::UnbalancedClose);
                    };
                    let argc = if prev == Prev::Open { 0 } else { count };
                    check_arity(registry, &name, argc)?;
                    program.push(Term::Call {
                        function: name,
                        argc,
                    });
                }
                expect_op = true;
                prev = Prev::Close;
            }

            Token::Separator => {
                match frames.last_mut() {
                    Some(Frame::Call { count }) => *count += 1,
                    _ => return Err(ParseError::SeparatorOutsideCall),
                }
                drain_to_open(&mut stack, &mut program)
                    .ok_or(ParseError::SeparatorOutsideCall)?;
                stack.push(StackOp::Open);
                expect_op = false;
                prev = Prev::Separator;
            }

            Token::Operator(token) => {
                let def = registry
                    .operator(&token)
                    .ok_or_else(|| ParseError::UnknownToken {
                        offset: lexer.offset(),
                        fragment: token.clone(),
                    })?;
                let (precedence, assoc) = (def.precedence, def.assoc);
                while let Some(top) = stack.last() {
                    let pop = match top {
                        StackOp::Unary { .. } => true,
                        StackOp::Binary {
                            precedence: top_prec,
                            ..
                        } => {
                            *top_prec > precedence
                                || (*top_prec == precedence && assoc == Assoc::Left)
                        }
                        StackOp::Open | StackOp::Function { .. } => false,
                    };
                    if !pop {
                        break;
                    }
                    emit(&mut program, stack.pop());
                }
                stack.push(StackOp::Binary {
                    token,
                    precedence,
                });
                expect_op = false;
                prev = Prev::Other;
            }

            Token::Unary(token) => {
                stack.push(StackOp::Unary { token });
                expect_op = false;
                prev = Prev::Other;
            }

            Token::Function(name) => {
                stack.push(StackOp::Function { name: name.clone() });
                pending_call = Some(name);
                expect_op = false;
                prev = Prev::Other;
            }

            Token::Name(name) => {
                if !variables.contains(&name) {
                    variables.push(name.clone());
                }
                program.push(Term::Variable(name.clone()));
                expect_op = true;
                prev = Prev::Name(name);
            }

            Token::Literal(value) => {
                program.push(Term::Value(value));
                expect_op = true;
                prev = Prev::Literal(value.to_string());
            }
        }
    }

    if let Some(name) = pending_call {
        return Err(ParseError::FunctionCallExpected { name });
    }

    while let Some(op) = stack.pop() {
        match op {
            StackOp::Open | StackOp::Function { .. } => {
                return Err(ParseError::UnbalancedOpen);
            }
            other => emit(&mut program, Some(other)),
        }
    }

    validate(&program)?;
    Ok(Compiled { program, variables })
}

/// Pops operators into the program until the matching `(` is consumed.
/// Returns `None` when the stack runs out first.
fn drain_to_open(stack: &mut SmallVec<[StackOp; 16]>, program: &mut Vec<Term>) -> Option<()> {
    loop {
        match stack.pop()? {
            StackOp::Open => return Some(()),
            other => emit(program, Some(other)),
        }
    }
}

fn emit(program: &mut Vec<Term>, op: Option<StackOp>) {
    match op {
        Some(StackOp::Binary { token, .. }) => program.push(Term::Binary { op: token }),
        Some(StackOp::Unary { token }) => program.push(Term::Unary { op: token }),
        // Open and Function are handled by their owners; nothing to emit.
        _ => {}
    }
}

fn check_arity(registry: &Registry, name: &str, argc: usize) -> Result<(), ParseError> {
    let def = registry
        .function(name)
        .ok_or_else(|| ParseError::UnknownFunction {
            name: name.to_string(),
        })?;
    if def.arity.accepts(argc) {
        Ok(())
    } else {
        Err(ParseError::FunctionArity {
            name: name.to_string(),
            expected: def.arity.to_string(),
            got: argc,
        })
    }
}

fn prev_text(prev: &Prev) -> String {
    match prev {
        Prev::Close => ")".to_string(),
        Prev::Literal(text) | Prev::Name(text) => text.clone(),
        _ => String::new(),
    }
}

/// Rejects programs that underflow the evaluation stack or leave more than
/// one value behind.
fn validate(program: &[Term]) -> Result<(), ParseError> {
    let mut depth = 0usize;
    for term in program {
        match depth.checked_sub(term.pops()) {
            Some(d) => depth = d + 1,
            None => {
                let op = match term {
                    Term::Binary { op } | Term::Unary { op } => op.clone(),
                    Term::Call { function, .. } => function.clone(),
                    Term::Value(_) | Term::Variable(_) => String::new(),
                };
                return Err(ParseError::MissingOperand { op });
            }
        }
    }
    debug_assert_eq!(stack_depth(program), Some(depth));
    match depth {
        0 => Err(ParseError::Empty),
        1 => Ok(()),
        _ => Err(ParseError::Unreduced),
    }
}
