//! The user-facing expression type.
//!
//! An [`Expression`] is a compiled program plus everything needed to call
//! it: the registry it was built against, the positional argument order,
//! the set of variables it uses, and any preset values.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{
    Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Div,
    DivAssign, Mul, MulAssign, Neg, Not, Rem, RemAssign, Sub, SubAssign,
};
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use hashbrown::{HashMap, HashSet};
use num_complex::Complex64;
use smallvec::SmallVec;
use thiserror::Error;

use equation_core::{EvalError, ParseError, Term, Value};
use equation_parse::compiler;
use equation_registry::Registry;

use crate::render;

/// The process-wide standard registry, shared by every expression built
/// through [`Expression::parse`].
static STANDARD: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::standard()));

/// Returns a handle to the shared standard registry.
#[must_use]
pub fn standard_registry() -> Arc<Registry> {
    Arc::clone(&STANDARD)
}

/// Errors raised while composing expressions with operators.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CombineError {
    /// A string operand failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The binary operator token is not registered.
    #[error("operator {token:?} is not registered")]
    UnknownOperator {
        /// The missing token.
        token: String,
    },

    /// The unary operator token is not registered.
    #[error("unary operator {token:?} is not registered")]
    UnknownUnary {
        /// The missing token.
        token: String,
    },

    /// The function name is not registered.
    #[error("function {name:?} is not registered")]
    UnknownFunction {
        /// The missing name.
        name: String,
    },

    /// [`Expression::apply`] needs a function accepting exactly one
    /// argument.
    #[error("function {name:?} does not accept a single argument")]
    NotSingleArgument {
        /// The rejected function.
        name: String,
    },

    /// Both sides preset the same variable to different values.
    #[error("preset variable {name:?} has two conflicting values")]
    PresetConflict {
        /// The conflicting variable.
        name: String,
    },
}

/// Anything usable as the other side of an expression combination:
/// a number, a value, another expression, or source text to parse.
#[derive(Clone, Debug)]
pub enum Operand {
    /// A literal value.
    Value(Value),
    /// An already-built expression.
    Expr(Expression),
    /// Expression source text, parsed against the left side's registry.
    Source(String),
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Value(Value::Integer(v))
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Value(Value::Integer(i64::from(v)))
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Operand::Value(Value::Float(v))
    }
}

impl From<Complex64> for Operand {
    fn from(v: Complex64) -> Self {
        Operand::Value(Value::Complex(v))
    }
}

impl From<Expression> for Operand {
    fn from(e: Expression) -> Self {
        Operand::Expr(e)
    }
}

impl From<&Expression> for Operand {
    fn from(e: &Expression) -> Self {
        Operand::Expr(e.clone())
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Source(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Source(s)
    }
}

/// A compiled, callable expression.
///
/// ```
/// use equation::Expression;
///
/// let fn_ = Expression::parse("sin(x) + y^2").unwrap();
/// let v = fn_.bind().var("x", 0.0).var("y", 3).eval().unwrap();
/// assert_eq!(v.as_real(), Some(9.0));
/// ```
#[derive(Clone, Debug)]
pub struct Expression {
    registry: Arc<Registry>,
    program: Vec<Term>,
    arg_order: Vec<String>,
    args_used: HashSet<String>,
    presets: HashMap<String, Value>,
}

impl Expression {
    /// Parses an expression against the standard registry.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the first problem found.
    pub fn parse(src: &str) -> Result<Self, ParseError> {
        Self::parse_with(standard_registry(), src)
    }

    /// Parses with an explicit leading positional argument order.
    ///
    /// Variables named in `arg_order` take the first positional slots;
    /// remaining variables follow in order of first appearance, exactly as
    /// with [`Expression::parse`].
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the first problem found.
    pub fn parse_ordered(src: &str, arg_order: &[&str]) -> Result<Self, ParseError> {
        let compiled = compiler::compile(&standard_registry(), src)?;
        Ok(Self::from_compiled(standard_registry(), compiled, arg_order))
    }

    /// Parses against a custom registry.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the first problem found.
    pub fn parse_with(registry: Arc<Registry>, src: &str) -> Result<Self, ParseError> {
        let compiled = compiler::compile(&registry, src)?;
        Ok(Self::from_compiled(registry, compiled, &[]))
    }

    fn from_compiled(
        registry: Arc<Registry>,
        compiled: compiler::Compiled,
        leading: &[&str],
    ) -> Self {
        let mut arg_order: Vec<String> = Vec::with_capacity(leading.len());
        for name in leading {
            if !arg_order.iter().any(|n| n == name) {
                arg_order.push((*name).to_string());
            }
        }
        for name in &compiled.variables {
            if !arg_order.contains(name) {
                arg_order.push(name.clone());
            }
        }
        let args_used = compiled.variables.iter().cloned().collect();
        Self {
            registry,
            program: compiled.program,
            arg_order,
            args_used,
            presets: HashMap::new(),
        }
    }

    /// The registry this expression was built against.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The compiled program, in postfix order.
    #[must_use]
    pub fn rpn(&self) -> &[Term] {
        &self.program
    }

    /// The positional argument order.
    #[must_use]
    pub fn arg_order(&self) -> &[String] {
        &self.arg_order
    }

    /// The variables this expression reads, in positional order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.arg_order
            .iter()
            .filter(|name| self.args_used.contains(name.as_str()))
            .map(String::as_str)
    }

    /// Returns true if the expression reads the named variable.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.args_used.contains(name)
    }

    // === Presets ===

    /// Returns the preset value for a variable, if any.
    #[must_use]
    pub fn preset(&self, name: &str) -> Option<&Value> {
        self.presets.get(name)
    }

    /// Presets a variable the expression uses.
    ///
    /// Presets are baked-in defaults: they shadow registry constants and are
    /// themselves shadowed by call bindings.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UndefinedVariable`] if the expression does not
    /// use `name`.
    pub fn set_preset(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), EvalError> {
        if !self.args_used.contains(name) {
            return Err(EvalError::UndefinedVariable {
                name: name.to_string(),
            });
        }
        self.presets.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Removes a preset.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UndefinedVariable`] if the expression does not
    /// use `name`.
    pub fn clear_preset(&mut self, name: &str) -> Result<(), EvalError> {
        if !self.args_used.contains(name) {
            return Err(EvalError::UndefinedVariable {
                name: name.to_string(),
            });
        }
        self.presets.remove(name);
        Ok(())
    }

    // === Evaluation ===

    /// Starts a call: bind positional and named variables, then evaluate.
    #[must_use]
    pub fn bind(&self) -> Binding<'_> {
        Binding {
            expr: self,
            positional: Vec::new(),
            named: HashMap::new(),
        }
    }

    /// Evaluates with positional arguments only.
    ///
    /// # Errors
    ///
    /// See [`Binding::eval`].
    pub fn eval<I>(&self, args: I) -> Result<Value, EvalError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.bind().args(args).eval()
    }

    /// Runs the program against fully resolved variables.
    fn run(&self, vars: &HashMap<String, Value>) -> Result<Value, EvalError> {
        let mut stack: Vec<Value> = Vec::with_capacity(self.program.len());
        for term in &self.program {
            match term {
                Term::Value(v) => stack.push(*v),
                Term::Variable(name) => {
                    let v = vars.get(name).ok_or_else(|| EvalError::UndefinedVariable {
                        name: name.clone(),
                    })?;
                    stack.push(*v);
                }
                Term::Binary { op } => {
                    let def =
                        self.registry
                            .operator(op)
                            .ok_or_else(|| EvalError::UnknownOperator {
                                token: op.clone(),
                            })?;
                    let b = stack.pop().ok_or(EvalError::CorruptProgram)?;
                    let a = stack.pop().ok_or(EvalError::CorruptProgram)?;
                    stack.push((def.apply)(&[a, b])?);
                }
                Term::Unary { op } => {
                    let def = self.registry.unary_operator(op).ok_or_else(|| {
                        EvalError::UnknownOperator {
                            token: op.clone(),
                        }
                    })?;
                    let a = stack.pop().ok_or(EvalError::CorruptProgram)?;
                    stack.push((def.apply)(&[a])?);
                }
                Term::Call { function, argc } => {
                    let def = self.registry.function(function).ok_or_else(|| {
                        EvalError::UnknownOperator {
                            token: function.clone(),
                        }
                    })?;
                    if stack.len() < *argc {
                        return Err(EvalError::CorruptProgram);
                    }
                    let at = stack.len() - argc;
                    let args: SmallVec<[Value; 4]> = stack.drain(at..).collect();
                    stack.push((def.apply)(&args)?);
                }
            }
        }
        let result = stack.pop().ok_or(EvalError::CorruptProgram)?;
        if stack.is_empty() {
            Ok(result)
        } else {
            Err(EvalError::CorruptProgram)
        }
    }

    // === Rendering ===

    /// Renders the LaTeX form of the expression.
    #[must_use]
    pub fn latex(&self) -> String {
        render::latex(&self.registry, &self.program)
    }

    // === Composition ===

    /// Combines `self ⊕ rhs` under a registered binary operator.
    ///
    /// String operands parse against this expression's registry; expression
    /// operands merge argument order, used variables, and presets.
    ///
    /// # Errors
    ///
    /// Returns [`CombineError::UnknownOperator`] for unregistered tokens,
    /// [`CombineError::Parse`] for unparseable string operands, and
    /// [`CombineError::PresetConflict`] when both sides preset the same
    /// variable differently.
    pub fn try_combine(
        &self,
        op: &str,
        rhs: impl Into<Operand>,
    ) -> Result<Expression, CombineError> {
        self.combine_operand(op, rhs.into(), false)
    }

    /// Combines `lhs ⊕ self`, for value-on-the-left composition.
    ///
    /// # Errors
    ///
    /// Same as [`Expression::try_combine`].
    pub fn try_combine_rev(
        &self,
        op: &str,
        lhs: impl Into<Operand>,
    ) -> Result<Expression, CombineError> {
        self.combine_operand(op, lhs.into(), true)
    }

    fn combine_operand(
        &self,
        op: &str,
        other: Operand,
        reversed: bool,
    ) -> Result<Expression, CombineError> {
        if self.registry.operator(op).is_none() {
            return Err(CombineError::UnknownOperator {
                token: op.to_string(),
            });
        }
        let other = match other {
            Operand::Value(v) => {
                let mut carrier = self.empty_like();
                carrier.program.push(Term::Value(v));
                carrier
            }
            Operand::Expr(e) => e,
            Operand::Source(src) => {
                let compiled = compiler::compile(&self.registry, &src)?;
                Expression::from_compiled(Arc::clone(&self.registry), compiled, &[])
            }
        };
        let (lhs, rhs) = if reversed {
            (&other, self)
        } else {
            (self, &other)
        };

        let mut program =
            Vec::with_capacity(lhs.program.len() + rhs.program.len() + 1);
        program.extend_from_slice(&lhs.program);
        program.extend_from_slice(&rhs.program);
        program.push(Term::Binary { op: op.to_string() });

        let mut arg_order = lhs.arg_order.clone();
        for name in &rhs.arg_order {
            if !arg_order.contains(name) {
                arg_order.push(name.clone());
            }
        }
        let mut args_used = lhs.args_used.clone();
        args_used.extend(rhs.args_used.iter().cloned());

        let mut presets = lhs.presets.clone();
        for (name, value) in &rhs.presets {
            match presets.get(name) {
                Some(existing) if existing != value => {
                    return Err(CombineError::PresetConflict { name: name.clone() });
                }
                _ => {
                    presets.insert(name.clone(), *value);
                }
            }
        }

        Ok(Expression {
            registry: Arc::clone(&self.registry),
            program,
            arg_order,
            args_used,
            presets,
        })
    }

    /// Wraps the expression in a registered unary operator.
    ///
    /// # Errors
    ///
    /// Returns [`CombineError::UnknownUnary`] for unregistered tokens.
    pub fn apply_unary(&self, op: &str) -> Result<Expression, CombineError> {
        if self.registry.unary_operator(op).is_none() {
            return Err(CombineError::UnknownUnary {
                token: op.to_string(),
            });
        }
        let mut out = self.clone();
        out.program.push(Term::Unary { op: op.to_string() });
        Ok(out)
    }

    /// Wraps the expression in a single-argument function call,
    /// e.g. `expr.apply("abs")`.
    ///
    /// # Errors
    ///
    /// Returns [`CombineError::UnknownFunction`] for unregistered names and
    /// [`CombineError::NotSingleArgument`] when the function cannot take
    /// exactly one argument.
    pub fn apply(&self, function: &str) -> Result<Expression, CombineError> {
        let def = self
            .registry
            .function(function)
            .ok_or_else(|| CombineError::UnknownFunction {
                name: function.to_string(),
            })?;
        if !def.arity.accepts(1) {
            return Err(CombineError::NotSingleArgument {
                name: function.to_string(),
            });
        }
        let mut out = self.clone();
        out.program.push(Term::Call {
            function: function.to_string(),
            argc: 1,
        });
        Ok(out)
    }

    /// Raises the expression to a power, the composition analog of the `^`
    /// operator (Rust reserves `^` for xor).
    ///
    /// # Panics
    ///
    /// Panics when the operand is a string that fails to parse or when
    /// presets conflict; use [`Expression::try_combine`] with `"^"` for the
    /// fallible form.
    #[must_use]
    pub fn pow(&self, rhs: impl Into<Operand>) -> Expression {
        match self.try_combine("^", rhs) {
            Ok(e) => e,
            Err(err) => panic!("cannot combine expressions with `^`: {err}"),
        }
    }

    /// An expression with the same registry and no program, used as the
    /// carrier for value operands.
    fn empty_like(&self) -> Expression {
        Expression {
            registry: Arc::clone(&self.registry),
            program: Vec::new(),
            arg_order: Vec::new(),
            args_used: HashSet::new(),
            presets: HashMap::new(),
        }
    }
}

impl fmt::Display for Expression {
    /// The canonical form: fully parenthesized and re-parseable.
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "{}", render::canonical(&self.registry, &self.program))
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::parse(s)
    }
}

// Expressions compare by canonical form, so structurally identical programs
// are equal regardless of how they were built.
impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Expression {}

impl PartialOrd for Expression {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expression {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

/// A call in progress: positional and named bindings for one evaluation.
///
/// Created by [`Expression::bind`].
#[derive(Clone, Debug)]
pub struct Binding<'e> {
    expr: &'e Expression,
    positional: Vec<Value>,
    named: HashMap<String, Value>,
}

impl Binding<'_> {
    /// Appends one positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Appends several positional arguments.
    #[must_use]
    pub fn args<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.positional.extend(values.into_iter().map(Into::into));
        self
    }

    /// Binds a variable by name.
    #[must_use]
    pub fn var(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.named.insert(name.to_string(), value.into());
        self
    }

    /// Evaluates the expression.
    ///
    /// Binding layers shadow each other in this order, weakest first:
    /// registry constants, presets, positional arguments, named arguments.
    ///
    /// # Errors
    ///
    /// - [`EvalError::TooManyArguments`] when positional arguments exceed
    ///   the argument order
    /// - [`EvalError::DuplicateBinding`] when a variable is bound both
    ///   positionally and by name
    /// - [`EvalError::UndefinedVariable`] when a used variable stays unbound
    /// - whatever the operators themselves raise (division by zero, domain
    ///   errors)
    pub fn eval(self) -> Result<Value, EvalError> {
        let expr = self.expr;
        if self.positional.len() > expr.arg_order.len() {
            return Err(EvalError::TooManyArguments {
                max: expr.arg_order.len(),
                got: self.positional.len(),
            });
        }

        let mut vars: HashMap<String, Value> =
            HashMap::with_capacity(expr.args_used.len() + self.named.len());
        for name in &expr.args_used {
            if let Some(value) = expr.registry.constant(name) {
                vars.insert(name.clone(), *value);
            }
        }
        for (name, value) in &expr.presets {
            vars.insert(name.clone(), *value);
        }
        for (name, value) in expr.arg_order.iter().zip(&self.positional) {
            if self.named.contains_key(name) {
                return Err(EvalError::DuplicateBinding { name: name.clone() });
            }
            vars.insert(name.clone(), *value);
        }
        for (name, value) in self.named {
            vars.insert(name, value);
        }

        // Deterministic order for the error message: positional order.
        for name in expr.variables() {
            if !vars.contains_key(name) {
                return Err(EvalError::UndefinedVariable {
                    name: name.to_string(),
                });
            }
        }

        expr.run(&vars)
    }
}

// === Operator sugar ===
//
// The operator impls panic where `try_combine` would error (unparseable
// string operands, preset conflicts); the fallible API is `try_combine`,
// `try_combine_rev`, `apply_unary`, and `apply`.

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $token:literal) => {
        impl<T: Into<Operand>> $trait<T> for Expression {
            type Output = Expression;

            fn $method(self, rhs: T) -> Expression {
                match self.try_combine($token, rhs) {
                    Ok(e) => e,
                    Err(err) => panic!("cannot combine expressions with `{}`: {err}", $token),
                }
            }
        }

        impl<T: Into<Operand>> $trait<T> for &Expression {
            type Output = Expression;

            fn $method(self, rhs: T) -> Expression {
                match self.try_combine($token, rhs) {
                    Ok(e) => e,
                    Err(err) => panic!("cannot combine expressions with `{}`: {err}", $token),
                }
            }
        }

        impl<T: Into<Operand>> $assign_trait<T> for Expression {
            fn $assign_method(&mut self, rhs: T) {
                let combined = match self.try_combine($token, rhs) {
                    Ok(e) => e,
                    Err(err) => panic!("cannot combine expressions with `{}`: {err}", $token),
                };
                *self = combined;
            }
        }
    };
}

impl_binary_op!(Add, add, AddAssign, add_assign, "+");
impl_binary_op!(Sub, sub, SubAssign, sub_assign, "-");
impl_binary_op!(Mul, mul, MulAssign, mul_assign, "*");
impl_binary_op!(Div, div, DivAssign, div_assign, "/");
impl_binary_op!(Rem, rem, RemAssign, rem_assign, "%");
impl_binary_op!(BitAnd, bitand, BitAndAssign, bitand_assign, "&");
impl_binary_op!(BitOr, bitor, BitOrAssign, bitor_assign, "|");
impl_binary_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, "</>");

macro_rules! impl_reverse_ops {
    ($ty:ty) => {
        impl Add<Expression> for $ty {
            type Output = Expression;
            fn add(self, rhs: Expression) -> Expression {
                rev_combine(&rhs, "+", self)
            }
        }
        impl Sub<Expression> for $ty {
            type Output = Expression;
            fn sub(self, rhs: Expression) -> Expression {
                rev_combine(&rhs, "-", self)
            }
        }
        impl Mul<Expression> for $ty {
            type Output = Expression;
            fn mul(self, rhs: Expression) -> Expression {
                rev_combine(&rhs, "*", self)
            }
        }
        impl Div<Expression> for $ty {
            type Output = Expression;
            fn div(self, rhs: Expression) -> Expression {
                rev_combine(&rhs, "/", self)
            }
        }
        impl Rem<Expression> for $ty {
            type Output = Expression;
            fn rem(self, rhs: Expression) -> Expression {
                rev_combine(&rhs, "%", self)
            }
        }
    };
}

impl_reverse_ops!(i64);
impl_reverse_ops!(f64);
impl_reverse_ops!(Complex64);

fn rev_combine(rhs: &Expression, op: &str, lhs: impl Into<Operand>) -> Expression {
    match rhs.try_combine_rev(op, lhs) {
        Ok(e) => e,
        Err(err) => panic!("cannot combine expressions with `{op}`: {err}"),
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        match self.apply_unary("-") {
            Ok(e) => e,
            Err(err) => panic!("cannot negate expression: {err}"),
        }
    }
}

impl Not for Expression {
    type Output = Expression;

    fn not(self) -> Expression {
        match self.apply_unary("!") {
            Ok(e) => e,
            Err(err) => panic!("cannot invert expression: {err}"),
        }
    }
}
