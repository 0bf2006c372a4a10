//! The runtime numeric tower.
//!
//! Every expression evaluates to a [`Value`]: a machine integer, a double,
//! or a complex double. Arithmetic promotes upward through that tower and
//! stays exact in `i64` for as long as it can.

use std::cmp::Ordering;
use std::fmt;

use num_complex::Complex64;
use num_traits::Zero;

use crate::error::EvalError;

/// A scalar produced or consumed by expression evaluation.
///
/// Promotion rules:
/// - integer ⊕ integer stays an integer where the result is representable;
///   on `i64` overflow the operation is redone in `f64`,
/// - any `Float` operand promotes the result to `Float`,
/// - any `Complex` operand promotes the result to `Complex`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    /// A 64-bit signed integer.
    Integer(i64),
    /// A 64-bit float.
    Float(f64),
    /// A complex number with `f64` components.
    Complex(Complex64),
}

impl Value {
    /// The imaginary unit.
    #[must_use]
    pub fn imaginary_unit() -> Self {
        Value::Complex(Complex64::new(0.0, 1.0))
    }

    /// Returns true if this value is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Integer(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Complex(c) => c.is_zero(),
        }
    }

    /// Returns true if this value counts as "true" for the logical operators.
    ///
    /// Anything non-zero is truthy; `NaN` is truthy (it is not zero).
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !self.is_zero()
    }

    /// Returns the value as a real `f64`, or `None` for complex values.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Complex(_) => None,
        }
    }

    /// Returns the value widened to a complex number.
    #[must_use]
    pub fn as_complex(&self) -> Complex64 {
        match self {
            Value::Integer(i) => Complex64::new(*i as f64, 0.0),
            Value::Float(f) => Complex64::new(*f, 0.0),
            Value::Complex(c) => *c,
        }
    }

    /// Narrows a complex result back to `Float` when its imaginary part is
    /// exactly zero.
    #[must_use]
    pub fn from_complex(c: Complex64) -> Self {
        if c.im == 0.0 {
            Value::Float(c.re)
        } else {
            Value::Complex(c)
        }
    }

    // === Arithmetic ===

    /// Adds two values.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` keeps the signature uniform with the other
    /// operator entry points.
    pub fn add(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(self.promote_binary(other, i64::checked_add, |a, b| a + b, |a, b| a + b))
    }

    /// Subtracts `other` from `self`.
    ///
    /// # Errors
    ///
    /// Never fails; see [`Value::add`].
    pub fn sub(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(self.promote_binary(other, i64::checked_sub, |a, b| a - b, |a, b| a - b))
    }

    /// Multiplies two values.
    ///
    /// # Errors
    ///
    /// Never fails; see [`Value::add`].
    pub fn mul(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(self.promote_binary(other, i64::checked_mul, |a, b| a * b, |a, b| a * b))
    }

    /// True division. Integer ÷ integer yields a `Float`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::DivisionByZero`] when `other` is exactly zero.
    pub fn div(&self, other: &Value) -> Result<Value, EvalError> {
        if other.is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        match (self.as_real(), other.as_real()) {
            (Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => Ok(Value::from_complex(self.as_complex() / other.as_complex())),
        }
    }

    /// Modulo with the sign of the divisor (`-7 % 3 == 2`).
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::DivisionByZero`] for a zero divisor and a domain
    /// error for complex operands.
    pub fn rem(&self, other: &Value) -> Result<Value, EvalError> {
        if other.is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => {
                // checked_rem is None only for i64::MIN % -1, which is 0.
                let r = a.checked_rem(*b).unwrap_or(0);
                let r = if r != 0 && (r < 0) != (*b < 0) { r + b } else { r };
                Ok(Value::Integer(r))
            }
            (Value::Complex(_), _) | (_, Value::Complex(_)) => {
                Err(EvalError::domain("modulo is undefined for complex values"))
            }
            _ => {
                let (a, b) = (self.to_f64(), other.to_f64());
                let r = a % b;
                let r = if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r };
                Ok(Value::Float(r))
            }
        }
    }

    /// Raises `self` to the power `other`.
    ///
    /// Integer ^ non-negative integer stays an integer while representable.
    /// A negative real base with a non-integral exponent promotes to complex.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::DivisionByZero`] for a zero base raised to a
    /// negative real power (`0 ^ -1` is an implicit division).
    pub fn pow(&self, other: &Value) -> Result<Value, EvalError> {
        if self.is_zero() && other.as_real().is_some_and(|b| b < 0.0) {
            return Err(EvalError::DivisionByZero);
        }
        if let (Value::Integer(a), Value::Integer(b)) = (self, other) {
            if *b >= 0 {
                if let Ok(e) = u32::try_from(*b) {
                    if let Some(v) = a.checked_pow(e) {
                        return Ok(Value::Integer(v));
                    }
                }
            }
        }
        match (self.as_real(), other.as_real()) {
            (Some(a), Some(b)) => {
                if a < 0.0 && b.fract() != 0.0 {
                    Ok(Value::from_complex(Complex64::new(a, 0.0).powc(Complex64::new(b, 0.0))))
                } else {
                    Ok(Value::Float(a.powf(b)))
                }
            }
            _ => Ok(Value::from_complex(self.as_complex().powc(other.as_complex()))),
        }
    }

    /// Arithmetic negation.
    ///
    /// # Errors
    ///
    /// Never fails; see [`Value::add`].
    pub fn neg(&self) -> Result<Value, EvalError> {
        Ok(match self {
            Value::Integer(i) => match i.checked_neg() {
                Some(v) => Value::Integer(v),
                None => Value::Float(-(*i as f64)),
            },
            Value::Float(f) => Value::Float(-f),
            Value::Complex(c) => Value::Complex(-c),
        })
    }

    // === Comparison ===

    /// Numeric equality across the whole tower (`1 == 1.0 == 1+0i`).
    ///
    /// # Errors
    ///
    /// Never fails; see [`Value::add`].
    pub fn eq(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::from_bool(self.numeric_eq(other)))
    }

    /// Numeric inequality.
    ///
    /// # Errors
    ///
    /// Never fails; see [`Value::add`].
    pub fn ne(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::from_bool(!self.numeric_eq(other)))
    }

    /// Strictly-less-than, `0` or `1`.
    ///
    /// # Errors
    ///
    /// Returns a domain error when either operand is complex.
    pub fn lt(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::from_bool(self.order(other)? == Some(Ordering::Less)))
    }

    /// Less-than-or-equal, `0` or `1`.
    ///
    /// # Errors
    ///
    /// Returns a domain error when either operand is complex.
    pub fn le(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::from_bool(matches!(
            self.order(other)?,
            Some(Ordering::Less | Ordering::Equal)
        )))
    }

    /// Strictly-greater-than, `0` or `1`.
    ///
    /// # Errors
    ///
    /// Returns a domain error when either operand is complex.
    pub fn gt(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::from_bool(self.order(other)? == Some(Ordering::Greater)))
    }

    /// Greater-than-or-equal, `0` or `1`.
    ///
    /// # Errors
    ///
    /// Returns a domain error when either operand is complex.
    pub fn ge(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::from_bool(matches!(
            self.order(other)?,
            Some(Ordering::Greater | Ordering::Equal)
        )))
    }

    // === Logic ===

    /// Logical conjunction on truthiness, `0` or `1`.
    ///
    /// # Errors
    ///
    /// Never fails; see [`Value::add`].
    pub fn and(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::from_bool(self.is_truthy() && other.is_truthy()))
    }

    /// Logical disjunction on truthiness, `0` or `1`.
    ///
    /// # Errors
    ///
    /// Never fails; see [`Value::add`].
    pub fn or(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::from_bool(self.is_truthy() || other.is_truthy()))
    }

    /// Logical exclusive-or on truthiness, `0` or `1`.
    ///
    /// # Errors
    ///
    /// Never fails; see [`Value::add`].
    pub fn xor(&self, other: &Value) -> Result<Value, EvalError> {
        Ok(Value::from_bool(self.is_truthy() != other.is_truthy()))
    }

    /// Logical negation, `0` or `1`.
    ///
    /// # Errors
    ///
    /// Never fails; see [`Value::add`].
    pub fn not(&self) -> Result<Value, EvalError> {
        Ok(Value::from_bool(!self.is_truthy()))
    }

    // === Helpers ===

    fn from_bool(b: bool) -> Value {
        Value::Integer(i64::from(b))
    }

    fn to_f64(self) -> f64 {
        match self {
            Value::Integer(i) => i as f64,
            Value::Float(f) => f,
            Value::Complex(c) => c.re,
        }
    }

    fn numeric_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            _ => self.as_complex() == other.as_complex(),
        }
    }

    fn order(&self, other: &Value) -> Result<Option<Ordering>, EvalError> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Some(a.cmp(b))),
            (Value::Complex(_), _) | (_, Value::Complex(_)) => Err(EvalError::domain(
                "ordering comparisons are undefined for complex values",
            )),
            _ => Ok(self.to_f64().partial_cmp(&other.to_f64())),
        }
    }

    fn promote_binary(
        &self,
        other: &Value,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
        complex_op: fn(Complex64, Complex64) -> Complex64,
    ) -> Value {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => match int_op(*a, *b) {
                Some(v) => Value::Integer(v),
                None => Value::Float(float_op(*a as f64, *b as f64)),
            },
            (Value::Complex(_), _) | (_, Value::Complex(_)) => {
                Value::from_complex(complex_op(self.as_complex(), other.as_complex()))
            }
            _ => Value::Float(float_op(self.to_f64(), other.to_f64())),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Complex64> for Value {
    fn from(v: Complex64) -> Self {
        Value::Complex(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::from_bool(v)
    }
}

/// Formats a float so the lexer reads it back as a `Float`, never an
/// `Integer`: integral values carry a trailing `.0`, values outside the
/// plain-decimal range use exponent notation.
fn fmt_float(f: f64, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    if f.is_nan() {
        write!(out, "NaN")
    } else if f.is_infinite() {
        write!(out, "{}Inf", if f < 0.0 { "-" } else { "" })
    } else if f == f.trunc() && f.abs() < 1e16 {
        write!(out, "{f:.1}")
    } else if f != 0.0 && !(1e-4..1e16).contains(&f.abs()) {
        write!(out, "{f:e}")
    } else {
        write!(out, "{f}")
    }
}

impl fmt::Display for Value {
    /// The canonical form: a string the lexer reads back as this value
    /// (for finite numbers; infinities and `NaN` render as the standard
    /// constants of the same name).
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(out, "{i}"),
            Value::Float(f) => fmt_float(*f, out),
            Value::Complex(c) => {
                write!(out, "(")?;
                fmt_float(c.re, out)?;
                write!(out, "{}", if c.im.is_sign_negative() { "-" } else { "+" })?;
                fmt_float(c.im.abs(), out)?;
                write!(out, "i)")
            }
        }
    }
}
