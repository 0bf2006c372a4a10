//! The standard deck: default operators, functions, and constants.
//!
//! Semantics follow the numeric tower in `equation-core`: real inputs stay
//! real wherever the result is real, and promote to complex where it is not
//! (`sqrt(-4)`, `ln(-1)`, `asin(2)`).

use std::sync::Arc;

use num_complex::Complex64;

use equation_core::{EvalError, Value};

use crate::def::{Arity, Assoc, NativeFn};
use crate::registry::Registry;

/// Builds the standard registry.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn standard() -> Registry {
    let mut r = Registry::empty();

    // Binary operators, loosest to tightest. `^` is right-associative; the
    // rest group left.
    let ops: &[(&str, &str, &str, u8, Assoc, NativeFn)] = &[
        ("|", "({0} | {1})", "\\left({0} \\vee {1}\\right)", 1, Assoc::Left, binary(Value::or)),
        ("</>", "({0} </> {1})", "\\left({0} \\oplus {1}\\right)", 1, Assoc::Left, binary(Value::xor)),
        ("&", "({0} & {1})", "\\left({0} \\wedge {1}\\right)", 2, Assoc::Left, binary(Value::and)),
        ("==", "({0} == {1})", "\\left({0} = {1}\\right)", 3, Assoc::Left, binary(Value::eq)),
        ("!=", "({0} != {1})", "\\left({0} \\neq {1}\\right)", 3, Assoc::Left, binary(Value::ne)),
        ("<", "({0} < {1})", "\\left({0} < {1}\\right)", 3, Assoc::Left, binary(Value::lt)),
        ("<=", "({0} <= {1})", "\\left({0} \\leq {1}\\right)", 3, Assoc::Left, binary(Value::le)),
        (">", "({0} > {1})", "\\left({0} > {1}\\right)", 3, Assoc::Left, binary(Value::gt)),
        (">=", "({0} >= {1})", "\\left({0} \\geq {1}\\right)", 3, Assoc::Left, binary(Value::ge)),
        ("+", "({0} + {1})", "\\left({0} + {1}\\right)", 4, Assoc::Left, binary(Value::add)),
        ("-", "({0} - {1})", "\\left({0} - {1}\\right)", 4, Assoc::Left, binary(Value::sub)),
        ("*", "({0} * {1})", "\\left({0} \\cdot {1}\\right)", 5, Assoc::Left, binary(Value::mul)),
        ("/", "({0} / {1})", "\\frac{{0}}{{1}}", 5, Assoc::Left, binary(Value::div)),
        ("%", "({0} % {1})", "\\left({0} \\bmod {1}\\right)", 5, Assoc::Left, binary(Value::rem)),
        ("^", "({0} ^ {1})", "{0}^{{1}}", 6, Assoc::Right, binary(Value::pow)),
    ];
    for (token, canonical, latex, prec, assoc, apply) in ops {
        r.add_operator(token, canonical, latex, *prec, *assoc, apply.clone())
            .expect("builtin operator tokens are valid");
    }

    let unary: &[(&str, &str, &str, NativeFn)] = &[
        ("-", "(-{0})", "-{0}", fn1(Value::neg)),
        ("!", "(!{0})", "\\neg\\left({0}\\right)", fn1(Value::not)),
    ];
    for (token, canonical, latex, apply) in unary {
        r.add_unary_operator(token, canonical, latex, apply.clone())
            .expect("builtin unary tokens are valid");
    }

    let one = Arity::Exact(1);
    let fns: &[(&str, &str, Arity, NativeFn)] = &[
        ("abs", "\\left|{0}\\right|", one.clone(), fn1(abs)),
        ("sign", "\\operatorname{sgn}\\left({0}\\right)", one.clone(), fn1(sign)),
        ("floor", "\\left\\lfloor{0}\\right\\rfloor", one.clone(), fn1(floor)),
        ("ceil", "\\left\\lceil{0}\\right\\rceil", one.clone(), fn1(ceil)),
        ("round", "\\operatorname{round}\\left({0}\\right)", one.clone(), fn1(round)),
        ("re", "\\Re\\left({0}\\right)", one.clone(), fn1(real_part)),
        ("im", "\\Im\\left({0}\\right)", one.clone(), fn1(imag_part)),
        ("sqrt", "\\sqrt{{0}}", one.clone(), fn1(sqrt)),
        ("exp", "e^{{0}}", one.clone(), fn1(exp)),
        ("ln", "\\ln\\left({0}\\right)", one.clone(), fn1(ln)),
        ("log", "\\log\\left({0}\\right)", Arity::OneOf(vec![1, 2]), Arc::new(log)),
        ("sin", "\\sin\\left({0}\\right)", one.clone(), fn1(sin)),
        ("cos", "\\cos\\left({0}\\right)", one.clone(), fn1(cos)),
        ("tan", "\\tan\\left({0}\\right)", one.clone(), fn1(tan)),
        ("asin", "\\arcsin\\left({0}\\right)", one.clone(), fn1(asin)),
        ("acos", "\\arccos\\left({0}\\right)", one.clone(), fn1(acos)),
        ("atan", "\\arctan\\left({0}\\right)", one.clone(), fn1(atan)),
        ("atan2", "\\operatorname{atan2}\\left({0}\\right)", Arity::Exact(2), Arc::new(atan2)),
        ("sinh", "\\sinh\\left({0}\\right)", one.clone(), fn1(sinh)),
        ("cosh", "\\cosh\\left({0}\\right)", one.clone(), fn1(cosh)),
        ("tanh", "\\tanh\\left({0}\\right)", one.clone(), fn1(tanh)),
        ("min", "\\min\\left({0}\\right)", Arity::AtLeast(1), Arc::new(min)),
        ("max", "\\max\\left({0}\\right)", Arity::AtLeast(1), Arc::new(max)),
    ];
    for (name, latex, arity, apply) in fns {
        r.add_function(name, latex, arity.clone(), apply.clone())
            .expect("builtin function names are valid");
    }

    let consts: &[(&str, Value)] = &[
        ("pi", Value::Float(std::f64::consts::PI)),
        ("e", Value::Float(std::f64::consts::E)),
        ("Inf", Value::Float(f64::INFINITY)),
        ("NaN", Value::Float(f64::NAN)),
        ("i", Value::imaginary_unit()),
        ("j", Value::imaginary_unit()),
    ];
    for (name, value) in consts {
        r.add_constant(name, *value)
            .expect("builtin constant names are valid");
    }

    r
}

// === Adapters ===

fn binary(f: fn(&Value, &Value) -> Result<Value, EvalError>) -> NativeFn {
    Arc::new(move |args: &[Value]| f(&args[0], &args[1]))
}

fn fn1(f: fn(&Value) -> Result<Value, EvalError>) -> NativeFn {
    Arc::new(move |args: &[Value]| f(&args[0]))
}

/// Applies the real or complex version of a function, staying real for real
/// input.
fn lift(v: &Value, real: fn(f64) -> f64, complex: fn(Complex64) -> Complex64) -> Value {
    match v.as_real() {
        Some(r) => Value::Float(real(r)),
        None => Value::from_complex(complex(v.as_complex())),
    }
}

/// Converts a finite float that lands on an integer back to `Integer`.
fn narrow(f: f64) -> Value {
    #[allow(clippy::cast_precision_loss)]
    if f.is_finite() && f.abs() < i64::MAX as f64 {
        // f is integral here in all callers (floor/ceil/round results).
        #[allow(clippy::cast_possible_truncation)]
        return Value::Integer(f as i64);
    }
    Value::Float(f)
}

// === Functions ===

fn abs(v: &Value) -> Result<Value, EvalError> {
    Ok(match v {
        Value::Integer(i) => match i.checked_abs() {
            Some(a) => Value::Integer(a),
            None => Value::Float((*i as f64).abs()),
        },
        Value::Float(f) => Value::Float(f.abs()),
        Value::Complex(c) => Value::Float(c.norm()),
    })
}

fn sign(v: &Value) -> Result<Value, EvalError> {
    match v {
        Value::Integer(i) => Ok(Value::Integer(i.signum())),
        Value::Float(f) if f.is_nan() => Ok(Value::Float(f64::NAN)),
        Value::Float(f) => {
            let s = if *f > 0.0 {
                1
            } else if *f < 0.0 {
                -1
            } else {
                0
            };
            Ok(Value::Integer(s))
        }
        Value::Complex(_) => Err(EvalError::domain("sign is undefined for complex values")),
    }
}

fn floor(v: &Value) -> Result<Value, EvalError> {
    round_like(v, f64::floor)
}

fn ceil(v: &Value) -> Result<Value, EvalError> {
    round_like(v, f64::ceil)
}

fn round(v: &Value) -> Result<Value, EvalError> {
    // Ties round to even.
    round_like(v, f64::round_ties_even)
}

fn round_like(v: &Value, f: fn(f64) -> f64) -> Result<Value, EvalError> {
    match v {
        Value::Integer(i) => Ok(Value::Integer(*i)),
        Value::Float(x) => Ok(narrow(f(*x))),
        Value::Complex(_) => Err(EvalError::domain(
            "floor/ceil/round are undefined for complex values",
        )),
    }
}

fn real_part(v: &Value) -> Result<Value, EvalError> {
    Ok(match v {
        Value::Integer(i) => Value::Integer(*i),
        Value::Float(f) => Value::Float(*f),
        Value::Complex(c) => Value::Float(c.re),
    })
}

fn imag_part(v: &Value) -> Result<Value, EvalError> {
    Ok(match v {
        Value::Integer(_) => Value::Integer(0),
        Value::Float(_) => Value::Float(0.0),
        Value::Complex(c) => Value::Float(c.im),
    })
}

fn sqrt(v: &Value) -> Result<Value, EvalError> {
    Ok(match v.as_real() {
        Some(r) if r >= 0.0 => Value::Float(r.sqrt()),
        _ => Value::from_complex(v.as_complex().sqrt()),
    })
}

fn exp(v: &Value) -> Result<Value, EvalError> {
    Ok(lift(v, f64::exp, Complex64::exp))
}

fn ln(v: &Value) -> Result<Value, EvalError> {
    ln_value(v)
}

fn ln_value(v: &Value) -> Result<Value, EvalError> {
    if v.is_zero() {
        return Err(EvalError::domain("logarithm of zero"));
    }
    Ok(match v.as_real() {
        Some(r) if r > 0.0 => Value::Float(r.ln()),
        _ => Value::from_complex(v.as_complex().ln()),
    })
}

/// `log(x)` is base 10; `log(x, b)` uses the explicit base.
fn log(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [x] => {
            let ln10 = Value::Float(std::f64::consts::LN_10);
            ln_value(x)?.div(&ln10)
        }
        [x, base] => ln_value(x)?.div(&ln_value(base)?),
        _ => Err(EvalError::CorruptProgram),
    }
}

fn sin(v: &Value) -> Result<Value, EvalError> {
    Ok(lift(v, f64::sin, Complex64::sin))
}

fn cos(v: &Value) -> Result<Value, EvalError> {
    Ok(lift(v, f64::cos, Complex64::cos))
}

fn tan(v: &Value) -> Result<Value, EvalError> {
    Ok(lift(v, f64::tan, Complex64::tan))
}

fn asin(v: &Value) -> Result<Value, EvalError> {
    Ok(match v.as_real() {
        Some(r) if (-1.0..=1.0).contains(&r) => Value::Float(r.asin()),
        _ => Value::from_complex(v.as_complex().asin()),
    })
}

fn acos(v: &Value) -> Result<Value, EvalError> {
    Ok(match v.as_real() {
        Some(r) if (-1.0..=1.0).contains(&r) => Value::Float(r.acos()),
        _ => Value::from_complex(v.as_complex().acos()),
    })
}

fn atan(v: &Value) -> Result<Value, EvalError> {
    Ok(lift(v, f64::atan, Complex64::atan))
}

fn atan2(args: &[Value]) -> Result<Value, EvalError> {
    match (args[0].as_real(), args[1].as_real()) {
        (Some(y), Some(x)) => Ok(Value::Float(y.atan2(x))),
        _ => Err(EvalError::domain("atan2 is undefined for complex values")),
    }
}

fn sinh(v: &Value) -> Result<Value, EvalError> {
    Ok(lift(v, f64::sinh, Complex64::sinh))
}

fn cosh(v: &Value) -> Result<Value, EvalError> {
    Ok(lift(v, f64::cosh, Complex64::cosh))
}

fn tanh(v: &Value) -> Result<Value, EvalError> {
    Ok(lift(v, f64::tanh, Complex64::tanh))
}

fn min(args: &[Value]) -> Result<Value, EvalError> {
    fold_extremum(args, Value::lt)
}

fn max(args: &[Value]) -> Result<Value, EvalError> {
    fold_extremum(args, Value::gt)
}

fn fold_extremum(
    args: &[Value],
    wins: fn(&Value, &Value) -> Result<Value, EvalError>,
) -> Result<Value, EvalError> {
    let (first, rest) = args.split_first().ok_or(EvalError::CorruptProgram)?;
    let mut best = *first;
    for candidate in rest {
        if wins(candidate, &best)?.is_truthy() {
            best = *candidate;
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn float(v: &Value) -> f64 {
        v.as_real().expect("expected a real value")
    }

    #[test]
    fn real_functions_stay_real() {
        assert_relative_eq!(float(&sqrt(&Value::Integer(9)).unwrap()), 3.0);
        assert_relative_eq!(float(&ln(&Value::Float(std::f64::consts::E)).unwrap()), 1.0);
        assert_relative_eq!(
            float(&sin(&Value::Float(std::f64::consts::FRAC_PI_2)).unwrap()),
            1.0
        );
    }

    #[test]
    fn out_of_domain_reals_promote_to_complex() {
        let r = sqrt(&Value::Integer(-4)).unwrap();
        match r {
            Value::Complex(c) => {
                assert_relative_eq!(c.re, 0.0);
                assert_relative_eq!(c.im, 2.0);
            }
            other => panic!("expected complex, got {other:?}"),
        }
        assert!(matches!(ln(&Value::Integer(-1)).unwrap(), Value::Complex(_)));
        assert!(matches!(asin(&Value::Integer(2)).unwrap(), Value::Complex(_)));
    }

    #[test]
    fn log_bases() {
        assert_relative_eq!(float(&log(&[Value::Integer(100)]).unwrap()), 2.0);
        assert_relative_eq!(
            float(&log(&[Value::Integer(8), Value::Integer(2)]).unwrap()),
            3.0
        );
        assert!(log(&[Value::Integer(0)]).is_err());
    }

    #[test]
    fn rounding_family() {
        assert_eq!(floor(&Value::Float(2.7)).unwrap(), Value::Integer(2));
        assert_eq!(ceil(&Value::Float(2.1)).unwrap(), Value::Integer(3));
        assert_eq!(round(&Value::Float(2.5)).unwrap(), Value::Integer(2));
        assert_eq!(round(&Value::Float(3.5)).unwrap(), Value::Integer(4));
        assert_eq!(floor(&Value::Integer(5)).unwrap(), Value::Integer(5));
    }

    #[test]
    fn complex_parts() {
        let z = Value::Complex(Complex64::new(3.0, -4.0));
        assert_eq!(abs(&z).unwrap(), Value::Float(5.0));
        assert_eq!(real_part(&z).unwrap(), Value::Float(3.0));
        assert_eq!(imag_part(&z).unwrap(), Value::Float(-4.0));
        assert_eq!(imag_part(&Value::Integer(7)).unwrap(), Value::Integer(0));
    }

    #[test]
    fn extrema_are_variadic() {
        let args = [Value::Integer(3), Value::Float(1.5), Value::Integer(2)];
        assert_eq!(min(&args).unwrap(), Value::Float(1.5));
        assert_eq!(max(&args).unwrap(), Value::Integer(3));
        assert!(min(&[Value::imaginary_unit(), Value::Integer(1)]).is_err());
    }

    #[test]
    fn sign_values() {
        assert_eq!(sign(&Value::Integer(-3)).unwrap(), Value::Integer(-1));
        assert_eq!(sign(&Value::Float(0.0)).unwrap(), Value::Integer(0));
        assert_eq!(sign(&Value::Float(2.5)).unwrap(), Value::Integer(1));
    }
}
