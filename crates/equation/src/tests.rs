//! End-to-end tests: parse, evaluate, render, compose.

use std::sync::Arc;

use approx::assert_relative_eq;

use crate::{
    standard_registry, Assoc, Complex64, EvalError, Expression, ParseError, Registry, Value,
};

fn eval_str(src: &str) -> Value {
    Expression::parse(src)
        .unwrap_or_else(|err| panic!("parse {src:?}: {err}"))
        .bind()
        .eval()
        .unwrap_or_else(|err| panic!("eval {src:?}: {err}"))
}

fn real(src: &str) -> f64 {
    eval_str(src)
        .as_real()
        .unwrap_or_else(|| panic!("{src:?} did not evaluate to a real"))
}

#[test]
fn precedence_and_grouping() {
    assert_eq!(eval_str("1 + 2 * 3"), Value::Integer(7));
    assert_eq!(eval_str("(1 + 2) * 3"), Value::Integer(9));
    assert_eq!(eval_str("2 * 3 ^ 2"), Value::Integer(18));
    assert_eq!(eval_str("1 < 2 & 3 < 2"), Value::Integer(0));
    assert_eq!(eval_str("1 < 2 | 3 < 2"), Value::Integer(1));
}

#[test]
fn power_is_right_associative() {
    assert_eq!(eval_str("2 ^ 3 ^ 2"), Value::Integer(512));
}

#[test]
fn unary_binds_tighter_than_power() {
    let square = Expression::parse("-x^2").unwrap();
    let v = square.bind().var("x", 3).eval().unwrap();
    assert_eq!(v, Value::Integer(9));
    assert_eq!(eval_str("0 - 2^2"), Value::Integer(-4));
}

#[test]
fn division_is_true_division() {
    assert_eq!(eval_str("7 / 2"), Value::Float(3.5));
    assert_eq!(
        Expression::parse("1 / 0").unwrap().bind().eval(),
        Err(EvalError::DivisionByZero)
    );
}

#[test]
fn modulo_follows_divisor_sign() {
    assert_eq!(eval_str("-7 % 3"), Value::Integer(2));
    assert_eq!(eval_str("7 % -3"), Value::Integer(-2));
}

#[test]
fn integer_overflow_promotes_to_float() {
    let v = eval_str("9223372036854775807 + 1");
    assert!(matches!(v, Value::Float(_)));
}

#[test]
fn complex_literals() {
    assert_eq!(
        eval_str("1+2i"),
        Value::Complex(Complex64::new(1.0, 2.0))
    );
    assert_eq!(
        eval_str("1.5-0.5j"),
        Value::Complex(Complex64::new(1.5, -0.5))
    );
    // `i` on its own is the constant, not a literal suffix.
    assert_eq!(eval_str("2 * i"), Value::Complex(Complex64::new(0.0, 2.0)));
}

#[test]
fn square_root_of_negative_promotes() {
    match eval_str("(0 - 4) ^ 0.5") {
        Value::Complex(c) => {
            assert_relative_eq!(c.re, 0.0, epsilon = 1e-12);
            assert_relative_eq!(c.im, 2.0, epsilon = 1e-12);
        }
        other => panic!("expected complex, got {other:?}"),
    }
}

#[test]
fn positional_and_named_bindings() {
    let f = Expression::parse("x + 10 * y").unwrap();
    assert!(f.contains("x") && f.contains("y"));
    assert!(!f.contains("z"));
    assert_eq!(f.eval([1, 2]).unwrap(), Value::Integer(21));
    assert_eq!(
        f.bind().var("y", 1).var("x", 5).eval().unwrap(),
        Value::Integer(15)
    );
    assert_eq!(
        f.bind().arg(3).var("y", 0).eval().unwrap(),
        Value::Integer(3)
    );
}

#[test]
fn binding_errors() {
    let f = Expression::parse("x + y").unwrap();
    assert_eq!(
        f.eval([1, 2, 3]),
        Err(EvalError::TooManyArguments { max: 2, got: 3 })
    );
    assert_eq!(
        f.bind().arg(1).var("x", 2).var("y", 3).eval(),
        Err(EvalError::DuplicateBinding {
            name: "x".to_string()
        })
    );
    assert_eq!(
        f.bind().var("x", 1).eval(),
        Err(EvalError::UndefinedVariable {
            name: "y".to_string()
        })
    );
}

#[test]
fn explicit_argument_order() {
    let f = Expression::parse_ordered("x + 10 * y", &["y"]).unwrap();
    assert_eq!(f.eval([2, 1]).unwrap(), Value::Integer(21));
    assert_eq!(f.arg_order(), ["y".to_string(), "x".to_string()]);
}

#[test]
fn constants_resolve_and_are_shadowable() {
    assert_relative_eq!(real("sin(pi / 2)"), 1.0);
    let f = Expression::parse("pi").unwrap();
    assert_eq!(
        f.bind().var("pi", 3).eval().unwrap(),
        Value::Integer(3)
    );
}

#[test]
fn presets_shadow_constants_and_yield_to_bindings() {
    let mut f = Expression::parse("e + x").unwrap();
    f.set_preset("e", 0).unwrap();
    assert_eq!(f.bind().var("x", 1).eval().unwrap(), Value::Integer(1));
    assert_eq!(
        f.bind().var("x", 1).var("e", 10).eval().unwrap(),
        Value::Integer(11)
    );
    f.clear_preset("e").unwrap();
    assert_relative_eq!(
        f.bind()
            .var("x", 0)
            .eval()
            .unwrap()
            .as_real()
            .unwrap(),
        std::f64::consts::E
    );
    assert!(f.set_preset("nope", 1).is_err());
}

#[test]
fn function_calls() {
    assert_relative_eq!(real("log(100)"), 2.0);
    assert_relative_eq!(real("log(8, 2)"), 3.0);
    assert_relative_eq!(real("atan2(1, 1)"), std::f64::consts::FRAC_PI_4);
    assert_eq!(eval_str("max(1, 2.5, 2)"), Value::Float(2.5));
    assert_eq!(eval_str("min(3)"), Value::Integer(3));
    assert_eq!(eval_str("abs(0 - 5)"), Value::Integer(5));
}

#[test]
fn parse_errors() {
    assert_eq!(Expression::parse(""), Err(ParseError::Empty));
    assert!(matches!(
        Expression::parse("(1 + 2"),
        Err(ParseError::UnbalancedOpen)
    ));
    assert!(matches!(
        Expression::parse("1 + 2)"),
        Err(ParseError::UnbalancedClose)
    ));
    assert!(matches!(
        Expression::parse("sin(1, 2)"),
        Err(ParseError::FunctionArity { .. })
    ));
    assert!(matches!(
        Expression::parse("x(1)"),
        Err(ParseError::UnknownFunction { .. })
    ));
    assert!(matches!(
        Expression::parse("1 ? 2"),
        Err(ParseError::UnknownToken { .. })
    ));
    assert!(matches!(
        Expression::parse("1, 2"),
        Err(ParseError::SeparatorOutsideCall)
    ));
}

#[test]
fn canonical_display_reparses() {
    for src in [
        "1 + 2 * x",
        "-x ^ 2",
        "sin(x) / cos(y)",
        "max(a, b, 3)",
        "(x == y) | (x < 1+2i)",
    ] {
        let first = Expression::parse(src).unwrap();
        let second = Expression::parse(&first.to_string()).unwrap();
        assert_eq!(first.rpn(), second.rpn(), "round trip of {src:?}");
    }
    assert_eq!(
        Expression::parse("1 + 2 * x").unwrap().to_string(),
        "(1 + (2 * x))"
    );
}

#[test]
fn latex_rendering() {
    assert_eq!(Expression::parse("x / 2").unwrap().latex(), "\\frac{x}{2}");
    assert_eq!(Expression::parse("x ^ 2").unwrap().latex(), "x^{2}");
    assert_eq!(
        Expression::parse("sqrt(x + 1)").unwrap().latex(),
        "\\sqrt{\\left(x + 1\\right)}"
    );
}

#[test]
fn expressions_compose_with_operators() {
    let x = Expression::parse("x").unwrap();
    let y = Expression::parse("y").unwrap();

    let sum = &x + &y;
    assert_eq!(sum.to_string(), "(x + y)");
    assert_eq!(sum.eval([2, 3]).unwrap(), Value::Integer(5));

    let poly = x.pow(2) + 2 * Expression::parse("x").unwrap() + 1;
    assert_eq!(poly.bind().var("x", 3).eval().unwrap(), Value::Integer(16));

    let halved = Expression::parse("x").unwrap() / 2.0;
    assert_eq!(halved.eval([5]).unwrap(), Value::Float(2.5));

    let negated = -Expression::parse("x + 1").unwrap();
    assert_eq!(negated.eval([4]).unwrap(), Value::Integer(-5));
}

#[test]
fn string_operands_parse_in_place() {
    let f = Expression::parse("x").unwrap();
    let g = f.try_combine("+", "y ^ 2").unwrap();
    assert_eq!(g.eval([1, 3]).unwrap(), Value::Integer(10));
    assert!(f.try_combine("+", "y +").is_err());
}

#[test]
fn composition_merges_argument_order() {
    let f = Expression::parse("x + y").unwrap();
    let g = Expression::parse("y * z").unwrap();
    let h = &f + &g;
    let names: Vec<&str> = h.variables().collect();
    assert_eq!(names, ["x", "y", "z"]);
    assert_eq!(h.eval([1, 2, 3]).unwrap(), Value::Integer(9));
}

#[test]
fn composition_rejects_conflicting_presets() {
    let mut f = Expression::parse("x + 0").unwrap();
    let mut g = Expression::parse("x * 1").unwrap();
    f.set_preset("x", 1).unwrap();
    g.set_preset("x", 2).unwrap();
    assert!(matches!(
        f.try_combine("+", &g),
        Err(crate::CombineError::PresetConflict { .. })
    ));
    g.set_preset("x", 1).unwrap();
    let merged = f.try_combine("+", &g).unwrap();
    assert_eq!(merged.bind().eval().unwrap(), Value::Integer(2));
}

#[test]
fn function_application() {
    let f = Expression::parse("x - 3").unwrap();
    let g = f.apply("abs").unwrap();
    assert_eq!(g.eval([1]).unwrap(), Value::Integer(2));
    assert!(f.apply("atan2").is_err());
    assert!(f.apply("nope").is_err());
}

#[test]
fn equality_is_canonical() {
    let parsed = Expression::parse("x + 1").unwrap();
    let composed = Expression::parse("x").unwrap() + 1;
    assert_eq!(parsed, composed);
    assert_ne!(parsed, Expression::parse("1 + x").unwrap());
}

#[test]
fn from_str_round_trip() {
    let f: Expression = "2 * x".parse().unwrap();
    assert_eq!(f.eval([4]).unwrap(), Value::Integer(8));
    assert!("".parse::<Expression>().is_err());
}

#[test]
fn custom_registry() {
    let mut r = Registry::empty();
    r.add_operator(
        "@",
        "({0} @ {1})",
        "\\left({0} \\mathbin{@} {1}\\right)",
        4,
        Assoc::Left,
        Arc::new(|args: &[Value]| {
            let two = Value::Integer(2);
            args[0].add(&args[1])?.div(&two)
        }),
    )
    .unwrap();
    let f = Expression::parse_with(Arc::new(r), "1 @ 3").unwrap();
    assert_eq!(f.bind().eval().unwrap(), Value::Float(2.0));
    // `@` means nothing to the standard deck.
    assert!(Expression::parse("1 @ 3").is_err());
}

#[test]
fn cross_registry_programs_fail_at_eval_not_render() {
    let mut r = Registry::empty();
    r.add_operator(
        "@",
        "({0} @ {1})",
        "\\left({0} \\mathbin{@} {1}\\right)",
        4,
        Assoc::Left,
        Arc::new(|args: &[Value]| args[0].add(&args[1])),
    )
    .unwrap();
    let custom = Expression::parse_with(Arc::new(r), "1 @ 3").unwrap();

    // The merged expression keeps the left side's registry, which has no
    // idea what `@` means.
    let merged = Expression::parse("x").unwrap().try_combine("+", &custom).unwrap();
    assert_eq!(
        merged.bind().var("x", 1).eval(),
        Err(EvalError::UnknownOperator {
            token: "@".to_string()
        })
    );
    // Rendering still works through the neutral fallback form.
    assert_eq!(merged.to_string(), "(x + (1 @ 3))");
}

#[test]
fn complex_values_compose_on_the_left() {
    let shifted = Complex64::new(0.0, 1.0) + Expression::parse("x").unwrap();
    assert_eq!(
        shifted.eval([1]).unwrap(),
        Value::Complex(Complex64::new(1.0, 1.0))
    );
    let scaled = Complex64::new(2.0, 0.0) * Expression::parse("x").unwrap();
    assert_eq!(scaled.eval([3]).unwrap(), Value::Float(6.0));
}

#[test]
fn standard_registry_is_shared() {
    let a = standard_registry();
    let b = standard_registry();
    assert!(Arc::ptr_eq(&a, &b));
}
