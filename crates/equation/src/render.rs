//! Rendering compiled programs back to text.
//!
//! Two renderings exist:
//! - **canonical**: fully parenthesized, re-parses to an equivalent program
//! - **LaTeX**: display form, with scientific notation for floats
//!
//! Both walk the postfix program with a string stack, mirroring the
//! evaluator, so rendering never recurses either.

use equation_core::{Term, Value};
use equation_registry::Registry;

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Canonical,
    Latex,
}

/// Renders the canonical, re-parseable form.
pub(crate) fn canonical(registry: &Registry, program: &[Term]) -> String {
    render(registry, program, Mode::Canonical)
}

/// Renders the LaTeX form.
pub(crate) fn latex(registry: &Registry, program: &[Term]) -> String {
    render(registry, program, Mode::Latex)
}

fn render(registry: &Registry, program: &[Term], mode: Mode) -> String {
    let mut stack: Vec<String> = Vec::new();
    for term in program {
        match term {
            Term::Value(value) => stack.push(match mode {
                Mode::Canonical => value.to_string(),
                Mode::Latex => latex_value(value),
            }),
            Term::Variable(name) => stack.push(name.clone()),
            Term::Binary { op } => {
                let b = stack.pop().unwrap_or_default();
                let a = stack.pop().unwrap_or_default();
                let rendered = match (registry.operator(op), mode) {
                    (Some(def), Mode::Canonical) => fill(&def.canonical, &[a, b]),
                    (Some(def), Mode::Latex) => fill(&def.latex, &[a, b]),
                    // Cross-registry program: fall back to a neutral form.
                    (None, _) => format!("({a} {op} {b})"),
                };
                stack.push(rendered);
            }
            Term::Unary { op } => {
                let a = stack.pop().unwrap_or_default();
                let rendered = match (registry.unary_operator(op), mode) {
                    (Some(def), Mode::Canonical) => fill(&def.canonical, &[a]),
                    (Some(def), Mode::Latex) => fill(&def.latex, &[a]),
                    (None, _) => format!("({op}{a})"),
                };
                stack.push(rendered);
            }
            Term::Call { function, argc } => {
                let at = stack.len().saturating_sub(*argc);
                let joined = stack.split_off(at).join(",");
                let rendered = match (registry.function(function), mode) {
                    (_, Mode::Canonical) | (None, _) => format!("{function}({joined})"),
                    (Some(def), Mode::Latex) => fill(&def.latex, &[joined]),
                };
                stack.push(rendered);
            }
        }
    }
    stack.pop().unwrap_or_default()
}

/// Substitutes `{0}`, `{1}`, ... in a format template.
///
/// Only the template's own placeholders are touched; braces inside already
/// rendered arguments (LaTeX superscripts and the like) pass through
/// untouched, which is why this is not a naive `str::replace`.
fn fill(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(close) = template[i..].find('}') {
                if let Ok(index) = template[i + 1..i + close].parse::<usize>() {
                    if let Some(arg) = args.get(index) {
                        out.push_str(arg);
                        i += close + 1;
                        continue;
                    }
                }
            }
        }
        // Advance one full character to stay UTF-8 safe.
        let step = template[i..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        out.push_str(&template[i..i + step]);
        i += step;
    }
    out
}

// === LaTeX number formatting ===

fn latex_value(value: &Value) -> String {
    match value {
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => latex_float(*f),
        Value::Complex(c) => {
            let re = latex_part(c.re, false);
            let im = latex_part(c.im, true);
            format!("\\left({re}{im}\\right)")
        }
    }
}

fn latex_float(f: f64) -> String {
    if f.is_nan() {
        return "\\mathrm{NaN}".to_string();
    }
    if f.is_infinite() {
        return if f < 0.0 { "-\\infty" } else { "\\infty" }.to_string();
    }
    let (mantissa, exponent) = sci_parts(f);
    if exponent == 0 {
        mantissa
    } else {
        format!("\\left({mantissa}\\times10^{{{exponent}}}\\right)")
    }
}

/// One component of a complex number; the imaginary part carries a forced
/// sign and the `\imath` marker before any exponent, matching the layout
/// `\left(3+2\imath\times10^{4}\right)`.
fn latex_part(v: f64, imaginary: bool) -> String {
    let (mantissa, exponent) = if v.is_finite() {
        sci_parts(v.abs())
    } else if v.is_nan() {
        ("\\mathrm{NaN}".to_string(), 0)
    } else {
        ("\\infty".to_string(), 0)
    };
    let sign = if v.is_sign_negative() {
        "-"
    } else if imaginary {
        "+"
    } else {
        ""
    };
    let marker = if imaginary { "\\imath" } else { "" };
    if exponent == 0 {
        format!("{sign}{mantissa}{marker}")
    } else {
        format!("{sign}{mantissa}{marker}\\times10^{{{exponent}}}")
    }
}

/// Splits a finite float into a display mantissa and a power-of-ten
/// exponent. Values with small exponents print plainly; the mantissa keeps
/// at most five decimals, trailing zeros trimmed.
fn sci_parts(v: f64) -> (String, i32) {
    if v == 0.0 {
        return ("0".to_string(), 0);
    }
    #[allow(clippy::cast_possible_truncation)]
    let exponent = v.abs().log10().floor() as i32;
    // Small integral values and short near-unit decimals print as-is.
    if (0..=3).contains(&exponent) && v.fract() == 0.0 {
        return (format!("{v:.0}"), 0);
    }
    if (-2..=-1).contains(&exponent) && format!("{v}").len() <= 7 {
        return (format!("{v}"), 0);
    }
    let mantissa = v * 10f64.powi(-exponent);
    let mut text = format!("{mantissa:.5}");
    if text.contains('.') {
        text = text
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string();
    }
    (text, exponent)
}
