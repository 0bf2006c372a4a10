//! Benchmarks for the expression pipeline.
//!
//! Includes:
//! - Compiling infix source of increasing size
//! - Repeated evaluation of a compiled expression
//! - Rendering the canonical and LaTeX forms

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use equation::Expression;

/// Builds `x + x*x + x*x*x + ...` with `terms` products.
fn chained_source(terms: usize) -> String {
    let mut src = String::from("x");
    for n in 2..=terms {
        src.push_str(" + ");
        src.push('x');
        for _ in 1..n {
            src.push_str(" * x");
        }
    }
    src
}

/// Benchmark compilation.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for terms in [1, 8, 32] {
        let src = chained_source(terms);
        group.bench_with_input(BenchmarkId::from_parameter(terms), &src, |b, src| {
            b.iter(|| black_box(Expression::parse(src).unwrap()))
        });
    }

    group.bench_function("mixed_grammar", |b| {
        b.iter(|| {
            black_box(
                Expression::parse("sin(x)^2 + cos(x)^2 - log(abs(x) + 1, 2) * (1+2i)")
                    .unwrap(),
            )
        })
    });

    group.finish();
}

/// Benchmark evaluation of compiled expressions.
fn bench_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval");

    let poly = Expression::parse(&chained_source(8)).unwrap();
    group.bench_function("polynomial_degree_8", |b| {
        b.iter(|| black_box(poly.bind().var("x", 1.0001).eval().unwrap()))
    });

    let trig = Expression::parse("sin(x)^2 + cos(x)^2").unwrap();
    group.bench_function("trig_identity", |b| {
        b.iter(|| black_box(trig.eval([0.5]).unwrap()))
    });

    let mixed = Expression::parse("(x + 2*i) * (x - 2*i)").unwrap();
    group.bench_function("complex_product", |b| {
        b.iter(|| black_box(mixed.eval([1.5]).unwrap()))
    });

    group.finish();
}

/// Benchmark rendering.
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    let expr = Expression::parse(&chained_source(16)).unwrap();
    group.bench_function("canonical_16_terms", |b| {
        b.iter(|| black_box(expr.to_string()))
    });
    group.bench_function("latex_16_terms", |b| b.iter(|| black_box(expr.latex())));

    group.finish();
}

criterion_group!(benches, bench_parse, bench_eval, bench_render);
criterion_main!(benches);
