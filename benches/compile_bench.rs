//! Benchmark for parsing, lowering and evaluation.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use waterkoker::compiler::{compile_str, run_str};
use waterkoker::interpreter::Interpreter;
use waterkoker::parser::parse;

const PROGRAM: &str = "d+a0a1. d-f0a0ia1.a2. f1 9i4i2. +f0 1i2.-93";

fn benchmark_parse(c: &mut Criterion) {
    c.bench_function("parse program", |b| {
        b.iter(|| black_box(parse(black_box(PROGRAM)).unwrap()));
    });
}

fn benchmark_compile(c: &mut Criterion) {
    c.bench_function("compile program to IR", |b| {
        b.iter(|| black_box(compile_str(black_box(PROGRAM)).unwrap()));
    });
}

fn benchmark_run(c: &mut Criterion) {
    c.bench_function("compile and run program", |b| {
        b.iter(|| black_box(run_str(black_box(PROGRAM)).unwrap()));
    });
}

fn benchmark_interpreter_only(c: &mut Criterion) {
    let module = compile_str(PROGRAM).unwrap();
    c.bench_function("run entry points", |b| {
        b.iter(|| black_box(Interpreter::new(&module).run_entry_points().unwrap()));
    });
}

criterion_group!(
    benches,
    benchmark_parse,
    benchmark_compile,
    benchmark_run,
    benchmark_interpreter_only
);
criterion_main!(benches);
