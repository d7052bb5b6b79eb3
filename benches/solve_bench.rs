//! Resolution benchmarks using Criterion.
//!
//! Run with: `cargo bench`
//!
//! Measures the core query loop: clause lookup with hash pruning,
//! unification, and chronological backtracking.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hornlog::machine::Machine;
use hornlog::parser;
use hornlog::term::Term;

/// append/3 over lists of increasing length.
fn bench_append(c: &mut Criterion) {
    let machine = Machine::new()
        .consult(
            "append([], A, A).
             append([A|B], C, [A|D]) :- append(B, C, D).",
        )
        .unwrap();

    let mut group = c.benchmark_group("append");
    for len in [8usize, 32, 128] {
        let items: Vec<Term> = (0..len).map(|i| Term::int(i as i64)).collect();
        let goal = Term::compound(
            "append",
            [Term::list(items), Term::list([Term::atom("x")]), Term::var("L")],
        );
        group.bench_with_input(BenchmarkId::from_parameter(len), &goal, |b, goal| {
            b.iter(|| {
                let answers = machine.prove_all_term(black_box(goal.clone())).unwrap();
                assert_eq!(answers.len(), 1);
            });
        });
    }
    group.finish();
}

/// Backtracking through a wide fact table.
fn bench_fanout(c: &mut Criterion) {
    let mut program = String::new();
    for i in 0..200 {
        program.push_str(&format!("item({}).\n", i));
    }
    program.push_str("wanted(X) :- item(X), X == 199.\n");
    let machine = Machine::new().consult(&program).unwrap();
    let goal = parser::term("wanted(X).").unwrap();

    c.bench_function("fanout_200", |b| {
        b.iter(|| {
            let answers = machine.prove_all_term(black_box(goal.clone())).unwrap();
            assert_eq!(answers.len(), 1);
        });
    });
}

/// First-answer latency on an infinite generator.
fn bench_first_answer(c: &mut Criterion) {
    let machine = Machine::new()
        .consult(
            "nat(zero).
             nat(s(N)) :- nat(N).",
        )
        .unwrap();
    let goal = parser::term("nat(s(s(s(X)))).").unwrap();

    c.bench_function("first_answer", |b| {
        b.iter(|| {
            assert!(machine.can_prove_term(black_box(goal.clone())).unwrap());
        });
    });
}

/// Candidate pruning: ground goals against a predicate with many clauses.
fn bench_hash_pruning(c: &mut Criterion) {
    let mut program = String::new();
    for i in 0..500 {
        program.push_str(&format!("color(thing{}, c{}).\n", i, i % 7));
    }
    let machine = Machine::new().consult(&program).unwrap();
    let goal = parser::term("color(thing250, C).").unwrap();

    c.bench_function("hash_pruning_500", |b| {
        b.iter(|| {
            let answers = machine.prove_all_term(black_box(goal.clone())).unwrap();
            assert_eq!(answers.len(), 1);
        });
    });
}

criterion_group!(
    benches,
    bench_append,
    bench_fanout,
    bench_first_answer,
    bench_hash_pruning
);
criterion_main!(benches);
