//! Micro-benchmarks for credit basis construction and ledger math.
//!
//! The ledger sits on the governor's per-decision path, so basis math is
//! measured separately from the environment sampling it feeds on.

use autohack_rs::env::ActionKind;
use autohack_rs::ledger::{fractional_gcd, CreditBasis, CreditLedger};
use autohack_rs::sim::{SimNet, SimNetSpec, SimNodeSpec};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_fractional_gcd(c: &mut Criterion) {
    c.bench_function("fractional_gcd", |b| {
        b.iter(|| fractional_gcd(black_box(1.75), black_box(1.6)))
    });
}

fn bench_basis_from_costs(c: &mut Criterion) {
    c.bench_function("credit_basis_from_costs", |b| {
        b.iter(|| CreditBasis::from_costs(black_box(1.75), black_box(1.6), black_box(1.75)))
    });
}

fn bench_available_threads(c: &mut Criterion) {
    let mut spec = SimNetSpec::default();
    spec.nodes.push(SimNodeSpec {
        hostname: "home".into(),
        rooted: true,
        player_owned: true,
        max_ram_gb: 128.0,
        ..SimNodeSpec::default()
    });
    let net = SimNet::from_spec(&spec);
    let ledger = CreditLedger::new("home", 0.10, CreditBasis::from_costs(1.75, 1.6, 1.75));

    c.bench_function("ledger_available_threads", |b| {
        b.iter(|| ledger.available_threads(black_box(&net), ActionKind::Weaken))
    });
}

criterion_group!(
    benches,
    bench_fractional_gcd,
    bench_basis_from_costs,
    bench_available_threads
);
criterion_main!(benches);
