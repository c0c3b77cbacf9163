use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};

use fee_forecaster::{calculate_block_percentiles, linearize, RemovedTransaction, Txid};

/// Generate a mempool-shaped transaction set: mostly independent
/// transactions with occasional parent/child clusters.
fn generate_transactions(count: usize) -> Vec<RemovedTransaction> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let mut txs = Vec::with_capacity(count);

    for index in 0..count {
        let parents = if index > 0 && rng.gen_ratio(1, 4) {
            vec![Txid::from_low_u64_be(rng.gen_range(0..index) as u64)]
        } else {
            Vec::new()
        };
        txs.push(RemovedTransaction {
            txid: Txid::from_low_u64_be(index as u64),
            fee: rng.gen_range(100..100_000),
            vsize: rng.gen_range(150..5_000),
            arrival_time: 0,
            parents,
        });
    }
    txs
}

fn benchmark_linearization(c: &mut Criterion) {
    let mut group = c.benchmark_group("linearization");

    for size in [100usize, 500, 2000].iter() {
        let txs = generate_transactions(*size);
        group.bench_with_input(BenchmarkId::new("transactions", size), size, |b, _| {
            b.iter(|| linearize(&txs));
        });
    }

    group.finish();
}

fn benchmark_percentiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("percentiles");

    for size in [100usize, 2000, 10000].iter() {
        let stats = linearize(&generate_transactions(*size)).size_per_feerate();
        group.bench_with_input(BenchmarkId::new("packages", size), size, |b, _| {
            b.iter(|| calculate_block_percentiles(&stats));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_linearization, benchmark_percentiles);
criterion_main!(benches);
