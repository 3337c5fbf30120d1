//! Benchmarks for Pareto selection and the epsilon indicator.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use district_opt::{
    compute::evolution::{eps_indicator, select_pareto},
    schema::{Fitness, Individual},
};

/// Pool with a mix of trade-off and dominated points.
fn random_pool(size: usize, seed: u64) -> Vec<Individual> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..size)
        .map(|i| {
            let x: f64 = rng.r#gen();
            let noise: f64 = rng.r#gen::<f64>() * 0.5;
            Individual::evaluated(
                vec![i as f64],
                Fitness::new(x + noise, 1.0 - x + noise, rng.r#gen()),
            )
        })
        .collect()
}

fn bench_select_pareto(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_pareto");

    for size in [16, 64, 256, 1024] {
        let pool = random_pool(size, 42);
        group.bench_with_input(BenchmarkId::from_parameter(size), &pool, |b, pool| {
            b.iter(|| select_pareto(black_box(pool.clone())))
        });
    }

    group.finish();
}

fn bench_eps_indicator(c: &mut Criterion) {
    let mut group = c.benchmark_group("eps_indicator");

    for size in [16, 64, 256] {
        let previous = select_pareto(random_pool(size, 1));
        let current = select_pareto(random_pool(size, 2));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &(previous, current),
            |b, (previous, current)| b.iter(|| eps_indicator(black_box(previous), black_box(current))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_select_pareto, bench_eps_indicator);
criterion_main!(benches);
