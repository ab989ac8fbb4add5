//! Sampling and aggregation benchmarks.
//!
//! Run with: cargo bench --bench sampling_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use distpi::coordinator::{aggregate, Partition};
use distpi::domains::{PreciseReal, QuarterCircleSampler};
use distpi::engine::rng::SampleRng;
use distpi::protocol::PartialResult;

/// Worker sampling loop, including exact accumulation of every sample.
fn bench_sampler(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampler");
    group.sample_size(20);

    for n in [1_000_u64, 10_000, 100_000] {
        group.throughput(Throughput::Elements(n));
        group.bench_with_input(BenchmarkId::new("quarter_circle", n), &n, |b, &n| {
            let sampler = QuarterCircleSampler::new(n, 0.0, 1.0);
            let mut rng = SampleRng::new(42);
            b.iter(|| black_box(sampler.run(&mut rng)));
        });
    }

    group.finish();
}

/// Coordinator-side combine of many partial sums.
fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for workers in [4_usize, 64, 512] {
        let partition = Partition::new(1_000_000 * workers as u64, workers).unwrap();
        let mut rng = SampleRng::new(7);
        let results: Vec<PartialResult> = (0..workers)
            .map(|i| PartialResult {
                sum: PreciseReal::from_f64(785_398.0 + rng.gen_f64(), format!("worker {i}")).unwrap(),
                elapsed_seconds: 0.0,
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("workers", workers), &results, |b, results| {
            b.iter(|| black_box(aggregate(results, &partition, 0.0, 1.0)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sampler, bench_aggregate);
criterion_main!(benches);
