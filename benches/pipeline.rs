//! Benchmarks for the cimeter tick pipeline

use cimeter::components::{coherence, integration_phi};
use cimeter::stats::{compressibility_ratio, entropy, spectral_peak_ratio};
use cimeter::{IndexConfig, IndexEngine, NetworkConfig, SignalBuffer, TickInput};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn generate_channels(channels: usize, samples: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..channels)
        .map(|_| {
            (0..samples)
                .map(|t| {
                    let x = t as f64 / 250.0;
                    (2.0 * std::f64::consts::PI * 40.0 * x).sin() + 0.3 * rng.gen::<f64>()
                })
                .collect()
        })
        .collect()
}

fn bench_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats");

    let signal: Vec<f64> = generate_channels(8, 250, 1).concat();
    let mut rng = StdRng::seed_from_u64(2);

    group.throughput(Throughput::Elements(signal.len() as u64));

    group.bench_function("entropy_2000", |b| {
        b.iter(|| black_box(entropy(black_box(&signal), 16)))
    });

    group.bench_function("spectral_peak_2000", |b| {
        b.iter(|| black_box(spectral_peak_ratio(black_box(&signal), 250.0)))
    });

    group.bench_function("compressibility_2000", |b| {
        b.iter(|| black_box(compressibility_ratio(black_box(&signal), &mut rng)))
    });

    group.finish();
}

fn bench_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("components");

    let buffer = SignalBuffer::new(generate_channels(8, 250, 3)).unwrap();
    let matrix = buffer.to_matrix();
    group.bench_function("coherence_8x250", |b| {
        b.iter(|| black_box(coherence(black_box(&matrix))))
    });

    let mut rng = StdRng::seed_from_u64(4);
    let weights = DMatrix::from_fn(100, 100, |i, j| if i == j { 0.0 } else { 0.1 });
    group.bench_function("integration_phi_100_nodes", |b| {
        b.iter(|| black_box(integration_phi(&weights, 100, 5, &mut rng).unwrap()))
    });

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");

    let inputs: Vec<TickInput> = (0..100)
        .map(|i| {
            let buffer = SignalBuffer::new(generate_channels(8, 250, i)).unwrap();
            TickInput::new(i * 100, buffer).with_resources(vec![0.8, 0.82, 0.79])
        })
        .collect();

    group.throughput(Throughput::Elements(inputs.len() as u64));

    group.bench_function("tick_100_inputs", |b| {
        b.iter(|| {
            let config = IndexConfig {
                network: NetworkConfig::default(),
                seed: Some(7),
                ..Default::default()
            };
            let mut engine = IndexEngine::new(config).unwrap();
            for input in &inputs {
                black_box(engine.tick(input).unwrap());
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_stats, bench_components, bench_engine);
criterion_main!(benches);
