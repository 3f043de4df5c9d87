//! Stepping and analysis benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cardiosim::config::{FibrosisConfig, FibrosisPattern, StimulusShape};
use cardiosim::tissue::{generate_fibrosis_map, Grid};
use cardiosim::{measure_apd90, CancelToken, Driver, ModelConfig, SimulationParameters, StimulusSpec};

fn bench_single_cell_run(c: &mut Criterion) {
    let mut params = SimulationParameters::single_cell(ModelConfig::default(), 0.01, 100.0);
    params.stimuli.push(StimulusSpec::point(5.0, 1.0, 1.0));
    let cancel = CancelToken::new();

    c.bench_function("single_cell_run_100ms", |b| {
        b.iter(|| {
            Driver::new(black_box(&params))
                .unwrap()
                .run_cell(&cancel)
                .unwrap()
        })
    });
}

fn bench_tissue_stepping(c: &mut Criterion) {
    let mut params = SimulationParameters::tissue(ModelConfig::default(), 50, 0.25, 0.05, 10.0);
    params.stride = 20;
    params.stimuli.push(StimulusSpec {
        shape: StimulusShape::Edge { width: 3 },
        delay_ms: 1.0,
        duration_ms: 1.0,
        amplitude: 1.0,
    });
    let cancel = CancelToken::new();

    c.bench_function("tissue_50x50_200_steps", |b| {
        b.iter(|| {
            Driver::new(black_box(&params))
                .unwrap()
                .run_tissue(&cancel, None)
                .unwrap()
        })
    });
}

fn bench_fibrosis_map_generation(c: &mut Criterion) {
    let grid = Grid::new(100, 0.25);
    let config = FibrosisConfig {
        pattern: FibrosisPattern::Scattered { density: 0.2 },
        conductivity_factor: 0.1,
        seed: 42,
    };

    c.bench_function("fibrosis_map_100x100", |b| {
        b.iter(|| generate_fibrosis_map(black_box(&config), black_box(&grid)).unwrap())
    });
}

fn bench_apd_measurement(c: &mut Criterion) {
    // One action potential embedded in a long sampled trace
    let mut trace = vec![0.0; 1_000];
    trace.extend((0..=10_000).map(|i| 1.0 - i as f64 / 10_000.0));
    trace.extend(vec![0.0; 39_000]);

    c.bench_function("apd90_50k_samples", |b| {
        b.iter(|| measure_apd90(black_box(&trace), 0.02))
    });
}

criterion_group!(
    benches,
    bench_single_cell_run,
    bench_tissue_stepping,
    bench_fibrosis_map_generation,
    bench_apd_measurement
);
criterion_main!(benches);
