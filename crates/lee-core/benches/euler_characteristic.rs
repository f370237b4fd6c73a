//! Criterion benchmarks for the calibration hot path.
//!
//! Benchmarks `ExcursionSet::euler_counts` over grid sizes, surface
//! thresholding, and the coefficient fit plus correction.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lee_config::SolverSettings;
use lee_core::{expected_euler, Calibration, CalibrationPoint, LeeCorrector, Surface};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Helpers ──────────────────────────────────────────────────────────

/// Ripple surface with many local maxima; deterministic.
fn ripple_surface(rows: usize, cols: usize) -> Surface {
    let values = (0..rows)
        .map(|r| {
            let y = r as f64 / rows as f64;
            (0..cols)
                .map(|c| {
                    let x = c as f64 / cols as f64;
                    let s = (12.0 * x).sin() * (9.0 * y).cos();
                    4.0 * s * s
                })
                .collect()
        })
        .collect();
    Surface::new(values).expect("ripple surface is valid")
}

fn noise_surface(rows: usize, cols: usize, seed: u64) -> Surface {
    let mut rng = StdRng::seed_from_u64(seed);
    let values = (0..rows)
        .map(|_| (0..cols).map(|_| 6.0 * rng.random::<f64>()).collect())
        .collect();
    Surface::new(values).expect("noise surface is valid")
}

// ── Topology ─────────────────────────────────────────────────────────

fn bench_euler_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("euler/counts");

    for &(rows, cols) in &[(50, 50), (100, 200), (400, 400)] {
        let surface = ripple_surface(rows, cols);
        let name = format!("{}x{}", rows, cols);
        group.bench_with_input(BenchmarkId::new("ripple", &name), &surface, |b, s| {
            b.iter(|| s.euler_counts_at(black_box(1.0)))
        });

        let noisy = noise_surface(rows, cols, 7);
        group.bench_with_input(BenchmarkId::new("noise", &name), &noisy, |b, s| {
            b.iter(|| s.euler_counts_at(black_box(3.0)))
        });
    }

    group.finish();
}

fn bench_calibration_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("euler/calibration_scan");
    let surfaces: Vec<Surface> = (0..20).map(|i| noise_surface(100, 200, i)).collect();

    group.bench_function("20_surfaces_two_levels", |b| {
        b.iter(|| lee_core::measure_calibration(black_box(&surfaces), 1.0, 4.0))
    });

    group.finish();
}

// ── Solve and correct ────────────────────────────────────────────────

fn bench_correct(c: &mut Criterion) {
    let mut group = c.benchmark_group("correct/single");
    let calibration = Calibration::new(
        CalibrationPoint::exact(1.0, expected_euler(1.0, 0.5, 0.8).unwrap_or(f64::NAN)),
        CalibrationPoint::exact(4.0, expected_euler(4.0, 0.5, 0.8).unwrap_or(f64::NAN)),
    );
    let corrector = LeeCorrector::new(SolverSettings::default());

    group.bench_function("fit", |b| {
        b.iter(|| calibration.fit(black_box(&SolverSettings::default())))
    });
    group.bench_function("fit_and_correct", |b| {
        b.iter(|| corrector.correct(black_box(3.0), &calibration))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_euler_counts,
    bench_calibration_scan,
    bench_correct
);
criterion_main!(benches);
