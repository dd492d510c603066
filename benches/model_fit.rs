//! Benchmarks for fitting the three model families.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use seasonal_forecast::data::synthetic::{trend_seasonal, SyntheticConfig};
use seasonal_forecast::models::arima::SARIMA;
use seasonal_forecast::models::dlm::{build_dlm, DLM};
use seasonal_forecast::models::regression::TrendSeasonalRegression;
use seasonal_forecast::models::Forecaster;

fn bench_fits(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_fit");
    group.sample_size(10);

    for size in [60, 120, 240].iter() {
        let ts = trend_seasonal(*size, &SyntheticConfig::default()).unwrap();

        group.bench_with_input(BenchmarkId::new("SARIMA(0,1,1)(0,1,1)12", size), size, |b, _| {
            b.iter(|| {
                let mut model = SARIMA::new(0, 1, 1, 0, 1, 1, 12);
                model.fit(black_box(&ts)).unwrap();
                model
            })
        });

        group.bench_with_input(BenchmarkId::new("Regression+ARMA", size), size, |b, _| {
            b.iter(|| {
                let mut model = TrendSeasonalRegression::default();
                model.fit(black_box(&ts)).unwrap();
                model
            })
        });

        group.bench_with_input(BenchmarkId::new("DLM", size), size, |b, _| {
            b.iter(|| {
                let mut model = DLM::default();
                model.fit(black_box(&ts)).unwrap();
                model
            })
        });
    }

    group.finish();
}

fn bench_kalman_filter(c: &mut Criterion) {
    let ts = trend_seasonal(120, &SyntheticConfig::default()).unwrap();
    let model = build_dlm(&[1.0, -1.0, -6.0, -4.0], 12).unwrap();
    let dim = model.dim();
    let mut a0 = nalgebra::DVector::zeros(dim);
    a0[0] = ts.values()[0];
    let p0 = nalgebra::DMatrix::identity(dim, dim) * 1e6;

    c.bench_function("kalman_filter_dlm_120", |b| {
        b.iter(|| model.filter(black_box(ts.values()), &a0, &p0, dim).unwrap())
    });
}

criterion_group!(benches, bench_fits, bench_kalman_filter);
criterion_main!(benches);
