//! End-to-end backtests on a 120-month synthetic series.
//!
//! Nine years train every family, the tenth year is withheld. Each of the
//! three seasonal families should beat the white-noise reference.

use approx::assert_relative_eq;
use seasonal_forecast::core::{Period, Z_95};
use seasonal_forecast::data::synthetic::{trend_seasonal, SyntheticConfig};
use seasonal_forecast::data::{parse_table, series_from_table, TableSource};
use seasonal_forecast::evaluation::{backtest, compare_families, ModelFamily};
use seasonal_forecast::models::arima::{rank_by_aic, SARIMASpec};
use seasonal_forecast::models::dlm::DlmConfig;
use seasonal_forecast::models::regression::RegressionConfig;
use seasonal_forecast::ForecastError;

const SPLIT: usize = 108;

fn series() -> seasonal_forecast::core::TimeSeries {
    trend_seasonal(120, &SyntheticConfig::default().with_seed(2024)).unwrap()
}

#[test]
fn every_family_beats_white_noise() {
    let ts = series();
    let families = ModelFamily::standard_set(SARIMASpec::default());
    let results = compare_families(&ts, SPLIT, &families);
    assert_eq!(results.len(), 4);

    let white = results[3].as_ref().unwrap();
    assert_eq!(white.family, "WhiteNoise");

    for result in &results[..3] {
        let r = result.as_ref().unwrap();
        assert_eq!(r.train_len, SPLIT);
        assert_eq!(r.forecast.horizon(), 12);
        assert_eq!(r.forecast.start(), Period::january(2009));

        let m = r.metrics;
        assert!(m.rmse.is_finite() && m.rmse >= 0.0);
        let mape = m.mape.unwrap();
        assert!(mape.is_finite() && mape >= 0.0);

        assert!(
            m.rmse < white.metrics.rmse,
            "{} RMSE {} vs white noise {}",
            r.family,
            m.rmse,
            white.metrics.rmse
        );
        assert!(mape < white.metrics.mape.unwrap());
    }
}

#[test]
fn seasonal_family_intervals_cover_most_of_the_holdout() {
    let ts = series();
    for family in [
        ModelFamily::Sarima(SARIMASpec::default()),
        ModelFamily::Regression(RegressionConfig::default()),
        ModelFamily::Dlm(DlmConfig::default()),
    ] {
        let result = backtest(&ts, SPLIT, &family).unwrap();
        // Loose bound: twelve correlated months.
        assert!(
            result.coverage(Z_95) >= 0.5,
            "{} coverage {}",
            family,
            result.coverage(Z_95)
        );
    }
}

#[test]
fn backtest_is_deterministic() {
    let ts = series();
    let family = ModelFamily::Sarima(SARIMASpec::default());
    let a = backtest(&ts, SPLIT, &family).unwrap();
    let b = backtest(&ts, SPLIT, &family).unwrap();
    assert_eq!(a.forecast.point(), b.forecast.point());
    assert_eq!(a.metrics, b.metrics);
}

#[test]
fn table_column_feeds_the_backtest() {
    let ts = series();
    let text: String = ts
        .values()
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{} {} {:.6}\n", 2000 + i / 12, i % 12 + 1, v))
        .collect();
    let table = parse_table(&format!("# year month value\n{}", text)).unwrap();
    let loaded = series_from_table(&table, &TableSource::default().with_expected_rows(120)).unwrap();
    assert_eq!(loaded.len(), 120);
    assert_eq!(loaded.start(), Period::january(2000));

    let result = backtest(&loaded, SPLIT, &ModelFamily::WhiteNoise).unwrap();
    assert_relative_eq!(result.actual[0], ts.values()[SPLIT], epsilon = 1e-6);
}

#[test]
fn wrong_row_count_aborts_ingestion() {
    let table = parse_table("1 2 3\n4 5 6\n").unwrap();
    let err = series_from_table(&table, &TableSource::default().with_expected_rows(120));
    assert!(err.is_err());
    assert!(matches!(
        parse_table("1 2 x\n"),
        Err(ForecastError::ParseError { line: 1, .. })
    ));
}

#[test]
fn literal_candidate_log_likelihoods() {
    let ranked = rank_by_aic(&[(-373.13, 1), (-359.43, 1), (-351.21, 2), (-351.21, 3)]);
    let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
    assert_eq!(order, vec![2, 3, 1, 0]);
    assert_relative_eq!(ranked[0].1, 708.42, epsilon = 0.011);
}
