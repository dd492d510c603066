//! Holdout and rolling-origin backtests.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::evaluation::ModelFamily;
use crate::utils::metrics::{calculate_metrics, AccuracyMetrics};
use tracing::{info, warn};

/// Forecast of a withheld window together with its accuracy.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    /// Display name of the family
    pub family: String,
    /// Number of training observations
    pub train_len: usize,
    pub forecast: Forecast,
    pub actual: Vec<f64>,
    pub metrics: AccuracyMetrics,
}

impl BacktestResult {
    /// Share of withheld values inside the `point ± z·se` band.
    pub fn coverage(&self, z: f64) -> f64 {
        let interval = self.forecast.interval_with_z(z);
        let inside = self
            .actual
            .iter()
            .enumerate()
            .filter(|(h, a)| interval.contains(*h, **a))
            .count();
        inside as f64 / self.actual.len() as f64
    }
}

/// Refit `family` on the first `split` observations and forecast the rest.
///
/// # Errors
/// `InvalidParameter` unless `0 < split < series.len()`, plus any error of
/// the family's fit or forecast.
pub fn backtest(series: &TimeSeries, split: usize, family: &ModelFamily) -> Result<BacktestResult> {
    backtest_window(series, split, series.len().saturating_sub(split), family)
}

fn backtest_window(
    series: &TimeSeries,
    split: usize,
    horizon: usize,
    family: &ModelFamily,
) -> Result<BacktestResult> {
    if split == 0 || split >= series.len() || horizon == 0 || split + horizon > series.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "backtest window {}+{} does not fit a series of length {}",
            split,
            horizon,
            series.len()
        )));
    }

    let train = series.head(split)?;
    let actual = series.values()[split..split + horizon].to_vec();

    let mut model = family.create();
    model.fit(&train)?;
    let forecast = model.predict(horizon)?;
    let metrics = calculate_metrics(&actual, forecast.point())?;

    Ok(BacktestResult {
        family: family.to_string(),
        train_len: split,
        forecast,
        actual,
        metrics,
    })
}

/// Backtest several families on the same split, in input order.
pub fn compare_families(
    series: &TimeSeries,
    split: usize,
    families: &[ModelFamily],
) -> Vec<Result<BacktestResult>> {
    families
        .iter()
        .map(|family| {
            let result = backtest(series, split, family);
            match &result {
                Ok(r) => info!(
                    family = %family,
                    rmse = r.metrics.rmse,
                    mape = r.metrics.mape.unwrap_or(f64::NAN),
                    "backtest finished"
                ),
                Err(e) => warn!(family = %family, error = %e, "backtest failed"),
            }
            result
        })
        .collect()
}

/// Expanding-window backtest: forecast `horizon` steps from every origin
/// `initial, initial + step, ...` that leaves a full horizon of data.
pub fn rolling_backtest(
    series: &TimeSeries,
    family: &ModelFamily,
    initial: usize,
    horizon: usize,
    step: usize,
) -> Result<Vec<BacktestResult>> {
    if step == 0 {
        return Err(ForecastError::InvalidParameter(
            "rolling backtest step must be positive".to_string(),
        ));
    }
    let mut results = Vec::new();
    let mut origin = initial;
    while origin + horizon <= series.len() {
        results.push(backtest_window(series, origin, horizon, family)?);
        origin += step;
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;

    fn series() -> TimeSeries {
        let values = (0..48)
            .map(|i| 20.0 + 0.3 * i as f64 + ((i * 5) % 7) as f64)
            .collect();
        TimeSeries::monthly(values, 2010, 1).unwrap()
    }

    #[test]
    fn holdout_backtest() {
        let ts = series();
        let result = backtest(&ts, 36, &ModelFamily::WhiteNoise).unwrap();
        assert_eq!(result.actual.len(), 12);
        assert_eq!(result.forecast.horizon(), 12);
        assert_eq!(result.forecast.start(), Period::january(2013));
        assert_eq!(result.actual[0], ts.values()[36]);
        assert!(result.metrics.rmse > 0.0);
        assert!(result.metrics.mape.is_some());
        let coverage = result.coverage(1.96);
        assert!((0.0..=1.0).contains(&coverage));
    }

    #[test]
    fn invalid_splits() {
        let ts = series();
        assert!(backtest(&ts, 0, &ModelFamily::WhiteNoise).is_err());
        assert!(backtest(&ts, 48, &ModelFamily::WhiteNoise).is_err());
    }

    #[test]
    fn compare_keeps_order_and_errors() {
        let ts = series();
        let results = compare_families(
            &ts,
            40,
            &[
                ModelFamily::WhiteNoise,
                // Needs more data than the training window holds.
                ModelFamily::Sarima(crate::models::arima::SARIMASpec::new(0, 1, 1, 0, 3, 1, 12)),
            ],
        );
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn rolling_origins() {
        let ts = series();
        let folds = rolling_backtest(&ts, &ModelFamily::WhiteNoise, 30, 6, 4).unwrap();
        // origins 30, 34, 38, 42
        assert_eq!(folds.len(), 4);
        assert_eq!(folds[3].train_len, 42);
        assert!(rolling_backtest(&ts, &ModelFamily::WhiteNoise, 30, 6, 0).is_err());
    }
}
