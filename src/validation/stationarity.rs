//! Stationarity preparation for seasonal series.
//!
//! A monthly series with trend and seasonality is made stationary by one
//! regular and one seasonal difference. The differenced values should
//! fluctuate around zero, which is checked with a one-sample t test, and
//! their correlogram guides the choice of ARMA orders.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::{difference_with_seeds, observations_lost};
use crate::utils::stats::{acf, acf_bound, is_constant, pacf};
use crate::validation::location::{one_sample_t_test, TTestResult};
use tracing::info;

/// Differenced series together with the diagnostics used to read it.
#[derive(Debug, Clone)]
pub struct StationarityReport {
    /// Regular differencing order
    pub d: usize,
    /// Seasonal differencing order
    pub cap_d: usize,
    /// Seasonal period
    pub period: usize,
    /// Fully differenced values
    pub differenced: Vec<f64>,
    /// t test of a zero mean for the differenced values
    pub mean_test: TTestResult,
    /// Sample autocorrelations at lags `1..=max_lag`
    pub acf: Vec<f64>,
    /// Partial autocorrelations at lags `1..=max_lag`
    pub pacf: Vec<f64>,
    /// Approximate 95% significance bound for both correlograms
    pub bound: f64,
}

impl StationarityReport {
    /// Whether the differenced values are consistent with a zero mean.
    pub fn has_zero_mean(&self, alpha: f64) -> bool {
        self.mean_test.is_consistent_with_null(alpha)
    }

    /// Lags (1-based) whose autocorrelation exceeds the bound.
    pub fn significant_acf_lags(&self) -> Vec<usize> {
        significant_lags(&self.acf, self.bound)
    }

    /// Lags (1-based) whose partial autocorrelation exceeds the bound.
    pub fn significant_pacf_lags(&self) -> Vec<usize> {
        significant_lags(&self.pacf, self.bound)
    }
}

fn significant_lags(values: &[f64], bound: f64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.abs() > bound)
        .map(|(i, _)| i + 1)
        .collect()
}

/// Apply `d` regular and `cap_d` seasonal differences and describe the result.
///
/// # Errors
/// `InsufficientData` when fewer than `max_lag + 2` differenced values remain,
/// `DegenerateSeries` when the differenced values are constant.
pub fn prepare_stationary(
    series: &TimeSeries,
    d: usize,
    cap_d: usize,
    max_lag: usize,
) -> Result<StationarityReport> {
    let period = series.frequency();
    let needed = observations_lost(d, cap_d, period) + max_lag + 2;
    if series.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: series.len(),
        });
    }

    let differenced = difference_with_seeds(series.values(), d, cap_d, period).values;
    if is_constant(&differenced) {
        return Err(ForecastError::DegenerateSeries(format!(
            "series differenced (d={}, D={}) has zero variance",
            d, cap_d
        )));
    }

    let mean_test = one_sample_t_test(&differenced, 0.0)?;
    let report = StationarityReport {
        d,
        cap_d,
        period,
        acf: acf(&differenced, max_lag),
        pacf: pacf(&differenced, max_lag),
        bound: acf_bound(differenced.len()),
        mean_test,
        differenced,
    };

    info!(
        d,
        cap_d,
        n = report.differenced.len(),
        mean = report.mean_test.mean,
        p_value = report.mean_test.p_value,
        "prepared stationary series"
    );
    Ok(report)
}
