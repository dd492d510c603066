//! Differencing utilities for ARIMA models.
//!
//! Regular differencing (`d` times at lag 1) is applied first, then seasonal
//! differencing (`D` times at lag `s`). Each stage keeps the leading values
//! it consumes so the transformation can be inverted exactly.

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    lagged_difference(series, d, 1)
}

/// Apply seasonal differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Seasonal differencing order
/// * `period` - Seasonal period
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    lagged_difference(series, d, period)
}

fn lagged_difference(series: &[f64], times: usize, lag: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..times {
        if result.len() <= lag {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(lag)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Lags of each differencing stage in application order.
pub fn stage_lags(d: usize, cap_d: usize, period: usize) -> Vec<usize> {
    let mut lags = vec![1; d];
    if period > 0 {
        lags.extend(std::iter::repeat(period).take(cap_d));
    }
    lags
}

/// Number of observations consumed by `d` regular and `D` seasonal differences.
pub fn observations_lost(d: usize, cap_d: usize, period: usize) -> usize {
    stage_lags(d, cap_d, period).iter().sum()
}

/// A differenced series together with the seed values needed to undo it.
#[derive(Debug, Clone, PartialEq)]
pub struct Differenced {
    /// Fully differenced values.
    pub values: Vec<f64>,
    /// Per stage (in application order): lag and the first `lag` values of
    /// that stage's input.
    pub seeds: Vec<(usize, Vec<f64>)>,
}

/// Apply `d` regular then `D` seasonal differences, keeping seeds.
pub fn difference_with_seeds(series: &[f64], d: usize, cap_d: usize, period: usize) -> Differenced {
    let mut current = series.to_vec();
    let mut seeds = Vec::new();
    for lag in stage_lags(d, cap_d, period) {
        let keep = lag.min(current.len());
        seeds.push((lag, current[..keep].to_vec()));
        current = lagged_difference(&current, 1, lag);
    }
    Differenced {
        values: current,
        seeds,
    }
}

/// Invert [`difference_with_seeds`] by cumulative summation from the seeds.
pub fn undifference(differenced: &Differenced) -> Vec<f64> {
    let mut current = differenced.values.clone();
    for (lag, seed) in differenced.seeds.iter().rev() {
        let mut restored = seed.clone();
        restored.reserve(current.len());
        for (i, &delta) in current.iter().enumerate() {
            let value = delta + restored[i];
            restored.push(value);
        }
        debug_assert!(restored.len() >= *lag);
        current = restored;
    }
    current
}

/// Map forecasts of the fully differenced series back to the original scale.
///
/// `history` is the observed series the differences were taken from.
///
/// # Arguments
/// * `forecast_diff` - Forecasts on the differenced scale
/// * `history` - Original (undifferenced) observations
/// * `d` - Regular differencing order
/// * `cap_d` - Seasonal differencing order
/// * `period` - Seasonal period
pub fn integrate(
    forecast_diff: &[f64],
    history: &[f64],
    d: usize,
    cap_d: usize,
    period: usize,
) -> Vec<f64> {
    let lags = stage_lags(d, cap_d, period);
    if lags.is_empty() || forecast_diff.is_empty() {
        return forecast_diff.to_vec();
    }

    // Input of every stage over the observed window.
    let mut levels = Vec::with_capacity(lags.len());
    let mut current = history.to_vec();
    for &lag in &lags {
        levels.push(current.clone());
        current = lagged_difference(&current, 1, lag);
    }

    let mut future = forecast_diff.to_vec();
    for (stage, &lag) in lags.iter().enumerate().rev() {
        let mut extended = levels[stage].clone();
        let observed = extended.len();
        for (j, &delta) in future.iter().enumerate() {
            let value = delta + extended[observed + j - lag];
            extended.push(value);
        }
        future = extended[observed..].to_vec();
    }

    future
}
