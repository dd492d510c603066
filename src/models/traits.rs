//! Forecaster trait defining the common interface for all model families.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Likelihood-based fit statistics.
///
/// The innovation variance is counted as an estimated parameter, so a model
/// with `k` coefficients is penalised for `k + 1` parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InformationCriteria {
    pub log_likelihood: f64,
    /// Estimated coefficients, variance excluded.
    pub num_params: usize,
    /// Observations the likelihood was evaluated on.
    pub n_obs: usize,
    pub aic: f64,
    pub bic: f64,
}

impl InformationCriteria {
    pub fn new(log_likelihood: f64, num_params: usize, n_obs: usize) -> Self {
        Self {
            log_likelihood,
            num_params,
            n_obs,
            aic: aic(log_likelihood, num_params),
            bic: bic(log_likelihood, num_params, n_obs),
        }
    }
}

/// Akaike information criterion, `-2·ll + 2·(k + 1)`.
pub fn aic(log_likelihood: f64, num_params: usize) -> f64 {
    -2.0 * log_likelihood + 2.0 * (num_params + 1) as f64
}

/// Bayesian information criterion, `-2·ll + (k + 1)·ln n`.
pub fn bic(log_likelihood: f64, num_params: usize, n_obs: usize) -> f64 {
    -2.0 * log_likelihood + (num_params + 1) as f64 * (n_obs as f64).ln()
}

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Point forecasts and standard errors for `horizon` steps after the
    /// last fitted observation.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// In-sample one-step predictions, aligned with the fitted series.
    /// Positions without a prediction are `NaN`.
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Residuals (actual - fitted), aligned with the fitted series.
    fn residuals(&self) -> Option<&[f64]>;

    /// Likelihood statistics, when the model has a likelihood.
    fn information_criteria(&self) -> Option<InformationCriteria> {
        None
    }

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use seasonal_forecast::models::{BoxedForecaster, Forecaster};
/// use seasonal_forecast::models::baseline::HistoricMean;
///
/// let model: BoxedForecaster = Box::new(HistoricMean::new());
/// assert_eq!(model.name(), "HistoricMean");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::SARIMA;
    use crate::models::baseline::HistoricMean;
    use approx::assert_relative_eq;

    fn make_test_series(n: usize) -> TimeSeries {
        let values: Vec<f64> = (1..=n)
            .map(|i| 10.0 + ((i * 37) % 11) as f64 * 0.3)
            .collect();
        TimeSeries::monthly(values, 2020, 1).unwrap()
    }

    #[test]
    fn criteria_count_variance() {
        let ic = InformationCriteria::new(-100.0, 2, 50);
        assert_relative_eq!(ic.aic, 206.0);
        assert_relative_eq!(ic.bic, 200.0 + 3.0 * 50.0_f64.ln());
    }

    #[test]
    fn literal_candidate_aics() {
        let expected = [750.26, 722.86, 708.42, 710.42];
        let cases = [(-373.13, 1), (-359.43, 1), (-351.21, 2), (-351.21, 3)];
        for ((ll, k), want) in cases.iter().zip(expected) {
            assert_relative_eq!(aic(*ll, *k), want, epsilon = 1e-9);
        }
    }

    #[test]
    fn boxed_forecaster_fit_predict() {
        let mut model: BoxedForecaster = Box::new(HistoricMean::new());
        assert!(!model.is_fitted());
        let ts = make_test_series(30);

        model.fit(&ts).unwrap();
        assert!(model.is_fitted());
        assert_eq!(model.residuals().unwrap().len(), 30);

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
    }

    #[test]
    fn boxed_models_share_interface() {
        let models: Vec<BoxedForecaster> =
            vec![Box::new(HistoricMean::new()), Box::new(SARIMA::arima(1, 0, 0))];
        let ts = make_test_series(40);
        for mut model in models {
            model.fit(&ts).unwrap();
            assert_eq!(model.predict(3).unwrap().horizon(), 3);
            assert!(model.information_criteria().is_some());
        }
    }
}
