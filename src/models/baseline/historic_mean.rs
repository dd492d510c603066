//! Historic mean forecaster.
//!
//! Treats the series as white noise around a constant: every forecast is
//! the training mean. Useful as a deliberately misspecified reference for
//! trending or seasonal data.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::{Forecaster, InformationCriteria};
use crate::utils::stats::{mean, variance};

/// Forecasts the mean of the training data.
#[derive(Debug, Clone, Default)]
pub struct HistoricMean {
    mean: Option<f64>,
    /// Standard error of a new observation, `s·sqrt(1 + 1/n)`
    se: Option<f64>,
    log_likelihood: Option<f64>,
    series: Option<TimeSeries>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl HistoricMean {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mean(&self) -> Option<f64> {
        self.mean
    }
}

impl Forecaster for HistoricMean {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if values.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }

        let n = values.len() as f64;
        let m = mean(values);
        let s2 = variance(values);
        let residuals: Vec<f64> = values.iter().map(|v| v - m).collect();
        let mle_var = residuals.iter().map(|r| r * r).sum::<f64>() / n;
        self.log_likelihood = if mle_var > 0.0 {
            Some(-0.5 * n * ((2.0 * std::f64::consts::PI).ln() + mle_var.ln() + 1.0))
        } else {
            None
        };

        self.mean = Some(m);
        self.se = Some((s2 * (1.0 + 1.0 / n)).sqrt());
        self.fitted = Some(vec![m; values.len()]);
        self.residuals = Some(residuals);
        self.series = Some(series.clone());
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let series = self.series.as_ref().ok_or(ForecastError::FitRequired)?;
        let m = self.mean.ok_or(ForecastError::FitRequired)?;
        let se = self.se.ok_or(ForecastError::FitRequired)?;
        Forecast::new(
            series.next_period(),
            series.frequency(),
            vec![m; horizon],
            vec![se; horizon],
        )
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn information_criteria(&self) -> Option<InformationCriteria> {
        let ll = self.log_likelihood?;
        let n = self.residuals.as_ref()?.len();
        Some(InformationCriteria::new(ll, 1, n))
    }

    fn name(&self) -> &str {
        "HistoricMean"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn forecasts_training_mean() {
        let ts = TimeSeries::monthly(vec![1.0, 2.0, 3.0, 4.0, 5.0], 2024, 1).unwrap();
        let mut model = HistoricMean::new();
        model.fit(&ts).unwrap();

        let fc = model.predict(3).unwrap();
        assert_eq!(fc.point(), &[3.0, 3.0, 3.0]);
        let se = (2.5_f64 * 1.2).sqrt();
        for s in fc.standard_errors() {
            assert_relative_eq!(*s, se, epsilon = 1e-12);
        }
        assert_eq!(model.residuals().unwrap(), &[-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert!(model.information_criteria().is_some());
    }

    #[test]
    fn constant_series_has_no_likelihood() {
        let ts = TimeSeries::monthly(vec![4.0; 6], 2024, 1).unwrap();
        let mut model = HistoricMean::new();
        model.fit(&ts).unwrap();
        assert!(model.information_criteria().is_none());
        assert_eq!(model.predict(2).unwrap().standard_errors(), &[0.0, 0.0]);
    }

    #[test]
    fn requires_fit_and_data() {
        assert!(matches!(
            HistoricMean::new().predict(1),
            Err(ForecastError::FitRequired)
        ));
        let ts = TimeSeries::monthly(vec![1.0], 2024, 1).unwrap();
        assert!(HistoricMean::new().fit(&ts).is_err());
    }
}
