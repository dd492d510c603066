//! Forecast results: point predictions, standard errors and intervals.

use crate::core::time_series::{Period, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::utils::stats::normal_quantile;

/// Multiplier used for 95% intervals by every model family.
pub const Z_95: f64 = 1.96;

/// Point forecasts with their standard errors, aligned on the calendar
/// immediately after the series they were produced from.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    start: Period,
    frequency: usize,
    point: Vec<f64>,
    standard_errors: Vec<f64>,
}

impl Forecast {
    /// Create a forecast. Standard errors must be finite and non-negative.
    pub fn new(
        start: Period,
        frequency: usize,
        point: Vec<f64>,
        standard_errors: Vec<f64>,
    ) -> Result<Self> {
        if point.len() != standard_errors.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: point.len(),
                got: standard_errors.len(),
            });
        }
        if standard_errors.iter().any(|se| !se.is_finite() || *se < 0.0) {
            return Err(ForecastError::ComputationError(
                "forecast standard errors must be finite and non-negative".to_string(),
            ));
        }
        if point.iter().any(|p| !p.is_finite()) {
            return Err(ForecastError::ComputationError(
                "non-finite point forecast".to_string(),
            ));
        }

        Ok(Self {
            start,
            frequency,
            point,
            standard_errors,
        })
    }

    /// Empty forecast starting right after `series`.
    pub fn empty_after(series: &TimeSeries) -> Self {
        Self {
            start: series.next_period(),
            frequency: series.frequency(),
            point: Vec::new(),
            standard_errors: Vec::new(),
        }
    }

    /// Forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Period of the first forecast step.
    pub fn start(&self) -> Period {
        self.start
    }

    pub fn frequency(&self) -> usize {
        self.frequency
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn standard_errors(&self) -> &[f64] {
        &self.standard_errors
    }

    /// Calendar period of each forecast step.
    pub fn periods(&self) -> Vec<Period> {
        (0..self.horizon())
            .map(|h| self.start.advance(h as i64, self.frequency))
            .collect()
    }

    /// Prediction interval at the given confidence level using the exact
    /// normal quantile.
    pub fn interval(&self, level: f64) -> Result<PredictionInterval> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {}",
                level
            )));
        }
        let z = normal_quantile((1.0 + level) / 2.0);
        Ok(self.interval_with_z(z))
    }

    /// Prediction interval `point ± z·se` for a fixed multiplier.
    pub fn interval_with_z(&self, z: f64) -> PredictionInterval {
        let lower = self
            .point
            .iter()
            .zip(&self.standard_errors)
            .map(|(p, se)| p - z * se)
            .collect();
        let upper = self
            .point
            .iter()
            .zip(&self.standard_errors)
            .map(|(p, se)| p + z * se)
            .collect();
        PredictionInterval { z, lower, upper }
    }

    /// The 95% interval with `z = 1.96`, the convention shared by all families.
    pub fn interval_95(&self) -> PredictionInterval {
        self.interval_with_z(Z_95)
    }

    /// Point forecasts as a series on the forecast calendar.
    pub fn to_series(&self) -> Result<TimeSeries> {
        TimeSeries::new(self.point.clone(), self.start, self.frequency)
    }
}

/// Lower and upper bounds derived from a [`Forecast`].
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionInterval {
    /// Standard-normal multiplier used.
    pub z: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl PredictionInterval {
    /// Whether `value` falls inside the interval at step `h` (0-based).
    pub fn contains(&self, h: usize, value: f64) -> bool {
        match (self.lower.get(h), self.upper.get(h)) {
            (Some(lo), Some(hi)) => *lo <= value && value <= *hi,
            _ => false,
        }
    }

    /// Interval width at each step.
    pub fn widths(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(&self.lower)
            .map(|(hi, lo)| hi - lo)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Forecast {
        Forecast::new(
            Period::new(2011, 1),
            12,
            vec![10.0, 11.0, 12.0],
            vec![1.0, 1.5, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn forecast_rejects_mismatched_lengths() {
        let err = Forecast::new(Period::january(2011), 12, vec![1.0, 2.0], vec![1.0]);
        assert!(matches!(err, Err(ForecastError::DimensionMismatch { .. })));

        let err = Forecast::new(Period::january(2011), 12, vec![1.0], vec![-1.0]);
        assert!(err.is_err());
    }

    #[test]
    fn forecast_periods_follow_calendar() {
        let fc = Forecast::new(
            Period::new(2010, 11),
            12,
            vec![1.0, 2.0, 3.0],
            vec![0.0; 3],
        )
        .unwrap();
        assert_eq!(
            fc.periods(),
            vec![
                Period::new(2010, 11),
                Period::new(2010, 12),
                Period::new(2011, 1)
            ]
        );
    }

    #[test]
    fn fixed_z_interval() {
        let pi = sample().interval_95();
        assert_relative_eq!(pi.lower[0], 10.0 - 1.96, epsilon = 1e-12);
        assert_relative_eq!(pi.upper[2], 12.0 + 1.96 * 2.0, epsilon = 1e-12);
        assert!(pi.contains(1, 11.5));
        assert!(!pi.contains(1, 20.0));
        assert!(!pi.contains(5, 11.0));
    }

    #[test]
    fn level_interval_uses_normal_quantile() {
        let pi = sample().interval(0.95).unwrap();
        assert_relative_eq!(pi.z, 1.959964, epsilon = 1e-5);
        let widths = pi.widths();
        assert!(widths.windows(2).all(|w| w[1] >= w[0]));

        assert!(sample().interval(1.0).is_err());
        assert!(sample().interval(0.0).is_err());
    }

    #[test]
    fn forecast_as_series() {
        let ts = sample().to_series().unwrap();
        assert_eq!(ts.start(), Period::january(2011));
        assert_eq!(ts.values(), &[10.0, 11.0, 12.0]);
    }
}
