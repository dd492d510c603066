//! Accuracy metrics for forecast evaluation.

use crate::error::{ForecastError, Result};

/// Accuracy of a forecast against held-out observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (None if zeros in actual)
    pub mape: Option<f64>,
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    Ok(())
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// # Example
/// ```
/// use seasonal_forecast::utils::calculate_metrics;
///
/// let m = calculate_metrics(&[100.0, 200.0], &[110.0, 180.0]).unwrap();
/// assert!((m.mae - 15.0).abs() < 1e-12);
/// assert!((m.mape.unwrap() - 10.0).abs() < 1e-12);
/// ```
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    check_lengths(actual, predicted)?;
    Ok(AccuracyMetrics {
        mae: mae(actual, predicted),
        rmse: rmse(actual, predicted),
        mape: mape(actual, predicted).ok(),
    })
}

/// Mean absolute error.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n as f64
}

/// Root mean squared error, `sqrt(mean((a - f)²))`.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n as f64;
    mse.sqrt()
}

/// Mean absolute percentage error, `mean(|a - f| / |a|)·100`.
///
/// # Errors
/// `InvalidParameter` when an actual value is zero.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    if let Some(i) = actual.iter().position(|&a| a == 0.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "MAPE undefined: actual value at {} is zero",
            i
        )));
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| ((a - p) / a).abs())
        .sum();
    Ok(100.0 * sum / actual.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_prediction() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let m = calculate_metrics(&actual, &actual).unwrap();
        assert_relative_eq!(m.mae, 0.0);
        assert_relative_eq!(m.rmse, 0.0);
        assert_relative_eq!(m.mape.unwrap(), 0.0);
    }

    #[test]
    fn known_values() {
        let actual = vec![10.0, 20.0, 40.0];
        let predicted = vec![12.0, 18.0, 44.0];
        let m = calculate_metrics(&actual, &predicted).unwrap();

        assert_relative_eq!(m.mae, 8.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m.rmse, (24.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(m.mape.unwrap(), 100.0 * 0.4 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn mape_with_zero_actual() {
        let actual = vec![0.0, 1.0];
        assert!(matches!(
            mape(&actual, &[0.5, 1.0]),
            Err(ForecastError::InvalidParameter(_))
        ));
        let m = calculate_metrics(&actual, &[0.5, 1.0]).unwrap();
        assert!(m.mape.is_none());
        assert_relative_eq!(m.mae, 0.25);
    }

    #[test]
    fn shape_errors() {
        assert!(matches!(
            calculate_metrics(&[1.0, 2.0], &[1.0]),
            Err(ForecastError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            calculate_metrics(&[], &[]),
            Err(ForecastError::EmptyData)
        ));
        assert!(rmse(&[], &[]).is_nan());
    }
}
