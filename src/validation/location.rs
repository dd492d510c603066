//! One-sample location test.

use crate::error::{ForecastError, Result};
use crate::utils::stats::{mean, std_dev, student_t_two_sided};

/// Result of a one-sample t test of `H0: mean = mu`.
#[derive(Debug, Clone, PartialEq)]
pub struct TTestResult {
    pub mean: f64,
    pub statistic: f64,
    pub df: usize,
    /// Two-sided p-value
    pub p_value: f64,
}

impl TTestResult {
    /// True when the null hypothesis is not rejected at level `alpha`.
    pub fn is_consistent_with_null(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Two-sided one-sample Student t test.
///
/// # Errors
/// `InsufficientData` for fewer than two values and `DegenerateSeries` when
/// the values have zero variance.
pub fn one_sample_t_test(values: &[f64], mu: f64) -> Result<TTestResult> {
    if values.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            got: values.len(),
        });
    }

    let m = mean(values);
    let sd = std_dev(values);
    if !(sd > 0.0) {
        return Err(ForecastError::DegenerateSeries(
            "t test on values with zero variance".to_string(),
        ));
    }

    let n = values.len();
    let statistic = (m - mu) / (sd / (n as f64).sqrt());
    let df = n - 1;
    Ok(TTestResult {
        mean: m,
        statistic,
        df,
        p_value: student_t_two_sided(statistic, df as f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn statistic_by_hand() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = one_sample_t_test(&values, 2.0).unwrap();
        // mean 3, sd sqrt(2.5), se sqrt(0.5)
        assert_relative_eq!(result.statistic, 1.0 / 0.5_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(result.df, 4);
        assert!(result.p_value > 0.2 && result.p_value < 0.3);
    }

    #[test]
    fn centred_values_are_consistent_with_zero() {
        let values = [0.3, -0.2, 0.1, -0.4, 0.25, -0.05, 0.0, 0.1];
        let result = one_sample_t_test(&values, 0.0).unwrap();
        assert!(result.is_consistent_with_null(0.05));

        let shifted: Vec<f64> = values.iter().map(|v| v + 5.0).collect();
        let result = one_sample_t_test(&shifted, 0.0).unwrap();
        assert!(!result.is_consistent_with_null(0.05));
    }

    #[test]
    fn degenerate_inputs() {
        assert!(matches!(
            one_sample_t_test(&[1.0], 0.0),
            Err(ForecastError::InsufficientData { .. })
        ));
        assert!(matches!(
            one_sample_t_test(&[2.0, 2.0, 2.0], 0.0),
            Err(ForecastError::DegenerateSeries(_))
        ));
    }
}
