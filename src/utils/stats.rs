//! Statistical utility functions.

use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};
use statrs::function::erf::erf_inv;

/// Quantile function of the standard normal distribution.
///
/// # Example
/// ```
/// use seasonal_forecast::utils::normal_quantile;
///
/// let z = normal_quantile(0.975);
/// assert!((z - 1.959964).abs() < 1e-5);
/// ```
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    std::f64::consts::SQRT_2 * erf_inv(2.0 * p - 1.0)
}

/// Upper tail probability of a chi-squared distribution.
pub fn chi_squared_sf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(df) {
        Ok(dist) => dist.sf(x),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value of a Student-t statistic.
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Calculate the standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Whether a slice is numerically constant relative to its magnitude.
pub fn is_constant(values: &[f64]) -> bool {
    if values.len() < 2 {
        return true;
    }
    let scale = values.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let var = variance(values);
    !(var > (f64::EPSILON * scale).powi(2) * 1e4)
}

/// Whether the spread of `values` is below `rel_tol` times `scale`.
///
/// Used when the values are derived from a larger series, so their own
/// magnitude says nothing about what counts as roundoff.
pub fn is_negligible(values: &[f64], scale: f64, rel_tol: f64) -> bool {
    if values.len() < 2 {
        return true;
    }
    !(std_dev(values) > rel_tol * scale.abs().max(1.0))
}

/// Calculate the autocorrelation at a given lag.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag {
        return f64::NAN;
    }
    let m = mean(values);
    let n = values.len();

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for i in 0..n {
        denominator += (values[i] - m).powi(2);
        if i >= lag {
            numerator += (values[i] - m) * (values[i - lag] - m);
        }
    }

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Sample autocorrelation function for lags `1..=max_lag`.
pub fn acf(values: &[f64], max_lag: usize) -> Vec<f64> {
    (1..=max_lag).map(|k| autocorrelation(values, k)).collect()
}

/// Partial autocorrelation function for lags `1..=max_lag`
/// (Durbin-Levinson recursion on the sample autocorrelations).
pub fn pacf(values: &[f64], max_lag: usize) -> Vec<f64> {
    let max_lag = max_lag.min(values.len().saturating_sub(1));
    if max_lag == 0 {
        return Vec::new();
    }

    let rho: Vec<f64> = (0..=max_lag).map(|k| autocorrelation(values, k)).collect();
    let mut result = Vec::with_capacity(max_lag);
    let mut phi: Vec<f64> = Vec::with_capacity(max_lag);

    for k in 1..=max_lag {
        let mut num = rho[k];
        let mut denom = 1.0;
        for j in 1..k {
            num -= phi[j - 1] * rho[k - j];
            denom -= phi[j - 1] * rho[j];
        }
        if denom.abs() < 1e-12 {
            result.resize(max_lag, f64::NAN);
            return result;
        }
        let phi_kk = num / denom;

        let previous = phi.clone();
        for j in 1..k {
            phi[j - 1] = previous[j - 1] - phi_kk * previous[k - j - 1];
        }
        phi.push(phi_kk);
        result.push(phi_kk);
    }

    result
}

/// Approximate 95% significance bound for sample autocorrelations.
pub fn acf_bound(n: usize) -> f64 {
    1.96 / (n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn normal_quantile_known_values() {
        assert_relative_eq!(normal_quantile(0.5), 0.0, epsilon = 1e-12);
        assert_relative_eq!(normal_quantile(0.975), 1.959964, epsilon = 1e-6);
        assert_relative_eq!(normal_quantile(0.025), -1.959964, epsilon = 1e-6);
        assert_relative_eq!(normal_quantile(0.995), 2.575829, epsilon = 1e-6);
        assert_eq!(normal_quantile(0.0), f64::NEG_INFINITY);
        assert_eq!(normal_quantile(1.0), f64::INFINITY);
    }

    #[test]
    fn chi_squared_tail() {
        // 95th percentile of chi2(1) is 3.841
        assert_relative_eq!(chi_squared_sf(3.841459, 1.0), 0.05, epsilon = 1e-5);
        assert_relative_eq!(chi_squared_sf(0.0, 3.0), 1.0);
        assert!(chi_squared_sf(100.0, 2.0) < 1e-10);
    }

    #[test]
    fn student_t_tail() {
        // t = 2.228 is the 97.5th percentile with 10 df
        assert_relative_eq!(student_t_two_sided(2.228139, 10.0), 0.05, epsilon = 1e-5);
        assert_relative_eq!(student_t_two_sided(0.0, 5.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn mean_and_variance() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
        assert_relative_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, epsilon = 1e-10);
        assert!(variance(&[1.0]).is_nan());
        assert_relative_eq!(std_dev(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5_f64.sqrt());
    }

    #[test]
    fn constant_detection() {
        assert!(is_constant(&[3.0, 3.0, 3.0]));
        assert!(is_constant(&[1e6, 1e6, 1e6]));
        assert!(!is_constant(&[1.0, 1.1, 0.9]));
        assert!(is_constant(&[2.0]));

        // Roundoff-sized residuals of a series of magnitude 200.
        let residuals = [1e-13, -2e-13, 5e-14, -1e-13];
        assert!(!is_constant(&residuals));
        assert!(is_negligible(&residuals, 200.0, 1e-9));
        assert!(!is_negligible(&[0.1, -0.1, 0.05], 200.0, 1e-9));
    }

    #[test]
    fn pacf_of_ar1_cuts_off() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut x = vec![0.0; 400];
        for t in 1..400 {
            x[t] = 0.7 * x[t - 1] + noise.sample(&mut rng);
        }
        let p = pacf(&x, 4);
        assert_eq!(p.len(), 4);
        assert!(p[0] > 0.5);
        assert!(p[1].abs() < 0.2);

        let a = acf(&x, 4);
        assert_relative_eq!(a[0], p[0], epsilon = 1e-12);
    }

    #[test]
    fn pacf_handles_short_input() {
        assert!(pacf(&[1.0], 3).is_empty());
        assert_eq!(pacf(&[1.0, 2.0, 1.5], 5).len(), 2);
    }
}
