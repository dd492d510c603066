//! Ordinary Least Squares (OLS) on an explicit design matrix.
//!
//! The normal equations `X'X β = X'y` are solved by Cholesky decomposition.
//! The same factor gives `(X'X)⁻¹`, from which coefficient standard errors
//! and the parameter-uncertainty part of a prediction variance follow.

use crate::error::{ForecastError, Result};

/// Fitted OLS regression.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Coefficients, one per design column.
    pub coefficients: Vec<f64>,
    /// Standard errors of the coefficients.
    pub standard_errors: Vec<f64>,
    /// In-sample fitted values `Xβ`.
    pub fitted: Vec<f64>,
    /// Residuals `y - Xβ`.
    pub residuals: Vec<f64>,
    /// Unbiased residual variance `RSS / (n - k)`.
    pub sigma2: f64,
    /// Residual degrees of freedom `n - k`.
    pub df_resid: usize,
    xtx_inv: Vec<Vec<f64>>,
}

impl OLSResult {
    /// Prediction `x'β` for one design row.
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        self.check_row(row)?;
        Ok(dot(row, &self.coefficients))
    }

    /// Variance of the estimated mean at `row`, `σ²·x'(X'X)⁻¹x`.
    pub fn mean_variance(&self, row: &[f64]) -> Result<f64> {
        self.check_row(row)?;
        let quad: f64 = self
            .xtx_inv
            .iter()
            .zip(row)
            .map(|(inv_row, xi)| xi * dot(inv_row, row))
            .sum();
        Ok(self.sigma2 * quad.max(0.0))
    }

    /// Number of design columns.
    pub fn num_coefficients(&self) -> usize {
        self.coefficients.len()
    }

    fn check_row(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.coefficients.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: row.len(),
            });
        }
        Ok(())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Fit `y = Xβ + e`.
///
/// # Arguments
/// * `design` - Rows of the design matrix (an intercept column, if wanted,
///   must be included explicitly)
/// * `y` - Response, one value per row
///
/// # Errors
/// `InsufficientData` unless there are more rows than columns,
/// `DimensionMismatch` for ragged input and `ComputationError` when `X'X` is
/// singular.
pub fn ols_fit(design: &[Vec<f64>], y: &[f64]) -> Result<OLSResult> {
    let n = y.len();
    if design.len() != n {
        return Err(ForecastError::DimensionMismatch {
            expected: n,
            got: design.len(),
        });
    }
    let k = design.first().map_or(0, |row| row.len());
    if k == 0 || n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &y_obs) in design.iter().zip(y) {
        if row.len() != k {
            return Err(ForecastError::DimensionMismatch {
                expected: k,
                got: row.len(),
            });
        }
        for i in 0..k {
            xty[i] += row[i] * y_obs;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
    }

    let singular = || ForecastError::ComputationError("OLS normal matrix is singular".into());
    let l = cholesky(&xtx).ok_or_else(singular)?;
    let coefficients = cholesky_solve(&l, &xty);
    let xtx_inv = cholesky_inverse(&l);

    let fitted: Vec<f64> = design.iter().map(|row| dot(row, &coefficients)).collect();
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(a, f)| a - f).collect();
    let df_resid = n - k;
    let sigma2 = residuals.iter().map(|r| r * r).sum::<f64>() / df_resid as f64;
    let standard_errors = (0..k)
        .map(|i| (sigma2 * xtx_inv[i][i]).max(0.0).sqrt())
        .collect();

    Ok(OLSResult {
        coefficients,
        standard_errors,
        fitted,
        residuals,
        sigma2,
        df_resid,
        xtx_inv,
    })
}

/// Cholesky factor `L` of a symmetric positive definite matrix (`A = LL'`).
///
/// Returns `None` when a pivot is not positive relative to the diagonal.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let scale = (0..n).fold(0.0_f64, |acc, i| acc.max(a[i][i].abs()));
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for m in 0..j {
                sum -= l[i][m] * l[j][m];
            }
            if i == j {
                if sum <= 1e-12 * scale {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(l)
}

/// Solve `LL'x = b` by forward then backward substitution.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut y = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[i][j] * y[j]).sum();
        y[i] = (b[i] - sum) / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[j][i] * x[j]).sum();
        x[i] = (y[i] - sum) / l[i][i];
    }
    x
}

fn cholesky_inverse(l: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = l.len();
    let mut inv = vec![vec![0.0; n]; n];
    let mut unit = vec![0.0; n];
    for col in 0..n {
        unit.iter_mut().for_each(|u| *u = 0.0);
        unit[col] = 1.0;
        let x = cholesky_solve(l, &unit);
        for row in 0..n {
            inv[row][col] = x[row];
        }
    }
    inv
}
