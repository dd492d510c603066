//! Likelihood evaluation for stationary ARMA processes.
//!
//! The exact Gaussian likelihood is computed with a Kalman filter on the
//! Harvey state-space form:
//!
//! ```text
//! w_t       = Z α_t,                 Z = [1, 0, ..., 0]
//! α_{t+1}   = T α_t + R e_{t+1},     T = companion(φ), R = [1, θ_1, ..., θ_{r-1}]'
//! ```
//!
//! with `r = max(p, q + 1)`. The innovation variance is concentrated out, so
//! the filter runs with unit disturbance variance.

use nalgebra::{DMatrix, DVector};

/// Output of a likelihood evaluation.
#[derive(Debug, Clone)]
pub struct ArmaFilterOutput {
    /// Concentrated log-likelihood.
    pub log_likelihood: f64,
    /// Maximum likelihood estimate of the innovation variance.
    pub sigma2: f64,
    /// One-step-ahead prediction errors `v_t`.
    pub innovations: Vec<f64>,
    /// Predicted state `a_{n+1|n}` after the last observation.
    pub next_state: DVector<f64>,
}

/// Harvey state-space representation of an ARMA(p, q) process.
#[derive(Debug, Clone)]
pub struct ArmaStateSpace {
    phi: Vec<f64>,
    rr: DMatrix<f64>,
    dim: usize,
}

impl ArmaStateSpace {
    pub fn new(ar: &[f64], ma: &[f64]) -> Self {
        let dim = ar.len().max(ma.len() + 1);
        let mut phi = vec![0.0; dim];
        phi[..ar.len()].copy_from_slice(ar);

        let mut r = DVector::zeros(dim);
        r[0] = 1.0;
        for (j, &theta) in ma.iter().enumerate() {
            r[j + 1] = theta;
        }
        let rr = &r * r.transpose();

        Self { phi, rr, dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// `T x` for the companion transition.
    pub fn transition_vector(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut out = DVector::zeros(self.dim);
        for i in 0..self.dim {
            out[i] = self.phi[i] * x[0] + if i + 1 < self.dim { x[i + 1] } else { 0.0 };
        }
        out
    }

    /// `T P T' + R R'` using the sparsity of the companion matrix.
    fn propagate(&self, p: &DMatrix<f64>) -> DMatrix<f64> {
        let k = self.dim;
        let mut tp = DMatrix::zeros(k, k);
        for i in 0..k {
            for j in 0..k {
                let below = if i + 1 < k { p[(i + 1, j)] } else { 0.0 };
                tp[(i, j)] = self.phi[i] * p[(0, j)] + below;
            }
        }
        let mut out = self.rr.clone();
        for i in 0..k {
            for j in 0..k {
                let right = if j + 1 < k { tp[(i, j + 1)] } else { 0.0 };
                out[(i, j)] += self.phi[j] * tp[(i, 0)] + right;
            }
        }
        out
    }

    fn transition_matrix(&self) -> DMatrix<f64> {
        let k = self.dim;
        let mut t = DMatrix::zeros(k, k);
        for i in 0..k {
            t[(i, 0)] = self.phi[i];
            if i + 1 < k {
                t[(i, i + 1)] = 1.0;
            }
        }
        t
    }

    /// Unconditional state covariance, solving `P = T P T' + R R'` by the
    /// doubling algorithm.
    pub fn stationary_covariance(&self) -> DMatrix<f64> {
        let mut p = self.rr.clone();
        let mut a = self.transition_matrix();
        for _ in 0..64 {
            let increment = &a * &p * a.transpose();
            p += &increment;
            a = &a * &a;
            if a.amax() < 1e-14 || increment.amax() < 1e-14 * p.amax().max(1.0) {
                break;
            }
        }
        p
    }

    /// Run the filter over a zero-mean series.
    pub fn filter(&self, w: &[f64]) -> Option<ArmaFilterOutput> {
        let n = w.len();
        if n == 0 {
            return None;
        }

        let k = self.dim;
        let mut a = DVector::zeros(k);
        let mut p = self.stationary_covariance();
        if !p.iter().all(|v| v.is_finite()) {
            return None;
        }

        let mut innovations = Vec::with_capacity(n);
        let mut sum_log_f = 0.0;
        let mut sum_v2_f = 0.0;

        for &obs in w {
            let v = obs - a[0];
            let f = p[(0, 0)];
            if !(f > 0.0) || !f.is_finite() {
                return None;
            }
            innovations.push(v);
            sum_log_f += f.ln();
            sum_v2_f += v * v / f;

            let pz = p.column(0).clone_owned();
            let mut a_filtered = a.clone();
            a_filtered.axpy(v / f, &pz, 1.0);
            let mut p_filtered = p.clone();
            p_filtered.ger(-1.0 / f, &pz, &pz, 1.0);

            a = self.transition_vector(&a_filtered);
            p = self.propagate(&p_filtered);
        }

        let n_f = n as f64;
        let sigma2 = sum_v2_f / n_f;
        if !(sigma2 > 0.0) || !sigma2.is_finite() {
            return None;
        }
        let log_likelihood = -0.5 * n_f * (2.0 * std::f64::consts::PI).ln()
            - 0.5 * n_f * sigma2.ln()
            - 0.5 * n_f
            - 0.5 * sum_log_f;

        Some(ArmaFilterOutput {
            log_likelihood,
            sigma2,
            innovations,
            next_state: a,
        })
    }

    /// Point forecasts `E[w_{n+h}]` for `h = 1..=horizon` from `a_{n+1|n}`.
    pub fn forecast(&self, next_state: &DVector<f64>, horizon: usize) -> Vec<f64> {
        let mut state = next_state.clone();
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            out.push(state[0]);
            state = self.transition_vector(&state);
        }
        out
    }
}

/// Conditional sum of squares of a zero-mean series under ARMA coefficients.
///
/// Residuals before the first usable time point are taken as zero.
pub fn conditional_sum_of_squares(w: &[f64], ar: &[f64], ma: &[f64]) -> f64 {
    let n = w.len();
    let start = ar.len();
    if n <= start {
        return f64::INFINITY;
    }

    let mut residuals = vec![0.0; n];
    let mut css = 0.0;
    for t in start..n {
        let mut pred = 0.0;
        for (i, &a) in ar.iter().enumerate() {
            pred += a * w[t - 1 - i];
        }
        for (j, &m) in ma.iter().enumerate() {
            if t > j {
                pred += m * residuals[t - 1 - j];
            }
        }
        let e = w[t] - pred;
        residuals[t] = e;
        css += e * e;
    }
    css
}
