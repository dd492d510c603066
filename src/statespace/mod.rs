//! Linear Gaussian state-space models with a scalar observation.
//!
//! ```text
//! y_t       = Z' α_t + ε_t,     ε_t ~ N(0, H)
//! α_{t+1}   = T α_t + η_t,      η_t ~ N(0, Q)
//! ```
//!
//! The filter works with predicted quantities `a_t = E[α_t | y_1..y_{t-1}]`
//! and `P_t = Var[α_t | y_1..y_{t-1}]`.

use crate::error::{ForecastError, Result};
use nalgebra::{DMatrix, DVector};

fn symmetrize(p: &DMatrix<f64>) -> DMatrix<f64> {
    0.5 * (p + p.transpose())
}

/// Time-invariant state-space model.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpaceModel {
    /// Transition matrix T
    pub transition: DMatrix<f64>,
    /// Observation vector Z
    pub design: DVector<f64>,
    /// State disturbance covariance Q
    pub state_cov: DMatrix<f64>,
    /// Observation variance H
    pub obs_var: f64,
}

impl StateSpaceModel {
    /// Create a model, checking that the matrices agree in dimension.
    pub fn new(
        transition: DMatrix<f64>,
        design: DVector<f64>,
        state_cov: DMatrix<f64>,
        obs_var: f64,
    ) -> Result<Self> {
        let k = design.len();
        for (rows, cols) in [transition.shape(), state_cov.shape()] {
            if rows != k || cols != k {
                return Err(ForecastError::DimensionMismatch {
                    expected: k,
                    got: if rows != k { rows } else { cols },
                });
            }
        }
        if !(obs_var >= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "observation variance must be non-negative, got {}",
                obs_var
            )));
        }
        Ok(Self {
            transition,
            design,
            state_cov,
            obs_var,
        })
    }

    /// State dimension.
    pub fn dim(&self) -> usize {
        self.design.len()
    }

    /// One prediction step without an observation.
    pub fn predict_step(&self, a: &DVector<f64>, p: &DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
        let a_next = &self.transition * a;
        let p_next = &self.transition * p * self.transition.transpose() + &self.state_cov;
        (a_next, symmetrize(&p_next))
    }

    /// Run the Kalman filter from the initial state `(a0, p0)`.
    ///
    /// The first `burn_in` observations update the state but are left out
    /// of the log-likelihood.
    pub fn filter(
        &self,
        y: &[f64],
        a0: &DVector<f64>,
        p0: &DMatrix<f64>,
        burn_in: usize,
    ) -> Result<FilterOutput> {
        let n = y.len();
        let k = self.dim();
        if a0.len() != k || p0.shape() != (k, k) {
            return Err(ForecastError::DimensionMismatch {
                expected: k,
                got: a0.len(),
            });
        }
        if n <= burn_in {
            return Err(ForecastError::InsufficientData {
                needed: burn_in + 1,
                got: n,
            });
        }

        let mut a = a0.clone();
        let mut p = p0.clone();
        let mut out = FilterOutput {
            log_likelihood: 0.0,
            predicted_states: Vec::with_capacity(n),
            predicted_covs: Vec::with_capacity(n),
            innovations: Vec::with_capacity(n),
            innovation_vars: Vec::with_capacity(n),
            next_state: DVector::zeros(k),
            next_cov: DMatrix::zeros(k, k),
        };

        let ln_2pi = (2.0 * std::f64::consts::PI).ln();
        let mut pz = DVector::<f64>::zeros(k);
        for (t, &obs) in y.iter().enumerate() {
            pz.gemv(1.0, &p, &self.design, 0.0);
            let f = self.design.dot(&pz) + self.obs_var;
            if !(f > 0.0) || !f.is_finite() {
                return Err(ForecastError::ComputationError(format!(
                    "innovation variance {} at t={} is not positive",
                    f, t
                )));
            }
            let v = obs - self.design.dot(&a);

            out.predicted_states.push(a.clone());
            out.predicted_covs.push(p.clone());
            out.innovations.push(v);
            out.innovation_vars.push(f);
            if t >= burn_in {
                out.log_likelihood -= 0.5 * (ln_2pi + f.ln() + v * v / f);
            }

            a.axpy(v / f, &pz, 1.0);
            p.ger(-1.0 / f, &pz, &pz, 1.0);
            let (a_next, p_next) = self.predict_step(&a, &p);
            a = a_next;
            p = p_next;
        }

        out.next_state = a;
        out.next_cov = p;
        Ok(out)
    }

    /// Fixed-interval smoothed states `E[α_t | y_1..y_n]`.
    ///
    /// Backward recursion on `r_t`:
    /// `r_{t-1} = Z v_t / F_t + L_t' r_t`, `L_t = T - K_t Z'`,
    /// `K_t = T P_t Z / F_t`, and `α̂_t = a_t + P_t r_{t-1}`.
    pub fn smooth(&self, filtered: &FilterOutput) -> Vec<DVector<f64>> {
        let n = filtered.innovations.len();
        let k = self.dim();
        let mut r = DVector::<f64>::zeros(k);
        let mut smoothed = vec![DVector::zeros(k); n];

        for t in (0..n).rev() {
            let p = &filtered.predicted_covs[t];
            let f = filtered.innovation_vars[t];
            let v = filtered.innovations[t];

            let gain = &self.transition * (p * &self.design) / f;
            let l = &self.transition - &gain * self.design.transpose();
            r = &self.design * (v / f) + l.transpose() * &r;
            smoothed[t] = &filtered.predicted_states[t] + p * &r;
        }
        smoothed
    }

    /// Forecast observations `h = 1..=horizon` steps after the filtered
    /// data: means `Z'a` and variances `Z'PZ + H`.
    pub fn forecast(&self, filtered: &FilterOutput, horizon: usize) -> (Vec<f64>, Vec<f64>) {
        let mut a = filtered.next_state.clone();
        let mut p = filtered.next_cov.clone();
        let mut means = Vec::with_capacity(horizon);
        let mut variances = Vec::with_capacity(horizon);
        for step in 0..horizon {
            if step > 0 {
                let (a_next, p_next) = self.predict_step(&a, &p);
                a = a_next;
                p = p_next;
            }
            means.push(self.design.dot(&a));
            variances.push((&p * &self.design).dot(&self.design) + self.obs_var);
        }
        (means, variances)
    }
}

/// Output of [`StateSpaceModel::filter`].
#[derive(Debug, Clone)]
pub struct FilterOutput {
    /// Gaussian log-likelihood after the burn-in
    pub log_likelihood: f64,
    /// `a_t` for every observation
    pub predicted_states: Vec<DVector<f64>>,
    /// `P_t` for every observation
    pub predicted_covs: Vec<DMatrix<f64>>,
    /// `v_t = y_t - Z'a_t`
    pub innovations: Vec<f64>,
    /// `F_t = Z'P_tZ + H`
    pub innovation_vars: Vec<f64>,
    /// `a_{n+1}`
    pub next_state: DVector<f64>,
    /// `P_{n+1}`
    pub next_cov: DMatrix<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn local_level(level_var: f64, obs_var: f64) -> StateSpaceModel {
        StateSpaceModel::new(
            DMatrix::from_element(1, 1, 1.0),
            DVector::from_element(1, 1.0),
            DMatrix::from_element(1, 1, level_var),
            obs_var,
        )
        .unwrap()
    }

    #[test]
    fn local_level_filter_by_hand() {
        let model = local_level(1.0, 1.0);
        let a0 = DVector::from_element(1, 0.0);
        let p0 = DMatrix::from_element(1, 1, 1.0);
        let out = model.filter(&[2.0, 1.0], &a0, &p0, 0).unwrap();

        // t=0: F = 2, v = 2, a = 1, P = 0.5, then P = 1.5
        assert_relative_eq!(out.innovation_vars[0], 2.0);
        assert_relative_eq!(out.innovations[0], 2.0);
        // t=1: F = 2.5, v = 0
        assert_relative_eq!(out.innovation_vars[1], 2.5);
        assert_relative_eq!(out.innovations[1], 0.0);
        let ln_2pi = (2.0 * std::f64::consts::PI).ln();
        let expected = -0.5 * (ln_2pi + 2.0_f64.ln() + 2.0) - 0.5 * (ln_2pi + 2.5_f64.ln());
        assert_relative_eq!(out.log_likelihood, expected, epsilon = 1e-12);
    }

    #[test]
    fn burn_in_is_excluded() {
        let model = local_level(0.5, 1.0);
        let a0 = DVector::from_element(1, 0.0);
        let p0 = DMatrix::from_element(1, 1, 10.0);
        let y = [1.0, 2.0, 1.5, 1.8];
        let all = model.filter(&y, &a0, &p0, 0).unwrap();
        let burned = model.filter(&y, &a0, &p0, 1).unwrap();
        let first = -0.5
            * ((2.0 * std::f64::consts::PI).ln()
                + all.innovation_vars[0].ln()
                + all.innovations[0].powi(2) / all.innovation_vars[0]);
        assert_relative_eq!(all.log_likelihood - first, burned.log_likelihood, epsilon = 1e-12);
        assert!(model.filter(&y, &a0, &p0, 4).is_err());
    }

    #[test]
    fn smoother_without_observation_noise_reproduces_data() {
        let model = local_level(1.0, 0.0);
        let a0 = DVector::from_element(1, 0.0);
        let p0 = DMatrix::from_element(1, 1, 1e6);
        let y = [3.0, 4.0, 2.0, 5.0];
        let out = model.filter(&y, &a0, &p0, 1).unwrap();
        let smoothed = model.smooth(&out);
        for (s, obs) in smoothed.iter().zip(y) {
            assert_relative_eq!(s[0], obs, epsilon = 1e-6);
        }
    }

    #[test]
    fn smoother_last_state_equals_filtered() {
        let model = local_level(0.3, 1.0);
        let a0 = DVector::from_element(1, 0.0);
        let p0 = DMatrix::from_element(1, 1, 100.0);
        let y = [1.0, 1.4, 0.8, 1.1, 1.3];
        let out = model.filter(&y, &a0, &p0, 0).unwrap();
        let smoothed = model.smooth(&out);

        let n = y.len() - 1;
        let p = out.predicted_covs[n][(0, 0)];
        let filtered = out.predicted_states[n][0] + p / out.innovation_vars[n] * out.innovations[n];
        assert_relative_eq!(smoothed[n][0], filtered, epsilon = 1e-12);
    }

    #[test]
    fn forecast_variance_grows() {
        let model = local_level(0.5, 1.0);
        let a0 = DVector::from_element(1, 0.0);
        let p0 = DMatrix::from_element(1, 1, 10.0);
        let out = model.filter(&[1.0, 2.0, 1.5], &a0, &p0, 0).unwrap();
        let (means, vars) = model.forecast(&out, 4);
        assert!(means.iter().all(|m| (m - means[0]).abs() < 1e-12));
        for w in vars.windows(2) {
            assert_relative_eq!(w[1] - w[0], 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn dimension_checks() {
        let bad = StateSpaceModel::new(
            DMatrix::identity(2, 2),
            DVector::from_element(3, 1.0),
            DMatrix::identity(3, 3),
            1.0,
        );
        assert!(matches!(bad, Err(ForecastError::DimensionMismatch { .. })));
        assert!(StateSpaceModel::new(
            DMatrix::identity(1, 1),
            DVector::from_element(1, 1.0),
            DMatrix::identity(1, 1),
            -1.0
        )
        .is_err());
    }
}
