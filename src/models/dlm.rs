//! Dynamic linear model: local linear trend plus trigonometric seasonal.
//!
//! State vector for period `s` with `m = ⌊s/2⌋` harmonics:
//!
//! ```text
//! [level, slope, c_1, c*_1, ..., c_m, c*_m]
//! ```
//!
//! Each harmonic `j` rotates its pair by `λ_j = 2πj/s`. The observation is
//! `level + Σ c_j + ε`. The four variances (observation, level, slope,
//! seasonal) are estimated by maximum likelihood over their logarithms.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::{Forecaster, InformationCriteria};
use crate::statespace::{FilterOutput, StateSpaceModel};
use crate::utils::optimization::{minimize, NelderMeadConfig};
use crate::utils::stats::variance;
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;
use tracing::{debug, info};

/// Variances of the DLM disturbances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DlmParams {
    pub obs_var: f64,
    pub level_var: f64,
    pub slope_var: f64,
    /// Shared by every seasonal state
    pub seasonal_var: f64,
}

impl DlmParams {
    pub fn from_log_variances(log_variances: &[f64; 4]) -> Self {
        Self {
            obs_var: log_variances[0].exp(),
            level_var: log_variances[1].exp(),
            slope_var: log_variances[2].exp(),
            seasonal_var: log_variances[3].exp(),
        }
    }

    fn validate(&self) -> Result<()> {
        let all = [self.obs_var, self.level_var, self.slope_var, self.seasonal_var];
        if all.iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
            return Err(ForecastError::InvalidParameter(format!(
                "variances must be finite and non-negative, got {:?}",
                all
            )));
        }
        Ok(())
    }
}

/// Number of seasonal harmonics for a period.
pub fn harmonics(period: usize) -> usize {
    period / 2
}

/// State dimension of the DLM for a period.
pub fn state_dim(period: usize) -> usize {
    2 + 2 * harmonics(period)
}

/// Build the state-space form of the DLM for given variances.
pub fn build_dlm_with(params: &DlmParams, period: usize) -> Result<StateSpaceModel> {
    if period < 2 {
        return Err(ForecastError::InvalidParameter(format!(
            "DLM seasonal period must be at least 2, got {}",
            period
        )));
    }
    params.validate()?;

    let k = state_dim(period);
    let mut transition = DMatrix::zeros(k, k);
    let mut design = DVector::zeros(k);
    let mut state_cov = DMatrix::zeros(k, k);

    // Local linear trend
    transition[(0, 0)] = 1.0;
    transition[(0, 1)] = 1.0;
    transition[(1, 1)] = 1.0;
    design[0] = 1.0;
    state_cov[(0, 0)] = params.level_var;
    state_cov[(1, 1)] = params.slope_var;

    for j in 0..harmonics(period) {
        let lambda = 2.0 * PI * (j + 1) as f64 / period as f64;
        let (sin, cos) = lambda.sin_cos();
        let i = 2 + 2 * j;
        transition[(i, i)] = cos;
        transition[(i, i + 1)] = sin;
        transition[(i + 1, i)] = -sin;
        transition[(i + 1, i + 1)] = cos;
        design[i] = 1.0;
        state_cov[(i, i)] = params.seasonal_var;
        state_cov[(i + 1, i + 1)] = params.seasonal_var;
    }

    StateSpaceModel::new(transition, design, state_cov, params.obs_var)
}

/// Build the DLM from `[ln obs_var, ln level_var, ln slope_var, ln seasonal_var]`.
pub fn build_dlm(log_variances: &[f64; 4], period: usize) -> Result<StateSpaceModel> {
    build_dlm_with(&DlmParams::from_log_variances(log_variances), period)
}

/// Configuration for [`DLM`].
#[derive(Debug, Clone)]
pub struct DlmConfig {
    /// Seasonal period; the series frequency when `None`.
    pub period: Option<usize>,
    /// Fixed variances; skips maximum likelihood when set.
    pub fixed: Option<DlmParams>,
    pub optimizer: NelderMeadConfig,
    /// Bounds applied to every log-variance.
    pub log_variance_bounds: (f64, f64),
}

impl Default for DlmConfig {
    fn default() -> Self {
        Self {
            period: None,
            fixed: None,
            optimizer: NelderMeadConfig {
                max_iter: 3000,
                tolerance: 1e-8,
                initial_step: 1.0,
                ..Default::default()
            },
            log_variance_bounds: (-40.0, 40.0),
        }
    }
}

impl DlmConfig {
    pub fn with_period(mut self, period: usize) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_fixed_variances(mut self, params: DlmParams) -> Self {
        self.fixed = Some(params);
        self
    }

    pub fn with_optimizer(mut self, config: NelderMeadConfig) -> Self {
        self.optimizer = config;
        self
    }
}

/// Smoothed components of the observed series.
#[derive(Debug, Clone, PartialEq)]
pub struct DlmDecomposition {
    pub level: Vec<f64>,
    pub slope: Vec<f64>,
    /// Sum of the harmonic states
    pub seasonal: Vec<f64>,
}

/// Trend + trigonometric seasonal dynamic linear model.
#[derive(Debug, Clone)]
pub struct DLM {
    config: DlmConfig,
    // Fitted state
    series: Option<TimeSeries>,
    params: Option<DlmParams>,
    model: Option<StateSpaceModel>,
    filtered: Option<FilterOutput>,
    burn_in: usize,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl DLM {
    pub fn new(config: DlmConfig) -> Self {
        Self {
            config,
            series: None,
            params: None,
            model: None,
            filtered: None,
            burn_in: 0,
            fitted: None,
            residuals: None,
        }
    }

    /// DLM with known variances.
    pub fn with_fixed_variances(params: DlmParams) -> Self {
        Self::new(DlmConfig::default().with_fixed_variances(params))
    }

    /// Estimated (or fixed) variances.
    pub fn params(&self) -> Option<DlmParams> {
        self.params
    }

    pub fn state_space(&self) -> Option<&StateSpaceModel> {
        self.model.as_ref()
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.filtered.as_ref().map(|f| f.log_likelihood)
    }

    /// Initial state `[y_0, 0, ...]` with a large diagonal covariance
    /// scaled to the data.
    fn initial_state(y: &[f64], k: usize) -> (DVector<f64>, DMatrix<f64>) {
        let mut a0 = DVector::zeros(k);
        a0[0] = y[0];
        let spread = variance(y);
        let kappa = 1e6 * if spread.is_finite() { spread.max(1.0) } else { 1.0 };
        (a0, DMatrix::identity(k, k) * kappa)
    }

    fn estimate(&self, y: &[f64], period: usize) -> Result<DlmParams> {
        let k = state_dim(period);
        let (a0, p0) = Self::initial_state(y, k);
        let objective = |log_vars: &[f64]| {
            let lv = [log_vars[0], log_vars[1], log_vars[2], log_vars[3]];
            build_dlm(&lv, period)
                .and_then(|m| m.filter(y, &a0, &p0, k))
                .map(|out| -out.log_likelihood)
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(f64::INFINITY)
        };

        let bounds = [self.config.log_variance_bounds; 4];
        let result = minimize(
            "DLM maximum likelihood",
            objective,
            &[0.0; 4],
            Some(&bounds),
            self.config.optimizer.clone(),
        )?;
        debug!(
            iterations = result.iterations,
            neg_loglik = result.optimal_value,
            "DLM variances estimated"
        );
        let p = &result.optimal_point;
        Ok(DlmParams::from_log_variances(&[p[0], p[1], p[2], p[3]]))
    }

    /// Smoothed level, slope and seasonal components at every observation.
    pub fn smooth(&self) -> Result<DlmDecomposition> {
        let model = self.model.as_ref().ok_or(ForecastError::FitRequired)?;
        let filtered = self.filtered.as_ref().ok_or(ForecastError::FitRequired)?;
        let states = model.smooth(filtered);

        let mut decomposition = DlmDecomposition {
            level: Vec::with_capacity(states.len()),
            slope: Vec::with_capacity(states.len()),
            seasonal: Vec::with_capacity(states.len()),
        };
        for state in &states {
            decomposition.level.push(state[0]);
            decomposition.slope.push(state[1]);
            decomposition
                .seasonal
                .push(state.iter().skip(2).step_by(2).sum());
        }
        Ok(decomposition)
    }

    /// Residuals after the burn-in period.
    pub fn innovations(&self) -> Option<&[f64]> {
        self.residuals.as_deref().map(|r| &r[self.burn_in.min(r.len())..])
    }

    fn clear_fit(&mut self) {
        self.series = None;
        self.params = None;
        self.model = None;
        self.filtered = None;
        self.burn_in = 0;
        self.fitted = None;
        self.residuals = None;
    }
}

impl Default for DLM {
    fn default() -> Self {
        Self::new(DlmConfig::default())
    }
}

impl Forecaster for DLM {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.clear_fit();
        let period = self.config.period.unwrap_or_else(|| series.frequency());
        if period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "DLM seasonal period must be at least 2, got {}",
                period
            )));
        }
        let k = state_dim(period);
        if series.len() <= k + 1 {
            return Err(ForecastError::InsufficientData {
                needed: k + 2,
                got: series.len(),
            });
        }

        let y = series.values();
        let params = match self.config.fixed {
            Some(params) => params,
            None => self.estimate(y, period)?,
        };

        let model = build_dlm_with(&params, period)?;
        let (a0, p0) = Self::initial_state(y, k);
        let filtered = model.filter(y, &a0, &p0, k)?;
        if !filtered.log_likelihood.is_finite() {
            return Err(ForecastError::ComputationError(
                "DLM likelihood is not finite at the estimated variances".to_string(),
            ));
        }

        info!(
            obs_var = params.obs_var,
            level_var = params.level_var,
            slope_var = params.slope_var,
            seasonal_var = params.seasonal_var,
            loglik = filtered.log_likelihood,
            "fitted DLM"
        );

        self.fitted = Some(
            y.iter()
                .zip(&filtered.innovations)
                .map(|(obs, v)| obs - v)
                .collect(),
        );
        self.residuals = Some(filtered.innovations.clone());
        self.burn_in = k;
        self.series = Some(series.clone());
        self.params = Some(params);
        self.model = Some(model);
        self.filtered = Some(filtered);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let series = self.series.as_ref().ok_or(ForecastError::FitRequired)?;
        let model = self.model.as_ref().ok_or(ForecastError::FitRequired)?;
        let filtered = self.filtered.as_ref().ok_or(ForecastError::FitRequired)?;

        let (point, variances) = model.forecast(filtered, horizon);
        let standard_errors = variances.iter().map(|v| v.max(0.0).sqrt()).collect();
        Forecast::new(
            series.next_period(),
            series.frequency(),
            point,
            standard_errors,
        )
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn information_criteria(&self) -> Option<InformationCriteria> {
        let ll = self.log_likelihood()?;
        let n = self.residuals.as_ref()?.len().saturating_sub(self.burn_in);
        // The observation variance takes the role of the innovation variance.
        let estimated = if self.config.fixed.is_some() { 0 } else { 3 };
        Some(InformationCriteria::new(ll, estimated, n))
    }

    fn name(&self) -> &str {
        "DLM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use crate::data::synthetic::{trend_seasonal, SyntheticConfig};
    use approx::assert_relative_eq;

    #[test]
    fn monthly_model_has_fourteen_states() {
        let model = build_dlm(&[0.0; 4], 12).unwrap();
        assert_eq!(model.dim(), 14);
        assert_eq!(state_dim(4), 6);
        // Observation picks level and every cosine state.
        let z: Vec<f64> = model.design.iter().copied().collect();
        assert_eq!(z, vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        assert_relative_eq!(model.obs_var, 1.0);
        assert!(build_dlm(&[0.0; 4], 1).is_err());
    }

    #[test]
    fn seasonal_block_has_period_s() {
        let model = build_dlm(&[0.0; 4], 12).unwrap();
        let t = &model.transition;
        let mut power = DMatrix::<f64>::identity(14, 14);
        for _ in 0..12 {
            power = &power * t;
        }
        // Seasonal states return to themselves after one full period.
        for i in 2..14 {
            for j in 2..14 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(power[(i, j)], expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn components_sum_to_observations_without_noise() {
        let series = trend_seasonal(60, &SyntheticConfig::default()).unwrap();
        let mut dlm = DLM::with_fixed_variances(DlmParams {
            obs_var: 0.0,
            level_var: 0.5,
            slope_var: 0.01,
            seasonal_var: 0.1,
        });
        dlm.fit(&series).unwrap();
        let parts = dlm.smooth().unwrap();
        assert_eq!(parts.level.len(), 60);
        for i in 0..60 {
            let total = parts.level[i] + parts.seasonal[i];
            assert_relative_eq!(total, series.values()[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn estimated_model_forecasts_with_growing_uncertainty() {
        let series = trend_seasonal(120, &SyntheticConfig::default()).unwrap();
        let mut dlm = DLM::default();
        dlm.fit(&series).unwrap();

        let params = dlm.params().unwrap();
        assert!(params.obs_var > 0.0);
        let fc = dlm.predict(12).unwrap();
        assert_eq!(fc.start(), Period::january(2010));
        let se = fc.standard_errors();
        assert!(se.windows(2).all(|w| w[1] >= w[0] - 1e-9));

        let ic = dlm.information_criteria().unwrap();
        assert!(ic.aic.is_finite());
        assert_eq!(dlm.innovations().unwrap().len(), 120 - 14);
    }

    #[test]
    fn estimation_is_deterministic() {
        let series = trend_seasonal(96, &SyntheticConfig::default().with_seed(5)).unwrap();
        let mut a = DLM::default();
        let mut b = DLM::default();
        a.fit(&series).unwrap();
        b.fit(&series).unwrap();
        assert_eq!(a.params(), b.params());
        assert_eq!(a.log_likelihood(), b.log_likelihood());
    }

    #[test]
    fn errors() {
        let dlm = DLM::default();
        assert!(matches!(dlm.predict(3), Err(ForecastError::FitRequired)));
        assert!(matches!(dlm.smooth(), Err(ForecastError::FitRequired)));

        let short = TimeSeries::monthly((0..15).map(|i| i as f64).collect(), 2000, 1).unwrap();
        let mut dlm = DLM::default();
        assert!(matches!(
            dlm.fit(&short),
            Err(ForecastError::InsufficientData { .. })
        ));

        let series = trend_seasonal(48, &SyntheticConfig::default()).unwrap();
        let mut dlm = DLM::new(DlmConfig::default().with_optimizer(NelderMeadConfig {
            max_iter: 3,
            ..Default::default()
        }));
        assert!(matches!(
            dlm.fit(&series),
            Err(ForecastError::ConvergenceFailure { .. })
        ));
    }

    #[test]
    fn failed_refit_discards_previous_fit() {
        let mut dlm = DLM::with_fixed_variances(DlmParams {
            obs_var: 4.0,
            level_var: 0.5,
            slope_var: 0.01,
            seasonal_var: 0.01,
        });
        dlm.fit(&trend_seasonal(60, &SyntheticConfig::default()).unwrap()).unwrap();
        assert!(dlm.is_fitted());

        let short = TimeSeries::monthly((0..15).map(|i| i as f64).collect(), 2000, 1).unwrap();
        assert!(matches!(
            dlm.fit(&short),
            Err(ForecastError::InsufficientData { .. })
        ));
        assert!(!dlm.is_fitted());
        assert!(dlm.params().is_none());
        assert!(dlm.innovations().is_none());
        assert!(matches!(dlm.predict(3), Err(ForecastError::FitRequired)));
        assert!(matches!(dlm.smooth(), Err(ForecastError::FitRequired)));
    }
}
