//! Trend + seasonal regression with ARMA-modelled residuals.
//!
//! The series is regressed on an intercept, a linear time index
//! `t = 1..n` and one dummy per season except the first (January for
//! monthly data). The regression residuals are then described by a
//! low-order ARMA process whose AR order starts at the PACF cutoff and is
//! reduced while a likelihood-ratio test cannot tell the richer model apart
//! from the simpler one.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::{MeanTerm, SARIMASpec, SARIMA};
use crate::models::{Forecaster, InformationCriteria};
use crate::utils::ols::{ols_fit, OLSResult};
use crate::utils::stats::{acf_bound, chi_squared_sf, is_negligible, pacf};
use tracing::{debug, info};

/// How forecast standard errors are formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntervalMode {
    /// Residual-ARMA forecast error only; trend and seasonal coefficients
    /// are treated as known.
    #[default]
    ResidualOnly,
    /// Adds the coefficient uncertainty term `σ²·x'(X'X)⁻¹x`.
    FullPredictive,
}

/// Configuration for [`TrendSeasonalRegression`].
#[derive(Debug, Clone)]
pub struct RegressionConfig {
    /// Largest residual AR order considered.
    pub max_ar: usize,
    /// Significance level of the likelihood-ratio tests.
    pub alpha: f64,
    /// Also test an added MA(1) term against the chosen AR order.
    pub consider_ma: bool,
    pub interval_mode: IntervalMode,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            max_ar: 3,
            alpha: 0.05,
            consider_ma: true,
            interval_mode: IntervalMode::ResidualOnly,
        }
    }
}

impl RegressionConfig {
    pub fn with_max_ar(mut self, max_ar: usize) -> Self {
        self.max_ar = max_ar;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_ma_test(mut self, consider_ma: bool) -> Self {
        self.consider_ma = consider_ma;
        self
    }

    pub fn with_interval_mode(mut self, mode: IntervalMode) -> Self {
        self.interval_mode = mode;
        self
    }
}

/// Likelihood-ratio comparison of two nested models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LikelihoodRatioResult {
    /// `2·(ll_richer - ll_simpler)`, never negative
    pub statistic: f64,
    /// Added parameters
    pub df: usize,
    pub p_value: f64,
}

impl LikelihoodRatioResult {
    /// True when the richer model is a significant improvement.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Relative residual spread below which the regression is an exact fit.
const RESIDUAL_ROUNDOFF: f64 = 1e-9;

/// Likelihood-ratio test of a simpler model nested in a richer one.
///
/// The log-likelihood gain is clamped at zero: a nested richer model cannot
/// fit worse, so a negative gain only reflects optimizer tolerance.
pub fn likelihood_ratio_test(ll_simpler: f64, ll_richer: f64, df: usize) -> LikelihoodRatioResult {
    let statistic = (2.0 * (ll_richer - ll_simpler)).max(0.0);
    LikelihoodRatioResult {
        statistic,
        df,
        p_value: chi_squared_sf(statistic, df.max(1) as f64),
    }
}

/// One step of the residual order search.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderComparison {
    /// (p, q) of the simpler model
    pub simpler: (usize, usize),
    /// (p, q) of the richer model
    pub richer: (usize, usize),
    pub test: LikelihoodRatioResult,
    /// Whether the richer model was kept
    pub accepted: bool,
}

/// Linear trend + seasonal dummies, with ARMA residuals.
#[derive(Debug, Clone)]
pub struct TrendSeasonalRegression {
    config: RegressionConfig,
    // Fitted state
    series: Option<TimeSeries>,
    ols: Option<OLSResult>,
    residual_model: Option<SARIMA>,
    order: Option<(usize, usize)>,
    comparisons: Vec<OrderComparison>,
    pacf: Vec<f64>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl TrendSeasonalRegression {
    pub fn new(config: RegressionConfig) -> Self {
        Self {
            config,
            series: None,
            ols: None,
            residual_model: None,
            order: None,
            comparisons: Vec::new(),
            pacf: Vec::new(),
            fitted: None,
            residuals: None,
        }
    }

    pub fn config(&self) -> &RegressionConfig {
        &self.config
    }

    /// Regression coefficients: intercept, slope, then one per non-baseline
    /// season.
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.ols.as_ref().map(|o| o.coefficients.as_slice())
    }

    pub fn coefficient_standard_errors(&self) -> Option<&[f64]> {
        self.ols.as_ref().map(|o| o.standard_errors.as_slice())
    }

    pub fn intercept(&self) -> Option<f64> {
        self.ols.as_ref().map(|o| o.coefficients[0])
    }

    pub fn slope(&self) -> Option<f64> {
        self.ols.as_ref().map(|o| o.coefficients[1])
    }

    /// Seasonal effect of every season (index 0 is the first season,
    /// January for monthly data, and is exactly zero).
    pub fn seasonal_offsets(&self) -> Option<Vec<f64>> {
        let ols = self.ols.as_ref()?;
        let mut offsets = vec![0.0];
        offsets.extend_from_slice(&ols.coefficients[2..]);
        Some(offsets)
    }

    /// Residual variance of the regression.
    pub fn regression_sigma2(&self) -> Option<f64> {
        self.ols.as_ref().map(|o| o.sigma2)
    }

    /// Residuals of the regression before ARMA modelling.
    pub fn regression_residuals(&self) -> Option<&[f64]> {
        self.ols.as_ref().map(|o| o.residuals.as_slice())
    }

    /// Chosen (p, q) of the residual ARMA model.
    pub fn residual_order(&self) -> Option<(usize, usize)> {
        self.order
    }

    pub fn residual_model(&self) -> Option<&SARIMA> {
        self.residual_model.as_ref()
    }

    /// Likelihood-ratio tests performed while choosing the residual order.
    pub fn order_comparisons(&self) -> &[OrderComparison] {
        &self.comparisons
    }

    /// Partial autocorrelations of the regression residuals.
    pub fn residual_pacf(&self) -> &[f64] {
        &self.pacf
    }

    fn clear_fit(&mut self) {
        self.series = None;
        self.ols = None;
        self.residual_model = None;
        self.order = None;
        self.comparisons.clear();
        self.pacf.clear();
        self.fitted = None;
        self.residuals = None;
    }

    fn design_row(t: usize, season: usize, frequency: usize) -> Vec<f64> {
        let mut row = vec![0.0; frequency + 1];
        row[0] = 1.0;
        row[1] = t as f64;
        if season > 1 {
            row[season] = 1.0;
        }
        row
    }

    fn fit_residual_arma(
        residuals: &TimeSeries,
        p: usize,
        q: usize,
        start: Option<Vec<f64>>,
    ) -> Result<SARIMA> {
        let mut model = SARIMA::from_spec(SARIMASpec::arima(p, 0, q)).with_mean_term(MeanTerm::Zero);
        if let Some(start) = start {
            model = model.with_start_params(start);
        }
        model.fit(residuals)?;
        Ok(model)
    }

    fn warm_start(model: &SARIMA) -> Vec<f64> {
        let mut start = model.unconstrained_params().map_or_else(Vec::new, <[f64]>::to_vec);
        start.push(0.0);
        start
    }

    /// Choose and fit the residual ARMA model.
    fn select_residual_model(&mut self, residuals: &TimeSeries) -> Result<(SARIMA, (usize, usize))> {
        let n = residuals.len();
        self.pacf = pacf(residuals.values(), self.config.max_ar);
        let bound = acf_bound(n);
        let cutoff = self
            .pacf
            .iter()
            .rposition(|v| v.abs() > bound)
            .map_or(0, |i| i + 1);
        debug!(cutoff, bound, "residual PACF cutoff");

        // Nested AR chain, each fit warm-started from the previous optimum.
        let mut chain = Vec::with_capacity(cutoff + 1);
        chain.push(Self::fit_residual_arma(residuals, 0, 0, None)?);
        for p in 1..=cutoff {
            let start = Self::warm_start(&chain[p - 1]);
            chain.push(Self::fit_residual_arma(residuals, p, 0, Some(start))?);
        }

        let mut p = cutoff;
        while p > 0 {
            let test = likelihood_ratio_test(
                chain[p - 1].log_likelihood().unwrap_or(f64::NAN),
                chain[p].log_likelihood().unwrap_or(f64::NAN),
                1,
            );
            let accepted = test.is_significant(self.config.alpha);
            self.comparisons.push(OrderComparison {
                simpler: (p - 1, 0),
                richer: (p, 0),
                test,
                accepted,
            });
            if accepted {
                break;
            }
            p -= 1;
        }

        let mut order = (p, 0);
        let mut model = chain.swap_remove(p);

        if self.config.consider_ma {
            let start = Self::warm_start(&model);
            match Self::fit_residual_arma(residuals, p, 1, Some(start)) {
                Ok(richer) => {
                    let test = likelihood_ratio_test(
                        model.log_likelihood().unwrap_or(f64::NAN),
                        richer.log_likelihood().unwrap_or(f64::NAN),
                        1,
                    );
                    let accepted = test.is_significant(self.config.alpha);
                    self.comparisons.push(OrderComparison {
                        simpler: (p, 0),
                        richer: (p, 1),
                        test,
                        accepted,
                    });
                    if accepted {
                        order = (p, 1);
                        model = richer;
                    }
                }
                Err(e) => debug!(error = %e, "MA(1) extension of residual model failed"),
            }
        }

        Ok((model, order))
    }
}

impl Default for TrendSeasonalRegression {
    fn default() -> Self {
        Self::new(RegressionConfig::default())
    }
}

impl Forecaster for TrendSeasonalRegression {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.clear_fit();
        let frequency = series.frequency();
        if frequency < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal regression needs a period of at least 2, got {}",
                frequency
            )));
        }
        if !(self.config.alpha > 0.0 && self.config.alpha < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "alpha must be in (0, 1), got {}",
                self.config.alpha
            )));
        }
        let needed = frequency + 2;
        if series.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: series.len(),
            });
        }

        let design: Vec<Vec<f64>> = (0..series.len())
            .map(|i| Self::design_row(i + 1, series.season_of(i), frequency))
            .collect();
        let ols = ols_fit(&design, series.values())?;

        let scale = series.values().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if is_negligible(&ols.residuals, scale, RESIDUAL_ROUNDOFF) {
            return Err(ForecastError::DegenerateSeries(
                "trend and seasonal dummies explain the series exactly".to_string(),
            ));
        }

        let residual_series = series.with_values(ols.residuals.clone())?;
        let (model, order) = self.select_residual_model(&residual_series)?;

        let innovations = model
            .residuals()
            .ok_or(ForecastError::FitRequired)?
            .to_vec();
        let fitted = series
            .values()
            .iter()
            .zip(&innovations)
            .map(|(y, e)| y - e)
            .collect();

        info!(
            slope = ols.coefficients[1],
            sigma2 = ols.sigma2,
            p = order.0,
            q = order.1,
            "fitted trend-seasonal regression"
        );

        self.series = Some(series.clone());
        self.ols = Some(ols);
        self.residual_model = Some(model);
        self.order = Some(order);
        self.fitted = Some(fitted);
        self.residuals = Some(innovations);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let series = self.series.as_ref().ok_or(ForecastError::FitRequired)?;
        let ols = self.ols.as_ref().ok_or(ForecastError::FitRequired)?;
        let arma = self.residual_model.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::empty_after(series));
        }

        let residual_forecast = arma.predict(horizon)?;
        let n = series.len();
        let frequency = series.frequency();
        let mut point = Vec::with_capacity(horizon);
        let mut standard_errors = Vec::with_capacity(horizon);

        for h in 0..horizon {
            let row = Self::design_row(n + h + 1, series.season_of(n + h), frequency);
            point.push(ols.predict(&row)? + residual_forecast.point()[h]);

            let se = residual_forecast.standard_errors()[h];
            let se = match self.config.interval_mode {
                IntervalMode::ResidualOnly => se,
                IntervalMode::FullPredictive => (se * se + ols.mean_variance(&row)?).sqrt(),
            };
            standard_errors.push(se);
        }

        Forecast::new(series.next_period(), frequency, point, standard_errors)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn information_criteria(&self) -> Option<InformationCriteria> {
        let ols = self.ols.as_ref()?;
        let arma = self.residual_model.as_ref()?;
        let ll = arma.log_likelihood()?;
        let k = ols.num_coefficients() + arma.num_params();
        Some(InformationCriteria::new(ll, k, ols.residuals.len()))
    }

    fn name(&self) -> &str {
        "TrendSeasonalRegression"
    }
}
