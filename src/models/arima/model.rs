//! Seasonal ARIMA model estimated by exact maximum likelihood.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference_with_seeds, integrate, observations_lost};
use crate::models::arima::likelihood::{conditional_sum_of_squares, ArmaStateSpace};
use crate::models::arima::polynomial::{
    constrain_invertible, constrain_stationary, expand_ar, expand_ma, integrated_ar, psi_weights,
};
use crate::models::{Forecaster, InformationCriteria};
use crate::utils::optimization::{minimize, NelderMeadConfig};
use crate::utils::stats::{is_constant, mean};
use nalgebra::DVector;
use std::fmt;
use tracing::debug;

/// Bound on unconstrained partial autocorrelations (`tanh(6) ≈ 0.99999`).
const PARTIAL_BOUND: f64 = 6.0;

/// SARIMA model specification (p, d, q)(P, D, Q)\[s\].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
    /// Seasonal AR order (P)
    pub cap_p: usize,
    /// Seasonal differencing order (D)
    pub cap_d: usize,
    /// Seasonal MA order (Q)
    pub cap_q: usize,
    /// Seasonal period (s)
    pub s: usize,
}

impl SARIMASpec {
    pub fn new(
        p: usize,
        d: usize,
        q: usize,
        cap_p: usize,
        cap_d: usize,
        cap_q: usize,
        s: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            cap_p,
            cap_d,
            cap_q,
            s,
        }
    }

    /// Non-seasonal ARIMA(p, d, q).
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self::new(p, d, q, 0, 0, 0, 0)
    }

    /// Whether any seasonal term is present.
    pub fn is_seasonal(&self) -> bool {
        self.s > 1 && (self.cap_p > 0 || self.cap_d > 0 || self.cap_q > 0)
    }

    /// Number of ARMA coefficients (excluding mean and variance).
    pub fn num_coefficients(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q
    }

    /// Observations consumed by differencing.
    pub fn observations_lost(&self) -> usize {
        observations_lost(self.d, self.cap_d, self.seasonal_lag())
    }

    fn seasonal_lag(&self) -> usize {
        if self.s > 1 {
            self.s
        } else {
            0
        }
    }

    /// Order of the expanded AR polynomial `φ(B)Φ(B^s)`.
    fn expanded_ar_order(&self) -> usize {
        self.p + self.cap_p * self.seasonal_lag()
    }

    /// Order of the expanded MA polynomial `θ(B)Θ(B^s)`.
    fn expanded_ma_order(&self) -> usize {
        self.q + self.cap_q * self.seasonal_lag()
    }

    /// Minimum series length this specification can be fitted to.
    pub fn min_length(&self) -> usize {
        self.observations_lost() + self.expanded_ar_order().max(self.expanded_ma_order() + 1) + 2
    }

    fn validate(&self) -> Result<()> {
        let seasonal_terms = self.cap_p + self.cap_d + self.cap_q;
        if seasonal_terms > 0 && self.s < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal terms need a period of at least 2, got {}",
                self.s
            )));
        }
        Ok(())
    }
}

impl Default for SARIMASpec {
    fn default() -> Self {
        Self::new(0, 1, 1, 0, 1, 1, 12)
    }
}

impl fmt::Display for SARIMASpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)?;
        if self.is_seasonal() {
            write!(f, "({},{},{})[{}]", self.cap_p, self.cap_d, self.cap_q, self.s)?;
        }
        Ok(())
    }
}

/// How the mean of the differenced series is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeanTerm {
    /// Estimate a mean only when no differencing is applied.
    #[default]
    Auto,
    /// Estimate a mean regardless of differencing.
    Estimate,
    /// Assume a zero-mean differenced series.
    Zero,
}

/// Coefficients of a fitted model.
#[derive(Debug, Clone, PartialEq)]
struct FittedCoefficients {
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
    mean: f64,
}

/// Layout of the unconstrained optimisation vector:
/// `[mean?, ar(p), ma(q), seasonal_ar(P), seasonal_ma(Q)]`.
#[derive(Debug, Clone, Copy)]
struct ParamLayout {
    spec: SARIMASpec,
    has_mean: bool,
}

impl ParamLayout {
    fn len(&self) -> usize {
        self.spec.num_coefficients() + usize::from(self.has_mean)
    }

    fn decode(&self, params: &[f64]) -> FittedCoefficients {
        let offset = usize::from(self.has_mean);
        let s = &self.spec;
        let ar_end = offset + s.p;
        let ma_end = ar_end + s.q;
        let sar_end = ma_end + s.cap_p;
        let sma_end = sar_end + s.cap_q;
        FittedCoefficients {
            mean: if self.has_mean { params[0] } else { 0.0 },
            ar: constrain_stationary(&params[offset..ar_end]),
            ma: constrain_invertible(&params[ar_end..ma_end]),
            seasonal_ar: constrain_stationary(&params[ma_end..sar_end]),
            seasonal_ma: constrain_invertible(&params[sar_end..sma_end]),
        }
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        let mut bounds = Vec::with_capacity(self.len());
        if self.has_mean {
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        bounds.extend(std::iter::repeat((-PARTIAL_BOUND, PARTIAL_BOUND)).take(self.spec.num_coefficients()));
        bounds
    }
}

impl FittedCoefficients {
    fn expanded(&self, spec: &SARIMASpec) -> (Vec<f64>, Vec<f64>) {
        let lag = spec.seasonal_lag();
        (
            expand_ar(&self.ar, &self.seasonal_ar, lag),
            expand_ma(&self.ma, &self.seasonal_ma, lag),
        )
    }
}

/// Seasonal ARIMA forecasting model.
///
/// SARIMA(p, d, q)(P, D, Q)\[s\] combines:
/// - AR(p) and seasonal AR(P) at lag s
/// - d regular and D seasonal differences
/// - MA(q) and seasonal MA(Q) at lag s
///
/// Coefficients are estimated by maximising the exact Gaussian likelihood of
/// the differenced series (Kalman filter, innovation variance concentrated
/// out), started from conditional-sum-of-squares estimates. Stationarity and
/// invertibility hold by construction.
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: SARIMASpec,
    mean_term: MeanTerm,
    optimizer: NelderMeadConfig,
    start_params: Option<Vec<f64>>,
    // Fitted state
    coefficients: Option<FittedCoefficients>,
    params: Option<Vec<f64>>,
    original: Option<TimeSeries>,
    differenced: Option<Vec<f64>>,
    next_state: Option<DVector<f64>>,
    sigma2: Option<f64>,
    log_likelihood: Option<f64>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl SARIMA {
    /// Create a new SARIMA(p,d,q)(P,D,Q)\[s\] model.
    pub fn new(
        p: usize,
        d: usize,
        q: usize,
        cap_p: usize,
        cap_d: usize,
        cap_q: usize,
        s: usize,
    ) -> Self {
        Self::from_spec(SARIMASpec::new(p, d, q, cap_p, cap_d, cap_q, s))
    }

    /// Create a non-seasonal ARIMA(p,d,q) model.
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self::from_spec(SARIMASpec::arima(p, d, q))
    }

    pub fn from_spec(spec: SARIMASpec) -> Self {
        Self {
            spec,
            mean_term: MeanTerm::Auto,
            optimizer: NelderMeadConfig {
                max_iter: 5000,
                tolerance: 1e-9,
                initial_step: 0.1,
                ..Default::default()
            },
            start_params: None,
            coefficients: None,
            params: None,
            original: None,
            differenced: None,
            next_state: None,
            sigma2: None,
            log_likelihood: None,
            fitted: None,
            residuals: None,
        }
    }

    /// Set how the mean of the differenced series is treated.
    pub fn with_mean_term(mut self, mean_term: MeanTerm) -> Self {
        self.mean_term = mean_term;
        self
    }

    /// Override the optimizer configuration.
    pub fn with_optimizer(mut self, config: NelderMeadConfig) -> Self {
        self.optimizer = config;
        self
    }

    /// Start the likelihood optimisation from the given unconstrained
    /// parameters instead of conditional-sum-of-squares estimates.
    ///
    /// The layout is the one returned by [`SARIMA::unconstrained_params`].
    pub fn with_start_params(mut self, params: Vec<f64>) -> Self {
        self.start_params = Some(params);
        self
    }

    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    fn layout(&self) -> ParamLayout {
        let has_mean = match self.mean_term {
            MeanTerm::Auto => self.spec.d + self.spec.cap_d == 0,
            MeanTerm::Estimate => true,
            MeanTerm::Zero => false,
        };
        ParamLayout {
            spec: self.spec,
            has_mean,
        }
    }

    /// Whether a mean is estimated.
    pub fn estimates_mean(&self) -> bool {
        self.layout().has_mean
    }

    /// Number of estimated coefficients, mean included, variance excluded.
    pub fn num_params(&self) -> usize {
        self.layout().len()
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        self.coefficients.as_ref().map_or(&[], |c| &c.ar)
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        self.coefficients.as_ref().map_or(&[], |c| &c.ma)
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        self.coefficients.as_ref().map_or(&[], |c| &c.seasonal_ar)
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        self.coefficients.as_ref().map_or(&[], |c| &c.seasonal_ma)
    }

    /// Mean of the differenced series (zero when not estimated).
    pub fn mean(&self) -> Option<f64> {
        self.coefficients.as_ref().map(|c| c.mean)
    }

    /// Innovation variance.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    /// Optimised parameters on the unconstrained scale.
    pub fn unconstrained_params(&self) -> Option<&[f64]> {
        self.params.as_deref()
    }

    /// Number of differenced observations the likelihood was computed on.
    pub fn n_effective(&self) -> Option<usize> {
        self.differenced.as_ref().map(|d| d.len())
    }

    pub fn aic(&self) -> Option<f64> {
        self.information_criteria().map(|ic| ic.aic)
    }

    pub fn bic(&self) -> Option<f64> {
        self.information_criteria().map(|ic| ic.bic)
    }

    /// Residuals after the observations consumed by differencing.
    pub fn innovations(&self) -> Option<&[f64]> {
        let lost = self.spec.observations_lost();
        self.residuals.as_deref().map(|r| &r[lost..])
    }

    fn negative_log_likelihood(layout: &ParamLayout, w: &[f64], params: &[f64]) -> f64 {
        let coefs = layout.decode(params);
        let (ar, ma) = coefs.expanded(&layout.spec);
        let centred: Vec<f64> = w.iter().map(|x| x - coefs.mean).collect();
        match ArmaStateSpace::new(&ar, &ma).filter(&centred) {
            Some(out) if out.log_likelihood.is_finite() => -out.log_likelihood,
            _ => f64::INFINITY,
        }
    }

    fn css_objective(layout: &ParamLayout, w: &[f64], params: &[f64]) -> f64 {
        let coefs = layout.decode(params);
        let (ar, ma) = coefs.expanded(&layout.spec);
        let centred: Vec<f64> = w.iter().map(|x| x - coefs.mean).collect();
        conditional_sum_of_squares(&centred, &ar, &ma)
    }

    fn initial_params(&self, layout: &ParamLayout, w: &[f64]) -> Result<Vec<f64>> {
        if let Some(start) = &self.start_params {
            if start.len() != layout.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: layout.len(),
                    got: start.len(),
                });
            }
            return Ok(start.clone());
        }

        let mut initial = vec![0.0; layout.len()];
        if layout.has_mean {
            initial[0] = mean(w);
        }
        if layout.spec.num_coefficients() == 0 {
            return Ok(initial);
        }

        let bounds = layout.bounds();
        let css = minimize(
            "SARIMA conditional sum of squares",
            |params| Self::css_objective(layout, w, params),
            &initial,
            Some(&bounds),
            self.optimizer.clone(),
        )?;
        Ok(css.optimal_point)
    }

    fn clear_fit(&mut self) {
        self.coefficients = None;
        self.params = None;
        self.original = None;
        self.differenced = None;
        self.next_state = None;
        self.sigma2 = None;
        self.log_likelihood = None;
        self.fitted = None;
        self.residuals = None;
    }
}

impl Default for SARIMA {
    fn default() -> Self {
        Self::from_spec(SARIMASpec::default())
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.clear_fit();
        self.spec.validate()?;
        let values = series.values();
        let min_len = self.spec.min_length();
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let spec = self.spec;
        let w = difference_with_seeds(values, spec.d, spec.cap_d, spec.seasonal_lag()).values;
        if is_constant(&w) {
            return Err(ForecastError::DegenerateSeries(format!(
                "differenced series for SARIMA{} has zero variance",
                spec
            )));
        }

        let layout = self.layout();
        let initial = self.initial_params(&layout, &w)?;

        let params = if layout.len() == 0 {
            initial
        } else {
            let bounds = layout.bounds();
            let result = minimize(
                "SARIMA maximum likelihood",
                |params| Self::negative_log_likelihood(&layout, &w, params),
                &initial,
                Some(&bounds),
                self.optimizer.clone(),
            )?;
            debug!(
                spec = %spec,
                iterations = result.iterations,
                neg_loglik = result.optimal_value,
                "fitted SARIMA"
            );
            result.optimal_point
        };

        let coefs = layout.decode(&params);
        let (ar, ma) = coefs.expanded(&spec);
        let centred: Vec<f64> = w.iter().map(|x| x - coefs.mean).collect();
        let out = ArmaStateSpace::new(&ar, &ma).filter(&centred).ok_or_else(|| {
            ForecastError::ComputationError(format!(
                "likelihood of SARIMA{} is not finite at the optimum",
                spec
            ))
        })?;

        let lost = spec.observations_lost();
        let mut residuals = vec![0.0; values.len()];
        let mut fitted = vec![f64::NAN; values.len()];
        for (i, v) in out.innovations.iter().enumerate() {
            residuals[lost + i] = *v;
            fitted[lost + i] = values[lost + i] - v;
        }

        self.coefficients = Some(coefs);
        self.params = Some(params);
        self.original = Some(series.clone());
        self.differenced = Some(w);
        self.next_state = Some(out.next_state);
        self.sigma2 = Some(out.sigma2);
        self.log_likelihood = Some(out.log_likelihood);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let coefs = self.coefficients.as_ref().ok_or(ForecastError::FitRequired)?;
        let next_state = self.next_state.as_ref().ok_or(ForecastError::FitRequired)?;
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::empty_after(original));
        }

        let spec = self.spec;
        let (ar, ma) = coefs.expanded(&spec);
        let ss = ArmaStateSpace::new(&ar, &ma);
        let diff_forecast: Vec<f64> = ss
            .forecast(next_state, horizon)
            .into_iter()
            .map(|w| w + coefs.mean)
            .collect();
        let point = integrate(
            &diff_forecast,
            original.values(),
            spec.d,
            spec.cap_d,
            spec.seasonal_lag(),
        );

        let full_ar = integrated_ar(&ar, spec.d, spec.cap_d, spec.seasonal_lag());
        let psi = psi_weights(&full_ar, &ma, horizon);
        let mut cumulative = 0.0;
        let standard_errors = psi
            .iter()
            .map(|w| {
                cumulative += w * w;
                (sigma2 * cumulative).sqrt()
            })
            .collect();

        Forecast::new(
            original.next_period(),
            original.frequency(),
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
        let ll = self.log_likelihood?;
        let n = self.n_effective()?;
        Some(InformationCriteria::new(ll, self.num_params(), n))
    }

    fn name(&self) -> &str {
        "SARIMA"
    }
}
