//! Candidate-list order selection for SARIMA models.
//!
//! Every candidate is fitted to the same series and scored by AIC and by
//! Ljung-Box tests on its innovations. Candidates with white residuals at
//! every configured lag rank ahead of the rest; within a group the lowest
//! AIC wins and AIC ties go to the model with fewer parameters.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::arima::model::{SARIMASpec, SARIMA};
use crate::models::{aic, Forecaster};
use crate::validation::{all_white, ljung_box_lags, LjungBoxResult};
use std::cmp::Ordering;
use tracing::{info, warn};

/// AIC values closer than this are treated as ties.
const AIC_TIE: f64 = 1e-6;

/// Configuration for candidate ranking.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Significance level of the Ljung-Box tests.
    pub alpha: f64,
    /// Lags at which residual whiteness is tested.
    pub lags: Vec<usize>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            lags: vec![6, 12, 18, 24],
        }
    }
}

impl SelectionConfig {
    /// Set the significance level.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the Ljung-Box lags.
    pub fn with_lags(mut self, lags: Vec<usize>) -> Self {
        self.lags = lags;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.lags.is_empty() || self.lags.contains(&0) {
            return Err(ForecastError::InvalidParameter(
                "Ljung-Box lags must be non-empty and positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fit statistics of a successfully estimated candidate.
#[derive(Debug, Clone)]
pub struct CandidateFit {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    /// Estimated coefficients (variance excluded)
    pub num_params: usize,
    pub aic: f64,
    pub bic: f64,
    /// One result per configured lag
    pub ljung_box: Vec<LjungBoxResult>,
    /// Residuals pass Ljung-Box at every lag
    pub white: bool,
}

/// Outcome of fitting one candidate order.
#[derive(Debug, Clone)]
pub struct CandidateReport {
    pub spec: SARIMASpec,
    pub outcome: Result<CandidateFit>,
}

impl CandidateReport {
    pub fn fit(&self) -> Option<&CandidateFit> {
        self.outcome.as_ref().ok()
    }

    pub fn aic(&self) -> Option<f64> {
        self.fit().map(|f| f.aic)
    }

    pub fn is_white(&self) -> bool {
        self.fit().is_some_and(|f| f.white)
    }
}

/// Ranked candidates and the refitted winner.
#[derive(Debug, Clone)]
pub struct Selection {
    /// All candidates, best first; failed fits last.
    pub ranking: Vec<CandidateReport>,
    /// Fitted model of the first-ranked candidate.
    pub model: SARIMA,
}

impl Selection {
    pub fn best(&self) -> &CandidateReport {
        &self.ranking[0]
    }
}

/// Fit one candidate and compute its diagnostics.
pub fn evaluate_candidate(
    series: &TimeSeries,
    spec: SARIMASpec,
    config: &SelectionConfig,
) -> (CandidateReport, Option<SARIMA>) {
    let mut model = SARIMA::from_spec(spec);
    if let Err(e) = model.fit(series) {
        warn!(spec = %spec, error = %e, "candidate failed to fit");
        return (
            CandidateReport {
                spec,
                outcome: Err(e),
            },
            None,
        );
    }

    let outcome = candidate_fit(&model, config);
    if let Ok(fit) = &outcome {
        if !fit.white {
            warn!(spec = %spec, aic = fit.aic, "candidate residuals are not white");
        }
    }
    (CandidateReport { spec, outcome }, Some(model))
}

fn candidate_fit(model: &SARIMA, config: &SelectionConfig) -> Result<CandidateFit> {
    let ic = model
        .information_criteria()
        .ok_or(ForecastError::FitRequired)?;
    let innovations = model.innovations().ok_or(ForecastError::FitRequired)?;
    let ljung_box = ljung_box_lags(innovations, &config.lags, model.spec().num_coefficients());
    let white = all_white(&ljung_box, config.alpha);
    Ok(CandidateFit {
        ar: model.ar_coefficients().to_vec(),
        ma: model.ma_coefficients().to_vec(),
        seasonal_ar: model.seasonal_ar_coefficients().to_vec(),
        seasonal_ma: model.seasonal_ma_coefficients().to_vec(),
        sigma2: model.sigma2().unwrap_or(f64::NAN),
        log_likelihood: ic.log_likelihood,
        num_params: ic.num_params,
        aic: ic.aic,
        bic: ic.bic,
        ljung_box,
        white,
    })
}

/// Rounded AIC used for tie detection.
fn aic_bucket(aic: f64) -> i64 {
    (aic / AIC_TIE).round() as i64
}

fn compare_reports(a: &CandidateReport, b: &CandidateReport) -> Ordering {
    match (a.fit(), b.fit()) {
        (Some(fa), Some(fb)) => fb
            .white
            .cmp(&fa.white)
            .then_with(|| aic_bucket(fa.aic).cmp(&aic_bucket(fb.aic)))
            .then_with(|| fa.num_params.cmp(&fb.num_params)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Fit every candidate and order the reports best first.
///
/// Ordering is stable: equally ranked candidates keep their input order.
pub fn rank_candidates(
    series: &TimeSeries,
    candidates: &[SARIMASpec],
    config: &SelectionConfig,
) -> Result<Vec<CandidateReport>> {
    Ok(rank_with_models(series, candidates, config)?
        .into_iter()
        .map(|(report, _)| report)
        .collect())
}

fn rank_with_models(
    series: &TimeSeries,
    candidates: &[SARIMASpec],
    config: &SelectionConfig,
) -> Result<Vec<(CandidateReport, Option<SARIMA>)>> {
    config.validate()?;
    if candidates.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "no candidate orders given".to_string(),
        ));
    }

    let mut reports: Vec<_> = candidates
        .iter()
        .map(|&spec| evaluate_candidate(series, spec, config))
        .collect();
    reports.sort_by(|a, b| compare_reports(&a.0, &b.0));
    Ok(reports)
}

/// Rank candidates and return the fitted best model.
///
/// # Errors
/// Configuration errors, or the first candidate's error when no candidate
/// could be fitted.
pub fn select_best(
    series: &TimeSeries,
    candidates: &[SARIMASpec],
    config: &SelectionConfig,
) -> Result<Selection> {
    let ranked = rank_with_models(series, candidates, config)?;

    let mut ranking = Vec::with_capacity(ranked.len());
    let mut best_model = None;
    for (report, model) in ranked {
        if best_model.is_none() {
            best_model = model;
        }
        ranking.push(report);
    }

    match best_model {
        Some(model) => {
            let best = &ranking[0];
            info!(
                spec = %best.spec,
                aic = best.aic().unwrap_or(f64::NAN),
                white = best.is_white(),
                "selected SARIMA order"
            );
            Ok(Selection { ranking, model })
        }
        None => Err(ranking
            .into_iter()
            .find_map(|r| r.outcome.err())
            .unwrap_or_else(|| {
                ForecastError::ComputationError("no candidate could be fitted".to_string())
            })),
    }
}

/// Rank `(log_likelihood, num_params)` pairs by AIC.
///
/// Returns `(index, aic)` best first; AIC ties go to fewer parameters.
pub fn rank_by_aic(candidates: &[(f64, usize)]) -> Vec<(usize, f64)> {
    let mut scored: Vec<(usize, f64, usize)> = candidates
        .iter()
        .enumerate()
        .map(|(i, &(ll, k))| (i, aic(ll, k), k))
        .collect();
    scored.sort_by(|a, b| {
        aic_bucket(a.1)
            .cmp(&aic_bucket(b.1))
            .then_with(|| a.2.cmp(&b.2))
    });
    scored.into_iter().map(|(i, a, _)| (i, a)).collect()
}

/// All orders with `p <= max_p`, `q <= max_q`, `P <= max_cap_p`,
/// `Q <= max_cap_q` at fixed differencing.
pub fn candidate_grid(
    max_p: usize,
    max_q: usize,
    max_cap_p: usize,
    max_cap_q: usize,
    d: usize,
    cap_d: usize,
    s: usize,
) -> Vec<SARIMASpec> {
    let mut grid = Vec::new();
    for p in 0..=max_p {
        for q in 0..=max_q {
            for cap_p in 0..=max_cap_p {
                for cap_q in 0..=max_cap_q {
                    grid.push(SARIMASpec::new(p, d, q, cap_p, cap_d, cap_q, s));
                }
            }
        }
    }
    grid
}
