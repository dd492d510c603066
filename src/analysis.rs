//! End-to-end analysis of one monthly series.
//!
//! Runs the four stages in order: stationarity preparation, SARIMA order
//! selection, fitting and forecasting the three model families, and a
//! holdout backtest of each family against the white-noise reference.

use crate::core::{Forecast, TimeSeries, Z_95};
use crate::error::{ForecastError, Result};
use crate::evaluation::{compare_families, BacktestResult, ModelFamily};
use crate::models::arima::{select_best, SARIMASpec, Selection, SelectionConfig};
use crate::models::dlm::{DlmConfig, DLM};
use crate::models::regression::{RegressionConfig, TrendSeasonalRegression};
use crate::models::Forecaster;
use crate::validation::{prepare_stationary, StationarityReport};
use std::fmt;
use tracing::info;

/// Configuration of [`run_analysis`].
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Steps forecast past the end of the series
    pub horizon: usize,
    /// Trailing observations withheld by the backtest
    pub holdout: usize,
    /// Correlogram depth of the stationarity report
    pub max_lag: usize,
    pub candidates: Vec<SARIMASpec>,
    pub selection: SelectionConfig,
    pub regression: RegressionConfig,
    pub dlm: DlmConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            horizon: 6,
            holdout: 12,
            max_lag: 24,
            candidates: vec![
                SARIMASpec::new(1, 1, 0, 0, 1, 0, 12),
                SARIMASpec::new(0, 1, 1, 0, 1, 0, 12),
                SARIMASpec::new(0, 1, 1, 0, 1, 1, 12),
                SARIMASpec::new(1, 1, 1, 0, 1, 1, 12),
            ],
            selection: SelectionConfig::default(),
            regression: RegressionConfig::default(),
            dlm: DlmConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_holdout(mut self, holdout: usize) -> Self {
        self.holdout = holdout;
        self
    }

    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = max_lag;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<SARIMASpec>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_regression(mut self, regression: RegressionConfig) -> Self {
        self.regression = regression;
        self
    }

    pub fn with_dlm(mut self, dlm: DlmConfig) -> Self {
        self.dlm = dlm;
        self
    }

    /// Differencing orders shared by the candidates.
    fn differencing(&self) -> Result<(usize, usize)> {
        let first = self.candidates.first().ok_or_else(|| {
            ForecastError::InvalidParameter("no candidate orders given".to_string())
        })?;
        Ok((first.d, first.cap_d))
    }
}

/// A fitted family with its forecast past the end of the series.
#[derive(Debug, Clone)]
pub struct FamilyForecast<M> {
    pub model: M,
    pub forecast: Forecast,
}

/// Everything produced by [`run_analysis`].
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub series: TimeSeries,
    pub stationarity: StationarityReport,
    pub selection: Selection,
    pub sarima_forecast: Forecast,
    pub regression: FamilyForecast<TrendSeasonalRegression>,
    pub dlm: FamilyForecast<DLM>,
    /// Observations withheld by the backtest
    pub holdout: usize,
    /// Backtested families, in the order they were run
    pub families: Vec<ModelFamily>,
    pub backtests: Vec<Result<BacktestResult>>,
}

impl AnalysisReport {
    /// Backtest of the named family, if it succeeded.
    pub fn backtest(&self, family: &str) -> Option<&BacktestResult> {
        self.families
            .iter()
            .zip(&self.backtests)
            .find(|(f, _)| f.to_string() == family)
            .and_then(|(_, r)| r.as_ref().ok())
    }
}

/// Analyse `series` with the given configuration.
///
/// # Errors
/// `InvalidParameter` for a zero horizon or a holdout that leaves no
/// training data, and any error of the stationarity step, the order
/// selection or the full-series fits. Backtest failures are reported per
/// family inside the report.
pub fn run_analysis(series: &TimeSeries, config: &AnalysisConfig) -> Result<AnalysisReport> {
    if config.horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "forecast horizon must be positive".to_string(),
        ));
    }
    if config.holdout == 0 || config.holdout >= series.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "holdout {} must lie in 1..{}",
            config.holdout,
            series.len()
        )));
    }

    let (d, cap_d) = config.differencing()?;
    let stationarity = prepare_stationary(series, d, cap_d, config.max_lag)?;

    let selection = select_best(series, &config.candidates, &config.selection)?;
    let sarima_forecast = selection.model.predict(config.horizon)?;

    let mut regression = TrendSeasonalRegression::new(config.regression.clone());
    regression.fit(series)?;
    let regression_forecast = regression.predict(config.horizon)?;

    let mut dlm = DLM::new(config.dlm.clone());
    dlm.fit(series)?;
    let dlm_forecast = dlm.predict(config.horizon)?;
    info!(horizon = config.horizon, "full-series fits finished");

    let families = vec![
        ModelFamily::Sarima(selection.best().spec),
        ModelFamily::Regression(config.regression.clone()),
        ModelFamily::Dlm(config.dlm.clone()),
        ModelFamily::WhiteNoise,
    ];
    let split = series.len() - config.holdout;
    let backtests = compare_families(series, split, &families);

    Ok(AnalysisReport {
        series: series.clone(),
        stationarity,
        selection,
        sarima_forecast,
        regression: FamilyForecast {
            model: regression,
            forecast: regression_forecast,
        },
        dlm: FamilyForecast {
            model: dlm,
            forecast: dlm_forecast,
        },
        holdout: config.holdout,
        families,
        backtests,
    })
}

fn write_forecast(f: &mut fmt::Formatter<'_>, title: &str, forecast: &Forecast) -> fmt::Result {
    writeln!(f, "{}", title)?;
    writeln!(f, "  {:<8} {:>10} {:>10} {:>10}", "period", "point", "lower", "upper")?;
    let band = forecast.interval_with_z(Z_95);
    for (h, period) in forecast.periods().iter().enumerate() {
        writeln!(
            f,
            "  {:<8} {:>10.3} {:>10.3} {:>10.3}",
            period.to_string(),
            forecast.point()[h],
            band.lower[h],
            band.upper[h]
        )?;
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Series: {} observations, {} to {}",
            self.series.len(),
            self.series.start(),
            self.series.end_period()
        )?;

        let st = &self.stationarity;
        writeln!(
            f,
            "\nDifferencing d={} D={} (period {}): mean {:.4}, t = {:.3}, p = {:.3}",
            st.d, st.cap_d, st.period, st.mean_test.mean, st.mean_test.statistic, st.mean_test.p_value
        )?;
        writeln!(f, "  significant ACF lags:  {:?}", st.significant_acf_lags())?;
        writeln!(f, "  significant PACF lags: {:?}", st.significant_pacf_lags())?;

        writeln!(f, "\nSARIMA candidates (best first)")?;
        writeln!(
            f,
            "  {:<22} {:>10} {:>10} {:>6} {:>6}",
            "order", "loglik", "AIC", "k", "white"
        )?;
        for report in &self.selection.ranking {
            match &report.outcome {
                Ok(fit) => writeln!(
                    f,
                    "  {:<22} {:>10.2} {:>10.2} {:>6} {:>6}",
                    report.spec.to_string(),
                    fit.log_likelihood,
                    fit.aic,
                    fit.num_params,
                    if fit.white { "yes" } else { "no" }
                )?,
                Err(e) => writeln!(f, "  {:<22} failed: {}", report.spec.to_string(), e)?,
            }
        }

        writeln!(f)?;
        write_forecast(
            f,
            &format!("SARIMA{} forecast", self.selection.best().spec),
            &self.sarima_forecast,
        )?;

        let reg = &self.regression.model;
        writeln!(
            f,
            "\nRegression: intercept {}, slope {}, residual ARMA{:?}",
            fmt_opt(reg.intercept()),
            fmt_opt(reg.slope()),
            reg.residual_order().unwrap_or((0, 0))
        )?;
        write_forecast(f, "Regression+ARMA forecast", &self.regression.forecast)?;

        if let Some(p) = self.dlm.model.params() {
            writeln!(
                f,
                "\nDLM variances: obs {:.4}, level {:.4}, slope {:.6}, seasonal {:.6}",
                p.obs_var, p.level_var, p.slope_var, p.seasonal_var
            )?;
        }
        write_forecast(f, "DLM forecast", &self.dlm.forecast)?;

        writeln!(f, "\nBacktest (last {} observations)", self.holdout)?;
        writeln!(
            f,
            "  {:<28} {:>10} {:>10} {:>10} {:>9}",
            "family", "MAE", "RMSE", "MAPE", "coverage"
        )?;
        for (family, result) in self.families.iter().zip(&self.backtests) {
            match result {
                Ok(r) => writeln!(
                    f,
                    "  {:<28} {:>10.3} {:>10.3} {:>10} {:>9.2}",
                    family.to_string(),
                    r.metrics.mae,
                    r.metrics.rmse,
                    fmt_opt(r.metrics.mape),
                    r.coverage(Z_95)
                )?,
                Err(e) => writeln!(f, "  {:<28} failed: {}", family.to_string(), e)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{trend_seasonal, SyntheticConfig};

    #[test]
    fn full_pipeline_on_synthetic_series() {
        let ts = trend_seasonal(120, &SyntheticConfig::default()).unwrap();
        let report = run_analysis(&ts, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.stationarity.differenced.len(), 120 - 13);
        assert_eq!(report.selection.ranking.len(), 4);
        assert_eq!(report.sarima_forecast.horizon(), 6);
        assert_eq!(report.regression.forecast.horizon(), 6);
        assert_eq!(report.dlm.forecast.horizon(), 6);
        assert_eq!(report.sarima_forecast.start(), ts.next_period());

        assert_eq!(report.backtests.len(), 4);
        let white = report.backtest("WhiteNoise").unwrap();
        assert_eq!(white.train_len, 108);

        let text = report.to_string();
        assert!(text.contains("SARIMA candidates"));
        assert!(text.contains("WhiteNoise"));
    }

    #[test]
    fn rejects_bad_windows() {
        let ts = trend_seasonal(60, &SyntheticConfig::default()).unwrap();
        let cfg = AnalysisConfig::default();
        assert!(run_analysis(&ts, &cfg.clone().with_horizon(0)).is_err());
        assert!(run_analysis(&ts, &cfg.clone().with_holdout(60)).is_err());
        assert!(matches!(
            run_analysis(&ts, &cfg.with_candidates(Vec::new())),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
