//! Model families compared by the backtest harness.

use crate::models::arima::{SARIMASpec, SARIMA};
use crate::models::baseline::HistoricMean;
use crate::models::dlm::{DlmConfig, DLM};
use crate::models::regression::{RegressionConfig, TrendSeasonalRegression};
use crate::models::BoxedForecaster;
use std::fmt;

/// A model family with its configuration.
///
/// Each call to [`ModelFamily::create`] returns a fresh, unfitted model, so
/// the same family can be refitted on any window of a series.
#[derive(Debug, Clone)]
pub enum ModelFamily {
    Sarima(SARIMASpec),
    Regression(RegressionConfig),
    Dlm(DlmConfig),
    /// Training mean; a white-noise forecast.
    WhiteNoise,
}

impl ModelFamily {
    /// Create an unfitted model of this family.
    pub fn create(&self) -> BoxedForecaster {
        match self {
            Self::Sarima(spec) => Box::new(SARIMA::from_spec(*spec)),
            Self::Regression(config) => Box::new(TrendSeasonalRegression::new(config.clone())),
            Self::Dlm(config) => Box::new(DLM::new(config.clone())),
            Self::WhiteNoise => Box::new(HistoricMean::new()),
        }
    }

    /// The default three families for monthly data plus the reference.
    pub fn standard_set(spec: SARIMASpec) -> Vec<ModelFamily> {
        vec![
            Self::Sarima(spec),
            Self::Regression(RegressionConfig::default()),
            Self::Dlm(DlmConfig::default()),
            Self::WhiteNoise,
        ]
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sarima(spec) => write!(f, "SARIMA{}", spec),
            Self::Regression(_) => write!(f, "Regression+ARMA"),
            Self::Dlm(_) => write!(f, "DLM"),
            Self::WhiteNoise => write!(f, "WhiteNoise"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_unfitted_models() {
        for family in ModelFamily::standard_set(SARIMASpec::default()) {
            let model = family.create();
            assert!(!model.is_fitted());
        }
        assert_eq!(
            ModelFamily::Sarima(SARIMASpec::default()).to_string(),
            "SARIMA(0,1,1)(0,1,1)[12]"
        );
        assert_eq!(ModelFamily::WhiteNoise.create().name(), "HistoricMean");
    }
}
