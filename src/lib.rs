//! # seasonal-forecast
//!
//! Forecasting of evenly spaced monthly series with three model families:
//! seasonal ARIMA fitted by exact Gaussian likelihood, a trend + seasonal
//! regression with ARMA residuals, and a trend + trigonometric seasonal
//! dynamic linear model estimated through the Kalman filter.
//!
//! The crate also covers the surrounding workflow: loading a column of a
//! whitespace-delimited table as a monthly series, stationarity preparation,
//! candidate order selection by AIC and Ljung-Box whiteness, and holdout
//! backtests against a white-noise reference.
//!
//! ```no_run
//! use seasonal_forecast::prelude::*;
//! use seasonal_forecast::data::synthetic::{trend_seasonal, SyntheticConfig};
//! use seasonal_forecast::models::arima::SARIMA;
//!
//! let series = trend_seasonal(120, &SyntheticConfig::default()).unwrap();
//! let mut model = SARIMA::new(0, 1, 1, 0, 1, 1, 12);
//! model.fit(&series).unwrap();
//! let forecast = model.predict(6).unwrap();
//! let band = forecast.interval_95();
//! println!("{:?} {:?}", forecast.point(), band.upper);
//! ```

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod analysis;
pub mod core;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod statespace;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, Period, PredictionInterval, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::evaluation::{backtest, ModelFamily};
    pub use crate::models::Forecaster;
    pub use crate::utils::{calculate_metrics, normal_quantile, AccuracyMetrics};
}
