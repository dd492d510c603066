//! Forecasting models.

mod traits;

pub mod arima;
pub mod baseline;
pub mod dlm;
pub mod regression;

pub use traits::{aic, bic, BoxedForecaster, Forecaster, InformationCriteria};
