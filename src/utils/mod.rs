//! Utility functions for forecasting models.

pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, AccuracyMetrics};
pub use ols::{ols_fit, OLSResult};
pub use optimization::{minimize, nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::normal_quantile;
