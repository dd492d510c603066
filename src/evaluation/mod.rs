//! Backtest evaluation of model families.
//!
//! A backtest refits a family on a prefix of the series, forecasts the
//! withheld suffix and scores the forecast with MAE, RMSE and MAPE.

mod backtest;
mod family;

pub use backtest::{backtest, compare_families, rolling_backtest, BacktestResult};
pub use family::ModelFamily;
