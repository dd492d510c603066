//! Core data structures: calendar-indexed series and forecasts.

mod forecast;
mod time_series;

pub use forecast::{Forecast, PredictionInterval, Z_95};
pub use time_series::{Period, TimeSeries, MONTHLY};
