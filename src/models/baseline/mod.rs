//! Reference models.

mod historic_mean;

pub use historic_mean::HistoricMean;
