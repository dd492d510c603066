//! Seasonal ARIMA models.
//!
//! This module provides:
//! - SARIMA(p, d, q)(P, D, Q)\[s\] estimated by exact maximum likelihood
//! - differencing and its inverse
//! - candidate-list order selection by AIC and residual whiteness

mod diff;
mod likelihood;
mod model;
mod polynomial;
pub mod selection;

pub use diff::{
    difference, difference_with_seeds, integrate, observations_lost, seasonal_difference,
    undifference, Differenced,
};
pub use model::{MeanTerm, SARIMASpec, SARIMA};
pub use selection::{
    candidate_grid, rank_by_aic, rank_candidates, select_best, CandidateFit, CandidateReport,
    Selection, SelectionConfig,
};
