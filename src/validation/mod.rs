//! Statistical validation for series and model residuals.
//!
//! # Example
//!
//! ```
//! use seasonal_forecast::validation::{ljung_box, one_sample_t_test};
//!
//! let residuals = vec![0.1, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05];
//! let lb = ljung_box(&residuals, Some(5), 0);
//! if lb.is_white_noise(0.05) {
//!     println!("residuals pass Ljung-Box");
//! }
//!
//! let t = one_sample_t_test(&residuals, 0.0).unwrap();
//! assert!(t.is_consistent_with_null(0.05));
//! ```

pub mod location;
pub mod stationarity;

pub use location::{one_sample_t_test, TTestResult};
pub use residual_tests::{all_white, ljung_box, ljung_box_lags, LjungBoxResult};
pub use stationarity::{prepare_stationary, StationarityReport};
