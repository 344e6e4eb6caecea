//! Built-in diagnostic statistics for tunegrid.
//!
//! Provides:
//! - Regression statistics (MSE, RMSE, MAE, bias, R², correlation, MAPE)
//! - Classification statistics (accuracy, misclassification rate, Brier score, log loss)
//! - [`DiagnosticSet`], a named selection of statistics usable as a grid diagnoser

pub mod metrics;
pub mod set;

pub use metrics::DiagnosticCalculator;
pub use set::{DiagnosticSet, Observed, Statistic};
