//! # tg-grid
//!
//! Argument grid evaluation for tunegrid.
//!
//! Provides the argument grid (Cartesian product of candidate values), the
//! grid runner that evaluates a prediction function and a diagnostic function
//! for every combination, per-combination trial tracking, and the selector that
//! picks the optimal combination for each diagnostic.

mod grid;
mod optimal;
mod runner;
mod trial;

pub use grid::{ArgumentDef, ArgumentGrid, Combinations};
pub use optimal::{Criterion, OptimalChoice, OptimalSelector, OptimalTable};
pub use runner::{Diagnoser, GridRun, GridRunner, Predictor, RunnerConfig};
pub use trial::{RunId, RunState, RunStatus, Trial, TrialStatus};
