//! Library side of the `tunegrid` binary: configuration, CSV data sets,
//! built-in models and the end-to-end evaluation pipeline.

pub mod config;
pub mod data;
pub mod models;
pub mod pipeline;
pub mod report;

pub use config::{DataConfig, RunConfig};
pub use data::Dataset;
pub use models::ModelKind;
pub use pipeline::{run_pipeline, Report};
