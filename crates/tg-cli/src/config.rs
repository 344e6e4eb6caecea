//! JSON run configuration for the `tunegrid` binary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tg_diagnostics::DiagnosticSet;
use tg_grid::{ArgumentGrid, Criterion, OptimalSelector, RunnerConfig};
use tg_types::{config_error, ArgValue, TgResult};
use tg_viz::PlotSpec;

use crate::data::Dataset;
use crate::models::ModelKind;

fn default_test_fraction() -> f64 {
    0.25
}

/// Where the train and test data come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataConfig {
    /// Separate train and test files.
    Split { train: PathBuf, test: PathBuf },
    /// One file split by a seeded shuffle.
    Single {
        path: PathBuf,
        #[serde(default = "default_test_fraction")]
        test_fraction: f64,
        #[serde(default)]
        seed: u64,
    },
}

impl DataConfig {
    fn resolve(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        match self {
            Self::Split { train, test } => {
                join(train);
                join(test);
            }
            Self::Single { path, .. } => join(path),
        }
    }
}

/// A complete grid evaluation: data, model, argument grid, diagnostics and
/// optional plot layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataConfig,
    pub target: String,
    pub model: ModelKind,
    /// Candidate values per argument, in declaration order. A scalar is a
    /// single candidate.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
    /// Statistic names; empty means the regression set.
    #[serde(default)]
    pub diagnostics: Vec<String>,
    /// Per-diagnostic criterion overrides (`min`, `max`, `closest:<x>`).
    #[serde(default)]
    pub criteria: BTreeMap<String, String>,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub plot: Option<PlotSpec>,
}

impl RunConfig {
    /// Read a config file. Relative data paths are resolved against the
    /// directory holding the file.
    pub fn load(path: impl AsRef<Path>) -> TgResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| config_error!("failed to read config {}: {}", path.display(), e))?;
        let mut config = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            config.data.resolve(base);
        }
        tracing::info!("Loaded {} config from {}", config.model, path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> TgResult<Self> {
        serde_json::from_str(text).map_err(|e| config_error!("invalid config: {}", e))
    }

    /// The argument grid, rejecting arguments the model does not accept.
    pub fn grid(&self) -> TgResult<ArgumentGrid> {
        let accepted = self.model.accepted_arguments();
        let mut grid = ArgumentGrid::new();
        for (name, raw) in &self.arguments {
            if !accepted.contains(&name.as_str()) {
                return Err(config_error!(
                    "model '{}' does not accept argument '{}' (expected one of {})",
                    self.model,
                    name,
                    accepted.join(", ")
                ));
            }
            let candidates = match raw {
                serde_json::Value::Array(items) => items.iter().collect(),
                scalar => vec![scalar],
            };
            let values = candidates
                .into_iter()
                .map(|v| {
                    ArgValue::from_json(v).ok_or_else(|| {
                        config_error!("argument '{}' has a non-scalar candidate {}", name, v)
                    })
                })
                .collect::<TgResult<Vec<_>>>()?;
            grid = grid.add_values(name.clone(), values);
        }
        grid.validate()?;
        Ok(grid)
    }

    pub fn diagnostic_set(&self) -> TgResult<DiagnosticSet> {
        if self.diagnostics.is_empty() {
            Ok(DiagnosticSet::regression())
        } else {
            DiagnosticSet::from_names(&self.diagnostics)
        }
    }

    /// Each statistic's preferred criterion, overridden by `criteria`.
    pub fn selector(&self, set: &DiagnosticSet) -> TgResult<OptimalSelector> {
        self.criteria
            .iter()
            .try_fold(set.selector(), |selector, (name, criterion)| {
                let criterion: Criterion = criterion.parse()?;
                Ok(selector.with_criterion(name.clone(), criterion))
            })
    }

    /// The plot layout with `x` defaulting to the first argument.
    pub fn plot_spec(&self) -> Option<PlotSpec> {
        let mut spec = self.plot.clone()?;
        if spec.x.is_empty() {
            spec.x = self.arguments.keys().next()?.clone();
        }
        Some(spec)
    }

    /// `(train, test)` data sets.
    pub fn load_data(&self) -> TgResult<(Dataset, Dataset)> {
        match &self.data {
            DataConfig::Split { train, test } => Ok((
                Dataset::load_csv(train, &self.target)?,
                Dataset::load_csv(test, &self.target)?,
            )),
            DataConfig::Single {
                path,
                test_fraction,
                seed,
            } => Dataset::load_csv(path, &self.target)?.split(*test_fraction, *seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_types::TgError;

    const CONFIG: &str = r#"{
        "data": { "path": "data.csv", "seed": 3 },
        "target": "y",
        "model": "knn",
        "arguments": { "weights": ["uniform", "distance"], "k": [1, 3, 5], "p": 2 },
        "criteria": { "rmse": "max" },
        "plot": { "color": "weights" }
    }"#;

    #[test]
    fn parses_with_defaults() {
        let config = RunConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.model, ModelKind::Knn);
        assert_eq!(
            config.data,
            DataConfig::Single {
                path: "data.csv".into(),
                test_fraction: 0.25,
                seed: 3
            }
        );
        assert_eq!(config.runner, RunnerConfig::default());
        assert!(config.diagnostics.is_empty());
    }

    #[test]
    fn split_data_form() {
        let config = RunConfig::from_json(
            r#"{ "data": { "train": "a.csv", "test": "b.csv" }, "target": "y", "model": "ridge" }"#,
        )
        .unwrap();
        assert!(matches!(config.data, DataConfig::Split { .. }));
        assert_eq!(config.grid().unwrap().size(), 1);
    }

    #[test]
    fn grid_keeps_declaration_order() {
        let grid = RunConfig::from_json(CONFIG).unwrap().grid().unwrap();
        assert_eq!(grid.names(), vec!["weights", "k", "p"]);
        assert_eq!(grid.size(), 6);
        let first = grid.combination(1).unwrap();
        assert_eq!(first.to_string(), "weights=distance, k=1, p=2");
    }

    #[test]
    fn grid_rejects_unknown_and_nested_arguments() {
        let mut config = RunConfig::from_json(CONFIG).unwrap();
        config
            .arguments
            .insert("lambda".into(), serde_json::json!([0.1]));
        assert!(matches!(config.grid(), Err(TgError::Config(_))));

        let mut config = RunConfig::from_json(CONFIG).unwrap();
        config.arguments.insert("k".into(), serde_json::json!([[1]]));
        assert!(matches!(config.grid(), Err(TgError::Config(_))));

        let mut config = RunConfig::from_json(CONFIG).unwrap();
        config.arguments.insert("k".into(), serde_json::json!([]));
        assert!(config.grid().is_err());
    }

    #[test]
    fn selector_applies_overrides() {
        let config = RunConfig::from_json(CONFIG).unwrap();
        let set = config.diagnostic_set().unwrap();
        assert_eq!(set, DiagnosticSet::regression());
        let selector = config.selector(&set).unwrap();
        assert_eq!(selector.criterion_for("rmse").to_string(), "max");
        assert_eq!(selector.criterion_for("r_squared").to_string(), "max");
        assert_eq!(selector.criterion_for("bias").to_string(), "closest:0");

        let mut bad = config.clone();
        bad.criteria.insert("mae".into(), "lowest".into());
        assert!(bad.selector(&set).is_err());
    }

    #[test]
    fn plot_x_defaults_to_first_argument() {
        let config = RunConfig::from_json(CONFIG).unwrap();
        let spec = config.plot_spec().unwrap();
        assert_eq!(spec.x, "weights");
        assert_eq!(spec.color.as_deref(), Some("weights"));
    }

    #[test]
    fn load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, CONFIG).unwrap();
        let config = RunConfig::load(&path).unwrap();
        match config.data {
            DataConfig::Single { path, .. } => assert_eq!(path, dir.path().join("data.csv")),
            other => panic!("unexpected data config {other:?}"),
        }
    }
}
