//! Numeric CSV data sets.

use csv::ReaderBuilder;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io;
use std::path::Path;

use tg_diagnostics::Observed;
use tg_types::{config_error, validation_error, EvaluationError, TgResult};

/// A table of numeric features plus one target column.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    /// Row-major feature matrix.
    pub features: Vec<Vec<f64>>,
    pub target: Vec<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Load a CSV file with a header row. `target` names the outcome column;
    /// every other column is a feature.
    pub fn load_csv<P: AsRef<Path>>(path: P, target: &str) -> TgResult<Self> {
        let path = path.as_ref();
        tracing::info!("Loading CSV data from: {}", path.display());
        let file = std::fs::File::open(path)
            .map_err(|e| config_error!("failed to open data file {}: {}", path.display(), e))?;
        let dataset = Self::from_reader(file, target)?;
        tracing::info!(
            "Loaded {} rows with {} features from {}",
            dataset.len(),
            dataset.n_features(),
            path.display()
        );
        Ok(dataset)
    }

    /// Parse CSV from any reader. Rows with unparseable, missing or non-finite
    /// values are skipped with a warning.
    pub fn from_reader<R: io::Read>(reader: R, target: &str) -> TgResult<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        tracing::debug!("CSV headers: {:?}", headers);
        let target_idx = headers
            .iter()
            .position(|h| h == target)
            .ok_or_else(|| config_error!("target column '{}' not found in CSV header", target))?;
        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut features = Vec::new();
        let mut target_values = Vec::new();
        for (line_num, result) in rdr.records().enumerate() {
            let record = result?;
            let parsed: Result<Vec<f64>, _> = record.iter().map(str::parse::<f64>).collect();
            let values = match parsed {
                Ok(values) if values.len() != headers.len() => {
                    tracing::warn!("Skipping record at line {}: wrong field count", line_num + 2);
                    continue;
                }
                Ok(values) if values.iter().all(|v| v.is_finite()) => values,
                Ok(_) => {
                    tracing::warn!("Skipping record at line {}: non-finite value", line_num + 2);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Skipping invalid record at line {}: {}", line_num + 2, e);
                    continue;
                }
            };

            target_values.push(values[target_idx]);
            features.push(
                values
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != target_idx)
                    .map(|(_, v)| *v)
                    .collect(),
            );
        }

        if target_values.is_empty() {
            return Err(EvaluationError::EmptyInput {
                message: "no valid data rows".to_string(),
            }
            .into());
        }

        Ok(Self {
            feature_names,
            features,
            target: target_values,
        })
    }

    fn take(&self, rows: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            features: rows.iter().map(|&r| self.features[r].clone()).collect(),
            target: rows.iter().map(|&r| self.target[r]).collect(),
        }
    }

    /// Seeded shuffle split into `(train, test)`. Both halves keep at least one row.
    pub fn split(&self, test_fraction: f64, seed: u64) -> TgResult<(Self, Self)> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(validation_error!(
                "test_fraction must be in (0, 1), got {}",
                test_fraction
            ));
        }
        if self.len() < 2 {
            return Err(validation_error!(
                "need at least 2 rows to split, got {}",
                self.len()
            ));
        }

        let mut rows: Vec<usize> = (0..self.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rows.shuffle(&mut rng);

        let n_test = ((self.len() as f64 * test_fraction).round() as usize).clamp(1, self.len() - 1);
        let (test_rows, train_rows) = rows.split_at(n_test);
        tracing::debug!(
            "Split {} rows into {} train / {} test (seed {})",
            self.len(),
            train_rows.len(),
            test_rows.len(),
            seed
        );
        Ok((self.take(train_rows), self.take(test_rows)))
    }
}

impl Observed for Dataset {
    fn observed(&self) -> &[f64] {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_types::TgError;

    const CSV: &str = "x1, y, x2\n1, 10, 2\n2, 20, 4\nbad, 30, 6\n3, 30, 6\n";

    #[test]
    fn parses_features_and_target() {
        let ds = Dataset::from_reader(CSV.as_bytes(), "y").unwrap();
        assert_eq!(ds.feature_names, vec!["x1", "x2"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.features[2], vec![3.0, 6.0]);
        assert_eq!(ds.target, vec![10.0, 20.0, 30.0]);
        assert_eq!(ds.observed(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn missing_target_column_is_config_error() {
        assert!(matches!(
            Dataset::from_reader(CSV.as_bytes(), "z"),
            Err(TgError::Config(_))
        ));
    }

    #[test]
    fn no_valid_rows_is_an_error() {
        let csv = "x,y\na,b\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes(), "y"),
            Err(TgError::Evaluation(EvaluationError::EmptyInput { .. }))
        ));
    }

    #[test]
    fn split_is_seeded_and_partitions_rows() {
        let mut csv = String::from("x,y\n");
        for i in 0..20 {
            csv.push_str(&format!("{i},{}\n", i * 2));
        }
        let ds = Dataset::from_reader(csv.as_bytes(), "y").unwrap();

        let (train, test) = ds.split(0.25, 7).unwrap();
        assert_eq!(test.len(), 5);
        assert_eq!(train.len(), 15);

        let mut all: Vec<f64> = train.target.iter().chain(&test.target).copied().collect();
        all.sort_by(f64::total_cmp);
        assert_eq!(all, ds.target);

        let (_, again) = ds.split(0.25, 7).unwrap();
        assert_eq!(again, test);
    }

    #[test]
    fn split_validation() {
        let ds = Dataset::from_reader("x,y\n1,2\n".as_bytes(), "y").unwrap();
        assert!(ds.split(0.5, 1).is_err());
        let ds = Dataset::from_reader(CSV.as_bytes(), "y").unwrap();
        assert!(ds.split(1.0, 1).is_err());
        assert!(ds.split(0.0, 1).is_err());
        let (train, test) = ds.split(0.01, 1).unwrap();
        assert_eq!((train.len(), test.len()), (2, 1));
    }

    #[test]
    fn non_finite_cells_skip_the_row() {
        let csv = "x,y\n1,2\nNaN,3\n4,inf\n5,-infinity\n6,7\n";
        let ds = Dataset::from_reader(csv.as_bytes(), "y").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.target, vec![2.0, 7.0]);
        assert_eq!(ds.features, vec![vec![1.0], vec![6.0]]);
    }
}
