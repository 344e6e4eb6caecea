//! Built-in models evaluated by the `tunegrid` binary.
//!
//! - `knn`: k-nearest-neighbours regression. Arguments: `k` (default 5),
//!   `weights` (`uniform` | `distance`, default `uniform`), `p` (Minkowski
//!   power, default 2).
//! - `ridge`: ridge regression. Arguments: `lambda` (default 0), `intercept`
//!   (default true; the intercept is never penalized).

use serde::{Deserialize, Serialize};
use std::fmt;

use tg_types::{validation_error, Combination, TgResult};

use crate::data::Dataset;

/// Pivots smaller than this are treated as a singular system.
const SINGULAR_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Knn,
    Ridge,
}

impl ModelKind {
    /// Argument names the model understands.
    pub fn accepted_arguments(&self) -> &'static [&'static str] {
        match self {
            Self::Knn => &["k", "weights", "p"],
            Self::Ridge => &["lambda", "intercept"],
        }
    }

    /// Fit on `train` with `args` and predict the target of every `test` row.
    pub fn predict(&self, train: &Dataset, test: &Dataset, args: &Combination) -> TgResult<Vec<f64>> {
        if train.is_empty() {
            return Err(validation_error!("training set is empty"));
        }
        if train.n_features() != test.n_features() {
            return Err(validation_error!(
                "train has {} features but test has {}",
                train.n_features(),
                test.n_features()
            ));
        }
        match self {
            Self::Knn => Knn::from_args(args)?.predict(train, test),
            Self::Ridge => Ridge::from_args(args)?.predict(train, test),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Knn => write!(f, "knn"),
            Self::Ridge => write!(f, "ridge"),
        }
    }
}

fn f64_or(args: &Combination, name: &str, default: f64) -> TgResult<f64> {
    match args.get(name) {
        Some(_) => args.get_f64(name),
        None => Ok(default),
    }
}

// ---- k-nearest neighbours ----

#[derive(Debug, Clone, Copy, PartialEq)]
struct Knn {
    k: usize,
    distance_weighted: bool,
    p: f64,
}

impl Knn {
    fn from_args(args: &Combination) -> TgResult<Self> {
        let k = match args.get("k") {
            Some(_) => args.get_i64("k")?,
            None => 5,
        };
        if k < 1 {
            return Err(validation_error!("k must be at least 1, got {}", k));
        }
        let distance_weighted = match args.get("weights") {
            None => false,
            Some(_) => match args.get_str("weights")? {
                "uniform" => false,
                "distance" => true,
                other => {
                    return Err(validation_error!(
                        "weights must be 'uniform' or 'distance', got '{}'",
                        other
                    ))
                }
            },
        };
        let p = f64_or(args, "p", 2.0)?;
        if !(p > 0.0) {
            return Err(validation_error!("p must be positive, got {}", p));
        }
        Ok(Self {
            k: k as usize,
            distance_weighted,
            p,
        })
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs().powf(self.p))
            .sum::<f64>()
            .powf(1.0 / self.p)
    }

    fn predict(&self, train: &Dataset, test: &Dataset) -> TgResult<Vec<f64>> {
        let k = self.k.min(train.len());
        let predictions = test
            .features
            .iter()
            .map(|row| {
                let mut neighbours: Vec<(f64, f64)> = train
                    .features
                    .iter()
                    .zip(&train.target)
                    .map(|(x, y)| (self.distance(row, x), *y))
                    .collect();
                neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));
                let nearest = &neighbours[..k];

                if !self.distance_weighted {
                    return nearest.iter().map(|(_, y)| y).sum::<f64>() / k as f64;
                }
                // Exact matches dominate inverse-distance weights.
                let exact: Vec<f64> = nearest
                    .iter()
                    .filter(|(d, _)| *d == 0.0)
                    .map(|(_, y)| *y)
                    .collect();
                if !exact.is_empty() {
                    return exact.iter().sum::<f64>() / exact.len() as f64;
                }
                let (num, den) = nearest
                    .iter()
                    .fold((0.0, 0.0), |(num, den), (d, y)| (num + y / d, den + 1.0 / d));
                num / den
            })
            .collect();
        Ok(predictions)
    }
}

// ---- ridge regression ----

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ridge {
    lambda: f64,
    intercept: bool,
}

impl Ridge {
    fn from_args(args: &Combination) -> TgResult<Self> {
        let lambda = f64_or(args, "lambda", 0.0)?;
        if !(lambda >= 0.0) {
            return Err(validation_error!("lambda must be non-negative, got {}", lambda));
        }
        let intercept = match args.get("intercept") {
            Some(_) => args.get_bool("intercept")?,
            None => true,
        };
        Ok(Self { lambda, intercept })
    }

    fn column_means(data: &Dataset) -> Vec<f64> {
        let n = data.len() as f64;
        (0..data.n_features())
            .map(|j| data.features.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect()
    }

    fn predict(&self, train: &Dataset, test: &Dataset) -> TgResult<Vec<f64>> {
        let p = train.n_features();
        let (x_mean, y_mean) = if self.intercept {
            let y_mean = train.target.iter().sum::<f64>() / train.len() as f64;
            (Self::column_means(train), y_mean)
        } else {
            (vec![0.0; p], 0.0)
        };

        // Normal equations on centred data: (X'X + lambda I) beta = X'y
        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for (row, y) in train.features.iter().zip(&train.target) {
            let centred: Vec<f64> = row.iter().zip(&x_mean).map(|(x, m)| x - m).collect();
            let yc = y - y_mean;
            for i in 0..p {
                xty[i] += centred[i] * yc;
                for j in 0..p {
                    xtx[i][j] += centred[i] * centred[j];
                }
            }
        }
        for (i, row) in xtx.iter_mut().enumerate() {
            row[i] += self.lambda;
        }

        let beta = solve(xtx, xty)?;
        Ok(test
            .features
            .iter()
            .map(|row| {
                y_mean
                    + row
                        .iter()
                        .zip(&x_mean)
                        .zip(&beta)
                        .map(|((x, m), b)| (x - m) * b)
                        .sum::<f64>()
            })
            .collect())
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> TgResult<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < SINGULAR_EPS {
            return Err(validation_error!(
                "singular system in ridge fit; increase lambda"
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
