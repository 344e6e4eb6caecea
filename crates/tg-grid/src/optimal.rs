//! Picking the optimal combination per diagnostic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use tg_types::{
    config_error, Combination, DiagnosticTable, GridError, TableError, TgError, TgResult,
};

type CustomCriterion = Arc<dyn Fn(&[Option<f64>]) -> Option<usize> + Send + Sync>;

/// Optimality criterion: maps a diagnostic column to the preferred row.
///
/// Missing values are never selected. Ties resolve to the earliest row.
#[derive(Clone, Default)]
pub enum Criterion {
    /// Index of the minimum value.
    #[default]
    Minimize,
    /// Index of the maximum value.
    Maximize,
    /// Index of the value closest to the target.
    Closest(f64),
    /// User-supplied selection function.
    Custom(CustomCriterion),
}

impl Criterion {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[Option<f64>]) -> Option<usize> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Position of the preferred value in `column`, if any.
    pub fn select(&self, column: &[Option<f64>]) -> Option<usize> {
        match self {
            Self::Minimize => best_by(column, |candidate, best| candidate < best),
            Self::Maximize => best_by(column, |candidate, best| candidate > best),
            Self::Closest(target) => {
                let distances: Vec<Option<f64>> = column
                    .iter()
                    .map(|v| v.map(|x| (x - target).abs()))
                    .collect();
                best_by(&distances, |candidate, best| candidate < best)
            }
            Self::Custom(f) => f(column),
        }
    }
}

fn best_by(column: &[Option<f64>], better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, value) in column.iter().enumerate() {
        let Some(v) = value.filter(|v| !v.is_nan()) else {
            continue;
        };
        match best {
            Some((_, b)) if !better(v, b) => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minimize => write!(f, "Minimize"),
            Self::Maximize => write!(f, "Maximize"),
            Self::Closest(t) => write!(f, "Closest({t})"),
            Self::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minimize => write!(f, "min"),
            Self::Maximize => write!(f, "max"),
            Self::Closest(t) => write!(f, "closest:{t}"),
            Self::Custom(_) => write!(f, "custom"),
        }
    }
}

impl FromStr for Criterion {
    type Err = TgError;

    /// Parses `min`, `max` or `closest:<target>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "min" | "minimize" => return Ok(Self::Minimize),
            "max" | "maximize" => return Ok(Self::Maximize),
            _ => {}
        }
        if let Some(target) = s.strip_prefix("closest:") {
            let target: f64 = target
                .trim()
                .parse()
                .map_err(|_| config_error!("invalid closest target in criterion '{}'", s))?;
            return Ok(Self::Closest(target));
        }
        Err(config_error!(
            "unknown criterion '{}': expected min, max or closest:<x>",
            s
        ))
    }
}

/// The optimal row for one diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalChoice {
    pub diagnostic: String,
    /// Row position in the table; `None` when the column has no usable value.
    pub position: Option<usize>,
    /// Grid index of the chosen combination.
    pub grid_index: Option<usize>,
    pub value: Option<f64>,
    pub combination: Option<Combination>,
}

/// The optimal rows, one per diagnostic that produced a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalTable {
    /// Diagnostic each row of `table` is optimal for.
    pub optimal_for: Vec<String>,
    pub table: DiagnosticTable,
}

/// Applies a criterion per diagnostic column.
#[derive(Debug, Clone, Default)]
pub struct OptimalSelector {
    default: Criterion,
    overrides: BTreeMap<String, Criterion>,
}

impl OptimalSelector {
    pub fn new(default: Criterion) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_criterion(mut self, diagnostic: impl Into<String>, criterion: Criterion) -> Self {
        self.overrides.insert(diagnostic.into(), criterion);
        self
    }

    pub fn criterion_for(&self, diagnostic: &str) -> &Criterion {
        self.overrides.get(diagnostic).unwrap_or(&self.default)
    }

    /// One choice per diagnostic column, in column order.
    pub fn select(&self, table: &DiagnosticTable) -> TgResult<Vec<OptimalChoice>> {
        if table.is_empty() {
            return Err(TableError::Empty.into());
        }
        if let Some(unknown) = self
            .overrides
            .keys()
            .find(|name| table.diagnostic_position(name).is_none())
        {
            return Err(TableError::UnknownDiagnostic {
                name: unknown.clone(),
            }
            .into());
        }

        let mut choices = Vec::with_capacity(table.diagnostic_names().len());
        for name in table.diagnostic_names() {
            let column = table.diagnostic_column(name)?;
            let criterion = self.criterion_for(name);
            let position = criterion.select(&column);

            if let Some(pos) = position {
                if pos >= column.len() {
                    return Err(GridError::IndexOutOfRange {
                        index: pos,
                        len: column.len(),
                    }
                    .into());
                }
            }

            let row = position.and_then(|pos| table.row(pos));
            debug!(
                "Optimal {} by {}: {:?}",
                name,
                criterion,
                row.map(|r| r.combination.to_string())
            );

            choices.push(OptimalChoice {
                diagnostic: name.clone(),
                position,
                grid_index: row.map(|r| r.index),
                value: position.and_then(|pos| column[pos]),
                combination: row.map(|r| r.combination.clone()),
            });
        }
        Ok(choices)
    }

    /// The chosen rows as a table, in diagnostic column order.
    pub fn optimal_table(&self, table: &DiagnosticTable) -> TgResult<OptimalTable> {
        let choices = self.select(table)?;
        let (optimal_for, positions): (Vec<String>, Vec<usize>) = choices
            .into_iter()
            .filter_map(|c| c.position.map(|pos| (c.diagnostic, pos)))
            .unzip();
        Ok(OptimalTable {
            optimal_for,
            table: table.subset(&positions)?,
        })
    }
}
