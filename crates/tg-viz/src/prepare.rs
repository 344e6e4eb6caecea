//! Turning a diagnostics table into plot series.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use tg_types::{ArgValue, DiagnosticTable, PlotError, TgResult};

use crate::spec::PlotSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub x: ArgValue,
    pub y: f64,
}

/// One drawn line (or point cloud): a diagnostic plus fixed values for every
/// grouping argument other than x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub diagnostic: String,
    pub keys: Vec<(String, ArgValue)>,
    /// Sorted by x.
    pub points: Vec<PlotPoint>,
}

impl Series {
    pub fn key(&self, name: &str) -> Option<&ArgValue> {
        self.keys.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn label(&self) -> String {
        let keys: Vec<String> = self.keys.iter().map(|(n, v)| format!("{n}={v}")).collect();
        if keys.is_empty() {
            self.diagnostic.clone()
        } else {
            format!("{} [{}]", self.diagnostic, keys.join(", "))
        }
    }
}

/// Series ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotData {
    pub x: String,
    /// Mapped arguments, in table column order.
    pub focus: Vec<String>,
    /// Unmapped arguments kept as per-series grouping when not averaging.
    pub detail: Vec<String>,
    pub averaged: bool,
    pub series: Vec<Series>,
}

impl PlotData {
    /// Whether every x value is numeric.
    pub fn numeric_x(&self) -> bool {
        self.series
            .iter()
            .flat_map(|s| s.points.iter())
            .all(|p| p.x.is_numeric())
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }
}

/// Running mean that ignores missing values.
#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// A long-form record reduced to the columns the plot groups by.
struct Reduced {
    diagnostic: String,
    x: ArgValue,
    keys: Vec<(String, ArgValue)>,
    value: Option<f64>,
}

/// Reshape `table` into long form and group it into plot series.
///
/// With `average_others` every combination of the focused arguments becomes
/// one point whose value is the mean over the unmapped arguments. Otherwise
/// each distinct value of the unmapped arguments draws its own series.
/// Missing values are dropped from the output.
pub fn prepare(table: &DiagnosticTable, spec: &PlotSpec) -> TgResult<PlotData> {
    if table.is_empty() || table.diagnostic_names().is_empty() {
        return Err(PlotError::NoData {
            message: "the diagnostics table is empty".to_string(),
        }
        .into());
    }
    spec.validate(table)?;

    let focus = spec.focus(table);
    let unmapped: Vec<String> = table
        .argument_names()
        .iter()
        .filter(|name| !focus.contains(name))
        .cloned()
        .collect();

    let (group_by, detail) = if spec.average_others {
        (focus.clone(), Vec::new())
    } else {
        if !unmapped.is_empty() {
            info!(
                "Plotting without averaging: unmapped arguments {:?} draw separate series",
                unmapped
            );
        }
        (table.argument_names().to_vec(), unmapped)
    };

    let records = reduce(table, spec, &group_by)?;
    let series = group_into_series(records);
    let data = PlotData {
        x: spec.x.clone(),
        focus,
        detail,
        averaged: spec.average_others,
        series,
    };

    if data.point_count() == 0 {
        return Err(PlotError::NoData {
            message: "every diagnostic value is missing".to_string(),
        }
        .into());
    }
    Ok(data)
}

/// Average values over everything not in `group_by`, preserving first-seen order.
fn reduce(table: &DiagnosticTable, spec: &PlotSpec, group_by: &[String]) -> TgResult<Vec<Reduced>> {
    let mut order: Vec<Reduced> = Vec::new();
    let mut means: Vec<Mean> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in table.to_long() {
        let mut x = None;
        let mut keys = Vec::with_capacity(group_by.len());
        for name in group_by {
            let value = record
                .combination
                .get(name)
                .cloned()
                .ok_or_else(|| tg_types::TableError::UnknownArgument { name: name.clone() })?;
            if *name == spec.x {
                x = Some(value);
            } else {
                keys.push((name.clone(), value));
            }
        }
        let x = x.ok_or_else(|| tg_types::TableError::UnknownArgument {
            name: spec.x.clone(),
        })?;

        let group_key = std::iter::once(record.diagnostic.clone())
            .chain(std::iter::once(x.key()))
            .chain(keys.iter().map(|(_, v)| v.key()))
            .collect::<Vec<_>>()
            .join("\u{1f}");

        let slot = *index.entry(group_key).or_insert_with(|| {
            order.push(Reduced {
                diagnostic: record.diagnostic.clone(),
                x,
                keys,
                value: None,
            });
            means.push(Mean::default());
            order.len() - 1
        });
        means[slot].add(record.value);
    }

    for (reduced, mean) in order.iter_mut().zip(&means) {
        reduced.value = mean.value();
    }
    Ok(order)
}

fn group_into_series(records: Vec<Reduced>) -> Vec<Series> {
    let mut series: Vec<Series> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut dropped = 0usize;

    for record in records {
        let Some(y) = record.value else {
            dropped += 1;
            continue;
        };
        let series_key = std::iter::once(record.diagnostic.clone())
            .chain(record.keys.iter().map(|(_, v)| v.key()))
            .collect::<Vec<_>>()
            .join("\u{1f}");

        let slot = *index.entry(series_key).or_insert_with(|| {
            series.push(Series {
                diagnostic: record.diagnostic.clone(),
                keys: record.keys.clone(),
                points: Vec::new(),
            });
            series.len() - 1
        });
        series[slot].points.push(PlotPoint { x: record.x, y });
    }

    for s in &mut series {
        s.points.sort_by(|a, b| a.x.compare(&b.x));
    }
    if dropped > 0 {
        debug!("Dropped {} missing plot values", dropped);
    }
    series
}
