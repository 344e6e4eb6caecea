//! The diagnostics table collected by a grid run.
//!
//! Columns are the argument names in declaration order followed by the
//! diagnostic names in the order they were first reported. Each row holds the
//! combination it was computed for and one optional value per diagnostic.

use serde::{Deserialize, Serialize};
use std::io;

use crate::combination::Combination;
use crate::diagnostics::Diagnostics;
use crate::errors::{GridError, TableError, TgResult};
use crate::value::ArgValue;

/// One row of the diagnostics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRow {
    /// Position of the combination in the grid.
    pub index: usize,
    pub combination: Combination,
    /// Aligned with [`DiagnosticTable::diagnostic_names`]; `None` is missing.
    pub values: Vec<Option<f64>>,
}

impl DiagnosticRow {
    pub fn value(&self, column: usize) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }

    pub fn is_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// A single (combination, diagnostic) record of the long-form table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    pub index: usize,
    pub combination: Combination,
    pub diagnostic: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticTable {
    argument_names: Vec<String>,
    diagnostic_names: Vec<String>,
    rows: Vec<DiagnosticRow>,
}

impl DiagnosticTable {
    pub fn new(argument_names: Vec<String>) -> Self {
        Self {
            argument_names,
            diagnostic_names: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// An empty table whose diagnostic columns are known up front, so rows
    /// pushed with `push_missing` still carry every column.
    pub fn with_diagnostics(argument_names: Vec<String>, diagnostic_names: Vec<String>) -> Self {
        let mut table = Self::new(argument_names);
        for name in &diagnostic_names {
            table.ensure_diagnostic(name);
        }
        table
    }

    pub fn argument_names(&self) -> &[String] {
        &self.argument_names
    }

    pub fn diagnostic_names(&self) -> &[String] {
        &self.diagnostic_names
    }

    pub fn rows(&self) -> &[DiagnosticRow] {
        &self.rows
    }

    pub fn row(&self, position: usize) -> Option<&DiagnosticRow> {
        self.rows.get(position)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.argument_names.iter().any(|n| n == name)
    }

    pub fn diagnostic_position(&self, name: &str) -> Option<usize> {
        self.diagnostic_names.iter().position(|n| n == name)
    }

    fn ensure_diagnostic(&mut self, name: &str) -> usize {
        if let Some(pos) = self.diagnostic_position(name) {
            return pos;
        }
        self.diagnostic_names.push(name.to_string());
        for row in &mut self.rows {
            row.values.push(None);
        }
        self.diagnostic_names.len() - 1
    }

    /// Append a row of diagnostics. New diagnostic names extend the column set
    /// and earlier rows receive a missing value for them. Non-finite values are
    /// stored as missing.
    pub fn push_row(&mut self, index: usize, combination: Combination, diagnostics: &Diagnostics) {
        let positions: Vec<(usize, f64)> = diagnostics
            .iter()
            .map(|(name, value)| (self.ensure_diagnostic(name), value))
            .collect();

        let mut values = vec![None; self.diagnostic_names.len()];
        for (pos, value) in positions {
            values[pos] = value.is_finite().then_some(value);
        }

        self.rows.push(DiagnosticRow {
            index,
            combination,
            values,
        });
    }

    /// Append a row where every diagnostic is missing.
    pub fn push_missing(&mut self, index: usize, combination: Combination) {
        self.rows.push(DiagnosticRow {
            index,
            combination,
            values: vec![None; self.diagnostic_names.len()],
        });
    }

    /// Keep rows ordered by grid index.
    pub fn sort_by_index(&mut self) {
        self.rows.sort_by_key(|r| r.index);
    }

    pub fn diagnostic_column(&self, name: &str) -> TgResult<Vec<Option<f64>>> {
        let pos = self
            .diagnostic_position(name)
            .ok_or_else(|| TableError::UnknownDiagnostic {
                name: name.to_string(),
            })?;
        Ok(self.rows.iter().map(|r| r.value(pos)).collect())
    }

    pub fn argument_column(&self, name: &str) -> TgResult<Vec<ArgValue>> {
        if !self.has_argument(name) {
            return Err(TableError::UnknownArgument {
                name: name.to_string(),
            }
            .into());
        }
        self.rows
            .iter()
            .map(|r| {
                r.combination.get(name).cloned().ok_or_else(|| {
                    TableError::UnknownArgument {
                        name: name.to_string(),
                    }
                    .into()
                })
            })
            .collect()
    }

    /// Reshape into long form: one record per (row, diagnostic).
    pub fn to_long(&self) -> Vec<LongRecord> {
        let mut records = Vec::with_capacity(self.rows.len() * self.diagnostic_names.len());
        for row in &self.rows {
            for (pos, name) in self.diagnostic_names.iter().enumerate() {
                records.push(LongRecord {
                    index: row.index,
                    combination: row.combination.clone(),
                    diagnostic: name.clone(),
                    value: row.value(pos),
                });
            }
        }
        records
    }

    /// New table holding the rows at the given positions, in the given order.
    pub fn subset(&self, positions: &[usize]) -> TgResult<Self> {
        let rows = positions
            .iter()
            .map(|&pos| {
                self.rows.get(pos).cloned().ok_or(GridError::IndexOutOfRange {
                    index: pos,
                    len: self.rows.len(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            argument_names: self.argument_names.clone(),
            diagnostic_names: self.diagnostic_names.clone(),
            rows,
        })
    }

    /// Write the table as CSV. Missing cells are left empty.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> TgResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let header: Vec<&str> = self
            .argument_names
            .iter()
            .chain(self.diagnostic_names.iter())
            .map(String::as_str)
            .collect();
        csv_writer.write_record(&header)?;

        for row in &self.rows {
            let mut record: Vec<String> = self
                .argument_names
                .iter()
                .map(|name| {
                    row.combination
                        .get(name)
                        .map(ToString::to_string)
                        .unwrap_or_default()
                })
                .collect();
            record.extend(
                (0..self.diagnostic_names.len())
                    .map(|pos| row.value(pos).map(|v| v.to_string()).unwrap_or_default()),
            );
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
