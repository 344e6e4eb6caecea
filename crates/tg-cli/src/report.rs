//! Output formatting for `tunegrid run`.

use std::fmt::Write as _;
use std::io;

use tg_grid::{OptimalChoice, OptimalTable};
use tg_types::TgResult;

/// Text summary: one line per diagnostic with its optimal combination.
pub fn format_optimal(choices: &[OptimalChoice]) -> String {
    let width = choices
        .iter()
        .map(|c| c.diagnostic.len())
        .max()
        .unwrap_or(0)
        .max("diagnostic".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  {:>12}  {:>6}  combination", "diagnostic", "value", "index");
    for choice in choices {
        match (&choice.combination, choice.value, choice.grid_index) {
            (Some(combination), Some(value), Some(index)) => {
                let _ = writeln!(
                    out,
                    "{:<width$}  {:>12.6}  {:>6}  {}",
                    choice.diagnostic, value, index, combination
                );
            }
            _ => {
                let _ = writeln!(out, "{:<width$}  {:>12}  {:>6}  (no value)", choice.diagnostic, "-", "-");
            }
        }
    }
    out
}

/// Write the optimal rows as CSV with a leading `optimal_for` column.
pub fn write_optimal_csv<W: io::Write>(optimal: &OptimalTable, writer: W) -> TgResult<()> {
    let table = &optimal.table;
    let mut csv_writer = csv::Writer::from_writer(writer);

    let header: Vec<&str> = std::iter::once("optimal_for")
        .chain(table.argument_names().iter().map(String::as_str))
        .chain(table.diagnostic_names().iter().map(String::as_str))
        .collect();
    csv_writer.write_record(&header)?;

    for (diagnostic, row) in optimal.optimal_for.iter().zip(table.rows()) {
        let mut record = vec![diagnostic.clone()];
        record.extend(table.argument_names().iter().map(|name| {
            row.combination
                .get(name)
                .map(ToString::to_string)
                .unwrap_or_default()
        }));
        record.extend(
            (0..table.diagnostic_names().len())
                .map(|pos| row.value(pos).map(|v| v.to_string()).unwrap_or_default()),
        );
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_grid::{Criterion, OptimalSelector};
    use tg_types::{ArgValue, Combination, DiagnosticTable, Diagnostics};

    fn table() -> DiagnosticTable {
        let mut table = DiagnosticTable::new(vec!["k".into()]);
        for (i, (k, rmse, r2)) in [(1, 2.0, 0.5), (3, 1.0, 0.4)].into_iter().enumerate() {
            table.push_row(
                i,
                Combination::from_pairs(vec![("k", ArgValue::Int(k))]),
                &Diagnostics::new().with("rmse", rmse).with("r2", r2),
            );
        }
        table.push_missing(2, Combination::from_pairs(vec![("k", ArgValue::Int(5))]));
        table
    }

    fn selector() -> OptimalSelector {
        OptimalSelector::new(Criterion::Minimize).with_criterion("r2", Criterion::Maximize)
    }

    #[test]
    fn summary_lists_each_diagnostic() {
        let choices = selector().select(&table()).unwrap();
        let text = format_optimal(&choices);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("diagnostic"));
        assert!(lines[1].starts_with("rmse"));
        assert!(lines[1].ends_with("k=3"));
        assert!(lines[2].contains("0.500000"));
        assert!(lines[2].ends_with("k=1"));
    }

    #[test]
    fn summary_marks_empty_columns() {
        let mut table = DiagnosticTable::new(vec!["k".into()]);
        table.push_row(
            0,
            Combination::from_pairs(vec![("k", ArgValue::Int(1))]),
            &Diagnostics::new().with("rmse", f64::NAN),
        );
        let choices = OptimalSelector::default().select(&table).unwrap();
        assert!(format_optimal(&choices).contains("(no value)"));
    }

    #[test]
    fn optimal_csv_has_one_row_per_diagnostic() {
        let optimal = selector().optimal_table(&table()).unwrap();
        let mut buf = Vec::new();
        write_optimal_csv(&optimal, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "optimal_for,k,rmse,r2\nrmse,3,1,0.4\nr2,1,2,0.5\n");
    }
}
