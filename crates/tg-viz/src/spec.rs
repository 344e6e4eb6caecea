//! Plot specification: which column goes on which channel.

use serde::{Deserialize, Serialize};

use tg_types::{DiagnosticTable, PlotError, TgResult};

/// Reserved column naming the diagnostic of a long-form record.
pub const DIAGNOSTIC: &str = "diagnostic";
/// Reserved column holding the diagnostic value (the y axis).
pub const VALUE: &str = "value";

/// Mark drawn for each series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geom {
    #[default]
    Line,
    Point,
    LinePoint,
}

/// How the diagnostics table is mapped onto a plot.
///
/// `x` must name an argument. The aesthetics and facets may name an argument
/// or [`DIAGNOSTIC`]. By default the plot is faceted by diagnostic in rows and
/// every argument that is not mapped is averaged out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSpec {
    pub x: String,
    pub geom: Geom,
    pub color: Option<String>,
    pub shape: Option<String>,
    pub linetype: Option<String>,
    pub facet_row: Option<String>,
    pub facet_col: Option<String>,
    pub average_others: bool,
    pub title: Option<String>,
}

impl Default for PlotSpec {
    fn default() -> Self {
        Self {
            x: String::new(),
            geom: Geom::Line,
            color: None,
            shape: None,
            linetype: None,
            facet_row: Some(DIAGNOSTIC.to_string()),
            facet_col: None,
            average_others: true,
            title: None,
        }
    }
}

impl PlotSpec {
    pub fn new(x: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            ..Self::default()
        }
    }

    pub fn with_geom(mut self, geom: Geom) -> Self {
        self.geom = geom;
        self
    }

    pub fn with_color(mut self, column: impl Into<String>) -> Self {
        self.color = Some(column.into());
        self
    }

    pub fn with_shape(mut self, column: impl Into<String>) -> Self {
        self.shape = Some(column.into());
        self
    }

    pub fn with_linetype(mut self, column: impl Into<String>) -> Self {
        self.linetype = Some(column.into());
        self
    }

    pub fn with_facet_row(mut self, column: Option<&str>) -> Self {
        self.facet_row = column.map(str::to_string);
        self
    }

    pub fn with_facet_col(mut self, column: Option<&str>) -> Self {
        self.facet_col = column.map(str::to_string);
        self
    }

    pub fn with_average_others(mut self, average: bool) -> Self {
        self.average_others = average;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Every `(channel, column)` mapping, x first.
    pub fn mappings(&self) -> Vec<(&'static str, &str)> {
        let optional = [
            ("color", &self.color),
            ("shape", &self.shape),
            ("linetype", &self.linetype),
            ("facet_row", &self.facet_row),
            ("facet_col", &self.facet_col),
        ];
        std::iter::once(("x", self.x.as_str()))
            .chain(
                optional
                    .into_iter()
                    .filter_map(|(channel, column)| column.as_deref().map(|c| (channel, c))),
            )
            .collect()
    }

    /// Whether some channel shows the diagnostic name.
    pub fn maps_diagnostic(&self) -> bool {
        self.mappings().iter().any(|(_, column)| *column == DIAGNOSTIC)
    }

    /// Check every mapping against the table's columns.
    pub fn validate(&self, table: &DiagnosticTable) -> TgResult<()> {
        for reserved in [DIAGNOSTIC, VALUE] {
            if table.has_argument(reserved) {
                return Err(PlotError::ReservedColumn {
                    column: reserved.to_string(),
                }
                .into());
            }
        }

        if !table.has_argument(&self.x) {
            return Err(PlotError::UnknownAesthetic {
                aesthetic: "x".to_string(),
                column: self.x.clone(),
            }
            .into());
        }

        let mut seen: Vec<&str> = Vec::new();
        for (channel, column) in self.mappings() {
            if column != DIAGNOSTIC && !table.has_argument(column) {
                return Err(PlotError::UnknownAesthetic {
                    aesthetic: channel.to_string(),
                    column: column.to_string(),
                }
                .into());
            }
            if seen.contains(&column) {
                return Err(PlotError::DuplicateMapping {
                    column: column.to_string(),
                }
                .into());
            }
            seen.push(column);
        }
        Ok(())
    }

    /// The focused arguments: every mapped argument, in table column order.
    pub fn focus(&self, table: &DiagnosticTable) -> Vec<String> {
        let mapped = self.mappings();
        table
            .argument_names()
            .iter()
            .filter(|name| mapped.iter().any(|(_, column)| column == name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_types::{ArgValue, Combination, Diagnostics, TgError};

    fn table(args: &[&str]) -> DiagnosticTable {
        let mut t = DiagnosticTable::new(args.iter().map(|a| a.to_string()).collect());
        let combination = Combination::from_pairs(args.iter().map(|a| (*a, ArgValue::Int(1))));
        t.push_row(0, combination, &Diagnostics::new().with("rmse", 1.0));
        t
    }

    #[test]
    fn defaults_facet_by_diagnostic_and_average() {
        let spec = PlotSpec::new("k");
        assert_eq!(spec.facet_row.as_deref(), Some(DIAGNOSTIC));
        assert!(spec.average_others);
        assert!(spec.maps_diagnostic());
        assert_eq!(spec.mappings(), vec![("x", "k"), ("facet_row", DIAGNOSTIC)]);
    }

    #[test]
    fn focus_lists_mapped_arguments_in_table_order() {
        let t = table(&["k", "p", "weights"]);
        let spec = PlotSpec::new("weights").with_color("k");
        assert_eq!(spec.focus(&t), vec!["k", "weights"]);
    }

    #[test]
    fn validation_errors() {
        let t = table(&["k", "p"]);
        assert!(PlotSpec::new("k").with_color("p").validate(&t).is_ok());

        assert!(matches!(
            PlotSpec::new("lambda").validate(&t),
            Err(TgError::Plot(PlotError::UnknownAesthetic { .. }))
        ));
        assert!(matches!(
            PlotSpec::new(DIAGNOSTIC).validate(&t),
            Err(TgError::Plot(PlotError::UnknownAesthetic { .. }))
        ));
        assert!(matches!(
            PlotSpec::new("k").with_shape("alpha").validate(&t),
            Err(TgError::Plot(PlotError::UnknownAesthetic { .. }))
        ));
        assert!(matches!(
            PlotSpec::new("k").with_color("k").validate(&t),
            Err(TgError::Plot(PlotError::DuplicateMapping { .. }))
        ));
        assert!(matches!(
            PlotSpec::new("k").with_color(DIAGNOSTIC).validate(&t),
            Err(TgError::Plot(PlotError::DuplicateMapping { .. }))
        ));
    }

    #[test]
    fn reserved_argument_names_are_rejected() {
        let t = table(&["value", "k"]);
        assert!(matches!(
            PlotSpec::new("k").validate(&t),
            Err(TgError::Plot(PlotError::ReservedColumn { .. }))
        ));
    }

    #[test]
    fn plot_spec_deserializes_with_defaults() {
        let spec: PlotSpec =
            serde_json::from_str(r#"{"x": "k", "color": "weights", "geom": "line_point"}"#).unwrap();
        assert_eq!(spec.geom, Geom::LinePoint);
        assert_eq!(spec.facet_row.as_deref(), Some(DIAGNOSTIC));
        assert!(spec.average_others);
    }
}
