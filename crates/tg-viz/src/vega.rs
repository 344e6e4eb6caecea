//! Vega-Lite rendering of prepared plot data.

use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use tg_types::TgResult;

use crate::prepare::PlotData;
use crate::spec::{Geom, PlotSpec, DIAGNOSTIC, VALUE};

const SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

fn field(name: &str, kind: &str) -> Value {
    json!({ "field": name, "type": kind })
}

fn mark(geom: Geom) -> Value {
    match geom {
        Geom::Line => json!({ "type": "line" }),
        Geom::Point => json!({ "type": "point", "filled": true }),
        Geom::LinePoint => json!({ "type": "line", "point": true }),
    }
}

/// Inline data values: one object per plotted point.
fn values(data: &PlotData) -> Vec<Value> {
    data.series
        .iter()
        .flat_map(|series| {
            series.points.iter().map(move |point| {
                let mut row = Map::new();
                row.insert(DIAGNOSTIC.to_string(), Value::String(series.diagnostic.clone()));
                row.insert(data.x.clone(), point.x.to_json());
                for (name, value) in &series.keys {
                    row.insert(name.clone(), value.to_json());
                }
                row.insert(VALUE.to_string(), json!(point.y));
                Value::Object(row)
            })
        })
        .collect()
}

/// Build a Vega-Lite v5 document for `data` laid out by `spec`.
///
/// Facets use the `row`/`column` encoding channels with independent y scales,
/// since diagnostics rarely share units. Grouping columns that no channel
/// shows go to `detail` so each series still draws separately.
pub fn render_vega_lite(data: &PlotData, spec: &PlotSpec) -> Value {
    let x_type = if data.numeric_x() { "quantitative" } else { "ordinal" };

    let mut encoding = Map::new();
    encoding.insert("x".into(), field(&data.x, x_type));
    encoding.insert(
        "y".into(),
        json!({ "field": VALUE, "type": "quantitative", "title": VALUE }),
    );

    let channels = [
        ("color", &spec.color),
        ("shape", &spec.shape),
        ("strokeDash", &spec.linetype),
        ("row", &spec.facet_row),
        ("column", &spec.facet_col),
    ];
    let mut shown = vec![data.x.clone()];
    for (channel, column) in channels {
        if let Some(column) = column {
            encoding.insert(channel.into(), field(column, "nominal"));
            shown.push(column.clone());
        }
    }

    let mut detail: Vec<Value> = Vec::new();
    if !shown.iter().any(|c| c == DIAGNOSTIC) {
        detail.push(field(DIAGNOSTIC, "nominal"));
    }
    for name in data.focus.iter().chain(data.detail.iter()) {
        if !shown.contains(name) {
            detail.push(field(name, "nominal"));
        }
    }
    if !detail.is_empty() {
        encoding.insert("detail".into(), Value::Array(detail));
    }

    let mut doc = Map::new();
    doc.insert("$schema".into(), json!(SCHEMA));
    if let Some(title) = &spec.title {
        doc.insert("title".into(), json!(title));
    }
    doc.insert("data".into(), json!({ "values": values(data) }));
    doc.insert("mark".into(), mark(spec.geom));
    doc.insert("encoding".into(), Value::Object(encoding));
    if spec.facet_row.is_some() || spec.facet_col.is_some() {
        doc.insert(
            "resolve".into(),
            json!({ "scale": { "y": "independent" } }),
        );
    }
    Value::Object(doc)
}

/// Render and write a pretty-printed Vega-Lite document.
pub fn write_vega_lite(path: impl AsRef<Path>, data: &PlotData, spec: &PlotSpec) -> TgResult<()> {
    let path = path.as_ref();
    let doc = render_vega_lite(data, spec);
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &doc)?;
    writer.flush()?;
    info!(
        "Wrote plot with {} series to {}",
        data.series.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::prepare;
    use tg_types::{ArgValue, Combination, DiagnosticTable, Diagnostics};

    fn sample_table() -> DiagnosticTable {
        let mut table = DiagnosticTable::new(vec!["k".into(), "weights".into()]);
        let mut index = 0;
        for weights in ["uniform", "distance"] {
            for k in [1i64, 3] {
                table.push_row(
                    index,
                    Combination::from_pairs(vec![
                        ("k", ArgValue::Int(k)),
                        ("weights", ArgValue::from(weights)),
                    ]),
                    &Diagnostics::new().with("rmse", k as f64).with("mae", 0.5 * k as f64),
                );
                index += 1;
            }
        }
        table
    }

    #[test]
    fn default_layout_facets_rows_by_diagnostic() {
        let spec = PlotSpec::new("k");
        let data = prepare(&sample_table(), &spec).unwrap();
        let doc = render_vega_lite(&data, &spec);

        assert_eq!(doc["$schema"], SCHEMA);
        assert_eq!(doc["mark"]["type"], "line");
        assert_eq!(doc["encoding"]["x"]["field"], "k");
        assert_eq!(doc["encoding"]["x"]["type"], "quantitative");
        assert_eq!(doc["encoding"]["row"]["field"], DIAGNOSTIC);
        assert_eq!(doc["resolve"]["scale"]["y"], "independent");
        assert!(doc["encoding"].get("detail").is_none());

        let values = doc["data"]["values"].as_array().unwrap();
        // 2 diagnostics x 2 values of k after averaging out weights
        assert_eq!(values.len(), 4);
        assert_eq!(values[0]["diagnostic"], "rmse");
        assert_eq!(values[0]["k"], 1);
        assert_eq!(values[0]["value"], 1.0);
    }

    #[test]
    fn aesthetics_map_to_channels() {
        let spec = PlotSpec::new("weights")
            .with_color("k")
            .with_geom(Geom::LinePoint)
            .with_facet_row(None)
            .with_facet_col(Some(DIAGNOSTIC))
            .with_title("knn");
        let data = prepare(&sample_table(), &spec).unwrap();
        let doc = render_vega_lite(&data, &spec);

        assert_eq!(doc["title"], "knn");
        assert_eq!(doc["mark"]["point"], true);
        assert_eq!(doc["encoding"]["x"]["type"], "ordinal");
        assert_eq!(doc["encoding"]["color"]["field"], "k");
        assert_eq!(doc["encoding"]["column"]["field"], DIAGNOSTIC);
        assert_eq!(doc["data"]["values"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn unshown_groupings_go_to_detail() {
        let spec = PlotSpec::new("k")
            .with_facet_row(None)
            .with_average_others(false);
        let data = prepare(&sample_table(), &spec).unwrap();
        let doc = render_vega_lite(&data, &spec);

        let detail: Vec<&str> = doc["encoding"]["detail"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert_eq!(detail, vec![DIAGNOSTIC, "weights"]);
        assert!(doc.get("resolve").is_none());
    }

    #[test]
    fn writes_pretty_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.vl.json");
        let spec = PlotSpec::new("k");
        let data = prepare(&sample_table(), &spec).unwrap();
        write_vega_lite(&path, &data, &spec).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["encoding"]["y"]["field"], VALUE);
        assert!(text.contains('\n'));
    }
}
