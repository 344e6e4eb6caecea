use std::fs;
use std::path::Path;

use tg_cli::report::write_optimal_csv;
use tg_cli::{run_pipeline, ModelKind, RunConfig};
use tg_types::ArgValue;

/// y = x1 + 2 * x2 on a 6 x 6 lattice.
fn write_csv(path: &Path) {
    let mut csv = String::from("x1,x2,y\n");
    for i in 0..6 {
        for j in 0..6 {
            let (x1, x2) = (i as f64, j as f64 / 2.0);
            csv.push_str(&format!("{x1},{x2},{}\n", x1 + 2.0 * x2));
        }
    }
    fs::write(path, csv).unwrap();
}

fn write_config(dir: &Path, body: &str) -> RunConfig {
    write_csv(&dir.join("lattice.csv"));
    let path = dir.join("run.json");
    fs::write(&path, body).unwrap();
    RunConfig::load(&path).unwrap()
}

#[test]
fn knn_grid_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{
            "data": { "path": "lattice.csv", "test_fraction": 0.3, "seed": 42 },
            "target": "y",
            "model": "knn",
            "arguments": { "k": [1, 4, 16], "weights": ["uniform", "distance"] },
            "diagnostics": ["rmse", "mae", "r2"],
            "runner": { "parallel": true },
            "plot": { "color": "weights", "geom": "line_point" }
        }"#,
    );
    assert_eq!(config.model, ModelKind::Knn);

    let report = run_pipeline(&config).unwrap();
    let table = &report.run.table;
    assert_eq!(table.len(), 6);
    assert_eq!(table.argument_names(), ["k", "weights"]);
    assert_eq!(table.diagnostic_names(), ["rmse", "mae", "r_squared"]);
    assert_eq!(report.run.status.trials_completed, 6);

    // Grid order: k varies fastest.
    let ks: Vec<i64> = table
        .rows()
        .iter()
        .map(|r| r.combination.get_i64("k").unwrap())
        .collect();
    assert_eq!(ks, vec![1, 4, 16, 1, 4, 16]);

    // The widest neighbourhood never wins on this smooth surface.
    let rmse = &report.choices[0];
    assert_eq!(rmse.diagnostic, "rmse");
    assert_ne!(
        rmse.combination.as_ref().unwrap().get("k"),
        Some(&ArgValue::Int(16))
    );
    let r2 = &report.choices[2];
    assert_eq!(r2.grid_index, rmse.grid_index);

    let (data, spec) = report.plot.as_ref().unwrap();
    assert_eq!(spec.x, "k");
    // 3 diagnostics x 2 weightings, 3 points each
    assert_eq!(data.series.len(), 6);
    assert_eq!(data.point_count(), 18);

    let mut csv = Vec::new();
    table.write_csv(&mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("k,weights,rmse,mae,r_squared"));
    assert!(lines.next().unwrap().starts_with("1,uniform,"));
    assert_eq!(csv.lines().count(), 7);
}

#[test]
fn ridge_with_separate_test_file_and_optimal_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(&dir.path().join("test.csv"));
    let config = write_config(
        dir.path(),
        r#"{
            "data": { "train": "lattice.csv", "test": "test.csv" },
            "target": "y",
            "model": "ridge",
            "arguments": { "lambda": [0.0, 1.0, 50.0], "intercept": [true, false] },
            "criteria": { "bias": "min" }
        }"#,
    );

    let report = run_pipeline(&config).unwrap();
    assert_eq!(report.run.table.len(), 6);
    assert!(report.plot.is_none());

    let rmse = report.choices.iter().find(|c| c.diagnostic == "rmse").unwrap();
    assert!(rmse.value.unwrap() < 1e-9);
    assert_eq!(
        rmse.combination.as_ref().unwrap().get("lambda"),
        Some(&ArgValue::Float(0.0))
    );

    let path = dir.path().join("optimal.csv");
    write_optimal_csv(&report.optimal, fs::File::create(&path).unwrap()).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, "optimal_for,lambda,intercept,rmse,mae,bias,r_squared");
    assert_eq!(text.lines().count(), 5);
}

#[test]
fn bad_configs_fail_before_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{
            "data": { "path": "lattice.csv" },
            "target": "y",
            "model": "ridge",
            "arguments": { "k": [1, 2] }
        }"#,
    );
    assert!(run_pipeline(&config).is_err());

    let config = write_config(
        dir.path(),
        r#"{
            "data": { "path": "lattice.csv" },
            "target": "missing",
            "model": "knn",
            "arguments": { "k": [1, 2] }
        }"#,
    );
    assert!(run_pipeline(&config).is_err());
}
