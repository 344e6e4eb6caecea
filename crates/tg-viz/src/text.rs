use std::fmt::Write;

use crate::prepare::PlotData;

/// Plain-text listing of every series, one `x -> y` line per point.
pub fn render_text(data: &PlotData) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} series over {}{}",
        data.series.len(),
        data.x,
        if data.averaged { " (averaged)" } else { "" }
    );
    for series in &data.series {
        let _ = writeln!(out, "{}", series.label());
        for point in &series.points {
            let _ = writeln!(out, "  {} = {:<10} -> {:.6}", data.x, point.x.to_string(), point.y);
        }
    }
    out
}
