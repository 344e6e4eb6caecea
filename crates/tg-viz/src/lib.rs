//! # tg-viz
//!
//! Plots of a diagnostics table: the table is reshaped into long form, the
//! arguments a plot does not focus on are optionally averaged out, and the
//! resulting series are rendered as a Vega-Lite document or a text listing.

mod prepare;
mod spec;
mod text;
mod vega;

pub use prepare::{prepare, PlotData, PlotPoint, Series};
pub use spec::{Geom, PlotSpec, DIAGNOSTIC, VALUE};
pub use text::render_text;
pub use vega::{render_vega_lite, write_vega_lite};
