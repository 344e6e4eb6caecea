use tracing::{info, warn};

use tg_grid::{GridRun, GridRunner, OptimalChoice, OptimalTable};
use tg_types::{Combination, TgResult};
use tg_viz::{prepare, PlotData, PlotSpec};

use crate::config::RunConfig;
use crate::data::Dataset;

/// Everything a `tunegrid run` produces.
#[derive(Debug, Clone)]
pub struct Report {
    pub run: GridRun<Vec<f64>>,
    pub choices: Vec<OptimalChoice>,
    pub optimal: OptimalTable,
    pub plot: Option<(PlotData, PlotSpec)>,
}

/// Load data, evaluate the model over the grid and pick optimal combinations.
pub fn run_pipeline(config: &RunConfig) -> TgResult<Report> {
    let grid = config.grid()?;
    let diagnostics = config.diagnostic_set()?;
    let selector = config.selector(&diagnostics)?;
    let (train, test) = config.load_data()?;

    info!(
        "Evaluating {} over {} combinations ({} train / {} test rows)",
        config.model,
        grid.size(),
        train.len(),
        test.len()
    );

    let model = config.model;
    let predictor =
        |train: &Dataset, test: &Dataset, args: &Combination| model.predict(train, test, args);
    let run = GridRunner::new(config.runner.clone()).run_auto(
        &grid,
        &train,
        &test,
        &predictor,
        &diagnostics,
    )?;

    let failed = run.status.trials_failed;
    if failed > 0 {
        warn!("{} of {} combinations failed", failed, run.table.len());
    }

    let choices = selector.select(&run.table)?;
    let optimal = selector.optimal_table(&run.table)?;

    let plot = match config.plot_spec() {
        Some(spec) => Some((prepare(&run.table, &spec)?, spec)),
        None => None,
    };

    Ok(Report {
        run,
        choices,
        optimal,
        plot,
    })
}
