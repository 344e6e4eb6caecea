//! Grid runner: evaluates a prediction function and a diagnostic function for
//! every combination of an [`ArgumentGrid`] and collects a [`DiagnosticTable`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use tg_types::{Combination, DiagnosticTable, Diagnostics, EvaluationError, TgResult};

use crate::grid::ArgumentGrid;
use crate::trial::{RunId, RunStatus, Trial};

/// Trains a model on `train` with the given arguments and predicts for `test`.
pub trait Predictor<Tr, Te> {
    type Output;
    type Error: fmt::Display;

    fn predict(&self, train: &Tr, test: &Te, args: &Combination) -> Result<Self::Output, Self::Error>;
}

impl<Tr, Te, P, E, F> Predictor<Tr, Te> for F
where
    F: Fn(&Tr, &Te, &Combination) -> Result<P, E>,
    E: fmt::Display,
{
    type Output = P;
    type Error = E;

    fn predict(&self, train: &Tr, test: &Te, args: &Combination) -> Result<P, E> {
        self(train, test, args)
    }
}

/// Summarizes a prediction against the held-out data as named diagnostics.
pub trait Diagnoser<P, Te> {
    type Error: fmt::Display;

    fn diagnose(&self, prediction: &P, test: &Te) -> Result<Diagnostics, Self::Error>;

    /// Diagnostic names known before any combination is evaluated. They become
    /// the leading table columns even when every combination fails.
    fn diagnostic_names(&self) -> Vec<String> {
        Vec::new()
    }
}

impl<P, Te, E, F> Diagnoser<P, Te> for F
where
    F: Fn(&P, &Te) -> Result<Diagnostics, E>,
    E: fmt::Display,
{
    type Error = E;

    fn diagnose(&self, prediction: &P, test: &Te) -> Result<Diagnostics, E> {
        self(prediction, test)
    }
}

/// Grid runner behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Abort the run on the first failing combination instead of recording a
    /// missing row.
    pub fail_fast: bool,
    /// Keep every prediction in the returned [`GridRun`].
    pub keep_predictions: bool,
    /// Evaluate combinations on the rayon thread pool (used by `run_auto`).
    pub parallel: bool,
}

/// Output of a grid run.
#[derive(Debug, Clone)]
pub struct GridRun<P> {
    pub status: RunStatus,
    pub table: DiagnosticTable,
    pub trials: Vec<Trial>,
    /// Indexed by grid position; empty unless `keep_predictions` is set.
    pub predictions: Vec<Option<P>>,
}

impl<P> GridRun<P> {
    pub fn id(&self) -> RunId {
        self.status.id
    }

    pub fn prediction(&self, index: usize) -> Option<&P> {
        self.predictions.get(index).and_then(Option::as_ref)
    }

    pub fn failed_trials(&self) -> impl Iterator<Item = &Trial> {
        self.trials.iter().filter(|t| t.error.is_some())
    }
}

struct Evaluated<P> {
    trial: Trial,
    prediction: Option<P>,
    failure: Option<EvaluationError>,
}

#[derive(Debug, Clone, Default)]
pub struct GridRunner {
    config: RunnerConfig,
}

impl GridRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Evaluate every combination sequentially, in grid order.
    pub fn run<Tr, Te, Pr, Dg>(
        &self,
        grid: &ArgumentGrid,
        train: &Tr,
        test: &Te,
        predictor: &Pr,
        diagnoser: &Dg,
    ) -> TgResult<GridRun<Pr::Output>>
    where
        Pr: Predictor<Tr, Te>,
        Dg: Diagnoser<Pr::Output, Te>,
    {
        grid.validate()?;
        let mut collector = Collector::start(grid, &self.config, diagnoser.diagnostic_names());

        for (index, combination) in grid.combinations().enumerate() {
            let evaluated = evaluate_one(index, combination, train, test, predictor, diagnoser);
            collector.absorb(evaluated)?;
        }

        Ok(collector.finish())
    }

    /// Evaluate combinations in parallel. The table keeps grid order; with
    /// `fail_fast` the earliest failing combination is reported.
    pub fn run_parallel<Tr, Te, Pr, Dg>(
        &self,
        grid: &ArgumentGrid,
        train: &Tr,
        test: &Te,
        predictor: &Pr,
        diagnoser: &Dg,
    ) -> TgResult<GridRun<Pr::Output>>
    where
        Tr: Sync,
        Te: Sync,
        Pr: Predictor<Tr, Te> + Sync,
        Pr::Output: Send,
        Dg: Diagnoser<Pr::Output, Te> + Sync,
    {
        grid.validate()?;
        let mut collector = Collector::start(grid, &self.config, diagnoser.diagnostic_names());

        let evaluated: Vec<Evaluated<Pr::Output>> = grid
            .to_vec()
            .into_par_iter()
            .enumerate()
            .map(|(index, combination)| {
                evaluate_one(index, combination, train, test, predictor, diagnoser)
            })
            .collect();

        for item in evaluated {
            collector.absorb(item)?;
        }

        Ok(collector.finish())
    }

    /// Dispatch to [`run_parallel`](Self::run_parallel) or [`run`](Self::run)
    /// according to `config.parallel`.
    pub fn run_auto<Tr, Te, Pr, Dg>(
        &self,
        grid: &ArgumentGrid,
        train: &Tr,
        test: &Te,
        predictor: &Pr,
        diagnoser: &Dg,
    ) -> TgResult<GridRun<Pr::Output>>
    where
        Tr: Sync,
        Te: Sync,
        Pr: Predictor<Tr, Te> + Sync,
        Pr::Output: Send,
        Dg: Diagnoser<Pr::Output, Te> + Sync,
    {
        if self.config.parallel {
            self.run_parallel(grid, train, test, predictor, diagnoser)
        } else {
            self.run(grid, train, test, predictor, diagnoser)
        }
    }
}

fn evaluate_one<Tr, Te, Pr, Dg>(
    index: usize,
    combination: Combination,
    train: &Tr,
    test: &Te,
    predictor: &Pr,
    diagnoser: &Dg,
) -> Evaluated<Pr::Output>
where
    Pr: Predictor<Tr, Te>,
    Dg: Diagnoser<Pr::Output, Te>,
{
    debug!("Evaluating combination #{}: {}", index, combination);
    let mut trial = Trial::new(index, combination);
    trial.mark_running();

    let prediction = match predictor.predict(train, test, &trial.combination) {
        Ok(prediction) => prediction,
        Err(e) => {
            let failure = EvaluationError::PredictionFailed {
                index,
                combination: trial.combination.to_string(),
                message: e.to_string(),
            };
            trial.mark_failed(e.to_string());
            return Evaluated {
                trial,
                prediction: None,
                failure: Some(failure),
            };
        }
    };

    match diagnoser.diagnose(&prediction, test) {
        Ok(diagnostics) => {
            trial.mark_completed(diagnostics);
            Evaluated {
                trial,
                prediction: Some(prediction),
                failure: None,
            }
        }
        Err(e) => {
            let failure = EvaluationError::DiagnosticFailed {
                index,
                combination: trial.combination.to_string(),
                message: e.to_string(),
            };
            trial.mark_failed(e.to_string());
            Evaluated {
                trial,
                prediction: Some(prediction),
                failure: Some(failure),
            }
        }
    }
}

/// Accumulates evaluated combinations into the run output.
struct Collector<P> {
    status: RunStatus,
    table: DiagnosticTable,
    trials: Vec<Trial>,
    predictions: Vec<Option<P>>,
    fail_fast: bool,
    keep_predictions: bool,
}

impl<P> Collector<P> {
    fn start(grid: &ArgumentGrid, config: &RunnerConfig, diagnostic_names: Vec<String>) -> Self {
        let mut status = RunStatus::new(grid.size());
        status.mark_running();
        info!(
            "Starting grid run {} over {} combinations of {} arguments",
            status.id,
            status.grid_size,
            grid.arguments.len()
        );

        Self {
            status,
            table: DiagnosticTable::with_diagnostics(grid.names(), diagnostic_names),
            trials: Vec::with_capacity(grid.size()),
            predictions: Vec::new(),
            fail_fast: config.fail_fast,
            keep_predictions: config.keep_predictions,
        }
    }

    fn absorb(&mut self, evaluated: Evaluated<P>) -> TgResult<()> {
        let Evaluated {
            trial,
            prediction,
            failure,
        } = evaluated;
        self.status.record(&trial);

        match (&trial.diagnostics, failure) {
            (_, Some(failure)) => {
                if self.fail_fast {
                    self.status.mark_failed(failure.to_string());
                    warn!("Aborting grid run {}: {}", self.status.id, failure);
                    return Err(failure.into());
                }
                warn!("{}", failure);
                self.table.push_missing(trial.number, trial.combination.clone());
            }
            (Some(diagnostics), None) => {
                self.table
                    .push_row(trial.number, trial.combination.clone(), diagnostics);
            }
            (None, None) => {
                self.table.push_missing(trial.number, trial.combination.clone());
            }
        }

        if self.keep_predictions {
            self.predictions.push(prediction);
        }
        self.trials.push(trial);
        Ok(())
    }

    fn finish(mut self) -> GridRun<P> {
        self.status.mark_completed();
        info!(
            "Grid run {} completed: {} succeeded, {} failed",
            self.status.id, self.status.trials_completed, self.status.trials_failed
        );
        GridRun {
            status: self.status,
            table: self.table,
            trials: self.trials,
            predictions: self.predictions,
        }
    }
}
