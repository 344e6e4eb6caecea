use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use tg_grid::{Criterion, Diagnoser, OptimalSelector};
use tg_types::{config_error, Diagnostics, TgError, TgResult};

use crate::metrics::DiagnosticCalculator;

/// Test data that exposes the observed outcomes predictions are scored against.
pub trait Observed {
    fn observed(&self) -> &[f64];
}

impl Observed for Vec<f64> {
    fn observed(&self) -> &[f64] {
        self
    }
}

/// A built-in diagnostic statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mse,
    Rmse,
    Mae,
    Bias,
    RSquared,
    Correlation,
    Mape,
    Accuracy,
    MisclassificationRate,
    BrierScore,
    LogLoss,
}

impl Statistic {
    pub const ALL: [Statistic; 11] = [
        Statistic::Mse,
        Statistic::Rmse,
        Statistic::Mae,
        Statistic::Bias,
        Statistic::RSquared,
        Statistic::Correlation,
        Statistic::Mape,
        Statistic::Accuracy,
        Statistic::MisclassificationRate,
        Statistic::BrierScore,
        Statistic::LogLoss,
    ];

    /// Column name used in the diagnostics table.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mse => "mse",
            Self::Rmse => "rmse",
            Self::Mae => "mae",
            Self::Bias => "bias",
            Self::RSquared => "r_squared",
            Self::Correlation => "correlation",
            Self::Mape => "mape",
            Self::Accuracy => "accuracy",
            Self::MisclassificationRate => "misclassification_rate",
            Self::BrierScore => "brier_score",
            Self::LogLoss => "log_loss",
        }
    }

    pub fn compute(&self, predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        match self {
            Self::Mse => DiagnosticCalculator::mse(predicted, observed),
            Self::Rmse => DiagnosticCalculator::rmse(predicted, observed),
            Self::Mae => DiagnosticCalculator::mae(predicted, observed),
            Self::Bias => DiagnosticCalculator::bias(predicted, observed),
            Self::RSquared => DiagnosticCalculator::r_squared(predicted, observed),
            Self::Correlation => DiagnosticCalculator::correlation(predicted, observed),
            Self::Mape => DiagnosticCalculator::mape(predicted, observed),
            Self::Accuracy => DiagnosticCalculator::accuracy(predicted, observed),
            Self::MisclassificationRate => {
                DiagnosticCalculator::misclassification_rate(predicted, observed)
            }
            Self::BrierScore => DiagnosticCalculator::brier_score(predicted, observed),
            Self::LogLoss => DiagnosticCalculator::log_loss(predicted, observed),
        }
    }

    /// The natural optimality criterion for this statistic.
    pub fn preferred_criterion(&self) -> Criterion {
        match self {
            Self::RSquared | Self::Correlation | Self::Accuracy => Criterion::Maximize,
            Self::Bias => Criterion::Closest(0.0),
            _ => Criterion::Minimize,
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = TgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        match wanted.as_str() {
            "r2" => return Ok(Self::RSquared),
            "cor" => return Ok(Self::Correlation),
            _ => {}
        }
        Self::ALL
            .iter()
            .find(|stat| stat.name() == wanted)
            .copied()
            .ok_or_else(|| config_error!("unknown diagnostic statistic '{}'", s))
    }
}

/// An ordered selection of statistics computed together for every combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSet {
    pub statistics: Vec<Statistic>,
}

impl DiagnosticSet {
    pub fn new(statistics: Vec<Statistic>) -> Self {
        Self { statistics }
    }

    /// RMSE, MAE, bias and R².
    pub fn regression() -> Self {
        Self::new(vec![
            Statistic::Rmse,
            Statistic::Mae,
            Statistic::Bias,
            Statistic::RSquared,
        ])
    }

    /// Misclassification rate, Brier score and log loss on 0/1 outcomes.
    pub fn classification() -> Self {
        Self::new(vec![
            Statistic::MisclassificationRate,
            Statistic::BrierScore,
            Statistic::LogLoss,
        ])
    }

    /// Parse statistic names, rejecting duplicates.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> TgResult<Self> {
        let mut statistics = Vec::with_capacity(names.len());
        for name in names {
            let stat: Statistic = name.as_ref().parse()?;
            if statistics.contains(&stat) {
                return Err(config_error!("diagnostic '{}' listed twice", stat));
            }
            statistics.push(stat);
        }
        Ok(Self::new(statistics))
    }

    pub fn evaluate(&self, predicted: &[f64], observed: &[f64]) -> TgResult<Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        for stat in &self.statistics {
            let value = stat.compute(predicted, observed)?;
            trace!("{} = {}", stat, value);
            diagnostics.insert(stat.name(), value);
        }
        Ok(diagnostics)
    }

    /// Selector using each statistic's preferred criterion.
    pub fn selector(&self) -> OptimalSelector {
        self.statistics
            .iter()
            .fold(OptimalSelector::default(), |selector, stat| {
                selector.with_criterion(stat.name(), stat.preferred_criterion())
            })
    }
}

impl Default for DiagnosticSet {
    fn default() -> Self {
        Self::regression()
    }
}

impl<Te: Observed> Diagnoser<Vec<f64>, Te> for DiagnosticSet {
    type Error = TgError;

    fn diagnose(&self, prediction: &Vec<f64>, test: &Te) -> Result<Diagnostics, TgError> {
        self.evaluate(prediction, test.observed())
    }

    fn diagnostic_names(&self) -> Vec<String> {
        self.statistics.iter().map(|s| s.name().to_string()).collect()
    }
}
