//! Diagnostic statistics computation.
//!
//! [`DiagnosticCalculator`] compares a vector of predictions with the observed
//! values of the held-out data. Every statistic checks that both sides have the
//! same non-zero length; degenerate inputs (zero variance, no usable
//! observations) produce `NaN`, which the diagnostics table stores as missing.

use tg_types::{EvaluationError, TgResult};

/// Probabilities are clamped to `[EPS, 1 - EPS]` before taking logs.
const LOG_LOSS_EPS: f64 = 1e-15;

/// Stateless calculator for diagnostic statistics.
pub struct DiagnosticCalculator;

impl DiagnosticCalculator {
    fn check(predicted: &[f64], observed: &[f64]) -> TgResult<()> {
        if predicted.len() != observed.len() {
            return Err(EvaluationError::LengthMismatch {
                predicted: predicted.len(),
                observed: observed.len(),
            }
            .into());
        }
        if observed.is_empty() {
            return Err(EvaluationError::EmptyInput {
                message: "no observations to compare against".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn mean(values: impl Iterator<Item = f64>) -> f64 {
        let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        if n == 0 {
            f64::NAN
        } else {
            sum / n as f64
        }
    }

    // --- regression ---

    /// Mean squared error.
    pub fn mse(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Self::check(predicted, observed)?;
        Ok(Self::mean(
            predicted.iter().zip(observed).map(|(p, o)| (p - o).powi(2)),
        ))
    }

    /// Root mean squared error.
    pub fn rmse(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Ok(Self::mse(predicted, observed)?.sqrt())
    }

    /// Mean absolute error.
    pub fn mae(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Self::check(predicted, observed)?;
        Ok(Self::mean(
            predicted.iter().zip(observed).map(|(p, o)| (p - o).abs()),
        ))
    }

    /// Mean of `predicted - observed`.
    pub fn bias(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Self::check(predicted, observed)?;
        Ok(Self::mean(predicted.iter().zip(observed).map(|(p, o)| p - o)))
    }

    /// Coefficient of determination, `1 - SS_res / SS_tot`.
    pub fn r_squared(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Self::check(predicted, observed)?;
        let mean = Self::mean(observed.iter().copied());
        let ss_tot: f64 = observed.iter().map(|o| (o - mean).powi(2)).sum();
        if ss_tot == 0.0 {
            return Ok(f64::NAN);
        }
        let ss_res: f64 = predicted
            .iter()
            .zip(observed)
            .map(|(p, o)| (o - p).powi(2))
            .sum();
        Ok(1.0 - ss_res / ss_tot)
    }

    /// Pearson correlation between predictions and observations.
    pub fn correlation(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Self::check(predicted, observed)?;
        let mp = Self::mean(predicted.iter().copied());
        let mo = Self::mean(observed.iter().copied());
        let (mut cov, mut vp, mut vo) = (0.0, 0.0, 0.0);
        for (p, o) in predicted.iter().zip(observed) {
            cov += (p - mp) * (o - mo);
            vp += (p - mp).powi(2);
            vo += (o - mo).powi(2);
        }
        if vp == 0.0 || vo == 0.0 {
            return Ok(f64::NAN);
        }
        Ok(cov / (vp.sqrt() * vo.sqrt()))
    }

    /// Mean absolute percentage error (in percent). Zero observations are skipped.
    pub fn mape(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Self::check(predicted, observed)?;
        Ok(100.0
            * Self::mean(
                predicted
                    .iter()
                    .zip(observed)
                    .filter(|(_, o)| **o != 0.0)
                    .map(|(p, o)| ((o - p) / o).abs()),
            ))
    }

    // --- classification ---

    /// Fraction of rows whose rounded prediction equals the rounded observation.
    ///
    /// Rounding turns probabilities into 0/1 labels at a 0.5 threshold and
    /// leaves integer class labels unchanged.
    pub fn accuracy(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Self::check(predicted, observed)?;
        Ok(Self::mean(predicted.iter().zip(observed).map(|(p, o)| {
            if p.round() == o.round() {
                1.0
            } else {
                0.0
            }
        })))
    }

    pub fn misclassification_rate(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Ok(1.0 - Self::accuracy(predicted, observed)?)
    }

    /// Mean squared difference between predicted probabilities and 0/1 outcomes.
    pub fn brier_score(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Self::mse(predicted, observed)
    }

    /// Binary cross-entropy of predicted probabilities against 0/1 outcomes.
    pub fn log_loss(predicted: &[f64], observed: &[f64]) -> TgResult<f64> {
        Self::check(predicted, observed)?;
        Ok(Self::mean(predicted.iter().zip(observed).map(|(p, o)| {
            let p = p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
            -(o * p.ln() + (1.0 - o) * (1.0 - p).ln())
        })))
    }
}
