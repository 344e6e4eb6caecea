//! Per-combination trial tracking and run status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tg_types::{Combination, Diagnostics};

/// Unique grid run identifier.
pub type RunId = Uuid;

/// Lifecycle state for a grid run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Aggregate status of a grid run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub id: RunId,
    pub state: RunState,
    pub grid_size: usize,
    pub trials_completed: usize,
    pub trials_failed: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl RunStatus {
    pub fn new(grid_size: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RunState::Pending,
            grid_size,
            trials_completed: 0,
            trials_failed: 0,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = RunState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = RunState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = RunState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Count a finished trial.
    pub fn record(&mut self, trial: &Trial) {
        match trial.status {
            TrialStatus::Completed => self.trials_completed += 1,
            TrialStatus::Failed => self.trials_failed += 1,
            TrialStatus::Pending | TrialStatus::Running => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Individual trial
// ---------------------------------------------------------------------------

/// A single trial: one combination evaluated through prediction and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Position of the combination in the grid.
    pub number: usize,
    pub combination: Combination,
    pub status: TrialStatus,
    pub diagnostics: Option<Diagnostics>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

impl Trial {
    pub fn new(number: usize, combination: Combination) -> Self {
        Self {
            number,
            combination,
            status: TrialStatus::Pending,
            diagnostics: None,
            error: None,
            started_at: None,
            finished_at: None,
            duration_ms: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = TrialStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self, diagnostics: Diagnostics) {
        self.status = TrialStatus::Completed;
        self.finish();
        self.diagnostics = Some(diagnostics);
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = TrialStatus::Failed;
        self.finish();
        self.error = Some(error);
    }

    fn finish(&mut self) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.duration_ms = self
            .started_at
            .map(|start| (now - start).num_milliseconds().max(0) as u64);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_types::ArgValue;

    fn sample_combination() -> Combination {
        Combination::from_pairs(vec![("k", ArgValue::Int(10))])
    }

    #[test]
    fn run_status_lifecycle() {
        let mut status = RunStatus::new(4);

        assert_eq!(status.state, RunState::Pending);
        assert!(status.started_at.is_none());

        status.mark_running();
        assert_eq!(status.state, RunState::Running);
        assert!(status.started_at.is_some());

        status.mark_completed();
        assert_eq!(status.state, RunState::Completed);
        assert!(status.finished_at.is_some());
    }

    #[test]
    fn run_status_counts_trials() {
        let mut status = RunStatus::new(2);

        let mut ok = Trial::new(0, sample_combination());
        ok.mark_running();
        ok.mark_completed(Diagnostics::new().with("rmse", 1.0));
        status.record(&ok);

        let mut bad = Trial::new(1, sample_combination());
        bad.mark_running();
        bad.mark_failed("singular matrix".into());
        status.record(&bad);

        assert_eq!(status.trials_completed, 1);
        assert_eq!(status.trials_failed, 1);
    }

    #[test]
    fn trial_lifecycle() {
        let mut trial = Trial::new(1, sample_combination());
        assert_eq!(trial.status, TrialStatus::Pending);

        trial.mark_running();
        assert_eq!(trial.status, TrialStatus::Running);

        trial.mark_completed(Diagnostics::new().with("rmse", 1.8));
        assert_eq!(trial.status, TrialStatus::Completed);
        assert!(trial.finished_at.is_some());
        assert!(trial.duration_ms.is_some());
        assert_eq!(trial.diagnostics.as_ref().unwrap().get("rmse"), Some(1.8));
    }

    #[test]
    fn trial_failure() {
        let mut trial = Trial::new(0, Combination::new());
        trial.mark_running();
        trial.mark_failed("model panicked".into());
        assert_eq!(trial.status, TrialStatus::Failed);
        assert_eq!(trial.error.as_deref(), Some("model panicked"));
    }
}
