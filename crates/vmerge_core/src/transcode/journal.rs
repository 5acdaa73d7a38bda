//! Record of which attempt produced each stage's output.

use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::plan::PlanSuccess;
use super::Stage;

/// One stage that produced its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRun {
    pub stage: Stage,
    /// Label of the attempt that succeeded.
    pub attempt: String,
    /// True when an earlier attempt of the plan failed first.
    pub fallback: bool,
    pub output: PathBuf,
}

impl StageRun {
    pub fn from_success(success: &PlanSuccess) -> Self {
        Self {
            stage: success.file.stage,
            attempt: success.label.to_string(),
            fallback: success.used_fallback(),
            output: success.file.path.clone(),
        }
    }
}

/// Shared sink for [`StageRun`]s.
///
/// Parallel normalize tasks record into the same journal, so entries are
/// in completion order rather than clip order.
#[derive(Debug, Default)]
pub struct StageJournal {
    runs: Mutex<Vec<StageRun>>,
}

impl StageJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, run: StageRun) {
        self.runs.lock().push(run);
    }

    /// Take everything recorded since the last call.
    pub fn drain(&self) -> Vec<StageRun> {
        std::mem::take(&mut *self.runs.lock())
    }
}
