//! Sequencing of steps over one workspace.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{PipelineError, PipelineResult, StepError};
use super::step::PipelineStep;
use super::types::{Context, RunState, StepOutcome};
use crate::transcode::StageRun;

/// Ordered steps sharing one cancellation flag.
///
/// Steps run strictly one after another: each consumes the working video
/// the previous one left in [`RunState`]. The first error aborts the run.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Observe `handle` instead of a private flag, so one handle can stop
    /// every pipeline of a batch.
    pub fn with_cancel_handle(mut self, handle: &CancelHandle) -> Self {
        self.cancelled = Arc::clone(&handle.flag);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order.
    ///
    /// Cancellation is checked between steps; a step already running is
    /// never interrupted. Stages a step ran are attached to its report,
    /// and a failing transcode stage is carried on the returned error.
    pub fn run(&self, ctx: &Context, state: &mut RunState) -> PipelineResult<PipelineRunResult> {
        let total = self.steps.len();
        let mut result = PipelineRunResult::default();

        for (i, step) in self.steps.iter().enumerate() {
            let name = step.name();
            if self.is_cancelled() {
                ctx.logger
                    .warn(&format!("Cancelled before {} ({}/{})", name, i + 1, total));
                return Err(PipelineError::cancelled(&ctx.run_name));
            }

            ctx.logger.phase(name);
            ctx.report_progress(i + 1, total, name);

            let report = run_step(step.as_ref(), ctx, state).map_err(|e| fail(ctx, name, e))?;
            result.steps.push(report);
        }

        ctx.logger.success(&result.summary());
        Ok(result)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn run_step(
    step: &dyn PipelineStep,
    ctx: &Context,
    state: &mut RunState,
) -> Result<StepReport, StepError> {
    step.validate_input(ctx)?;
    let outcome = step.execute(ctx, state);
    let stages = ctx.take_stage_runs();
    let outcome = outcome?;

    let mut report = StepReport {
        name: step.name().to_string(),
        status: StepStatus::Completed,
        stages,
        artifact: None,
    };

    match outcome {
        StepOutcome::Success => {
            if let Some(path) = step.artifact(ctx, state) {
                if !path.is_file() {
                    return Err(StepError::invalid_output(format!(
                        "{} not created",
                        path.display()
                    )));
                }
                ctx.logger.debug(&format!("{} -> {}", report.name, path.display()));
                report.artifact = Some(path);
            }
            for run in report.stages.iter().filter(|r| r.fallback) {
                ctx.logger
                    .info(&format!("{} used fallback '{}'", run.stage, run.attempt));
            }
            ctx.logger.success(&format!("{} completed", report.name));
        }
        StepOutcome::Skipped(reason) => {
            ctx.logger
                .info(&format!("{} skipped: {}", report.name, reason));
            report.status = StepStatus::Skipped(reason);
        }
    }

    Ok(report)
}

fn fail(ctx: &Context, step_name: &str, error: StepError) -> PipelineError {
    let error = PipelineError::step_failed(&ctx.run_name, step_name, error);
    match error.stage() {
        Some(stage) => ctx.logger.error(&format!("{} failed in stage {}", step_name, stage)),
        None => ctx.logger.error(&format!("{} failed", step_name)),
    }
    error
}

/// Stops a pipeline at its next step boundary.
#[derive(Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Completed,
    Skipped(String),
}

/// What one step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    /// Transcoding stages the step ran, in completion order.
    pub stages: Vec<StageRun>,
    /// File the step left for the rest of the run.
    pub artifact: Option<PathBuf>,
}

impl StepReport {
    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

/// Per-step reports of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRunResult {
    pub steps: Vec<StepReport>,
}

impl PipelineRunResult {
    pub fn steps_completed(&self) -> Vec<&str> {
        self.names(true)
    }

    pub fn steps_skipped(&self) -> Vec<&str> {
        self.names(false)
    }

    /// Stages whose first attempt failed, across all steps.
    pub fn fallbacks(&self) -> Vec<&StageRun> {
        self.steps
            .iter()
            .flat_map(|s| &s.stages)
            .filter(|r| r.fallback)
            .collect()
    }

    fn names(&self, completed: bool) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.is_completed() == completed)
            .map(|s| s.name.as_str())
            .collect()
    }

    fn summary(&self) -> String {
        let stages: usize = self.steps.iter().map(|s| s.stages.len()).sum();
        format!(
            "Run finished: {} step(s) completed, {} skipped, {} transcode stage(s), {} fallback(s)",
            self.steps_completed().len(),
            self.steps_skipped().len(),
            stages,
            self.fallbacks().len()
        )
    }
}
