//! The unit of work the pipeline sequences.

use std::path::PathBuf;

use super::errors::StepResult;
use super::types::{Context, RunState, StepOutcome};

/// One stage of a run.
///
/// `execute` reads the clips and the current working video from
/// [`RunState`] and records what it produced there. A step that has
/// nothing to do returns [`StepOutcome::Skipped`]; that is not a failure
/// and later steps still run.
///
/// After a successful `execute`, the pipeline checks that the file named
/// by [`artifact`](PipelineStep::artifact) exists before moving on.
///
/// ```ignore
/// struct Reverse;
///
/// impl PipelineStep for Reverse {
///     fn name(&self) -> &str { "Reverse" }
///
///     fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
///         let video = state.working_video().ok_or_else(|| StepError::invalid_input("no video"))?;
///         let out = ctx.work_path("reversed.mp4");
///         // ... run ffmpeg ...
///         state.advance(MediaFile::new(out, Stage::Normalize));
///         Ok(StepOutcome::Success)
///     }
///
///     fn artifact(&self, _ctx: &Context, state: &RunState) -> Option<PathBuf> {
///         state.working_video().map(Path::to_path_buf)
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    fn name(&self) -> &str;

    /// Preconditions on the options and workspace, checked before any
    /// step of the run has touched them.
    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome>;

    /// File this step left for the rest of the run.
    ///
    /// `None` means the step produces nothing on disk.
    fn artifact(&self, _ctx: &Context, _state: &RunState) -> Option<PathBuf> {
        None
    }
}
