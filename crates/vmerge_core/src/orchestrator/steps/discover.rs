//! Discover step - finds the clips to concatenate.

use crate::discovery::find_files_sorted;
use crate::models::ClipReference;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Lists clips in the video directory in case-insensitive name order.
pub struct DiscoverStep;

impl DiscoverStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DiscoverStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for DiscoverStep {
    fn name(&self) -> &str {
        "Discover"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.options.exts.is_empty() {
            return Err(StepError::invalid_input("No clip extensions configured"));
        }
        std::fs::create_dir_all(&ctx.options.output_dir)
            .map_err(|e| StepError::io_error("creating output directory", e))
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let files = find_files_sorted(&ctx.options.video_dir, &ctx.options.exts);
        if files.is_empty() {
            return Err(StepError::no_inputs(&ctx.options.video_dir, &ctx.options.exts));
        }

        ctx.logger.info(&format!(
            "Found {} clip(s) in {}",
            files.len(),
            ctx.options.video_dir.display()
        ));
        for (i, file) in files.iter().enumerate() {
            ctx.logger.info(&format!("  [{}] {}", i + 1, file.display()));
        }

        state.clips = files.into_iter().map(ClipReference::new).collect();
        Ok(StepOutcome::Success)
    }
}
