//! NormalizeConcat step - re-encodes every clip to one profile and joins
//! them with the concat demuxer.

use std::path::PathBuf;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{ConcatOutput, Context, RunState, StepOutcome};
use crate::transcode::{write_concat_manifest, CONCAT_LIST_NAME, MERGED_NAME};

pub struct NormalizeConcatStep;

impl NormalizeConcatStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NormalizeConcatStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for NormalizeConcatStep {
    fn name(&self) -> &str {
        "NormalizeConcat"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if !ctx.work_dir.is_dir() {
            return Err(StepError::invalid_input(format!(
                "Workspace {} does not exist",
                ctx.work_dir.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        if state.clips.is_empty() {
            return Err(StepError::invalid_input("No clips to concatenate"));
        }

        let transcoder = ctx.transcoder();
        let inputs: Vec<PathBuf> = state.clips.iter().map(|c| c.path.clone()).collect();

        ctx.logger.section("Normalizing clips");
        let normalized = transcoder.normalize_all(
            &inputs,
            &ctx.work_dir,
            ctx.settings.pipeline.normalize_jobs,
        )?;

        let manifest = ctx.work_path(CONCAT_LIST_NAME);
        write_concat_manifest(&normalized, &manifest)
            .map_err(|e| StepError::io_error("writing concat list", e))?;

        ctx.logger.section("Concatenating");
        let merged = transcoder.concat(&manifest, &ctx.work_path(MERGED_NAME))?;
        ctx.logger.info(&format!("Merged video: {}", merged.path.display()));

        state.advance(merged.clone());
        state.concat = Some(ConcatOutput { normalized, merged });
        Ok(StepOutcome::Success)
    }

    fn artifact(&self, _ctx: &Context, state: &RunState) -> Option<PathBuf> {
        state.concat.as_ref().map(|c| c.merged.path.clone())
    }
}
