//! ApplySubtitles step - burns subtitles into the picture or muxes them
//! as a soft track.

use std::path::PathBuf;

use crate::models::SubtitleMode;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{AppliedSubtitles, Context, RunState, StepOutcome};
use crate::transcode::{BURNED_NAME, SUBBED_NAME};

pub struct ApplySubtitlesStep;

impl ApplySubtitlesStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ApplySubtitlesStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ApplySubtitlesStep {
    fn name(&self) -> &str {
        "ApplySubtitles"
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let Some(subs) = &state.subtitles else {
            return Ok(StepOutcome::Skipped("no subtitles resolved".to_string()));
        };
        let video = state
            .working_video()
            .ok_or_else(|| StepError::invalid_input("No video to add subtitles to"))?;

        let transcoder = ctx.transcoder();
        let (mode, file) = if ctx.options.burn_in {
            ctx.logger.info("Burning subtitles into the picture");
            let file = transcoder.burn_subtitles(
                video,
                &subs.path,
                &ctx.work_dir,
                &ctx.work_path(BURNED_NAME),
            )?;
            (SubtitleMode::Burned, file)
        } else {
            ctx.logger.info("Adding subtitles as a soft track");
            let file =
                transcoder.embed_soft_subtitles(video, &subs.path, &ctx.work_path(SUBBED_NAME))?;
            (SubtitleMode::Soft, file)
        };

        state.advance(file.clone());
        state.applied = Some(AppliedSubtitles { mode, file });
        Ok(StepOutcome::Success)
    }

    fn artifact(&self, _ctx: &Context, state: &RunState) -> Option<PathBuf> {
        state.applied.as_ref().map(|a| a.file.path.clone())
    }
}
