//! Mix step - lays the background track under the video.

use std::path::PathBuf;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, MixOutput, RunState, StepOutcome};
use crate::transcode::{clamp_volume, MIXED_NAME};

pub struct MixStep;

impl MixStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MixStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MixStep {
    fn name(&self) -> &str {
        "Mix"
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let Some(bgm) = &state.bgm else {
            return Ok(StepOutcome::Skipped("no background music".to_string()));
        };
        let video = state
            .working_video()
            .ok_or_else(|| StepError::invalid_input("No video to mix into"))?;

        let volume = ctx.options.bgm_volume;
        if clamp_volume(volume) != volume {
            ctx.logger.warn(&format!(
                "BGM volume {} out of range; using {}",
                volume,
                clamp_volume(volume)
            ));
        }

        let (file, strategy) =
            ctx.transcoder()
                .mix_audio(video, bgm, volume, &ctx.work_path(MIXED_NAME))?;

        state.advance(file.clone());
        state.mix = Some(MixOutput {
            file,
            strategy,
            volume: clamp_volume(volume),
        });
        Ok(StepOutcome::Success)
    }

    fn artifact(&self, _ctx: &Context, state: &RunState) -> Option<PathBuf> {
        state.mix.as_ref().map(|m| m.file.path.clone())
    }
}
