//! ResolveSubtitles step - builds `merged.srt` from per-clip files, the
//! combined file, or speech-to-text, in that order of preference.

use std::path::{Path, PathBuf};

use crate::captions::{CaptionRequest, CaptionServiceError, GeneratedCaptions};
use crate::models::SubtitleSource;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome, SubtitlesOutput};
use crate::subtitles::{self, merge_for_clips, parse_srt};
use crate::transcode::EXTRACTED_AUDIO_NAME;

/// Subtitle file written to the workspace and, when kept, the output dir.
pub const MERGED_SUBS_NAME: &str = "merged.srt";

pub struct ResolveSubtitlesStep;

impl ResolveSubtitlesStep {
    pub fn new() -> Self {
        Self
    }

    /// Extract the merged video's audio and transcribe it.
    ///
    /// `None` when the generator produced nothing.
    fn generate(
        &self,
        ctx: &Context,
        state: &RunState,
        target: &Path,
    ) -> StepResult<Option<SubtitlesOutput>> {
        let captioner = ctx.captioner.as_ref().ok_or_else(|| {
            CaptionServiceError::unavailable(
                "caption generation requested but no generator is configured",
            )
        })?;
        let video = state
            .working_video()
            .ok_or_else(|| StepError::invalid_input("No merged video to transcribe"))?;

        ctx.logger.section("Generating captions");
        let audio = ctx.transcoder().extract_audio(
            video,
            ctx.options.sample_rate,
            &ctx.work_path(EXTRACTED_AUDIO_NAME),
        )?;

        let request = CaptionRequest {
            audio_path: audio.path,
            language: ctx.options.language.clone(),
            sample_rate: ctx.options.sample_rate,
        };
        ctx.logger.info(&format!(
            "Transcribing with {} ({})",
            captioner.name(),
            request.language
        ));
        let captions = captioner.generate(&request)?;

        if captions.is_empty() {
            return Ok(None);
        }

        let cue_count = match &captions {
            GeneratedCaptions::Srt(text) => {
                subtitles::write_file(text, target)?;
                parse_srt(text).map(|t| t.len()).unwrap_or(0)
            }
            GeneratedCaptions::Cues(timeline) => {
                subtitles::write_file(timeline, target)?;
                timeline.len()
            }
        };

        Ok(Some(SubtitlesOutput {
            path: target.to_path_buf(),
            source: SubtitleSource::Generated {
                generator: captioner.name().to_string(),
            },
            cue_count,
            offsets: Vec::new(),
        }))
    }
}

impl Default for ResolveSubtitlesStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ResolveSubtitlesStep {
    fn name(&self) -> &str {
        "ResolveSubtitles"
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let target = ctx.work_path(MERGED_SUBS_NAME);
        let lookup = ctx.caption_lookup();

        let resolved = match merge_for_clips(&state.clips, &lookup, &ctx.probe()) {
            Some(merged) => {
                for (clip, offset) in state.clips.iter().zip(&merged.offsets) {
                    ctx.logger
                        .debug(&format!("{} starts at {:.3}s", clip.stem, offset));
                }
                subtitles::write_file(&merged.timeline, &target)?;
                Some(SubtitlesOutput {
                    path: target,
                    source: merged.source,
                    cue_count: merged.timeline.len(),
                    offsets: merged.offsets,
                })
            }
            None if ctx.options.generate_captions => {
                ctx.logger.info(&format!(
                    "No subtitle files in {}; generating captions",
                    lookup.dir().display()
                ));
                match self.generate(ctx, state, &target)? {
                    Some(output) => Some(output),
                    None => {
                        ctx.logger.warn(
                            "Caption generator returned no cues; continuing without subtitles",
                        );
                        return Ok(StepOutcome::Skipped("no captions generated".to_string()));
                    }
                }
            }
            None => None,
        };

        let Some(output) = resolved else {
            return Ok(StepOutcome::Skipped(format!(
                "no subtitle files in {}",
                lookup.dir().display()
            )));
        };

        ctx.logger.info(&format!(
            "Subtitles: {} cue(s) from {}",
            output.cue_count, output.source
        ));
        state.subtitles = Some(output);
        Ok(StepOutcome::Success)
    }

    fn artifact(&self, _ctx: &Context, state: &RunState) -> Option<PathBuf> {
        state.subtitles.as_ref().map(|s| s.path.clone())
    }
}
