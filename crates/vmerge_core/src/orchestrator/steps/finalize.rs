//! Finalize step - copies the last working video to the output path.

use std::fs;
use std::path::{Path, PathBuf};

use super::resolve_subtitles::MERGED_SUBS_NAME;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, FinalizeOutput, RunState, StepOutcome};
use crate::transcode::MERGED_NAME;

/// Delivers the result. With `keep_temp`, the plain concatenation and the
/// merged subtitles are copied next to it as well.
pub struct FinalizeStep;

impl FinalizeStep {
    pub fn new() -> Self {
        Self
    }

    fn copy(from: &Path, to: &Path) -> StepResult<()> {
        if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| StepError::io_error("creating output directory", e))?;
        }
        fs::copy(from, to).map_err(|e| {
            StepError::io_error(
                format!("copying {} to {}", from.display(), to.display()),
                e,
            )
        })?;
        Ok(())
    }

    /// Intermediates worth keeping: the bare concatenation and the SRT.
    fn retain_intermediates(ctx: &Context, state: &RunState) -> StepResult<Vec<PathBuf>> {
        let mut retained = Vec::new();
        let output = same_path_key(&ctx.options.output);

        if let Some(concat) = &state.concat {
            let dest = ctx.options.output_dir.join(MERGED_NAME);
            if same_path_key(&dest) == output {
                ctx.logger.warn(&format!(
                    "Not copying the concatenation over the output {}",
                    dest.display()
                ));
            } else {
                Self::copy(&concat.merged.path, &dest)?;
                retained.push(dest);
            }
        }

        if let Some(subs) = &state.subtitles {
            let dest = ctx.options.output_dir.join(MERGED_SUBS_NAME);
            Self::copy(&subs.path, &dest)?;
            retained.push(dest);
        }

        Ok(retained)
    }
}

fn same_path_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl Default for FinalizeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for FinalizeStep {
    fn name(&self) -> &str {
        "Finalize"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.options.output.as_os_str().is_empty() {
            return Err(StepError::invalid_input("No output path"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let video = state
            .working_video()
            .ok_or_else(|| StepError::invalid_input("No video produced"))?;

        Self::copy(video, &ctx.options.output)?;
        ctx.logger
            .info(&format!("Output: {}", ctx.options.output.display()));

        let retained = if ctx.options.keep_temp {
            let retained = Self::retain_intermediates(ctx, state)?;
            for path in &retained {
                ctx.logger.info(&format!("Kept {}", path.display()));
            }
            retained
        } else {
            Vec::new()
        };

        state.finalize = Some(FinalizeOutput {
            output_path: ctx.options.output.clone(),
            retained,
        });
        Ok(StepOutcome::Success)
    }

    fn artifact(&self, ctx: &Context, _state: &RunState) -> Option<PathBuf> {
        Some(ctx.options.output.clone())
    }
}
