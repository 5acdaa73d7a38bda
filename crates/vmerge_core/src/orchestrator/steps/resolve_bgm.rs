//! ResolveBgm step - picks the background track.

use std::path::PathBuf;

use crate::discovery::pick_bgm_file;
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Uses the explicit `bgm_file` when it exists, otherwise the first
/// audio file in the BGM directory.
pub struct ResolveBgmStep;

impl ResolveBgmStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResolveBgmStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ResolveBgmStep {
    fn name(&self) -> &str {
        "ResolveBgm"
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let explicit = ctx.options.bgm_file.as_ref().filter(|path| {
            let exists = path.is_file();
            if !exists {
                ctx.logger.warn(&format!(
                    "BGM file {} not found; searching {}",
                    path.display(),
                    ctx.options.bgm_dir.display()
                ));
            }
            exists
        });

        let bgm = match explicit {
            Some(path) => Some(path.clone()),
            None => pick_bgm_file(&ctx.options.bgm_dir, &ctx.settings.inputs.bgm_exts),
        };

        match bgm {
            Some(path) => {
                ctx.logger.info(&format!("Background music: {}", path.display()));
                state.bgm = Some(path);
                Ok(StepOutcome::Success)
            }
            None => Ok(StepOutcome::Skipped("no background music found".to_string())),
        }
    }

    fn artifact(&self, _ctx: &Context, state: &RunState) -> Option<PathBuf> {
        state.bgm.clone()
    }
}
