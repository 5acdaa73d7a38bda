//! Pipeline orchestrator for coordinating a run.
//!
//! A run is a fixed sequence of steps that record their results in a
//! shared `RunState`. Each transforming step consumes the current working
//! video and produces a new one in the workspace; the transcoding stages
//! it ran, and which fallback attempts they needed, land in its
//! `StepReport`.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Discover
//!     ├── Step: NormalizeConcat
//!     ├── Step: ResolveSubtitles
//!     ├── Step: ApplySubtitles
//!     ├── Step: ResolveBgm
//!     ├── Step: Mix
//!     └── Step: Finalize
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vmerge_core::orchestrator::{create_standard_pipeline, Context, RunState};
//!
//! let pipeline = create_standard_pipeline();
//! let ctx = Context::new("merged", options, settings, work_dir, logger, engine);
//! let mut state = RunState::new("merged");
//!
//! let result = pipeline.run(&ctx, &mut state)?;
//! println!("Completed: {:?}", result.steps_completed());
//! ```

mod errors;
mod pipeline;
mod runner;
mod step;
pub mod steps;
mod types;
mod workspace;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult, StepReport, StepStatus};
pub use runner::{RunReport, Runner};
pub use step::PipelineStep;
pub use steps::{
    ApplySubtitlesStep, DiscoverStep, FinalizeStep, MixStep, NormalizeConcatStep, ResolveBgmStep,
    ResolveSubtitlesStep, MERGED_SUBS_NAME,
};
pub use types::{
    AppliedSubtitles, ConcatOutput, Context, FinalizeOutput, MixOutput, ProgressCallback,
    RunOptions, RunState, StepOutcome, SubtitlesOutput,
};
pub use workspace::Workspace;

/// Create a standard pipeline with all steps in the correct order.
///
/// 1. Discover - find clips in the video directory
/// 2. NormalizeConcat - re-encode clips to one profile and join them
/// 3. ResolveSubtitles - merge per-clip SRTs, fall back to the combined
///    file, or generate captions
/// 4. ApplySubtitles - burn in or embed (skipped without subtitles)
/// 5. ResolveBgm - pick the background track
/// 6. Mix - lay the track under the video (skipped without one)
/// 7. Finalize - copy the result to the output path
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(DiscoverStep::new())
        .with_step(NormalizeConcatStep::new())
        .with_step(ResolveSubtitlesStep::new())
        .with_step(ApplySubtitlesStep::new())
        .with_step(ResolveBgmStep::new())
        .with_step(MixStep::new())
        .with_step(FinalizeStep::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_pipeline_order() {
        let pipeline = create_standard_pipeline();
        assert_eq!(
            pipeline.step_names(),
            vec![
                "Discover",
                "NormalizeConcat",
                "ResolveSubtitles",
                "ApplySubtitles",
                "ResolveBgm",
                "Mix",
                "Finalize"
            ]
        );
    }
}
