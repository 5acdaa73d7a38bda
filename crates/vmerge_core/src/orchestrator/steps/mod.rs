//! Pipeline step implementations.
//!
//! Each step handles one phase of a run. Steps that find nothing to do
//! return `Skipped` and leave the working video untouched.

mod apply_subtitles;
mod concat;
mod discover;
mod finalize;
mod mix;
mod resolve_bgm;
mod resolve_subtitles;

pub use apply_subtitles::ApplySubtitlesStep;
pub use concat::NormalizeConcatStep;
pub use discover::DiscoverStep;
pub use finalize::FinalizeStep;
pub use mix::MixStep;
pub use resolve_bgm::ResolveBgmStep;
pub use resolve_subtitles::{ResolveSubtitlesStep, MERGED_SUBS_NAME};
