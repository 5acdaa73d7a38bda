//! Data types shared across the pipeline.

mod clip;
mod media;

pub use clip::ClipReference;
pub use media::{MediaFile, SubtitleMode, SubtitleSource};
