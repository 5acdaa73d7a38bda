//! Working artifacts and resolution outcomes recorded in the run state.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::transcode::Stage;

/// An encoded file produced by a stage.
///
/// Stages consume files and produce new ones; a `MediaFile` is never
/// rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    /// Stage that produced this file.
    pub stage: Stage,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>, stage: Stage) -> Self {
        Self {
            path: path.into(),
            stage,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Where the resolved subtitle timeline came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubtitleSource {
    /// Per-clip files merged with cumulative offsets.
    PerClip { matched_clips: usize },
    /// A single file covering the whole directory, used unshifted.
    Combined { path: PathBuf },
    /// Produced by a caption generator.
    Generated { generator: String },
}

impl fmt::Display for SubtitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubtitleSource::PerClip { matched_clips } => {
                write!(f, "per-clip files ({} matched)", matched_clips)
            }
            SubtitleSource::Combined { path } => write!(f, "combined file {}", path.display()),
            SubtitleSource::Generated { generator } => write!(f, "generated by {}", generator),
        }
    }
}

/// How subtitles were attached to the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleMode {
    /// Rendered into the picture.
    Burned,
    /// Added as a selectable track.
    Soft,
}
