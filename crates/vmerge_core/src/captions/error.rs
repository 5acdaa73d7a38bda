//! Caption service errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure at the caption-generation boundary.
///
/// Kept apart from transcode errors so a run report can say the speech
/// service failed rather than ffmpeg.
#[derive(Error, Debug)]
pub enum CaptionServiceError {
    #[error("Caption service credentials missing: set the {var} environment variable")]
    MissingCredentials { var: String },

    #[error("Cannot read extracted audio {}: {source}", .path.display())]
    AudioUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Caption service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Caption service returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Caption service unavailable: {0}")]
    Unavailable(String),
}

impl CaptionServiceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
