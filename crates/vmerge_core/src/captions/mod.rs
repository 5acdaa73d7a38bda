//! Caption generation from speech.
//!
//! When a run finds no subtitle files and generation was requested, the
//! concatenated video's audio is extracted and handed to a
//! [`CaptionGenerator`]. The generator returns either finished SRT text or
//! a cue list.

mod error;
mod google;
mod synth;

use std::path::PathBuf;

pub use error::CaptionServiceError;
pub use google::{parse_recognize_response, GoogleSpeechGenerator, SPEECH_API_URL};
pub use synth::{synthesize_cues, CueWindow};

use crate::subtitles::SubtitleTimeline;

/// Input for one transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionRequest {
    /// Mono PCM WAV.
    pub audio_path: PathBuf,
    /// BCP-47 language code, e.g. `en-US`.
    pub language: String,
    pub sample_rate: u32,
}

/// What a generator hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedCaptions {
    /// Already formatted SRT text, written as-is.
    Srt(String),
    Cues(SubtitleTimeline),
}

impl GeneratedCaptions {
    /// True when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        match self {
            GeneratedCaptions::Srt(text) => text.trim().is_empty(),
            GeneratedCaptions::Cues(timeline) => timeline.is_empty(),
        }
    }
}

/// A speech-to-text backend.
pub trait CaptionGenerator: Send + Sync {
    /// Short name recorded in the run state.
    fn name(&self) -> &str;

    fn generate(&self, request: &CaptionRequest) -> Result<GeneratedCaptions, CaptionServiceError>;
}
