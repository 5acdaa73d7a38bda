//! ffmpeg transcoding stages.
//!
//! Every stage is described as an [`AttemptPlan`]: an ordered list of
//! argument vectors tried until one exits 0. Single-shot stages have one
//! attempt; concat and burn-in carry a fallback.
//!
//! # Stages
//!
//! | Stage | Output | Fallback |
//! |---|---|---|
//! | normalize | `norm_NNN.mp4` | none |
//! | concat | `merged.mp4` | re-encode with the profile |
//! | embed subtitles | `subbed.mp4` | none |
//! | burn subtitles | `burned.mp4` | `subtitles=subs.srt` run from the workspace |
//! | mix audio | `mixed.mp4` | none (strategy chosen by audio probe) |
//! | extract audio | `audio.wav` | none |

mod error;
mod journal;
mod plan;
mod profile;
mod stages;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::TranscodeError;
pub use journal::{StageJournal, StageRun};
pub use plan::{run_plan, Attempt, AttemptPlan, PlanSuccess, Preparation};
pub use profile::EncodingProfile;
pub use stages::{
    burn_plan, clamp_volume, concat_manifest, concat_plan, embed_plan, escape_filter_path,
    extract_audio_plan, mix_plan, normalize_plan, normalized_name, write_concat_manifest,
    MixStrategy, Transcoder, BURNED_NAME, CONCAT_LIST_NAME, EXTRACTED_AUDIO_NAME, FALLBACK_SUBS_NAME,
    MERGED_NAME, MIXED_NAME, SUBBED_NAME,
};

/// A transcoding stage, as named in logs and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalize,
    Concat,
    BurnSubtitles,
    EmbedSubtitles,
    ExtractAudio,
    MixAudio,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Concat => "concat",
            Stage::BurnSubtitles => "burn_subtitles",
            Stage::EmbedSubtitles => "embed_subtitles",
            Stage::ExtractAudio => "extract_audio",
            Stage::MixAudio => "mix_audio",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
