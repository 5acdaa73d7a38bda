//! Cue timing for transcripts that arrive without timestamps.

use serde::{Deserialize, Serialize};

use crate::subtitles::{SubtitleCue, SubtitleTimeline};

/// Bounds for synthesized cue durations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueWindow {
    pub min_secs: f64,
    pub max_secs: f64,
    /// Reading speed used to size a cue from its text length.
    pub chars_per_sec: f64,
}

impl Default for CueWindow {
    fn default() -> Self {
        Self {
            min_secs: 2.0,
            max_secs: 6.0,
            chars_per_sec: 12.0,
        }
    }
}

impl CueWindow {
    /// Display time for `text`. The minimum wins if the bounds cross.
    pub fn duration_for(&self, text: &str) -> f64 {
        let natural = text.chars().count() as f64 / self.chars_per_sec;
        natural.min(self.max_secs).max(self.min_secs)
    }
}

/// Lay transcripts end to end starting at zero.
///
/// Blank transcripts are skipped and do not consume an index.
pub fn synthesize_cues<I, S>(transcripts: I, window: CueWindow) -> SubtitleTimeline
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut timeline = SubtitleTimeline::new();
    let mut t = 0.0;

    for transcript in transcripts {
        let text = transcript.as_ref().trim();
        if text.is_empty() {
            continue;
        }
        let end = t + window.duration_for(text);
        timeline.push(SubtitleCue::from_secs(timeline.len() + 1, t, end, text));
        t = end;
    }

    timeline
}
