//! Subtitle cue and timeline types.
//!
//! Times are stored as floating-point milliseconds. Conversion to integer
//! milliseconds happens only when writing SRT.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One timed caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// 1-based sequence number.
    pub index: usize,
    pub start_ms: f64,
    pub end_ms: f64,
    /// Caption text; multiple lines are joined with `\n`.
    pub text: String,
}

impl SubtitleCue {
    pub fn new(index: usize, start_ms: f64, end_ms: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Build a cue from times in seconds.
    pub fn from_secs(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self::new(index, start * 1000.0, end * 1000.0, text)
    }

    pub fn start_secs(&self) -> f64 {
        self.start_ms / 1000.0
    }

    pub fn end_secs(&self) -> f64 {
        self.end_ms / 1000.0
    }

    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }

    /// Same cue moved by `offset_ms`; the index is kept.
    pub fn shifted(&self, offset_ms: f64) -> Self {
        Self {
            index: self.index,
            start_ms: self.start_ms + offset_ms,
            end_ms: self.end_ms + offset_ms,
            text: self.text.clone(),
        }
    }
}

/// Ordered sequence of cues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTimeline {
    pub cues: Vec<SubtitleCue>,
    /// File this timeline was parsed from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

impl SubtitleTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cues(cues: Vec<SubtitleCue>) -> Self {
        Self {
            cues,
            source_path: None,
        }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubtitleCue> {
        self.cues.iter()
    }

    pub fn push(&mut self, cue: SubtitleCue) {
        self.cues.push(cue);
    }

    /// New timeline with every cue moved by `offset_secs`.
    ///
    /// Indices are preserved. No clamping happens here, so shifting by `x`
    /// and then `-x` restores the original times; negative times are
    /// clamped to zero only when written.
    pub fn shift(&self, offset_secs: f64) -> SubtitleTimeline {
        let offset_ms = offset_secs * 1000.0;
        SubtitleTimeline {
            cues: self.cues.iter().map(|c| c.shifted(offset_ms)).collect(),
            source_path: self.source_path.clone(),
        }
    }

    /// Move all cues of `other` onto the end of this timeline.
    pub fn append(&mut self, other: SubtitleTimeline) {
        self.cues.extend(other.cues);
    }

    /// Renumber cues 1..N in their current order.
    pub fn renumber(&mut self) {
        for (i, cue) in self.cues.iter_mut().enumerate() {
            cue.index = i + 1;
        }
    }

    /// Stable sort by start time.
    pub fn sort_by_time(&mut self) {
        self.cues.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));
    }

    /// Whether cues are in non-decreasing start order.
    pub fn is_ordered(&self) -> bool {
        self.cues.windows(2).all(|w| w[0].start_ms <= w[1].start_ms)
    }

    /// End of the last cue, in seconds.
    pub fn end_secs(&self) -> f64 {
        self.cues
            .iter()
            .map(|c| c.end_ms)
            .fold(0.0_f64, f64::max)
            / 1000.0
    }
}

impl<'a> IntoIterator for &'a SubtitleTimeline {
    type Item = &'a SubtitleCue;
    type IntoIter = std::slice::Iter<'a, SubtitleCue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SubtitleTimeline {
        SubtitleTimeline::from_cues(vec![
            SubtitleCue::from_secs(1, 0.0, 1.5, "Hello"),
            SubtitleCue::from_secs(2, 2.0, 3.25, "Two\nlines"),
        ])
    }

    #[test]
    fn shift_moves_times_and_keeps_indices() {
        let shifted = sample().shift(2.0);
        assert!((shifted.cues[0].start_ms - 2000.0).abs() < 1e-9);
        assert!((shifted.cues[1].end_ms - 5250.0).abs() < 1e-9);
        assert_eq!(shifted.cues[0].index, 1);
        assert_eq!(shifted.cues[1].index, 2);
    }

    #[test]
    fn shift_round_trip_restores_timings() {
        let original = sample();
        for offset in [0.0, 0.001, 2.0, 17.333_333, 3600.5, -1.25] {
            let back = original.shift(offset).shift(-offset);
            for (a, b) in original.iter().zip(back.iter()) {
                assert!((a.start_ms - b.start_ms).abs() < 1e-6, "offset {}", offset);
                assert!((a.end_ms - b.end_ms).abs() < 1e-6, "offset {}", offset);
            }
        }
    }

    #[test]
    fn renumber_makes_indices_contiguous() {
        let mut timeline = sample();
        timeline.append(sample().shift(4.0));
        timeline.renumber();
        let indices: Vec<usize> = timeline.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert!(timeline.is_ordered());
    }

    #[test]
    fn sort_by_time_is_stable() {
        let mut timeline = SubtitleTimeline::from_cues(vec![
            SubtitleCue::from_secs(1, 5.0, 6.0, "late"),
            SubtitleCue::from_secs(2, 1.0, 2.0, "first"),
            SubtitleCue::from_secs(3, 1.0, 3.0, "second"),
        ]);
        timeline.sort_by_time();
        let texts: Vec<&str> = timeline.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "late"]);
    }

    #[test]
    fn end_secs_is_last_cue_end() {
        assert!((sample().end_secs() - 3.25).abs() < 1e-9);
        assert_eq!(SubtitleTimeline::new().end_secs(), 0.0);
    }
}
