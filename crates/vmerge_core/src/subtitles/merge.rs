//! Merging per-clip subtitle files onto the concatenated timeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::parse_file;
use super::types::SubtitleTimeline;
use crate::media::MediaProbe;
use crate::models::{ClipReference, SubtitleSource};

/// Locates subtitle files in the caption directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionLookup {
    dir: PathBuf,
    /// Extension without the leading dot.
    extension: String,
    /// File covering the whole directory when no per-clip file matches.
    combined_name: String,
}

impl CaptionLookup {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: "srt".to_string(),
            combined_name: "combined.srt".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.extension = extension.as_ref().trim_start_matches('.').to_string();
        self
    }

    pub fn with_combined_name(mut self, name: impl Into<String>) -> Self {
        self.combined_name = name.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<stem>.<ext>` if it exists.
    pub fn per_clip(&self, stem: &str) -> Option<PathBuf> {
        let path = self.dir.join(format!("{}.{}", stem, self.extension));
        path.is_file().then_some(path)
    }

    /// The combined file if it exists.
    pub fn combined(&self) -> Option<PathBuf> {
        let path = self.dir.join(&self.combined_name);
        path.is_file().then_some(path)
    }
}

/// A resolved timeline plus the bookkeeping that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSubtitles {
    pub timeline: SubtitleTimeline,
    pub source: SubtitleSource,
    /// Offset in seconds applied to each clip, in clip order.
    /// Empty when the combined file was used.
    pub offsets: Vec<f64>,
}

/// Merge per-clip subtitle files into one timeline.
///
/// Clip *i* is shifted by the sum of the probed durations of clips
/// `0..i`, whether or not those clips had subtitles. A file that fails to
/// parse is skipped with a warning. If no per-clip cues are found, the
/// combined file is used unshifted. Returns `None` when neither exists.
pub fn merge_for_clips(
    clips: &[ClipReference],
    lookup: &CaptionLookup,
    probe: &MediaProbe<'_>,
) -> Option<MergedSubtitles> {
    let matches: Vec<Option<PathBuf>> = clips.iter().map(|c| lookup.per_clip(&c.stem)).collect();

    if matches.iter().any(Option::is_some) {
        let mut merged = SubtitleTimeline::new();
        let mut offsets = Vec::with_capacity(clips.len());
        let mut matched_clips = 0;
        let mut cumulative = 0.0;

        for (clip, srt) in clips.iter().zip(&matches) {
            offsets.push(cumulative);

            if let Some(path) = srt {
                match parse_file(path) {
                    Ok(timeline) => {
                        tracing::debug!(
                            "{}: {} cue(s) shifted by {:.3}s",
                            path.display(),
                            timeline.len(),
                            cumulative
                        );
                        merged.append(timeline.shift(cumulative));
                        matched_clips += 1;
                    }
                    Err(e) => tracing::warn!("Ignoring subtitles for {}: {}", clip.stem, e),
                }
            }

            cumulative += clip.duration(probe);
        }

        if !merged.is_empty() {
            merged.renumber();
            return Some(MergedSubtitles {
                timeline: merged,
                source: SubtitleSource::PerClip { matched_clips },
                offsets,
            });
        }
    }

    let path = lookup.combined()?;
    match parse_file(&path) {
        Ok(timeline) if !timeline.is_empty() => Some(MergedSubtitles {
            timeline,
            source: SubtitleSource::Combined { path },
            offsets: Vec::new(),
        }),
        Ok(_) => {
            tracing::warn!("Combined subtitle file {} has no cues", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Ignoring combined subtitle file: {}", e);
            None
        }
    }
}
