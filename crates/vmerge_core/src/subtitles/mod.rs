//! Subtitle timelines: SRT parsing, writing, shifting and merging.
//!
//! # Components
//!
//! - **types**: [`SubtitleCue`] and [`SubtitleTimeline`]
//! - **parsers**: SRT parser and lenient UTF-8 decoding
//! - **writers**: SRT writer
//! - **merge**: per-clip merge with cumulative probed offsets
//!
//! # Usage
//!
//! ```no_run
//! use vmerge_core::subtitles::{parse_file, write_file};
//!
//! let timeline = parse_file("Caption/intro.srt").unwrap();
//! write_file(&timeline.shift(12.5), "merged.srt").unwrap();
//! ```

mod error;
mod merge;
pub mod parsers;
mod types;
pub mod writers;

use std::fs;
use std::path::Path;

pub use error::{ParseError, SubtitleError};
pub use merge::{merge_for_clips, CaptionLookup, MergedSubtitles};
pub use parsers::{decode_lossy, parse_srt, parse_srt_time};
pub use types::{SubtitleCue, SubtitleTimeline};
pub use writers::{format_srt_time, write_srt};

/// Content accepted by [`write_file`]: a timeline to serialize, or text
/// that is already in SRT form.
#[derive(Debug, Clone, Copy)]
pub enum SrtContent<'a> {
    Timeline(&'a SubtitleTimeline),
    Raw(&'a str),
}

impl<'a> From<&'a SubtitleTimeline> for SrtContent<'a> {
    fn from(timeline: &'a SubtitleTimeline) -> Self {
        SrtContent::Timeline(timeline)
    }
}

impl<'a> From<&'a str> for SrtContent<'a> {
    fn from(text: &'a str) -> Self {
        SrtContent::Raw(text)
    }
}

impl<'a> From<&'a String> for SrtContent<'a> {
    fn from(text: &'a String) -> Self {
        SrtContent::Raw(text.as_str())
    }
}

/// Parse an SRT file from disk.
///
/// Invalid UTF-8 sequences are dropped rather than rejected.
pub fn parse_file(path: impl AsRef<Path>) -> Result<SubtitleTimeline, SubtitleError> {
    let path = path.as_ref();

    let bytes = fs::read(path).map_err(|e| SubtitleError::read(path, e))?;
    let content = decode_lossy(&bytes);

    let mut timeline = parse_srt(&content).map_err(|e| SubtitleError::parse(path, e))?;
    timeline.source_path = Some(path.to_path_buf());

    Ok(timeline)
}

/// Write a timeline or raw SRT text to a file.
pub fn write_file<'a>(
    content: impl Into<SrtContent<'a>>,
    path: impl AsRef<Path>,
) -> Result<(), SubtitleError> {
    let path = path.as_ref();

    let text = match content.into() {
        SrtContent::Timeline(timeline) => write_srt(timeline),
        SrtContent::Raw(text) => text.to_string(),
    };

    fs::write(path, text).map_err(|e| SubtitleError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_parse_keeps_cue_text_and_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.srt");

        let timeline = SubtitleTimeline::from_cues(vec![
            SubtitleCue::new(1, 0.0, 1500.0, "First"),
            SubtitleCue::new(2, 2000.0, 3500.0, "Second\nwith two lines"),
            SubtitleCue::new(3, 61_000.0, 62_250.0, "<i>Third</i>"),
        ]);
        write_file(&timeline, &path).unwrap();

        let reparsed = parse_file(&path).unwrap();
        assert_eq!(reparsed.len(), timeline.len());
        for (a, b) in timeline.iter().zip(reparsed.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.index, b.index);
            assert!((a.start_ms - b.start_ms).abs() < 1.0);
            assert!((a.end_ms - b.end_ms).abs() < 1.0);
        }
        assert_eq!(reparsed.source_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn raw_text_is_written_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.srt");
        let text = "1\n00:00:00,000 --> 00:00:02,000\nGenerated\n\n";

        write_file(text, &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn undecodable_bytes_do_not_fail_parsing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.srt");
        fs::write(&path, b"1\n00:00:00,000 --> 00:00:01,000\nCaf\xe9\n").unwrap();

        let timeline = parse_file(&path).unwrap();
        assert_eq!(timeline.cues[0].text, "Caf");
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = parse_file("/nonexistent/vmerge/none.srt").unwrap_err();
        assert!(matches!(err, SubtitleError::ReadError { .. }));
    }
}
