//! SRT subtitle parser.
//!
//! # Format Overview
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! Hello, world!
//!
//! 2
//! 00:00:05,000 --> 00:00:08,000
//! This is a test.
//! ```
//!
//! Each entry has:
//! - Index number (kept when it parses, otherwise assigned sequentially)
//! - Timing line: `HH:MM:SS,mmm --> HH:MM:SS,mmm`
//! - One or more lines of text
//! - Blank line separator

use crate::subtitles::error::ParseError;
use crate::subtitles::types::{SubtitleCue, SubtitleTimeline};

/// Parse SRT content into a timeline.
///
/// Blocks without a timing line or without text are skipped. A timing line
/// that does not parse is an error.
pub fn parse_srt(content: &str) -> Result<SubtitleTimeline, ParseError> {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut timeline = SubtitleTimeline::new();

    for block in blocks(&content) {
        let Some(timing_idx) = block.iter().position(|(_, line)| line.contains("-->")) else {
            tracing::debug!("Skipping SRT block at line {} without timing", block[0].0);
            continue;
        };
        let (line_no, timing_line) = block[timing_idx];

        let (start_ms, mut end_ms) = parse_srt_timing(timing_line, line_no)?;
        if end_ms < start_ms {
            tracing::debug!("Cue at line {} ends before it starts; clamping", line_no);
            end_ms = start_ms;
        }

        let text = block[timing_idx + 1..]
            .iter()
            .map(|(_, line)| *line)
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            continue;
        }

        let index = timing_idx
            .checked_sub(1)
            .and_then(|i| block[i].1.trim().parse::<usize>().ok())
            .unwrap_or(timeline.len() + 1);

        timeline.push(SubtitleCue::new(index, start_ms, end_ms, text));
    }

    Ok(timeline)
}

/// Group non-blank lines into blocks, keeping 1-based line numbers.
fn blocks(content: &str) -> Vec<Vec<(usize, &str)>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push((i + 1, line));
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Parse `HH:MM:SS,mmm --> HH:MM:SS,mmm` into (start_ms, end_ms).
///
/// Anything after the end timestamp (position hints) is ignored.
fn parse_srt_timing(line: &str, line_no: usize) -> Result<(f64, f64), ParseError> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| ParseError::invalid_timing(line_no, line))?;

    let end = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::invalid_timing(line_no, line))?;

    let start_ms =
        parse_srt_time(start).ok_or_else(|| ParseError::invalid_time(line_no, start.trim()))?;
    let end_ms = parse_srt_time(end).ok_or_else(|| ParseError::invalid_time(line_no, end))?;

    Ok((start_ms, end_ms))
}

/// Parse an SRT timestamp: `HH:MM:SS,mmm` or `HH:MM:SS.mmm`.
///
/// Returns time in milliseconds. Fractions of 1 to 9 digits are accepted.
pub fn parse_srt_time(s: &str) -> Option<f64> {
    let s = s.trim();
    let (clock, fraction) = match s.find([',', '.']) {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };

    let mut parts = clock.split(':');
    let hours = parse_digits(parts.next()?)?;
    let minutes = parse_digits(parts.next()?)?;
    let seconds = parse_digits(parts.next()?)?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }

    let millis = match fraction {
        Some(frac) if !frac.is_empty() && frac.len() <= 9 => {
            let value = parse_digits(frac)? as f64;
            value * 10f64.powi(3 - frac.len() as i32)
        }
        Some(_) => return None,
        None => 0.0,
    };

    let whole_ms = hours
        .checked_mul(3_600_000)?
        .checked_add(minutes * 60_000 + seconds * 1000)?;
    Some(whole_ms as f64 + millis)
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
