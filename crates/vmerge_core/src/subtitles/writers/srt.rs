//! SRT subtitle writer.
//!
//! Internal float milliseconds are rounded to the nearest millisecond when
//! written. Each cue is emitted as `index\nstart --> end\ntext\n\n`.

use crate::subtitles::types::SubtitleTimeline;

/// Write a timeline to an SRT string.
pub fn write_srt(timeline: &SubtitleTimeline) -> String {
    let mut output = String::new();

    for cue in timeline {
        output.push_str(&format!("{}\n", cue.index));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(cue.start_ms),
            format_srt_time(cue.end_ms)
        ));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output
}

/// Format milliseconds as an SRT timestamp (HH:MM:SS,mmm).
///
/// Negative values are written as zero.
pub fn format_srt_time(ms: f64) -> String {
    let ms = ms.round().max(0.0) as u64;

    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}
