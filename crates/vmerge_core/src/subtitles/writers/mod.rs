//! Subtitle writers.

mod srt;

pub use srt::{format_srt_time, write_srt};
