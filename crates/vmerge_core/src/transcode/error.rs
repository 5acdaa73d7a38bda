//! Transcode failure report.

use thiserror::Error;

use super::Stage;

/// A stage that failed after exhausting its attempts.
///
/// `command` and `output` belong to the last attempt. `output` is the
/// tool's stdout and stderr exactly as captured.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "{stage} failed after {attempts} attempt(s) ({}): {command}",
    exit_label(.exit_code)
)]
pub struct TranscodeError {
    pub stage: Stage,
    pub attempts: usize,
    pub command: String,
    /// `None` when the tool never ran to completion (missing binary,
    /// timeout, failed preparation).
    pub exit_code: Option<i32>,
    pub output: String,
}

fn exit_label(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {}", code),
        None => "did not complete".to_string(),
    }
}
