//! Duration and audio-stream queries.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::engine::{path_arg, EngineError, MediaEngine};

/// A duration query that could not be answered.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("ffprobe failed on '{}' (exit code {exit_code:?}): {output}", .file.display())]
    ToolFailed {
        file: PathBuf,
        exit_code: Option<i32>,
        output: String,
    },
}

/// Queries media files through the engine's inspection tool.
#[derive(Clone, Copy)]
pub struct MediaProbe<'a> {
    engine: &'a dyn MediaEngine,
}

impl<'a> MediaProbe<'a> {
    pub fn new(engine: &'a dyn MediaEngine) -> Self {
        Self { engine }
    }

    /// Container duration in seconds.
    ///
    /// A non-zero exit is a `ProbeError`. Output that does not parse as a
    /// number (`N/A`, empty) resolves to 0.0.
    pub fn duration(&self, file: &Path) -> Result<f64, ProbeError> {
        let output = self.engine.probe(&duration_args(file))?;
        if !output.success() {
            return Err(ProbeError::ToolFailed {
                file: file.to_path_buf(),
                exit_code: output.exit_code,
                output: output.combined(),
            });
        }

        let secs = parse_duration(&output.stdout);
        if secs == 0.0 {
            tracing::debug!(
                "No usable duration for {} (got {:?}); using 0.0",
                file.display(),
                output.stdout.trim()
            );
        }
        Ok(secs)
    }

    /// Whether the file has at least one audio stream.
    ///
    /// Any failure to probe counts as "no audio".
    pub fn has_audio(&self, file: &Path) -> bool {
        match self.engine.probe(&audio_stream_args(file)) {
            Ok(output) if output.success() => !output.stdout.trim().is_empty(),
            Ok(output) => {
                tracing::debug!(
                    "Audio probe of {} exited with {:?}; treating as silent",
                    file.display(),
                    output.exit_code
                );
                false
            }
            Err(e) => {
                tracing::debug!("Audio probe of {} failed: {}", file.display(), e);
                false
            }
        }
    }
}

/// `ffprobe` arguments printing only the container duration.
pub fn duration_args(file: &Path) -> Vec<String> {
    vec![
        "-v".into(),
        "error".into(),
        "-show_entries".into(),
        "format=duration".into(),
        "-of".into(),
        "default=noprint_wrappers=1:nokey=1".into(),
        path_arg(file),
    ]
}

/// `ffprobe` arguments listing audio stream indices, one per line.
pub fn audio_stream_args(file: &Path) -> Vec<String> {
    vec![
        "-v".into(),
        "error".into(),
        "-select_streams".into(),
        "a".into(),
        "-show_entries".into(),
        "stream=index".into(),
        "-of".into(),
        "csv=p=0".into(),
        path_arg(file),
    ]
}

/// Parse a duration printed by ffprobe, falling back to 0.0.
pub fn parse_duration(stdout: &str) -> f64 {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite())
        .unwrap_or(0.0)
}
