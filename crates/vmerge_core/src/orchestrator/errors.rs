//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Stage → captured tool output

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::captions::CaptionServiceError;
use crate::subtitles::SubtitleError;
use crate::transcode::{Stage, TranscodeError};

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Run '{run_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        run_name: String,
        step_name: String,
        /// Transcoding stage that failed, when the step was transcoding.
        stage: Option<Stage>,
        #[source]
        source: StepError,
    },

    /// Pipeline was cancelled between steps.
    #[error("Run '{run_name}' was cancelled")]
    Cancelled { run_name: String },

    /// Failed to set up the run (output directory, workspace, log file).
    #[error("Run '{run_name}' setup failed: {message}")]
    SetupFailed { run_name: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        run_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        let stage = match &source {
            StepError::Transcode(e) => Some(e.stage),
            _ => None,
        };
        Self::StepFailed {
            run_name: run_name.into(),
            step_name: step_name.into(),
            stage,
            source,
        }
    }

    pub fn setup_failed(run_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            run_name: run_name.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(run_name: impl Into<String>) -> Self {
        Self::Cancelled {
            run_name: run_name.into(),
        }
    }

    /// Name of the step that failed, if a step failed.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step_name, .. } => Some(step_name),
            _ => None,
        }
    }

    /// Transcoding stage that failed, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StepFailed { stage, .. } => *stage,
            _ => None,
        }
    }

    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            Self::StepFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The transcode failure behind this error, with its captured output.
    pub fn transcode_error(&self) -> Option<&TranscodeError> {
        match self.step_error()? {
            StepError::Transcode(e) => Some(e),
            _ => None,
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// No clip matched the extension allow-list.
    #[error("No input videos found in {} (extensions: {})", .dir.display(), .exts.join(", "))]
    NoInputs { dir: PathBuf, exts: Vec<String> },

    /// An ffmpeg stage failed after its fallbacks.
    #[error("{0}")]
    Transcode(#[from] TranscodeError),

    /// Speech-to-text failed while it was the only subtitle source.
    #[error("{0}")]
    CaptionService(#[from] CaptionServiceError),

    /// The resolved subtitles could not be written.
    #[error("{0}")]
    Subtitle(#[from] SubtitleError),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    #[error("{0}")]
    Other(String),
}

impl StepError {
    pub fn no_inputs(dir: impl Into<PathBuf>, exts: &[String]) -> Self {
        Self::NoInputs {
            dir: dir.into(),
            exts: exts.to_vec(),
        }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
