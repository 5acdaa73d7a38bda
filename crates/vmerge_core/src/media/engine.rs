//! The capability interface every external media call goes through.

use std::fmt;
use std::io;
use std::path::Path;

use thiserror::Error;

/// External tool behind an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured result of one external invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn new(exit_code: Option<i32>, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Exit code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout followed by stderr, as attached to failure reports.
    pub fn combined(&self) -> String {
        match (self.stdout.trim_end().is_empty(), self.stderr.trim_end().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
        }
    }
}

/// Failure to run a tool at all (as opposed to the tool exiting non-zero).
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while running {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} timed out after {secs}s and was killed")]
    TimedOut { tool: String, secs: u64 },
}

/// Runs probing and transcoding commands.
///
/// Implementations receive complete argument vectors (without the program
/// name) and must capture all output. `working_dir` is applied to the child
/// process only; the caller's working directory is never changed.
pub trait MediaEngine: Send + Sync {
    /// Run the inspection tool (ffprobe).
    fn probe(&self, args: &[String]) -> Result<ToolOutput, EngineError>;

    /// Run the transcoding tool (ffmpeg).
    fn transcode(&self, args: &[String], working_dir: Option<&Path>)
        -> Result<ToolOutput, EngineError>;

    /// Program name used when rendering commands for logs and reports.
    fn program(&self, tool: Tool) -> String {
        tool.as_str().to_string()
    }
}

/// Render a command line for logs and error reports.
///
/// Arguments containing whitespace or quotes are single-quoted.
pub fn render_command(program: &str, args: &[String]) -> String {
    let mut out = String::from(program);
    for arg in args {
        out.push(' ');
        if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
            out.push('\'');
            out.push_str(&arg.replace('\'', "'\\''"));
            out.push('\'');
        } else {
            out.push_str(arg);
        }
    }
    out
}

/// Lossy conversion of a path into an argument.
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
