//! Subtitle error types.

use std::path::PathBuf;

/// Errors reading or writing a subtitle file.
#[derive(Debug, thiserror::Error)]
pub enum SubtitleError {
    /// Failed to read subtitle file.
    #[error("Failed to read subtitle file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write subtitle file.
    #[error("Failed to write subtitle file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File was readable but malformed.
    #[error("Failed to parse subtitle file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Errors in SRT content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Timing line is not `start --> end`.
    #[error("Invalid timing line at line {line}: '{value}'")]
    InvalidTiming { line: usize, value: String },

    /// A timestamp could not be parsed.
    #[error("Invalid time format at line {line}: '{value}'")]
    InvalidTime { line: usize, value: String },
}

impl SubtitleError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteError {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Self::ParseError {
            path: path.into(),
            source,
        }
    }
}

impl ParseError {
    pub fn invalid_timing(line: usize, value: impl Into<String>) -> Self {
        Self::InvalidTiming {
            line,
            value: value.into(),
        }
    }

    pub fn invalid_time(line: usize, value: impl Into<String>) -> Self {
        Self::InvalidTime {
            line,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_file_and_line() {
        let err = SubtitleError::parse(
            "Caption/intro.srt",
            ParseError::invalid_time(2, "00:00:xx,000"),
        );
        let msg = err.to_string();
        assert!(msg.contains("intro.srt"));
        assert!(msg.contains("line 2"));
    }
}
