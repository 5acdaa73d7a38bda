//! Per-run logger with file and callback output.
//!
//! Each pipeline run gets its own logger that:
//! - Writes to a dedicated log file (when a log directory is configured)
//! - Sends every line to an optional callback
//! - Mirrors lines into `tracing` at the matching level
//! - Shows the tail of a failed tool invocation's output

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Per-run logger with file + callback output.
pub struct RunLogger {
    run_name: String,
    log_path: Option<PathBuf>,
    file_writer: Mutex<Option<BufWriter<File>>>,
    callback: Option<LogCallback>,
    config: LogConfig,
}

impl RunLogger {
    /// Create a new run logger.
    ///
    /// # Arguments
    /// * `run_name` - Name of the run (used in the log filename)
    /// * `log_dir` - Directory for `<run_name>.log`, or `None` for no file
    /// * `config` - Logging configuration
    /// * `callback` - Optional line callback
    pub fn new(
        run_name: impl Into<String>,
        log_dir: Option<&Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let run_name = run_name.into();

        let (log_path, writer) = match log_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let path = dir.join(format!("{}.log", sanitize_filename(&run_name)));
                let file = File::create(&path)?;
                (Some(path), Some(BufWriter::new(file)))
            }
            None => (None, None),
        };

        Ok(Self {
            run_name,
            log_path,
            file_writer: Mutex::new(writer),
            callback,
            config,
        })
    }

    /// Logger that only forwards to `tracing`; no file, no callback.
    pub fn detached(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            log_path: None,
            file_writer: Mutex::new(None),
            callback: None,
            config: LogConfig::default(),
        }
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }

        if self.config.forward_to_tracing {
            forward(level, &self.run_name, message);
        }

        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        let msg = MessagePrefix::Warning.format(message);
        self.log(LogLevel::Warn, &msg);
    }

    pub fn error(&self, message: &str) {
        let msg = MessagePrefix::Error.format(message);
        self.log(LogLevel::Error, &msg);
    }

    /// Log an external command line.
    pub fn command(&self, command: &str) {
        let msg = MessagePrefix::Command.format(command);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a pipeline phase marker.
    pub fn phase(&self, phase_name: &str) {
        let msg = MessagePrefix::Phase.format(phase_name);
        self.log(LogLevel::Info, &msg);
    }

    pub fn section(&self, section_name: &str) {
        let msg = MessagePrefix::Section.format(section_name);
        self.log(LogLevel::Info, &msg);
    }

    pub fn success(&self, message: &str) {
        let msg = MessagePrefix::Success.format(message);
        self.log(LogLevel::Info, &msg);
    }

    /// Log captured tool output line by line at debug level.
    ///
    /// Nothing is logged in compact mode.
    pub fn tool_output(&self, stdout: &str, stderr: &str) {
        if self.config.compact {
            return;
        }
        for line in stdout.lines() {
            self.debug(line);
        }
        for line in stderr.lines() {
            self.debug(&format!("[stderr] {}", line));
        }
    }

    /// Show the last `error_tail` lines of one invocation's output.
    ///
    /// The block is written under a single lock so concurrent invocations
    /// cannot interleave their tails.
    pub fn show_tail(&self, header: &str, stdout: &str, stderr: &str) {
        let lines = tail_lines(stdout, stderr, self.config.error_tail);
        if lines.is_empty() {
            return;
        }

        let mut block = Vec::with_capacity(lines.len() + 1);
        block.push(self.format_message(&format!("[{}/tail]", header)));
        block.extend(lines.iter().map(|line| self.format_message(line)));
        self.output_block(&block);
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Flush and release the log file.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        self.output_block(&[formatted]);
    }

    fn output_block<S: AsRef<str>>(&self, lines: &[S]) {
        let mut writer = self.file_writer.lock();
        for line in lines {
            let line = line.as_ref();
            if let Some(ref mut w) = *writer {
                let _ = writeln!(w, "{}", line);
            }
            if let Some(ref callback) = self.callback {
                callback(line);
            }
        }
    }
}

/// Last `limit` lines of stdout followed by stderr.
fn tail_lines<'a>(stdout: &'a str, stderr: &'a str, limit: usize) -> Vec<&'a str> {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let skip = lines.len().saturating_sub(limit);
    lines[skip..].to_vec()
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn forward(level: LogLevel, run: &str, message: &str) {
    match level {
        LogLevel::Trace => tracing::trace!(run, "{}", message),
        LogLevel::Debug => tracing::debug!(run, "{}", message),
        LogLevel::Info => tracing::info!(run, "{}", message),
        LogLevel::Warn => tracing::warn!(run, "{}", message),
        LogLevel::Error => tracing::error!(run, "{}", message),
    }
}

/// Make a run name safe for use as a filename.
pub(crate) fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
