//! Scripted in-memory engine.
//!
//! Answers probes from configured tables, records every invocation, and
//! "transcodes" by writing a small placeholder to the output path (the last
//! argument). Used to drive the pipeline without ffmpeg installed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::engine::{EngineError, MediaEngine, Tool, ToolOutput};

type FailurePredicate = Box<dyn Fn(&[String], Option<&Path>) -> bool + Send + Sync>;

struct FailureRule {
    matches: FailurePredicate,
    exit_code: i32,
    stderr: String,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: Tool,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    /// True if `flag` is immediately followed by `value`.
    pub fn has_pair(&self, flag: &str, value: &str) -> bool {
        self.args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    pub fn output(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

/// Fake `MediaEngine` for tests and dry runs.
pub struct ScriptedEngine {
    durations: HashMap<String, ToolOutput>,
    audio: HashMap<String, ToolOutput>,
    probe_overrides: HashMap<String, ToolOutput>,
    default_audio: bool,
    failures: Vec<FailureRule>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            durations: HashMap::new(),
            audio: HashMap::new(),
            probe_overrides: HashMap::new(),
            default_audio: true,
            failures: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Report `secs` as the duration of `file`.
    pub fn with_duration(mut self, file: impl AsRef<Path>, secs: f64) -> Self {
        self.durations.insert(
            key(file.as_ref()),
            ToolOutput::new(Some(0), format!("{:.6}\n", secs), ""),
        );
        self
    }

    /// Report whether `file` has an audio stream.
    pub fn with_audio(mut self, file: impl AsRef<Path>, has_audio: bool) -> Self {
        let stdout = if has_audio { "1\n" } else { "" };
        self.audio
            .insert(key(file.as_ref()), ToolOutput::new(Some(0), stdout, ""));
        self
    }

    /// Answer every probe of `file` with `output`.
    pub fn with_probe_response(mut self, file: impl AsRef<Path>, output: ToolOutput) -> Self {
        self.probe_overrides.insert(key(file.as_ref()), output);
        self
    }

    /// Audio answer for files without an explicit entry (default: has audio).
    pub fn with_default_audio(mut self, has_audio: bool) -> Self {
        self.default_audio = has_audio;
        self
    }

    /// Make matching transcode calls exit non-zero.
    pub fn fail_when<F>(mut self, exit_code: i32, stderr: impl Into<String>, matches: F) -> Self
    where
        F: Fn(&[String], Option<&Path>) -> bool + Send + Sync + 'static,
    {
        self.failures.push(FailureRule {
            matches: Box::new(matches),
            exit_code,
            stderr: stderr.into(),
        });
        self
    }

    /// All recorded invocations, in call order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    /// Recorded ffmpeg invocations, in call order.
    pub fn transcode_calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.tool == Tool::Ffmpeg)
            .cloned()
            .collect()
    }

    fn record(&self, tool: Tool, args: &[String], working_dir: Option<&Path>) {
        self.calls.lock().push(Invocation {
            tool,
            args: args.to_vec(),
            working_dir: working_dir.map(Path::to_path_buf),
        });
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEngine for ScriptedEngine {
    fn probe(&self, args: &[String]) -> Result<ToolOutput, EngineError> {
        self.record(Tool::Ffprobe, args, None);

        let file = args.last().cloned().unwrap_or_default();
        if let Some(output) = self.probe_overrides.get(&file) {
            return Ok(output.clone());
        }

        if args.iter().any(|a| a == "format=duration") {
            return Ok(self
                .durations
                .get(&file)
                .cloned()
                .unwrap_or_else(|| ToolOutput::new(Some(0), "N/A\n", "")));
        }

        if args.iter().any(|a| a == "stream=index") {
            return Ok(self.audio.get(&file).cloned().unwrap_or_else(|| {
                let stdout = if self.default_audio { "1\n" } else { "" };
                ToolOutput::new(Some(0), stdout, "")
            }));
        }

        Ok(ToolOutput::new(Some(0), "", ""))
    }

    fn transcode(
        &self,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<ToolOutput, EngineError> {
        self.record(Tool::Ffmpeg, args, working_dir);

        if let Some(rule) = self.failures.iter().find(|r| (r.matches)(args, working_dir)) {
            return Ok(ToolOutput::new(Some(rule.exit_code), "", rule.stderr.clone()));
        }

        if let Some(output) = args.last() {
            let mut path = PathBuf::from(output);
            if path.is_relative() {
                if let Some(dir) = working_dir {
                    path = dir.join(path);
                }
            }
            fs::write(&path, b"scripted media").map_err(|source| EngineError::Io {
                tool: Tool::Ffmpeg.to_string(),
                source,
            })?;
        }

        Ok(ToolOutput::new(Some(0), "", "scripted: done\n"))
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
