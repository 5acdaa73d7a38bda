//! Ordered attempt lists and the loop that runs them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::error::TranscodeError;
use super::Stage;
use crate::logging::RunLogger;
use crate::media::{render_command, MediaEngine, Tool};
use crate::models::MediaFile;

/// File work done right before an attempt runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preparation {
    CopyFile { from: PathBuf, to: PathBuf },
}

impl Preparation {
    fn apply(&self) -> io::Result<()> {
        match self {
            Preparation::CopyFile { from, to } => fs::copy(from, to).map(|_| ()),
        }
    }
}

/// One argument vector to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub label: &'static str,
    pub args: Vec<String>,
    /// Working directory for the child process only.
    pub working_dir: Option<PathBuf>,
    pub preparation: Option<Preparation>,
}

impl Attempt {
    pub fn new(label: &'static str, args: Vec<String>) -> Self {
        Self {
            label,
            args,
            working_dir: None,
            preparation: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_preparation(mut self, preparation: Preparation) -> Self {
        self.preparation = Some(preparation);
        self
    }
}

/// Attempts for one stage, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptPlan {
    pub stage: Stage,
    /// File every attempt writes.
    pub output: PathBuf,
    pub attempts: Vec<Attempt>,
}

impl AttemptPlan {
    pub fn new(stage: Stage, output: impl Into<PathBuf>) -> Self {
        Self {
            stage,
            output: output.into(),
            attempts: Vec::new(),
        }
    }

    pub fn then(mut self, attempt: Attempt) -> Self {
        self.attempts.push(attempt);
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

/// Which attempt produced the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSuccess {
    pub file: MediaFile,
    pub label: &'static str,
    /// Zero-based position in the plan.
    pub attempt_index: usize,
}

impl PlanSuccess {
    pub fn used_fallback(&self) -> bool {
        self.attempt_index > 0
    }
}

struct Failure {
    command: String,
    exit_code: Option<i32>,
    output: String,
}

/// Run a plan's attempts in order and return the first that exits 0.
///
/// A non-zero exit or a failed preparation moves on to the next attempt.
/// An engine error (missing binary, timeout) stops the plan at once, since
/// no later attempt would get further.
pub fn run_plan(
    engine: &dyn MediaEngine,
    plan: &AttemptPlan,
    logger: &RunLogger,
) -> Result<PlanSuccess, TranscodeError> {
    let program = engine.program(Tool::Ffmpeg);
    let mut last: Option<Failure> = None;
    let mut tried = 0;

    for (index, attempt) in plan.attempts.iter().enumerate() {
        if let Some(prev) = index.checked_sub(1).map(|i| plan.attempts[i].label) {
            logger.warn(&format!(
                "{}: '{}' failed, retrying with '{}'",
                plan.stage, prev, attempt.label
            ));
        }
        tried += 1;

        let command = render_command(&program, &attempt.args);

        if let Some(preparation) = &attempt.preparation {
            if let Err(e) = preparation.apply() {
                logger.warn(&format!("{}: preparation failed: {}", plan.stage, e));
                last = Some(Failure {
                    command,
                    exit_code: None,
                    output: e.to_string(),
                });
                continue;
            }
        }

        logger.command(&command);

        let output = match engine.transcode(&attempt.args, attempt.working_dir.as_deref()) {
            Ok(output) => output,
            Err(e) => {
                logger.error(&format!("{}: {}", plan.stage, e));
                last = Some(Failure {
                    command,
                    exit_code: None,
                    output: e.to_string(),
                });
                break;
            }
        };

        logger.tool_output(&output.stdout, &output.stderr);

        if output.success() {
            return Ok(PlanSuccess {
                file: MediaFile::new(&plan.output, plan.stage),
                label: attempt.label,
                attempt_index: index,
            });
        }

        logger.show_tail(&program, &output.stdout, &output.stderr);
        last = Some(Failure {
            command,
            exit_code: output.exit_code,
            output: output.combined(),
        });
    }

    let failure = last.unwrap_or(Failure {
        command: String::new(),
        exit_code: None,
        output: "no attempts planned".to_string(),
    });

    Err(TranscodeError {
        stage: plan.stage,
        attempts: tried,
        command: failure.command,
        exit_code: failure.exit_code,
        output: failure.output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{EngineError, ScriptedEngine, ToolOutput};
    use tempfile::tempdir;

    fn args(out: &Path, marker: &str) -> Vec<String> {
        vec![marker.to_string(), out.to_string_lossy().into_owned()]
    }

    #[test]
    fn first_successful_attempt_wins() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("merged.mp4");
        let engine = ScriptedEngine::new();
        let logger = RunLogger::detached("plan");

        let plan = AttemptPlan::new(Stage::Concat, &out)
            .then(Attempt::new("stream copy", args(&out, "copy")))
            .then(Attempt::new("re-encode", args(&out, "encode")));

        let success = run_plan(&engine, &plan, &logger).unwrap();
        assert_eq!(success.label, "stream copy");
        assert!(!success.used_fallback());
        assert_eq!(engine.transcode_calls().len(), 1);
        assert_eq!(success.file.stage, Stage::Concat);
    }

    #[test]
    fn falls_through_to_next_attempt() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("merged.mp4");
        let engine = ScriptedEngine::new().fail_when(1, "mismatch", |args, _| args[0] == "copy");
        let logger = RunLogger::detached("plan");

        let plan = AttemptPlan::new(Stage::Concat, &out)
            .then(Attempt::new("stream copy", args(&out, "copy")))
            .then(Attempt::new("re-encode", args(&out, "encode")));

        let success = run_plan(&engine, &plan, &logger).unwrap();
        assert_eq!(success.attempt_index, 1);
        assert!(success.used_fallback());
        assert_eq!(engine.transcode_calls().len(), 2);
    }

    #[test]
    fn exhausted_plan_reports_last_attempt_verbatim() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("merged.mp4");
        let engine = ScriptedEngine::new().fail_when(1, "line one\nline two", |_, _| true);
        let logger = RunLogger::detached("plan");

        let plan = AttemptPlan::new(Stage::Concat, &out)
            .then(Attempt::new("stream copy", args(&out, "copy")))
            .then(Attempt::new("re-encode", args(&out, "encode")));

        let err = run_plan(&engine, &plan, &logger).unwrap_err();
        assert_eq!(err.stage, Stage::Concat);
        assert_eq!(err.attempts, 2);
        assert_eq!(err.exit_code, Some(1));
        assert_eq!(err.output, "line one\nline two");
        assert!(err.command.starts_with("ffmpeg encode"));
    }

    #[test]
    fn failed_attempt_shows_its_own_output_tail() {
        use crate::logging::{LogCallback, LogConfig};
        use parking_lot::Mutex;
        use std::sync::Arc;

        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let callback: LogCallback = Box::new(move |line: &str| sink.lock().push(line.to_string()));
        let logger = RunLogger::new("plan", None, LogConfig::quiet(), Some(callback)).unwrap();

        let dir = tempdir().unwrap();
        let out = dir.path().join("merged.mp4");
        let engine = ScriptedEngine::new()
            .fail_when(1, "copy broke", |args, _| args[0] == "copy")
            .fail_when(1, "encode broke", |args, _| args[0] == "encode");

        let plan = AttemptPlan::new(Stage::Concat, &out)
            .then(Attempt::new("stream copy", args(&out, "copy")))
            .then(Attempt::new("re-encode", args(&out, "encode")));
        run_plan(&engine, &plan, &logger).unwrap_err();

        let lines = lines.lock();
        let tails: Vec<&str> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.as_str() == "[ffmpeg/tail]")
            .map(|(i, _)| lines[i + 1].as_str())
            .collect();
        assert_eq!(tails, vec!["copy broke", "encode broke"]);
    }

    #[test]
    fn preparation_runs_before_attempt() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("merged.srt");
        let to = dir.path().join("subs.srt");
        fs::write(&from, "1\n").unwrap();
        let out = dir.path().join("burned.mp4");
        let engine = ScriptedEngine::new();
        let logger = RunLogger::detached("plan");

        let plan = AttemptPlan::new(Stage::BurnSubtitles, &out).then(
            Attempt::new("relative", args(&out, "-vf"))
                .with_working_dir(dir.path())
                .with_preparation(Preparation::CopyFile {
                    from: from.clone(),
                    to: to.clone(),
                }),
        );

        run_plan(&engine, &plan, &logger).unwrap();
        assert!(to.exists());
        assert_eq!(
            engine.transcode_calls()[0].working_dir.as_deref(),
            Some(dir.path())
        );
    }

    struct MissingTool;

    impl MediaEngine for MissingTool {
        fn probe(&self, _: &[String]) -> Result<ToolOutput, EngineError> {
            unreachable!()
        }

        fn transcode(&self, _: &[String], _: Option<&Path>) -> Result<ToolOutput, EngineError> {
            Err(EngineError::Spawn {
                tool: "ffmpeg".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            })
        }
    }

    #[test]
    fn engine_error_stops_the_plan() {
        let logger = RunLogger::detached("plan");
        let plan = AttemptPlan::new(Stage::Concat, "merged.mp4")
            .then(Attempt::new("stream copy", vec!["merged.mp4".to_string()]))
            .then(Attempt::new("re-encode", vec!["merged.mp4".to_string()]));

        let err = run_plan(&MissingTool, &plan, &logger).unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(err.exit_code, None);
        assert!(err.output.contains("Failed to start ffmpeg"));
    }
}
