//! `MediaEngine` backed by the ffmpeg/ffprobe binaries.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::engine::{EngineError, MediaEngine, Tool, ToolOutput};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs the real ffmpeg and ffprobe executables.
///
/// Both programs are looked up in `PATH` unless overridden.
#[derive(Debug, Clone)]
pub struct SystemEngine {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    timeout: Option<Duration>,
}

impl SystemEngine {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            timeout: None,
        }
    }

    /// Set a custom path to the ffmpeg executable.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Set a custom path to the ffprobe executable.
    pub fn with_ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffprobe_path = path.into();
        self
    }

    /// Kill any invocation that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn tool_path(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Ffmpeg => &self.ffmpeg_path,
            Tool::Ffprobe => &self.ffprobe_path,
        }
    }

    fn run(
        &self,
        tool: Tool,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<ToolOutput, EngineError> {
        let program = self.tool_path(tool);
        let tool_name = program.display().to_string();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!("Running {}: {:?}", tool, cmd);

        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            tool: tool_name.clone(),
            source,
        })?;

        // Drain both pipes concurrently so a chatty tool cannot block on a full pipe.
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let status = match self.timeout {
            None => Some(child.wait().map_err(|source| EngineError::Io {
                tool: tool_name.clone(),
                source,
            })?),
            Some(limit) => wait_with_timeout(&mut child, limit).map_err(|source| {
                EngineError::Io {
                    tool: tool_name.clone(),
                    source,
                }
            })?,
        };

        let stdout = collect(stdout_reader);
        let stderr = collect(stderr_reader);

        match status {
            Some(status) => Ok(ToolOutput {
                exit_code: status.code(),
                stdout,
                stderr,
            }),
            None => Err(EngineError::TimedOut {
                tool: tool_name,
                secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
            }),
        }
    }
}

impl Default for SystemEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEngine for SystemEngine {
    fn probe(&self, args: &[String]) -> Result<ToolOutput, EngineError> {
        self.run(Tool::Ffprobe, args, None)
    }

    fn transcode(
        &self,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<ToolOutput, EngineError> {
        self.run(Tool::Ffmpeg, args, working_dir)
    }

    fn program(&self, tool: Tool) -> String {
        self.tool_path(tool).display().to_string()
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn collect(handle: JoinHandle<Vec<u8>>) -> String {
    handle
        .join()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Poll the child until it exits or `limit` passes.
///
/// Returns `None` after killing a child that overran.
fn wait_with_timeout(child: &mut Child, limit: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
