//! External media tool access.
//!
//! Everything that touches ffmpeg or ffprobe goes through [`MediaEngine`]:
//! - [`SystemEngine`] runs the real binaries as subprocesses
//! - [`ScriptedEngine`] answers from tables, for tests
//! - [`MediaProbe`] answers duration and audio-stream questions

mod engine;
mod probe;
mod scripted;
mod system;

pub use engine::{render_command, EngineError, MediaEngine, Tool, ToolOutput};
pub(crate) use engine::path_arg;
pub use probe::{audio_stream_args, duration_args, parse_duration, MediaProbe, ProbeError};
pub use scripted::{Invocation, ScriptedEngine};
pub use system::SystemEngine;
