//! Core types for the orchestrator pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::captions::CaptionGenerator;
use crate::config::Settings;
use crate::logging::RunLogger;
use crate::media::{MediaEngine, MediaProbe};
use crate::models::{ClipReference, MediaFile, SubtitleMode, SubtitleSource};
use crate::subtitles::CaptionLookup;
use crate::transcode::{MixStrategy, StageJournal, StageRun, Transcoder};

/// Called as each step starts with (step number from 1, step count, step name).
pub type ProgressCallback = Box<dyn Fn(usize, usize, &str) + Send + Sync>;

/// What one invocation asks for.
///
/// Built from [`Settings`] and then overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    pub video_dir: PathBuf,
    pub caption_dir: PathBuf,
    pub bgm_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Final file; defaults to `output_dir/output_name`.
    pub output: PathBuf,
    /// Clip extension allow-list.
    pub exts: Vec<String>,
    /// Explicit background track; otherwise the first one in `bgm_dir`.
    pub bgm_file: Option<PathBuf>,
    pub bgm_volume: f64,
    pub burn_in: bool,
    pub generate_captions: bool,
    pub language: String,
    pub sample_rate: u32,
    pub keep_temp: bool,
}

impl RunOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let paths = &settings.paths;
        Self {
            video_dir: paths.video_dir.clone(),
            caption_dir: paths.caption_dir.clone(),
            bgm_dir: paths.bgm_dir.clone(),
            output_dir: paths.output_dir.clone(),
            output: paths.output_dir.join(&paths.output_name),
            exts: settings.inputs.video_exts.clone(),
            bgm_file: None,
            bgm_volume: settings.mix.bgm_volume,
            burn_in: settings.subtitles.burn_in,
            generate_captions: settings.captions.generate,
            language: settings.captions.language.clone(),
            sample_rate: settings.captions.sample_rate,
            keep_temp: settings.pipeline.keep_temp,
        }
    }

    /// Run name used for the log file: the output file stem.
    pub fn run_name(&self) -> String {
        self.output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "vmerge".to_string())
    }
}

/// Read-only context passed to pipeline steps.
///
/// Contains run configuration and shared resources that steps can read
/// but not modify. Mutable state goes in `RunState`.
pub struct Context {
    pub run_name: String,
    pub options: RunOptions,
    /// Encoding, input naming, caption and tool settings.
    pub settings: Settings,
    /// Scratch directory; removed after the run unless retained.
    pub work_dir: PathBuf,
    pub logger: Arc<RunLogger>,
    pub engine: Arc<dyn MediaEngine>,
    /// Speech-to-text backend, when one is configured.
    pub captioner: Option<Arc<dyn CaptionGenerator>>,
    /// Stages run by transcoders handed out from this context.
    journal: StageJournal,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(
        run_name: impl Into<String>,
        options: RunOptions,
        settings: Settings,
        work_dir: PathBuf,
        logger: Arc<RunLogger>,
        engine: Arc<dyn MediaEngine>,
    ) -> Self {
        Self {
            run_name: run_name.into(),
            options,
            settings,
            work_dir,
            logger,
            engine,
            captioner: None,
            journal: StageJournal::new(),
            progress_callback: None,
        }
    }

    pub fn with_captioner(mut self, captioner: Arc<dyn CaptionGenerator>) -> Self {
        self.captioner = Some(captioner);
        self
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn report_progress(&self, position: usize, total: usize, step_name: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(position, total, step_name);
        }
    }

    pub fn probe(&self) -> MediaProbe<'_> {
        MediaProbe::new(self.engine.as_ref())
    }

    pub fn transcoder(&self) -> Transcoder<'_> {
        Transcoder::new(self.engine.as_ref(), &self.settings.encoding, &self.logger)
            .with_journal(&self.journal)
    }

    /// Stages run since the last call, in completion order.
    pub fn take_stage_runs(&self) -> Vec<StageRun> {
        self.journal.drain()
    }

    /// Where per-clip and combined subtitle files are looked up.
    pub fn caption_lookup(&self) -> CaptionLookup {
        CaptionLookup::new(&self.options.caption_dir)
            .with_extension(&self.settings.inputs.subtitle_ext)
            .with_combined_name(&self.settings.inputs.combined_name)
    }

    /// Path of a file inside the workspace.
    pub fn work_path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// Steps add their own section and never overwrite an earlier one.
/// `working` always points at the newest video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub started_at: Option<String>,
    /// Discovered clips in playback order.
    #[serde(default)]
    pub clips: Vec<ClipReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concat: Option<ConcatOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<SubtitlesOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<AppliedSubtitles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgm: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mix: Option<MixOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalize: Option<FinalizeOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working: Option<MediaFile>,
}

impl RunState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// The newest video produced so far.
    pub fn working_video(&self) -> Option<&Path> {
        self.working.as_ref().map(MediaFile::path)
    }

    /// Make `file` the video later stages consume.
    pub fn advance(&mut self, file: MediaFile) {
        self.working = Some(file);
    }

    pub fn has_subtitles(&self) -> bool {
        self.subtitles.is_some()
    }
}

/// Output from the NormalizeConcat step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcatOutput {
    /// One normalized file per clip, in clip order.
    pub normalized: Vec<MediaFile>,
    pub merged: MediaFile,
}

/// Output from subtitle resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitlesOutput {
    /// `merged.srt` in the workspace.
    pub path: PathBuf,
    pub source: SubtitleSource,
    pub cue_count: usize,
    /// Per-clip offsets in seconds; empty unless per-clip files were merged.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offsets: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedSubtitles {
    pub mode: SubtitleMode,
    pub file: MediaFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixOutput {
    pub file: MediaFile,
    pub strategy: MixStrategy,
    /// Volume after clamping.
    pub volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeOutput {
    pub output_path: PathBuf,
    /// Intermediates copied next to the output when the workspace is kept.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retained: Vec<PathBuf>,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (nothing to do, but not an error).
    Skipped(String),
}
