//! Settings struct with TOML-based sections.
//!
//! Every field has a serde default, so a partial file (or no file) is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::captions::CueWindow;
use crate::discovery::{DEFAULT_BGM_EXTS, DEFAULT_VIDEO_EXTS};
use crate::logging::LogConfig;
use crate::transcode::EncodingProfile;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub inputs: InputSettings,

    #[serde(default)]
    pub encoding: EncodingProfile,

    #[serde(default)]
    pub mix: MixSettings,

    #[serde(default)]
    pub subtitles: SubtitleSettings,

    #[serde(default)]
    pub captions: CaptionSettings,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub tools: ToolSettings,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Directory layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,

    /// Per-clip `<stem>.srt` files and the combined fallback.
    #[serde(default = "default_caption_dir")]
    pub caption_dir: PathBuf,

    #[serde(default = "default_bgm_dir")]
    pub bgm_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the result inside `output_dir`.
    #[serde(default = "default_output_name")]
    pub output_name: String,

    /// Per-run log files; none are written when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_dir: Option<PathBuf>,
}

fn default_video_dir() -> PathBuf {
    PathBuf::from("Video")
}

fn default_caption_dir() -> PathBuf {
    PathBuf::from("Caption")
}

fn default_bgm_dir() -> PathBuf {
    PathBuf::from("BGM")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Output")
}

fn default_output_name() -> String {
    "merged.mp4".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            video_dir: default_video_dir(),
            caption_dir: default_caption_dir(),
            bgm_dir: default_bgm_dir(),
            output_dir: default_output_dir(),
            output_name: default_output_name(),
            logs_dir: None,
        }
    }
}

/// File matching rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(default = "default_video_exts")]
    pub video_exts: Vec<String>,

    #[serde(default = "default_bgm_exts")]
    pub bgm_exts: Vec<String>,

    #[serde(default = "default_subtitle_ext")]
    pub subtitle_ext: String,

    /// Subtitle file used when no clip has its own.
    #[serde(default = "default_combined_name")]
    pub combined_name: String,
}

fn default_video_exts() -> Vec<String> {
    DEFAULT_VIDEO_EXTS.iter().map(|e| e.to_string()).collect()
}

fn default_bgm_exts() -> Vec<String> {
    DEFAULT_BGM_EXTS.iter().map(|e| e.to_string()).collect()
}

fn default_subtitle_ext() -> String {
    ".srt".to_string()
}

fn default_combined_name() -> String {
    "combined.srt".to_string()
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            video_exts: default_video_exts(),
            bgm_exts: default_bgm_exts(),
            subtitle_ext: default_subtitle_ext(),
            combined_name: default_combined_name(),
        }
    }
}

/// Background music.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixSettings {
    /// BGM gain, clamped to [0.0, 2.0] when applied.
    #[serde(default = "default_bgm_volume")]
    pub bgm_volume: f64,
}

fn default_bgm_volume() -> f64 {
    0.15
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            bgm_volume: default_bgm_volume(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSettings {
    /// Render into the picture instead of adding a soft track.
    #[serde(default)]
    pub burn_in: bool,
}

/// Speech-to-text fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSettings {
    #[serde(default)]
    pub generate: bool,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_min_cue_secs")]
    pub min_cue_secs: f64,

    #[serde(default = "default_max_cue_secs")]
    pub max_cue_secs: f64,

    #[serde(default = "default_chars_per_sec")]
    pub chars_per_sec: f64,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_min_cue_secs() -> f64 {
    2.0
}

fn default_max_cue_secs() -> f64 {
    6.0
}

fn default_chars_per_sec() -> f64 {
    12.0
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            generate: false,
            language: default_language(),
            sample_rate: default_sample_rate(),
            min_cue_secs: default_min_cue_secs(),
            max_cue_secs: default_max_cue_secs(),
            chars_per_sec: default_chars_per_sec(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl CaptionSettings {
    pub fn cue_window(&self) -> CueWindow {
        CueWindow {
            min_secs: self.min_cue_secs,
            max_secs: self.max_cue_secs,
            chars_per_sec: self.chars_per_sec,
        }
    }
}

/// Run behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Keep the workspace and copy intermediates into the output directory.
    #[serde(default)]
    pub keep_temp: bool,

    /// Clips normalized at once.
    #[serde(default = "default_normalize_jobs")]
    pub normalize_jobs: usize,

    /// Per-invocation limit for ffmpeg/ffprobe; 0 disables it.
    #[serde(default)]
    pub tool_timeout_secs: u64,
}

fn default_normalize_jobs() -> usize {
    1
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            keep_temp: false,
            normalize_jobs: default_normalize_jobs(),
            tool_timeout_secs: 0,
        }
    }
}

/// External binaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Inputs,
    Encoding,
    Mix,
    Subtitles,
    Captions,
    Pipeline,
    Tools,
    Logging,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 9] = [
        ConfigSection::Paths,
        ConfigSection::Inputs,
        ConfigSection::Encoding,
        ConfigSection::Mix,
        ConfigSection::Subtitles,
        ConfigSection::Captions,
        ConfigSection::Pipeline,
        ConfigSection::Tools,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Inputs => "inputs",
            ConfigSection::Encoding => "encoding",
            ConfigSection::Mix => "mix",
            ConfigSection::Subtitles => "subtitles",
            ConfigSection::Captions => "captions",
            ConfigSection::Pipeline => "pipeline",
            ConfigSection::Tools => "tools",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the table in generated files.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Input, caption, music and output directories",
            ConfigSection::Inputs => "Which files count as clips, music and subtitles",
            ConfigSection::Encoding => "Canonical encoding used by normalize, concat fallback and burn-in",
            ConfigSection::Mix => "Background music level",
            ConfigSection::Subtitles => "Burn subtitles into the picture or add a soft track",
            ConfigSection::Captions => "Speech-to-text when no subtitle files exist",
            ConfigSection::Pipeline => "Workspace retention, parallelism and tool timeout",
            ConfigSection::Tools => "ffmpeg and ffprobe binaries",
            ConfigSection::Logging => "Per-run log output",
        }
    }
}
