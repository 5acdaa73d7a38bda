//! `vmerge` - concatenate clips, merge their subtitles and mix background
//! music into one video.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;

use vmerge_core::captions::{
    CaptionGenerator, CaptionRequest, CaptionServiceError, GeneratedCaptions,
    GoogleSpeechGenerator,
};
use vmerge_core::config::{ConfigManager, Settings};
use vmerge_core::logging::{init_tracing, LogConfig, LogLevel};
use vmerge_core::media::SystemEngine;
use vmerge_core::orchestrator::{RunOptions, RunReport, Runner};

#[derive(Parser, Debug)]
#[command(
    name = "vmerge",
    version,
    about = "Concatenate video clips with merged subtitles and background music"
)]
struct Args {
    /// Directory of input clips
    #[arg(long)]
    video_dir: Option<PathBuf>,

    /// Directory of per-clip `<stem>.srt` files
    #[arg(long)]
    caption_dir: Option<PathBuf>,

    /// Directory searched for background music
    #[arg(long)]
    bgm_dir: Option<PathBuf>,

    /// Directory for the result (created if absent)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output file; a bare name is placed in the output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Clip extensions to accept, e.g. `--exts .mp4,.mov`
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    exts: Vec<String>,

    /// Background track, overriding the BGM directory scan
    #[arg(long)]
    bgm_file: Option<PathBuf>,

    /// Background music gain (0.0 - 2.0)
    #[arg(long)]
    bgm_volume: Option<f64>,

    /// Burn subtitles into the picture instead of adding a soft track
    #[arg(long, alias = "no-soft-subs")]
    burn_in: bool,

    /// Transcribe the audio when no subtitle files are found
    #[arg(long)]
    generate_captions: bool,

    /// Language code for caption generation
    #[arg(long)]
    language: Option<String>,

    /// Sample rate of the audio sent for caption generation
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Keep the workspace and copy intermediates to the output directory
    #[arg(long)]
    keep_temp: bool,

    /// Clips normalized in parallel
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Settings file (created with defaults if missing)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every tool output line
    #[arg(short, long)]
    verbose: bool,

    /// Write the overrides above (all but --verbose) back to the settings file
    #[arg(long)]
    save: bool,
}

impl Args {
    /// Fold command-line overrides into the loaded settings.
    fn apply_to(&self, settings: &mut Settings) {
        let paths = &mut settings.paths;
        if let Some(dir) = &self.video_dir {
            paths.video_dir = dir.clone();
        }
        if let Some(dir) = &self.caption_dir {
            paths.caption_dir = dir.clone();
        }
        if let Some(dir) = &self.bgm_dir {
            paths.bgm_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            paths.output_dir = dir.clone();
        }
        if !self.exts.is_empty() {
            settings.inputs.video_exts = self.exts.clone();
        }
        if let Some(volume) = self.bgm_volume {
            settings.mix.bgm_volume = volume;
        }
        if self.burn_in {
            settings.subtitles.burn_in = true;
        }
        if self.generate_captions {
            settings.captions.generate = true;
        }
        if let Some(language) = &self.language {
            settings.captions.language = language.clone();
        }
        if let Some(rate) = self.sample_rate {
            settings.captions.sample_rate = rate;
        }
        if self.keep_temp {
            settings.pipeline.keep_temp = true;
        }
        if let Some(jobs) = self.jobs {
            settings.pipeline.normalize_jobs = jobs.max(1);
        }
    }

    fn run_options(&self, settings: &Settings) -> RunOptions {
        let mut options = RunOptions::from_settings(settings);
        options.bgm_file = self.bgm_file.clone();
        if let Some(output) = &self.output {
            options.output = resolve_output(output, &options.output_dir);
        }
        options
    }
}

/// A bare file name lands in the output directory; anything with a
/// directory component is used as given.
fn resolve_output(output: &Path, output_dir: &Path) -> PathBuf {
    let has_dir = output
        .parent()
        .map(|p| !p.as_os_str().is_empty())
        .unwrap_or(false);
    if has_dir {
        output.to_path_buf()
    } else {
        output_dir.join(output)
    }
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "vmerge")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from("vmerge.toml"))
}

/// Stand-in generator used when the API key is missing, so the error only
/// surfaces if a run actually needs generated captions.
struct MissingCredentials {
    var: String,
}

impl CaptionGenerator for MissingCredentials {
    fn name(&self) -> &str {
        "google-speech"
    }

    fn generate(&self, _request: &CaptionRequest) -> Result<GeneratedCaptions, CaptionServiceError> {
        Err(CaptionServiceError::MissingCredentials {
            var: self.var.clone(),
        })
    }
}

fn build_runner(settings: Settings) -> Result<Runner> {
    let timeout = match settings.pipeline.tool_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let engine = SystemEngine::new()
        .with_ffmpeg_path(&settings.tools.ffmpeg)
        .with_ffprobe_path(&settings.tools.ffprobe)
        .with_timeout(timeout);

    let captioner: Option<Arc<dyn CaptionGenerator>> = if settings.captions.generate {
        let window = settings.captions.cue_window();
        match GoogleSpeechGenerator::from_env(&settings.captions.api_key_env, window) {
            Ok(generator) => Some(Arc::new(generator)),
            Err(CaptionServiceError::MissingCredentials { var }) => {
                tracing::warn!("{} is not set; caption generation will fail if needed", var);
                Some(Arc::new(MissingCredentials { var }))
            }
            Err(e) => return Err(e).context("Failed to set up caption generation"),
        }
    } else {
        None
    };

    let mut runner = Runner::new(settings, Arc::new(engine));
    if let Some(captioner) = captioner {
        runner = runner.with_captioner(captioner);
    }
    Ok(runner)
}

/// Print a failed run's diagnostic to stderr.
fn report_failure(report: &RunReport) {
    let Some(error) = &report.error else {
        return;
    };

    eprintln!("error: {}", error);
    if let Some(step) = error.step_name() {
        eprintln!("  step:    {}", step);
    }
    if let Some(stage) = error.stage() {
        eprintln!("  stage:   {}", stage);
    }
    if let Some(failure) = error.transcode_error() {
        eprintln!("  command: {}", failure.command);
        if !failure.output.trim().is_empty() {
            eprintln!("--- tool output ---");
            eprintln!("{}", failure.output.trim_end());
        }
    }
    if let Some(log) = &report.log_path {
        eprintln!("  log:     {}", log.display());
    }
}

/// Load the settings file, apply overrides, and persist them with `--save`.
fn load_settings(args: &Args, config_path: &Path) -> Result<Settings> {
    let mut config = ConfigManager::new(config_path);
    config
        .load_or_create()
        .with_context(|| format!("Failed to load settings from {}", config_path.display()))?;
    tracing::debug!("Settings loaded from {}", config.path().display());

    let baseline = config.settings().clone();
    args.apply_to(config.settings_mut());
    if args.save {
        let written = config
            .update_changed_sections(&baseline)
            .with_context(|| format!("Failed to save settings to {}", config_path.display()))?;
        let names: Vec<&str> = written.iter().map(|s| s.table_name()).collect();
        tracing::info!("Saved [{}] to {}", names.join(", "), config_path.display());
    }

    let mut settings = config.into_settings();
    if args.verbose {
        settings.logging = LogConfig::debug();
    }
    Ok(settings)
}

fn run(args: Args) -> Result<bool> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let settings = load_settings(&args, &config_path)?;
    let options = args.run_options(&settings);

    let runner = build_runner(settings)?;
    let report = runner.run(&options);

    if report.is_success() {
        if let Some(output) = &report.output_path {
            println!("{}", output.display());
        }
        if let Some(workspace) = &report.workspace {
            eprintln!("Workspace kept at {}", workspace.display());
        }
        Ok(true)
    } else {
        report_failure(&report);
        Ok(false)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
