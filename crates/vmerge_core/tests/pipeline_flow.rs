//! End-to-end runs of the standard pipeline against the scripted engine.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use vmerge_core::captions::{
    CaptionGenerator, CaptionRequest, CaptionServiceError, GeneratedCaptions,
};
use vmerge_core::config::Settings;
use vmerge_core::logging::LogConfig;
use vmerge_core::media::{MediaEngine, ScriptedEngine, Tool};
use vmerge_core::models::{SubtitleMode, SubtitleSource};
use vmerge_core::orchestrator::{PipelineError, RunOptions, Runner, StepError};
use vmerge_core::subtitles::{parse_file, SubtitleCue, SubtitleTimeline};
use vmerge_core::transcode::{MixStrategy, Stage};

const ONE_CUE: &str = "1\n00:00:00,000 --> 00:00:01,500\nhello\n\n";

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            root: tempfile::tempdir().unwrap(),
        };
        for dir in ["Video", "Caption", "BGM", "tmp"] {
            fs::create_dir_all(fixture.root.path().join(dir)).unwrap();
        }
        fixture
    }

    fn dir(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn clip(&self, name: &str) -> PathBuf {
        let path = self.dir("Video").join(name);
        fs::write(&path, b"clip").unwrap();
        path
    }

    fn srt(&self, name: &str, content: &str) {
        fs::write(self.dir("Caption").join(name), content).unwrap();
    }

    fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.paths.video_dir = self.dir("Video");
        settings.paths.caption_dir = self.dir("Caption");
        settings.paths.bgm_dir = self.dir("BGM");
        settings.paths.output_dir = self.dir("Output");
        settings.logging = LogConfig::quiet();
        settings
    }

    fn options(&self) -> RunOptions {
        RunOptions::from_settings(&self.settings())
    }

    fn runner(&self, engine: &Arc<ScriptedEngine>) -> Runner {
        let engine: Arc<dyn MediaEngine> = engine.clone();
        Runner::new(self.settings(), engine).with_temp_root(self.dir("tmp"))
    }

    fn leftover_workspaces(&self) -> usize {
        fs::read_dir(self.dir("tmp")).unwrap().count()
    }
}

struct FakeCaptioner {
    lines: Vec<&'static str>,
}

impl CaptionGenerator for FakeCaptioner {
    fn name(&self) -> &str {
        "fake"
    }

    fn generate(&self, request: &CaptionRequest) -> Result<GeneratedCaptions, CaptionServiceError> {
        assert!(request.audio_path.is_file());
        let cues = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, text)| SubtitleCue::from_secs(i + 1, i as f64 * 2.0, i as f64 * 2.0 + 1.5, *text))
            .collect();
        Ok(GeneratedCaptions::Cues(SubtitleTimeline::from_cues(cues)))
    }
}

fn is_concat_copy(args: &[String]) -> bool {
    args.iter().any(|a| a == "concat") && args.windows(2).any(|w| w[0] == "-c" && w[1] == "copy")
}

fn starts(cues: &SubtitleTimeline) -> Vec<f64> {
    cues.iter().map(|c| c.start_ms).collect()
}

#[test]
fn per_clip_subtitles_are_offset_by_probed_durations() {
    let fx = Fixture::new();
    let a = fx.clip("a.mp4");
    let b = fx.clip("b.mp4");
    fx.srt("a.srt", ONE_CUE);
    fx.srt("b.srt", ONE_CUE);

    let engine = Arc::new(ScriptedEngine::new().with_duration(&a, 2.0).with_duration(&b, 2.0));
    let mut options = fx.options();
    options.keep_temp = true;
    options.output = fx.dir("Output").join("final.mp4");

    let report = fx.runner(&engine).run(&options);
    assert!(report.is_success(), "{:?}", report.error);

    let subs = report.state.subtitles.as_ref().unwrap();
    assert_eq!(subs.offsets, vec![0.0, 2.0]);
    assert_eq!(subs.source, SubtitleSource::PerClip { matched_clips: 2 });

    let merged = parse_file(fx.dir("Output").join("merged.srt")).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(starts(&merged), vec![0.0, 2000.0]);
    assert_eq!(merged.cues[1].end_ms, 3500.0);
    assert_eq!(merged.cues[1].index, 2);

    assert!(fx.dir("Output").join("final.mp4").is_file());
    assert!(fx.dir("Output").join("merged.mp4").is_file());
}

#[test]
fn offsets_count_clips_without_subtitles() {
    let fx = Fixture::new();
    let a = fx.clip("a.mp4");
    let b = fx.clip("b.mp4");
    fx.clip("c.mp4");
    fx.srt("c.srt", ONE_CUE);

    let engine = Arc::new(ScriptedEngine::new().with_duration(&a, 2.5).with_duration(&b, 1.0));
    let report = fx.runner(&engine).run(&fx.options());
    assert!(report.is_success(), "{:?}", report.error);

    let subs = report.state.subtitles.as_ref().unwrap();
    assert_eq!(subs.offsets, vec![0.0, 2.5, 3.5]);
    assert_eq!(subs.cue_count, 1);
}

#[test]
fn soft_subtitles_by_default_and_mix_skipped_without_bgm() {
    let fx = Fixture::new();
    fx.clip("a.mp4");
    fx.srt("a.srt", ONE_CUE);

    let engine = Arc::new(ScriptedEngine::new());
    let report = fx.runner(&engine).run(&fx.options());
    assert!(report.is_success(), "{:?}", report.error);

    let applied = report.state.applied.as_ref().unwrap();
    assert_eq!(applied.mode, SubtitleMode::Soft);
    assert!(engine
        .transcode_calls()
        .iter()
        .any(|c| c.has_pair("-c:s", "mov_text")));
    assert_eq!(report.steps_skipped(), vec!["ResolveBgm", "Mix"]);
    assert_eq!(report.output_path, Some(fx.dir("Output").join("merged.mp4")));
}

#[test]
fn combined_file_is_used_unshifted_without_probing() {
    let fx = Fixture::new();
    fx.clip("a.mp4");
    fx.clip("b.mp4");
    fx.srt(
        "combined.srt",
        "1\n00:00:05,000 --> 00:00:06,000\nwhole video\n\n",
    );

    let engine = Arc::new(ScriptedEngine::new());
    let report = fx.runner(&engine).run(&fx.options());
    assert!(report.is_success(), "{:?}", report.error);

    let subs = report.state.subtitles.as_ref().unwrap();
    assert!(matches!(subs.source, SubtitleSource::Combined { .. }));
    assert!(subs.offsets.is_empty());
    assert!(!engine
        .calls()
        .iter()
        .any(|c| c.tool == Tool::Ffprobe && c.args.iter().any(|a| a == "format=duration")));
}

#[test]
fn concat_falls_back_to_reencode() {
    let fx = Fixture::new();
    fx.clip("a.mp4");
    fx.clip("b.mp4");

    let engine = Arc::new(
        ScriptedEngine::new().fail_when(1, "Non-monotonous DTS", |args, _| is_concat_copy(args)),
    );
    let report = fx.runner(&engine).run(&fx.options());
    assert!(report.is_success(), "{:?}", report.error);

    let concat_calls: Vec<_> = engine
        .transcode_calls()
        .into_iter()
        .filter(|c| c.has_pair("-f", "concat"))
        .collect();
    assert_eq!(concat_calls.len(), 2);
    assert!(concat_calls[1].has_pair("-c:v", "libx264"));

    let fallbacks = report.pipeline.fallbacks();
    assert_eq!(fallbacks.len(), 1);
    assert_eq!(fallbacks[0].stage, Stage::Concat);
    assert_eq!(fallbacks[0].attempt, "re-encode");

    let concat_step = &report.pipeline.steps[1];
    assert_eq!(concat_step.name, "NormalizeConcat");
    let normalized = concat_step
        .stages
        .iter()
        .filter(|r| r.stage == Stage::Normalize)
        .count();
    assert_eq!(normalized, 2);
}

#[test]
fn failed_concat_reports_stage_and_output_and_cleans_up() {
    let fx = Fixture::new();
    fx.clip("a.mp4");

    let engine = Arc::new(ScriptedEngine::new().fail_when(1, "concat.txt: Invalid data", |args, _| {
        args.iter().any(|a| a == "concat")
    }));
    let report = fx.runner(&engine).run(&fx.options());

    let error = report.error.as_ref().unwrap();
    assert_eq!(error.step_name(), Some("NormalizeConcat"));
    assert_eq!(error.stage(), Some(Stage::Concat));
    let failure = error.transcode_error().unwrap();
    assert_eq!(failure.stage, Stage::Concat);
    assert_eq!(failure.attempts, 2);
    assert_eq!(failure.exit_code, Some(1));
    assert!(failure.output.contains("concat.txt: Invalid data"));

    assert!(report.workspace.is_none());
    assert_eq!(fx.leftover_workspaces(), 0);
    assert!(!fx.dir("Output").join("merged.mp4").exists());
}

#[test]
fn burn_in_retries_from_workspace() {
    let fx = Fixture::new();
    fx.clip("a.mp4");
    fx.srt("a.srt", ONE_CUE);

    let engine = Arc::new(ScriptedEngine::new().fail_when(1, "Unable to open", |args, _| {
        args.iter().any(|a| a.starts_with("ass="))
    }));
    let mut options = fx.options();
    options.burn_in = true;

    let report = fx.runner(&engine).run(&options);
    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(report.state.applied.as_ref().unwrap().mode, SubtitleMode::Burned);

    let fallback = engine
        .transcode_calls()
        .into_iter()
        .find(|c| c.has_pair("-vf", "subtitles=subs.srt"))
        .unwrap();
    assert!(fallback.working_dir.is_some());
}

#[test]
fn bgm_is_sole_audio_for_silent_video() {
    let fx = Fixture::new();
    fx.clip("a.mp4");
    fs::write(fx.dir("BGM").join("song.mp3"), b"music").unwrap();

    let engine = Arc::new(ScriptedEngine::new().with_default_audio(false));
    let report = fx.runner(&engine).run(&fx.options());
    assert!(report.is_success(), "{:?}", report.error);

    let mix = report.state.mix.as_ref().unwrap();
    assert_eq!(mix.strategy, MixStrategy::BgmOnly);
    let call = engine
        .transcode_calls()
        .into_iter()
        .find(|c| c.has_pair("-filter_complex", "[1:a]volume=0.15[aout]"))
        .unwrap();
    assert!(call.args.iter().any(|a| a == "-shortest"));
    assert_eq!(report.state.bgm, Some(fx.dir("BGM").join("song.mp3")));
}

#[test]
fn bgm_is_mixed_with_existing_audio() {
    let fx = Fixture::new();
    fx.clip("a.mp4");
    fs::write(fx.dir("BGM").join("song.mp3"), b"music").unwrap();

    let engine = Arc::new(ScriptedEngine::new());
    let mut options = fx.options();
    options.bgm_volume = 5.0;

    let report = fx.runner(&engine).run(&options);
    assert!(report.is_success(), "{:?}", report.error);

    let mix = report.state.mix.as_ref().unwrap();
    assert_eq!(mix.strategy, MixStrategy::WithOriginalAudio);
    assert_eq!(mix.volume, 2.0);
    let call = engine
        .transcode_calls()
        .into_iter()
        .find(|c| c.args.iter().any(|a| a.contains("amix=inputs=2:duration=shortest")))
        .unwrap();
    assert!(!call.args.iter().any(|a| a == "-shortest"));
}

#[test]
fn explicit_bgm_file_overrides_directory() {
    let fx = Fixture::new();
    fx.clip("a.mp4");
    fs::write(fx.dir("BGM").join("alpha.mp3"), b"music").unwrap();
    let chosen = fx.dir("chosen.wav");
    fs::write(&chosen, b"music").unwrap();

    let engine = Arc::new(ScriptedEngine::new());
    let mut options = fx.options();
    options.bgm_file = Some(chosen.clone());

    let report = fx.runner(&engine).run(&options);
    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(report.state.bgm, Some(chosen));
}

#[test]
fn no_clips_fails_before_transcoding() {
    let fx = Fixture::new();
    fs::write(fx.dir("Video").join("notes.txt"), b"").unwrap();

    let engine = Arc::new(ScriptedEngine::new());
    let report = fx.runner(&engine).run(&fx.options());

    let error = report.error.as_ref().unwrap();
    assert!(matches!(
        error.step_error(),
        Some(StepError::NoInputs { .. })
    ));
    assert!(engine.transcode_calls().is_empty());
    assert_eq!(fx.leftover_workspaces(), 0);
}

#[test]
fn keep_temp_retains_workspace() {
    let fx = Fixture::new();
    fx.clip("a.mp4");

    let engine = Arc::new(ScriptedEngine::new());
    let mut options = fx.options();
    options.keep_temp = true;

    let report = fx.runner(&engine).run(&options);
    assert!(report.is_success(), "{:?}", report.error);

    let workspace = report.workspace.as_ref().unwrap();
    assert!(workspace.join("merged.mp4").is_file());
    assert!(workspace.join("concat.txt").is_file());
    assert_eq!(fx.leftover_workspaces(), 1);
    assert!(report.state.finalize.as_ref().unwrap().retained.is_empty());
}

#[test]
fn captions_generated_when_no_subtitle_files() {
    let fx = Fixture::new();
    fx.clip("a.mp4");

    let engine = Arc::new(ScriptedEngine::new());
    let mut options = fx.options();
    options.generate_captions = true;

    let runner = fx.runner(&engine).with_captioner(Arc::new(FakeCaptioner {
        lines: vec!["first line", "second line"],
    }));
    let report = runner.run(&options);
    assert!(report.is_success(), "{:?}", report.error);

    let subs = report.state.subtitles.as_ref().unwrap();
    assert_eq!(
        subs.source,
        SubtitleSource::Generated {
            generator: "fake".to_string()
        }
    );
    assert_eq!(subs.cue_count, 2);
    assert!(engine
        .transcode_calls()
        .iter()
        .any(|c| c.has_pair("-ar", "16000") && c.has_pair("-ac", "1")));
}

#[test]
fn empty_generated_captions_continue_without_subtitles() {
    let fx = Fixture::new();
    fx.clip("a.mp4");

    let engine = Arc::new(ScriptedEngine::new());
    let mut options = fx.options();
    options.generate_captions = true;

    let runner = fx
        .runner(&engine)
        .with_captioner(Arc::new(FakeCaptioner { lines: vec![] }));
    let report = runner.run(&options);

    assert!(report.is_success(), "{:?}", report.error);
    assert!(report.state.subtitles.is_none());
    assert!(report.steps_skipped().contains(&"ResolveSubtitles"));
    assert!(report.steps_skipped().contains(&"ApplySubtitles"));
}

#[test]
fn caption_generation_without_generator_is_a_caption_error() {
    let fx = Fixture::new();
    fx.clip("a.mp4");

    let engine = Arc::new(ScriptedEngine::new());
    let mut options = fx.options();
    options.generate_captions = true;

    let report = fx.runner(&engine).run(&options);
    let error = report.error.as_ref().unwrap();
    assert_eq!(error.step_name(), Some("ResolveSubtitles"));
    assert!(matches!(
        error.step_error(),
        Some(StepError::CaptionService(_))
    ));
}

#[test]
fn existing_subtitles_win_over_generation() {
    let fx = Fixture::new();
    fx.clip("a.mp4");
    fx.srt("a.srt", ONE_CUE);

    let engine = Arc::new(ScriptedEngine::new());
    let mut options = fx.options();
    options.generate_captions = true;

    let report = fx.runner(&engine).run(&options);
    assert!(report.is_success(), "{:?}", report.error);
    assert!(matches!(
        report.state.subtitles.as_ref().unwrap().source,
        SubtitleSource::PerClip { .. }
    ));
}

#[test]
fn cancelled_batch_runs_nothing() {
    let fx = Fixture::new();
    fx.clip("a.mp4");

    let engine = Arc::new(ScriptedEngine::new());
    let runner = fx.runner(&engine);
    runner.cancel_handle().cancel();

    let reports = runner.run_batch(&[fx.options(), fx.options()]);
    assert!(reports.is_empty());
    assert!(engine.calls().is_empty());
}

#[test]
fn cancelled_run_reports_cancellation() {
    let fx = Fixture::new();
    fx.clip("a.mp4");

    let engine = Arc::new(ScriptedEngine::new());
    let runner = fx.runner(&engine);
    runner.cancel_handle().cancel();

    let report = runner.run(&fx.options());
    assert!(matches!(report.error, Some(PipelineError::Cancelled { .. })));
    assert_eq!(fx.leftover_workspaces(), 0);
}

#[test]
fn run_log_written_when_logs_dir_set() {
    let fx = Fixture::new();
    fx.clip("a.mp4");

    let mut settings = fx.settings();
    settings.paths.logs_dir = Some(fx.dir("logs"));
    let engine: Arc<dyn MediaEngine> = Arc::new(ScriptedEngine::new());
    let runner = Runner::new(settings, engine).with_temp_root(fx.dir("tmp"));

    let report = runner.run(&fx.options());
    assert!(report.is_success(), "{:?}", report.error);

    let log = report.log_path.as_ref().unwrap();
    assert_eq!(log, &fx.dir("logs").join("merged.log"));
    let content = fs::read_to_string(log).unwrap();
    assert!(content.contains("=== Discover ==="));
    assert!(content.contains("$ ffmpeg"));
}
