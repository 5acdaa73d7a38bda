//! Argument vectors for each stage and the [`Transcoder`] that runs them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::error::TranscodeError;
use super::journal::{StageJournal, StageRun};
use super::plan::{run_plan, Attempt, AttemptPlan, Preparation};
use super::profile::EncodingProfile;
use super::Stage;
use crate::logging::RunLogger;
use crate::media::{path_arg, MediaEngine, MediaProbe};
use crate::models::MediaFile;

pub const CONCAT_LIST_NAME: &str = "concat.txt";
pub const MERGED_NAME: &str = "merged.mp4";
pub const SUBBED_NAME: &str = "subbed.mp4";
pub const BURNED_NAME: &str = "burned.mp4";
pub const FALLBACK_SUBS_NAME: &str = "subs.srt";
pub const MIXED_NAME: &str = "mixed.mp4";
pub const EXTRACTED_AUDIO_NAME: &str = "audio.wav";

/// `norm_000.mp4`, `norm_001.mp4`, ...
pub fn normalized_name(index: usize) -> String {
    format!("norm_{:03}.mp4", index)
}

fn s(value: &str) -> String {
    value.to_string()
}

pub fn normalize_plan(profile: &EncodingProfile, input: &Path, output: &Path) -> AttemptPlan {
    let mut args = vec![s("-y"), s("-i"), path_arg(input), s("-vf"), profile.video_filter()];
    args.extend(profile.video_args());
    args.extend(profile.audio_args());
    args.push(path_arg(output));

    AttemptPlan::new(Stage::Normalize, output).then(Attempt::new("normalize", args))
}

/// Stream copy first, then a full re-encode with the profile.
pub fn concat_plan(profile: &EncodingProfile, manifest: &Path, output: &Path) -> AttemptPlan {
    let input = || {
        vec![
            s("-y"),
            s("-f"),
            s("concat"),
            s("-safe"),
            s("0"),
            s("-i"),
            path_arg(manifest),
        ]
    };

    let mut copy = input();
    copy.extend([s("-c"), s("copy"), path_arg(output)]);

    let mut encode = input();
    encode.extend(profile.video_args());
    encode.extend(profile.audio_args());
    encode.push(path_arg(output));

    AttemptPlan::new(Stage::Concat, output)
        .then(Attempt::new("stream copy", copy))
        .then(Attempt::new("re-encode", encode))
}

/// Subtitles as a `mov_text` track; missing audio or subtitle streams are
/// tolerated.
pub fn embed_plan(video: &Path, subtitles: &Path, output: &Path) -> AttemptPlan {
    let args = vec![
        s("-y"),
        s("-i"),
        path_arg(video),
        s("-i"),
        path_arg(subtitles),
        s("-c"),
        s("copy"),
        s("-c:s"),
        s("mov_text"),
        s("-map"),
        s("0:v"),
        s("-map"),
        s("0:a?"),
        s("-map"),
        s("1:s:0?"),
        path_arg(output),
    ];

    AttemptPlan::new(Stage::EmbedSubtitles, output).then(Attempt::new("mov_text track", args))
}

/// `ass` filter on the absolute path, then `subtitles=subs.srt` from inside
/// the workspace.
pub fn burn_plan(
    profile: &EncodingProfile,
    video: &Path,
    subtitles: &Path,
    work_dir: &Path,
    output: &Path,
) -> AttemptPlan {
    let args_with = |filter: String| {
        let mut args = vec![s("-y"), s("-i"), path_arg(video), s("-vf"), filter];
        args.extend(profile.video_args());
        args.extend([s("-c:a"), s("copy"), path_arg(output)]);
        args
    };

    let absolute = std::path::absolute(subtitles).unwrap_or_else(|_| subtitles.to_path_buf());
    let primary = args_with(format!("ass='{}'", escape_filter_path(&absolute)));
    let fallback = args_with(format!("subtitles={}", FALLBACK_SUBS_NAME));

    AttemptPlan::new(Stage::BurnSubtitles, output)
        .then(Attempt::new("ass filter", primary))
        .then(
            Attempt::new("subtitles filter in workspace", fallback)
                .with_working_dir(work_dir)
                .with_preparation(Preparation::CopyFile {
                    from: subtitles.to_path_buf(),
                    to: work_dir.join(FALLBACK_SUBS_NAME),
                }),
        )
}

/// How background music is combined with the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixStrategy {
    /// Attenuated BGM mixed with the original audio, cut to the shorter.
    WithOriginalAudio,
    /// Attenuated BGM is the only audio, cut to the video.
    BgmOnly,
}

/// Clamp a BGM volume into [0.0, 2.0]. NaN becomes 0.0.
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 2.0)
    }
}

pub fn mix_plan(
    profile: &EncodingProfile,
    video: &Path,
    bgm: &Path,
    volume: f64,
    strategy: MixStrategy,
    output: &Path,
) -> AttemptPlan {
    let volume = clamp_volume(volume);
    let filter = match strategy {
        MixStrategy::WithOriginalAudio => format!(
            "[1:a]volume={}[bgm];[0:a][bgm]amix=inputs=2:duration=shortest:dropout_transition=2[aout]",
            volume
        ),
        MixStrategy::BgmOnly => format!("[1:a]volume={}[aout]", volume),
    };

    let mut args = vec![
        s("-y"),
        s("-i"),
        path_arg(video),
        s("-i"),
        path_arg(bgm),
        s("-filter_complex"),
        filter,
        s("-map"),
        s("0:v"),
        s("-map"),
        s("[aout]"),
        s("-c:v"),
        s("copy"),
    ];
    args.extend(profile.audio_codec_args());
    if strategy == MixStrategy::BgmOnly {
        args.push(s("-shortest"));
    }
    args.push(path_arg(output));

    let label = match strategy {
        MixStrategy::WithOriginalAudio => "amix with original audio",
        MixStrategy::BgmOnly => "bgm as sole audio",
    };
    AttemptPlan::new(Stage::MixAudio, output).then(Attempt::new(label, args))
}

/// Mono PCM at `sample_rate`, no video.
pub fn extract_audio_plan(video: &Path, sample_rate: u32, output: &Path) -> AttemptPlan {
    let args = vec![
        s("-y"),
        s("-i"),
        path_arg(video),
        s("-ac"),
        s("1"),
        s("-ar"),
        sample_rate.to_string(),
        s("-vn"),
        path_arg(output),
    ];
    AttemptPlan::new(Stage::ExtractAudio, output).then(Attempt::new("mono pcm", args))
}

/// Escape a path for use inside a single-quoted ffmpeg filter argument.
///
/// Backslashes become forward slashes and `'` is closed, escaped and reopened.
pub fn escape_filter_path(path: &Path) -> String {
    path_arg(path).replace('\\', "/").replace('\'', r"'\''")
}

/// Concat demuxer manifest: one `file '<path>'` line per input.
pub fn concat_manifest(inputs: &[MediaFile]) -> String {
    inputs
        .iter()
        .map(|f| format!("file '{}'\n", escape_filter_path(f.path())))
        .collect()
}

pub fn write_concat_manifest(inputs: &[MediaFile], path: &Path) -> io::Result<()> {
    fs::write(path, concat_manifest(inputs))
}

/// Runs transcoding stages against one engine with one profile.
#[derive(Clone, Copy)]
pub struct Transcoder<'a> {
    engine: &'a dyn MediaEngine,
    profile: &'a EncodingProfile,
    logger: &'a RunLogger,
    journal: Option<&'a StageJournal>,
}

impl<'a> Transcoder<'a> {
    pub fn new(engine: &'a dyn MediaEngine, profile: &'a EncodingProfile, logger: &'a RunLogger) -> Self {
        Self {
            engine,
            profile,
            logger,
            journal: None,
        }
    }

    /// Record every successful stage in `journal`.
    pub fn with_journal(mut self, journal: &'a StageJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn profile(&self) -> &EncodingProfile {
        self.profile
    }

    fn run(&self, plan: AttemptPlan) -> Result<MediaFile, TranscodeError> {
        let success = run_plan(self.engine, &plan, self.logger)?;
        if success.used_fallback() {
            self.logger.success(&format!(
                "{} succeeded with fallback '{}'",
                plan.stage, success.label
            ));
        }
        if let Some(journal) = self.journal {
            journal.record(StageRun::from_success(&success));
        }
        Ok(success.file)
    }

    pub fn normalize(&self, input: &Path, output: &Path) -> Result<MediaFile, TranscodeError> {
        self.run(normalize_plan(self.profile, input, output))
    }

    /// Normalize every input into `work_dir`, keeping input order.
    ///
    /// With `jobs > 1` clips are encoded on a dedicated pool of that size.
    pub fn normalize_all(
        &self,
        inputs: &[PathBuf],
        work_dir: &Path,
        jobs: usize,
    ) -> Result<Vec<MediaFile>, TranscodeError> {
        let task = |(index, input): (usize, &PathBuf)| {
            self.logger.info(&format!(
                "Normalizing [{}/{}] {}",
                index + 1,
                inputs.len(),
                input.display()
            ));
            self.normalize(input, &work_dir.join(normalized_name(index)))
        };

        if jobs <= 1 || inputs.len() < 2 {
            return inputs.iter().enumerate().map(task).collect();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.min(inputs.len()))
            .build()
        {
            Ok(pool) => pool.install(|| inputs.par_iter().enumerate().map(task).collect()),
            Err(e) => {
                self.logger
                    .warn(&format!("Could not start {} workers ({}); normalizing serially", jobs, e));
                inputs.iter().enumerate().map(task).collect()
            }
        }
    }

    pub fn concat(&self, manifest: &Path, output: &Path) -> Result<MediaFile, TranscodeError> {
        self.run(concat_plan(self.profile, manifest, output))
    }

    pub fn embed_soft_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        output: &Path,
    ) -> Result<MediaFile, TranscodeError> {
        self.run(embed_plan(video, subtitles, output))
    }

    pub fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        work_dir: &Path,
        output: &Path,
    ) -> Result<MediaFile, TranscodeError> {
        self.run(burn_plan(self.profile, video, subtitles, work_dir, output))
    }

    /// Mix `bgm` under the video's audio, or use it as the only audio when
    /// the video has none.
    pub fn mix_audio(
        &self,
        video: &Path,
        bgm: &Path,
        volume: f64,
        output: &Path,
    ) -> Result<(MediaFile, MixStrategy), TranscodeError> {
        let strategy = if MediaProbe::new(self.engine).has_audio(video) {
            MixStrategy::WithOriginalAudio
        } else {
            MixStrategy::BgmOnly
        };
        self.logger.info(&format!(
            "Mixing {} at volume {} ({:?})",
            bgm.display(),
            clamp_volume(volume),
            strategy
        ));

        let file = self.run(mix_plan(self.profile, video, bgm, volume, strategy, output))?;
        Ok((file, strategy))
    }

    pub fn extract_audio(
        &self,
        video: &Path,
        sample_rate: u32,
        output: &Path,
    ) -> Result<MediaFile, TranscodeError> {
        self.run(extract_audio_plan(video, sample_rate, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Invocation, ScriptedEngine, Tool};
    use tempfile::tempdir;

    fn strs(args: &[String]) -> Vec<&str> {
        args.iter().map(String::as_str).collect()
    }

    #[test]
    fn normalize_args() {
        let plan = normalize_plan(
            &EncodingProfile::default(),
            Path::new("in.mov"),
            Path::new("/w/norm_000.mp4"),
        );
        assert_eq!(
            strs(&plan.attempts[0].args),
            vec![
                "-y",
                "-i",
                "in.mov",
                "-vf",
                "scale='min(1920,iw)':'min(1080,ih)':force_original_aspect_ratio=decrease,fps=30,format=yuv420p",
                "-c:v",
                "libx264",
                "-preset",
                "medium",
                "-crf",
                "20",
                "-c:a",
                "aac",
                "-b:a",
                "192k",
                "-ac",
                "2",
                "/w/norm_000.mp4",
            ]
        );
    }

    #[test]
    fn concat_tries_copy_then_reencode() {
        let plan = concat_plan(
            &EncodingProfile::default(),
            Path::new("/w/concat.txt"),
            Path::new("/w/merged.mp4"),
        );
        assert_eq!(plan.attempts.len(), 2);
        assert_eq!(
            strs(&plan.attempts[0].args),
            vec!["-y", "-f", "concat", "-safe", "0", "-i", "/w/concat.txt", "-c", "copy", "/w/merged.mp4"]
        );
        let encode = &plan.attempts[1].args;
        assert!(encode.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(!encode.iter().any(|a| a == "copy"));
    }

    #[test]
    fn embed_maps_optional_streams() {
        let plan = embed_plan(Path::new("v.mp4"), Path::new("s.srt"), Path::new("subbed.mp4"));
        assert_eq!(
            strs(&plan.attempts[0].args),
            vec![
                "-y", "-i", "v.mp4", "-i", "s.srt", "-c", "copy", "-c:s", "mov_text", "-map", "0:v",
                "-map", "0:a?", "-map", "1:s:0?", "subbed.mp4",
            ]
        );
    }

    #[test]
    fn burn_fallback_runs_from_workspace() {
        let plan = burn_plan(
            &EncodingProfile::default(),
            Path::new("/w/merged.mp4"),
            Path::new("/w/it's.srt"),
            Path::new("/w"),
            Path::new("/w/burned.mp4"),
        );

        let primary = &plan.attempts[0];
        assert!(primary.args.contains(&r"ass='/w/it'\''s.srt'".to_string()));
        assert!(primary.working_dir.is_none());

        let fallback = &plan.attempts[1];
        assert!(fallback.args.contains(&"subtitles=subs.srt".to_string()));
        assert_eq!(fallback.working_dir.as_deref(), Some(Path::new("/w")));
        assert_eq!(
            fallback.preparation,
            Some(Preparation::CopyFile {
                from: PathBuf::from("/w/it's.srt"),
                to: PathBuf::from("/w/subs.srt"),
            })
        );
        for attempt in &plan.attempts {
            assert!(attempt.args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "copy"));
        }
    }

    #[test]
    fn mix_with_audio_uses_amix_shortest() {
        let plan = mix_plan(
            &EncodingProfile::default(),
            Path::new("v.mp4"),
            Path::new("bgm.mp3"),
            0.15,
            MixStrategy::WithOriginalAudio,
            Path::new("mixed.mp4"),
        );
        let args = &plan.attempts[0].args;
        assert!(args.contains(
            &"[1:a]volume=0.15[bgm];[0:a][bgm]amix=inputs=2:duration=shortest:dropout_transition=2[aout]"
                .to_string()
        ));
        assert!(!args.contains(&"-shortest".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "copy"));
    }

    #[test]
    fn mix_without_audio_routes_bgm_alone() {
        let plan = mix_plan(
            &EncodingProfile::default(),
            Path::new("v.mp4"),
            Path::new("bgm.mp3"),
            5.0,
            MixStrategy::BgmOnly,
            Path::new("mixed.mp4"),
        );
        let args = strs(&plan.attempts[0].args);
        assert!(args.contains(&"[1:a]volume=2[aout]"));
        assert!(args.contains(&"-shortest"));
        assert!(!args.iter().any(|a| a.contains("amix")));
        assert!(!args.iter().any(|a| a.starts_with("-filter:a")));
    }

    #[test]
    fn volume_is_clamped() {
        assert_eq!(clamp_volume(-1.0), 0.0);
        assert_eq!(clamp_volume(3.0), 2.0);
        assert_eq!(clamp_volume(0.4), 0.4);
        assert_eq!(clamp_volume(f64::NAN), 0.0);
    }

    #[test]
    fn extract_audio_args() {
        let plan = extract_audio_plan(Path::new("m.mp4"), 16000, Path::new("audio.wav"));
        assert_eq!(
            strs(&plan.attempts[0].args),
            vec!["-y", "-i", "m.mp4", "-ac", "1", "-ar", "16000", "-vn", "audio.wav"]
        );
    }

    #[test]
    fn manifest_escapes_quotes_and_backslashes() {
        let inputs = vec![
            MediaFile::new("/w/norm_000.mp4", Stage::Normalize),
            MediaFile::new(r"C:\w\it's.mp4", Stage::Normalize),
        ];
        assert_eq!(
            concat_manifest(&inputs),
            "file '/w/norm_000.mp4'\nfile 'C:/w/it'\\''s.mp4'\n"
        );
    }

    #[test]
    fn mix_strategy_follows_audio_probe() {
        let dir = tempdir().unwrap();
        let silent = dir.path().join("silent.mp4");
        let out = dir.path().join("mixed.mp4");
        let engine = ScriptedEngine::new().with_audio(&silent, false);
        let logger = RunLogger::detached("mix");
        let profile = EncodingProfile::default();
        let transcoder = Transcoder::new(&engine, &profile, &logger);

        let (_, strategy) = transcoder
            .mix_audio(&silent, Path::new("bgm.mp3"), 0.15, &out)
            .unwrap();
        assert_eq!(strategy, MixStrategy::BgmOnly);

        let (_, strategy) = transcoder
            .mix_audio(Path::new("loud.mp4"), Path::new("bgm.mp3"), 0.15, &out)
            .unwrap();
        assert_eq!(strategy, MixStrategy::WithOriginalAudio);
    }

    #[test]
    fn parallel_normalize_keeps_order() {
        let dir = tempdir().unwrap();
        let engine = ScriptedEngine::new();
        let logger = RunLogger::detached("norm");
        let profile = EncodingProfile::default();
        let transcoder = Transcoder::new(&engine, &profile, &logger);

        let inputs: Vec<PathBuf> = (0..6).map(|i| PathBuf::from(format!("clip{}.mp4", i))).collect();
        let outputs = transcoder.normalize_all(&inputs, dir.path(), 3).unwrap();

        for (i, file) in outputs.iter().enumerate() {
            assert_eq!(file.path(), dir.path().join(normalized_name(i)));
            assert!(file.path().exists());
        }
        let calls: Vec<Invocation> = engine.transcode_calls();
        assert_eq!(calls.len(), 6);
        assert!(calls.iter().all(|c| c.tool == Tool::Ffmpeg));
    }
}
