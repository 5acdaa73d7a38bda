//! Canonical encoding parameters.

use serde::{Deserialize, Serialize};

/// Parameters shared by normalize, the concat re-encode fallback, burn-in
/// and audio mixing.
///
/// Stored as the `[encoding]` section of the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingProfile {
    pub video_codec: String,
    pub preset: String,
    pub crf: u32,
    pub fps: u32,
    /// Frames wider than this are scaled down, keeping aspect ratio.
    pub max_width: u32,
    pub max_height: u32,
    pub pixel_format: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub audio_channels: u32,
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 20,
            fps: 30,
            max_width: 1920,
            max_height: 1080,
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            audio_channels: 2,
        }
    }
}

impl EncodingProfile {
    /// The `-vf` chain used by normalize.
    pub fn video_filter(&self) -> String {
        format!(
            "scale='min({},iw)':'min({},ih)':force_original_aspect_ratio=decrease,fps={},format={}",
            self.max_width, self.max_height, self.fps, self.pixel_format
        )
    }

    /// `-c:v CODEC -preset P -crf C`
    pub fn video_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
        ]
    }

    /// `-c:a CODEC -b:a BR -ac CH`
    pub fn audio_args(&self) -> Vec<String> {
        let mut args = self.audio_codec_args();
        args.push("-ac".to_string());
        args.push(self.audio_channels.to_string());
        args
    }

    /// `-c:a CODEC -b:a BR`
    pub fn audio_codec_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}
