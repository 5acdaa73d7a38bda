//! vmerge core - clip assembly pipeline.
//!
//! Normalizes and concatenates a directory of clips, merges per-clip SRT
//! subtitles onto the concatenated timeline, burns or embeds them, optionally
//! generates captions through a speech-to-text service, and mixes in
//! background music. All media work is delegated to ffmpeg/ffprobe through
//! the [`media::MediaEngine`] trait.
//!
//! This crate has no CLI dependencies; the `vmerge` binary is a thin layer
//! over [`orchestrator::Runner`].

pub mod captions;
pub mod config;
pub mod discovery;
pub mod logging;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod subtitles;
pub mod transcode;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
