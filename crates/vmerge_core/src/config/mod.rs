//! Configuration management.
//!
//! This module provides:
//! - TOML-based configuration with one table per concern
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only the changed table is rewritten)
//!
//! # Example
//!
//! ```no_run
//! use vmerge_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Clips from: {}", config.settings().paths.video_dir.display());
//!
//! config.settings_mut().subtitles.burn_in = true;
//! config.update_section(ConfigSection::Subtitles).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    CaptionSettings, ConfigSection, InputSettings, MixSettings, PathSettings, PipelineSettings,
    Settings, SubtitleSettings, ToolSettings,
};
