//! Config manager for loading, saving, and atomic updates.
//!
//! - Atomic writes (write to temp file, then rename)
//! - Section-level updates that keep comments elsewhere in the file
//! - Missing keys are filled in from defaults on `load_or_create`

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use toml_edit::{DocumentMut, Item, Table};

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the settings file and the settings loaded from it.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Does not touch the file; call `load()` or `load_or_create()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Changes stay in memory until `save()` or `update_section()`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Load config from file. Fails if the file doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = toml::from_str(&content)?;
        Ok(())
    }

    /// Load config from file, writing defaults if it doesn't exist.
    ///
    /// An existing file that lacks sections or keys is rewritten with the
    /// defaults filled in.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            self.settings = toml::from_str(&content)?;

            if self.missing_keys(&content)? {
                tracing::debug!(
                    "Filling in default keys in {}",
                    self.config_path.display()
                );
                self.save()?;
            }
        } else {
            self.settings = Settings::default();
            self.save()?;
        }
        Ok(())
    }

    /// True if any section or key of the current settings is absent from
    /// `content`.
    fn missing_keys(&self, content: &str) -> ConfigResult<bool> {
        let on_disk: DocumentMut = content.parse()?;

        for section in ConfigSection::ALL {
            let expected = self.section_table(section)?;
            let Some(present) = on_disk.get(section.table_name()).and_then(Item::as_table) else {
                return Ok(true);
            };
            if expected.iter().any(|(key, _)| !present.contains_key(key)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save the entire config atomically.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.generate_config_with_comments()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Rewrite one section on disk, leaving the rest of the file (comments
    /// included) as it is.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let current_content = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = if current_content.is_empty() {
            DocumentMut::new()
        } else {
            current_content.parse()?
        };

        doc[section.table_name()] = Item::Table(self.section_table(section)?);

        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    /// Rewrite every section whose values differ from `baseline`.
    ///
    /// Returns the sections written, in file order. Used to persist
    /// command-line overrides without disturbing untouched sections.
    pub fn update_changed_sections(
        &mut self,
        baseline: &Settings,
    ) -> ConfigResult<Vec<ConfigSection>> {
        let mut written = Vec::new();
        for section in ConfigSection::ALL {
            if section_body(&self.settings, section)? != section_body(baseline, section)? {
                self.update_section(section)?;
                written.push(section);
            }
        }
        Ok(written)
    }

    fn section_table(&self, section: ConfigSection) -> ConfigResult<Table> {
        let doc: DocumentMut = section_body(&self.settings, section)?.parse()?;
        Ok(doc.as_table().clone())
    }

    fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut output = String::new();

        output.push_str("# vmerge configuration\n");
        output.push_str("# Command-line flags override these values for a single run.\n\n");

        for section in ConfigSection::ALL {
            let mut doc = DocumentMut::new();
            doc[section.table_name()] = Item::Table(self.section_table(section)?);

            output.push_str(&format!("# {}\n", section.comment()));
            output.push_str(doc.to_string().trim_end());
            output.push_str("\n\n");
        }

        Ok(output.trim_end().to_string() + "\n")
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.config_path.with_extension("toml.tmp");

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.config_path)?;
        Ok(())
    }
}

fn section_body(s: &Settings, section: ConfigSection) -> Result<String, toml::ser::Error> {
    match section {
        ConfigSection::Paths => to_toml(&s.paths),
        ConfigSection::Inputs => to_toml(&s.inputs),
        ConfigSection::Encoding => to_toml(&s.encoding),
        ConfigSection::Mix => to_toml(&s.mix),
        ConfigSection::Subtitles => to_toml(&s.subtitles),
        ConfigSection::Captions => to_toml(&s.captions),
        ConfigSection::Pipeline => to_toml(&s.pipeline),
        ConfigSection::Tools => to_toml(&s.tools),
        ConfigSection::Logging => to_toml(&s.logging),
    }
}

fn to_toml<T: Serialize>(value: &T) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_or_create_creates_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".config").join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        for section in ConfigSection::ALL {
            assert!(content.contains(&format!("[{}]", section.table_name())));
        }
        assert!(content.contains("# Background music level"));

        let reparsed: Settings = toml::from_str(&content).unwrap();
        assert_eq!(&reparsed, manager.settings());
    }

    #[test]
    fn load_or_create_preserves_existing_and_fills_gaps() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");
        fs::write(&config_path, "[mix]\nbgm_volume = 0.4\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().mix.bgm_volume, 0.4);
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("bgm_volume = 0.4"));
        assert!(content.contains("[captions]"));
    }

    #[test]
    fn complete_file_is_not_rewritten() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        let mut content = fs::read_to_string(&config_path).unwrap();
        content.push_str("# hand-written note\n");
        fs::write(&config_path, &content).unwrap();

        let mut again = ConfigManager::new(&config_path);
        again.load_or_create().unwrap();
        assert!(fs::read_to_string(&config_path)
            .unwrap()
            .contains("# hand-written note"));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("absent.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn update_section_only_changes_target() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        manager.settings_mut().subtitles.burn_in = true;
        manager.settings_mut().mix.bgm_volume = 0.9;
        manager.update_section(ConfigSection::Subtitles).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("burn_in = true"));
        assert!(content.contains("bgm_volume = 0.15"));
        assert!(content.contains("# Speech-to-text when no subtitle files exist"));
    }

    #[test]
    fn only_changed_sections_are_written() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();
        let mut content = fs::read_to_string(&config_path).unwrap();
        content.push_str("# hand-written note\n");
        fs::write(&config_path, &content).unwrap();

        let baseline = manager.settings().clone();
        manager.settings_mut().mix.bgm_volume = 0.6;
        manager.settings_mut().pipeline.keep_temp = true;

        let written = manager.update_changed_sections(&baseline).unwrap();
        assert_eq!(written, vec![ConfigSection::Mix, ConfigSection::Pipeline]);

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("bgm_volume = 0.6"));
        assert!(content.contains("keep_temp = true"));
        assert!(content.contains("# hand-written note"));

        let unchanged = manager.settings().clone();
        assert!(manager.update_changed_sections(&unchanged).unwrap().is_empty());
    }

    #[test]
    fn atomic_write_creates_no_temp_on_success() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(!config_path.with_extension("toml.tmp").exists());
    }
}
