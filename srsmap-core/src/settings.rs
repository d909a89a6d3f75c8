//! Application settings shared by the CLI and the GUI
//!
//! Settings are an explicit value owned by the application and passed to the
//! parts that need them. Every change goes through a method on `Settings`.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::SettingsError;
use crate::filter::ParentMatchChildren;
use crate::source::{SourceConfig, SourceKind};
use crate::tree_view::DEFAULT_INDENT;

/// Overrides the REST base URL (and selects the REST source)
pub const ENV_API_URL: &str = "SRSMAP_API_URL";
/// Overrides the mapping file (and selects the file source)
pub const ENV_FILE: &str = "SRSMAP_FILE";

const SETTINGS_DIR: &str = "srsmap";
const SETTINGS_FILE: &str = "settings.yaml";

fn default_indent() -> f32 {
    DEFAULT_INDENT
}

fn default_notice_secs() -> u64 {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Dark color theme
    #[serde(default)]
    dark_mode: bool,
    /// Where entries are loaded from
    #[serde(default)]
    source: SourceConfig,
    /// Children of an entry that matches the filter itself
    #[serde(default)]
    parent_match_children: ParentMatchChildren,
    /// Tree indentation per depth level, in points
    #[serde(default = "default_indent")]
    indent_per_level: f32,
    /// Lifetime of transient notices
    #[serde(default = "default_notice_secs")]
    notice_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            source: SourceConfig::default(),
            parent_match_children: ParentMatchChildren::default(),
            indent_per_level: DEFAULT_INDENT,
            notice_secs: default_notice_secs(),
        }
    }
}

impl Settings {
    /// Default settings file location
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    /// Loads settings from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Loads settings from a file, or returns defaults if it is missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Ignoring unreadable settings file {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Saves settings to the default location
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Saves settings to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let yaml = serde_yaml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, yaml).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `SRSMAP_API_URL` / `SRSMAP_FILE` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(env::var(ENV_API_URL).ok(), env::var(ENV_FILE).ok());
    }

    /// Applies explicit overrides; a file wins over a URL when both are given
    pub fn apply_overrides(&mut self, api_url: Option<String>, file: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.is_empty()) {
            self.set_http_source(url);
        }
        if let Some(file) = file.filter(|f| !f.is_empty()) {
            self.set_file_source(PathBuf::from(file));
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    pub fn parent_match_children(&self) -> ParentMatchChildren {
        self.parent_match_children
    }

    pub fn indent_per_level(&self) -> f32 {
        self.indent_per_level
    }

    pub fn notice_secs(&self) -> u64 {
        self.notice_secs
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Flips the theme and returns the new value
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    pub fn set_parent_match_children(&mut self, policy: ParentMatchChildren) {
        self.parent_match_children = policy;
    }

    pub fn set_indent_per_level(&mut self, indent: f32) {
        self.indent_per_level = indent.clamp(0.0, 64.0);
    }

    pub fn set_source_kind(&mut self, kind: SourceKind) {
        self.source.kind = kind;
    }

    pub fn set_http_source(&mut self, base_url: impl Into<String>) {
        self.source.kind = SourceKind::Http;
        self.source.base_url = base_url.into();
    }

    pub fn set_file_source(&mut self, path: PathBuf) {
        self.source.kind = SourceKind::File;
        self.source.path = Some(path);
    }

    pub fn set_collection_id(&mut self, collection_id: impl Into<String>) {
        self.source.collection_id = collection_id.into();
    }

    pub fn set_timeout_secs(&mut self, secs: u64) {
        self.source.timeout_secs = secs.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.dark_mode());
        assert_eq!(settings.source().kind, SourceKind::Sample);
        assert_eq!(settings.source().collection_id, "1");
        assert_eq!(settings.parent_match_children(), ParentMatchChildren::KeepAll);
        assert_eq!(settings.notice_secs(), 2);
    }

    #[test]
    fn test_toggle_dark_mode() {
        let mut settings = Settings::default();
        assert!(settings.toggle_dark_mode());
        assert!(settings.dark_mode());
        assert!(!settings.toggle_dark_mode());
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("settings.yaml");

        let mut settings = Settings::default();
        settings.toggle_dark_mode();
        settings.set_http_source("http://localhost:8080");
        settings.set_parent_match_children(ParentMatchChildren::Refilter);
        settings.save_to(&path)?;

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, settings);
        Ok(())
    }

    #[test]
    fn test_missing_and_partial_files() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(Settings::load_from(&dir.path().join("none.yaml")), Settings::default());

        let path = dir.path().join("partial.yaml");
        std::fs::write(&path, "dark_mode: true\n")?;
        let loaded = Settings::load_from(&path);
        assert!(loaded.dark_mode());
        assert_eq!(loaded.indent_per_level(), DEFAULT_INDENT);

        std::fs::write(&path, "dark_mode: [not, a, bool]\n")?;
        assert_eq!(Settings::load_from(&path), Settings::default());
        Ok(())
    }

    #[test]
    fn test_overrides() {
        let mut settings = Settings::default();
        settings.apply_overrides(Some("https://srs.internal".to_string()), None);
        assert_eq!(settings.source().kind, SourceKind::Http);
        assert_eq!(settings.source().base_url, "https://srs.internal");

        settings.apply_overrides(Some("https://other".to_string()), Some("map.yaml".to_string()));
        assert_eq!(settings.source().kind, SourceKind::File);
        assert_eq!(settings.source().path, Some(PathBuf::from("map.yaml")));

        let before = settings.clone();
        settings.apply_overrides(Some(String::new()), None);
        assert_eq!(settings.source().base_url, "https://other");
        assert_eq!(settings.source().kind, before.source().kind);
    }
}
