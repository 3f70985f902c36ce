//! # Application Configuration
//!
//! A single YAML file holds the settings that decide where data lives:
//!
//! ```yaml
//! data_directory: "/home/me/.local/share/habit-tracker"
//! storage_key: "habit-tracker-data"
//! export_directory: null
//! log_level: "info"
//! ```
//!
//! The file is created with defaults on first use and written atomically
//! (temp file, then rename). `$HABIT_TRACKER_DATA_DIR` overrides the data
//! directory without editing the file.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::persistence_service::DEFAULT_STORAGE_KEY;
use crate::storage::json::connection::JsonConnection;

/// Application configuration loaded from `config.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the stored blob; platform data dir when unset
    pub data_directory: Option<PathBuf>,
    /// Key (file stem) the habit blob is stored under
    pub storage_key: String,
    /// Where exports are written; current directory when unset
    pub export_directory: Option<PathBuf>,
    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            export_directory: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Default location: `<config_dir>/habit-tracker/config.yaml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine a configuration directory"))?;
        Ok(config_dir.join("habit-tracker").join("config.yaml"))
    }

    /// Load the configuration at `path`, creating it with defaults if missing.
    ///
    /// The flag is true when the file was created by this call. Loading runs
    /// before logging is configured, so callers report the creation later.
    pub fn load_or_create(path: &Path) -> Result<(Self, bool)> {
        if path.exists() {
            let yaml_content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config: AppConfig = serde_yaml::from_str(&yaml_content)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            Ok((config, false))
        } else {
            let config = AppConfig::default();
            config.save(path)?;
            Ok((config, true))
        }
    }

    /// Write the configuration to `path` atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml_content = serde_yaml::to_string(self)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, path)?;

        debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Resolve the data directory: environment override, then config, then platform default
    pub fn resolve_data_directory(&self) -> Result<PathBuf> {
        if let Some(dir) = JsonConnection::data_directory_override() {
            return Ok(dir);
        }

        match &self.data_directory {
            Some(dir) => Ok(dir.clone()),
            None => JsonConnection::default_data_directory(),
        }
    }

    /// Resolve the export directory, defaulting to the current directory
    pub fn resolve_export_directory(&self) -> PathBuf {
        self.export_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_or_create_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        let (config, created) = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(created);
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let (reloaded, created) = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(reloaded, config);
        assert!(!created);
    }

    #[test]
    fn test_load_existing_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(
            &path,
            "data_directory: /tmp/habits\nstorage_key: custom\nlog_level: debug\n",
        )
        .unwrap();

        let (config, created) = AppConfig::load_or_create(&path).unwrap();
        assert!(!created);
        assert_eq!(config.data_directory, Some(PathBuf::from("/tmp/habits")));
        assert_eq!(config.storage_key, "custom");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.export_directory, None);
    }

    #[test]
    fn test_save_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        let config = AppConfig {
            export_directory: Some(PathBuf::from("/tmp/exports")),
            ..AppConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(AppConfig::load_or_create(&path).unwrap(), (config, false));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "storage_key: [unclosed").unwrap();
        assert!(AppConfig::load_or_create(&path).is_err());
    }

    #[test]
    fn test_resolve_export_directory_default() {
        assert_eq!(AppConfig::default().resolve_export_directory(), PathBuf::from("."));
    }
}
