use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the default data directory
pub const DATA_DIR_ENV: &str = "HABIT_TRACKER_DATA_DIR";

/// JsonConnection manages the data directory and maps storage keys to files
#[derive(Debug, Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
}

impl JsonConnection {
    /// Create a new connection rooted at `base_directory`, creating it if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).with_context(|| {
                format!("Failed to create data directory {}", base_path.display())
            })?;
            info!("📁 Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Resolve the default data directory without creating it
    pub fn default_data_directory() -> Result<PathBuf> {
        if let Some(dir) = Self::data_directory_override() {
            return Ok(dir);
        }

        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine a data directory"))?;
        Ok(data_dir.join("habit-tracker"))
    }

    /// Data directory named by `$HABIT_TRACKER_DATA_DIR`, if set and non-blank
    pub fn data_directory_override() -> Option<PathBuf> {
        let dir = std::env::var(DATA_DIR_ENV).ok()?;
        let dir = dir.trim();
        if dir.is_empty() {
            return None;
        }
        debug!("Using data directory from {}: {}", DATA_DIR_ENV, dir);
        Some(PathBuf::from(dir))
    }

    /// Get the base directory path
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Get the file that holds the value for a storage key
    pub fn key_file_path(&self, key: &str) -> PathBuf {
        self.base_directory
            .join(format!("{}.json", Self::safe_file_stem(key)))
    }

    /// Convert a storage key into a filesystem-safe file stem.
    /// "habit-tracker-data" stays as is, "my key/1" becomes "my_key_1".
    pub fn safe_file_stem(key: &str) -> String {
        let stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stem = stem.trim_matches('_');

        if stem.is_empty() {
            "_".to_string()
        } else {
            stem.to_string()
        }
    }
}
