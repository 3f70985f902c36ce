//! # File Key-Value Repository
//!
//! Stores each key as a JSON file in the data directory:
//!
//! ```text
//! data/
//! └── habit-tracker-data.json    ← one file per storage key
//! ```
//!
//! Writes go to a temp file first and are renamed into place, so a value is
//! always either the old blob or the new blob, never a partial one.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::io::ErrorKind;

use super::connection::JsonConnection;
use crate::storage::traits::KeyValueStorage;

/// File-backed key-value repository
#[derive(Debug, Clone)]
pub struct FileKeyValueRepository {
    connection: JsonConnection,
}

impl FileKeyValueRepository {
    /// Create a new repository on top of a connection
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

impl KeyValueStorage for FileKeyValueRepository {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.connection.key_file_path(key);

        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!("Read {} bytes from {:?}", content.len(), path);
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.connection.key_file_path(key);
        let base_dir = self.connection.base_directory();

        if !base_dir.exists() {
            fs::create_dir_all(base_dir)?;
        }

        // Atomic write: temp file, then rename over the target
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to move {} into place", path.display()))?;

        debug!("Saved {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.connection.key_file_path(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}
