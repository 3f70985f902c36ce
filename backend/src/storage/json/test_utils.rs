//! Test utilities for filesystem-backed storage tests
//!
//! Provides an RAII environment whose temporary data directory is removed
//! when the environment is dropped, even if the test panics.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use super::connection::JsonConnection;
use super::key_value_repository::FileKeyValueRepository;
use crate::storage::traits::KeyValueStorage;

/// RAII test environment that cleans up on drop
pub struct TestEnvironment {
    /// The temporary directory - kept alive until drop
    _temp_dir: TempDir,
    pub connection: JsonConnection,
    pub repository: FileKeyValueRepository,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    /// Create a new test environment with automatic cleanup
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = JsonConnection::new(&base_path)?;
        let repository = FileKeyValueRepository::new(connection.clone());

        Ok(Self {
            _temp_dir: temp_dir,
            connection,
            repository,
            base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_path
    }

    /// The repository as a shareable trait object
    pub fn storage(&self) -> Arc<dyn KeyValueStorage> {
        Arc::new(self.repository.clone())
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        if std::env::var("HABIT_TRACKER_DEBUG_TESTS").is_ok() {
            println!("🧹 Cleaning up test environment: {:?}", self.base_path);
        }
    }
}
