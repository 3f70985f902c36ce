//! # Habit Tracker Backend
//!
//! Contains all non-UI logic for the habit tracker.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (command line)
//!     ↓
//! Domain Layer (HabitStore, CalendarService, PersistenceService, ToastQueue)
//!     ↓
//! Storage Layer (KeyValueStorage: JSON files or memory)
//! ```
//!
//! The binary loads an [`config::AppConfig`], calls [`initialize_backend`]
//! and hands the resulting [`AppState`] to the command line layer.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use log::info;
use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::{CalendarService, HabitStore, PersistenceService, ToastQueue};
use crate::storage::{FileKeyValueRepository, JsonConnection, KeyValueStorage};

/// Main application state that holds all services
pub struct AppState {
    pub habit_store: HabitStore,
    pub toast_queue: ToastQueue,
    pub calendar_service: CalendarService,
    pub config: AppConfig,
}

impl AppState {
    /// Wire the services over an arbitrary storage backend and load saved data
    pub fn with_storage(
        config: AppConfig,
        storage: Arc<dyn KeyValueStorage>,
        calendar_service: CalendarService,
    ) -> Self {
        let persistence = PersistenceService::with_key(
            storage,
            config.storage_key.clone(),
            calendar_service.clone(),
        );
        let mut habit_store = HabitStore::new(persistence, calendar_service.clone());
        habit_store.load_from_storage();

        Self {
            habit_store,
            toast_queue: ToastQueue::new(),
            calendar_service,
            config,
        }
    }
}

/// Initialize the backend with file storage in the configured data directory
pub fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    let data_directory = config.resolve_data_directory()?;
    initialize_backend_at(config, &data_directory)
}

/// Initialize the backend with file storage in an explicit data directory
pub fn initialize_backend_at(config: &AppConfig, data_directory: &Path) -> Result<AppState> {
    info!("📁 Setting up storage in {:?}", data_directory);
    let connection = JsonConnection::new(data_directory)?;
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileKeyValueRepository::new(connection));

    info!("Setting up domain model");
    let app_state = AppState::with_storage(config.clone(), storage, CalendarService::new());
    info!(
        "✅ Backend ready with {} habits",
        app_state.habit_store.habits().len()
    );

    Ok(app_state)
}
