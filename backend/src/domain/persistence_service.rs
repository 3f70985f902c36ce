//! Persistence domain logic for the habit tracker.
//!
//! Loads and saves the complete application blob ([`StorageData`]) under a
//! single storage key, and moves it in and out of standalone JSON files for
//! export and import.
//!
//! Failure policy:
//! - **load/save**: storage and parse failures are logged and swallowed;
//!   `load` falls back to the default blob, `save` leaves the in-memory
//!   state as the only copy until the next successful save.
//! - **import**: read, parse and validation failures are surfaced as
//!   [`ImportError`] and nothing is persisted.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use shared::{Habit, Settings, StorageData};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::calendar::CalendarService;
use crate::storage::KeyValueStorage;

/// Storage key the blob lives under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "habit-tracker-data";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Error reading file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Invalid data format: habits array is required")]
    MissingHabits,
    #[error("Invalid habit format: id and name are required (habit #{index})")]
    InvalidHabit { index: usize },
    #[error("Duplicate habit id {id} (habit #{index})")]
    DuplicateId { id: String, index: usize },
    #[error("Invalid habit data: {0}")]
    InvalidHabitData(#[source] serde_json::Error),
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[source] serde_json::Error),
}

/// Service that persists the application blob
#[derive(Clone)]
pub struct PersistenceService {
    storage: Arc<dyn KeyValueStorage>,
    storage_key: String,
    calendar: CalendarService,
}

impl PersistenceService {
    /// Create a new PersistenceService using the default storage key
    pub fn new(storage: Arc<dyn KeyValueStorage>, calendar: CalendarService) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY, calendar)
    }

    /// Create a PersistenceService storing the blob under `storage_key`
    pub fn with_key(
        storage: Arc<dyn KeyValueStorage>,
        storage_key: impl Into<String>,
        calendar: CalendarService,
    ) -> Self {
        Self {
            storage,
            storage_key: storage_key.into(),
            calendar,
        }
    }

    /// Load the stored blob, falling back to defaults on any failure
    pub fn load(&self) -> StorageData {
        let raw = match self.storage.get_item(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored data under '{}', using defaults", self.storage_key);
                return StorageData::default();
            }
            Err(e) => {
                error!("❌ Error loading data from storage: {:#}", e);
                return StorageData::default();
            }
        };

        let parsed = serde_json::from_str::<Value>(&raw).and_then(merge_over_defaults);
        match parsed {
            Ok(data) => {
                debug!("📂 Loaded {} habits from storage", data.habits.len());
                data
            }
            Err(e) => {
                error!("❌ Error parsing stored data, using defaults: {}", e);
                StorageData::default()
            }
        }
    }

    /// Serialize and store the full blob; failures are logged, never returned
    pub fn save(&self, data: &StorageData) {
        let json = match serde_json::to_string(data) {
            Ok(json) => json,
            Err(e) => {
                error!("❌ Error serializing data: {}", e);
                return;
            }
        };

        match self.storage.set_item(&self.storage_key, &json) {
            Ok(()) => debug!("💾 Saved {} habits ({} bytes)", data.habits.len(), json.len()),
            Err(e) => error!("❌ Error saving data to storage: {:#}", e),
        }
    }

    /// The currently stored blob as pretty-printed JSON (2-space indent)
    pub fn export_to_string(&self) -> Result<String> {
        let data = self.load();
        serde_json::to_string_pretty(&data).context("Failed to serialize export")
    }

    /// File name used for an export made today, e.g. `habits-export-2025-01-15.json`
    pub fn export_file_name(&self) -> String {
        format!("habits-export-{}.json", self.calendar.today_string())
    }

    /// Write the currently stored blob to `directory` and return the file path
    pub fn export_to_file(&self, directory: &Path) -> Result<PathBuf> {
        let content = self.export_to_string()?;

        if !directory.exists() {
            fs::create_dir_all(directory).with_context(|| {
                format!("Failed to create export directory {}", directory.display())
            })?;
        }

        let path = directory.join(self.export_file_name());
        fs::write(&path, content)
            .with_context(|| format!("Failed to write export file {}", path.display()))?;

        info!("📤 Exported data to {}", path.display());
        Ok(path)
    }

    /// Read, validate and persist an export file
    pub async fn import_from_file(&self, path: &Path) -> Result<StorageData, ImportError> {
        info!("📥 Importing data from {}", path.display());

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ImportError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        self.import_from_str(&content)
    }

    /// Validate and persist export content already in memory
    pub fn import_from_str(&self, content: &str) -> Result<StorageData, ImportError> {
        let data = match parse_import(content) {
            Ok(data) => data,
            Err(e) => {
                warn!("⚠️ Import rejected: {}", e);
                return Err(e);
            }
        };

        self.save(&data);
        info!("✅ Imported {} habits", data.habits.len());
        Ok(data)
    }
}

/// Validate export content and merge its settings over the defaults
pub fn parse_import(content: &str) -> Result<StorageData, ImportError> {
    let data: Value = serde_json::from_str(content).map_err(ImportError::InvalidJson)?;

    let mut fields = match data {
        Value::Object(fields) => fields,
        _ => return Err(ImportError::MissingHabits),
    };

    let habits = match fields.remove("habits") {
        Some(Value::Array(habits)) => habits,
        _ => return Err(ImportError::MissingHabits),
    };

    let mut seen = HashSet::new();
    for (index, habit) in habits.iter().enumerate() {
        if !has_text(habit, "id") || !has_text(habit, "name") {
            return Err(ImportError::InvalidHabit { index });
        }
        if let Some(id) = habit.get("id").and_then(Value::as_str) {
            if !seen.insert(id) {
                return Err(ImportError::DuplicateId {
                    id: id.to_string(),
                    index,
                });
            }
        }
    }

    let habits: Vec<Habit> =
        serde_json::from_value(Value::Array(habits)).map_err(ImportError::InvalidHabitData)?;
    let settings = merge_settings(fields.remove("settings")).map_err(ImportError::InvalidSettings)?;

    Ok(StorageData { habits, settings })
}

fn has_text(habit: &Value, field: &str) -> bool {
    habit
        .get(field)
        .and_then(Value::as_str)
        .map(|value| !value.is_empty())
        .unwrap_or(false)
}

/// Shallow-merge a parsed blob over the defaults.
///
/// A missing `habits` key keeps the empty default; stored habits that fail
/// to decode are skipped one by one. `settings` is merged one level deeper
/// so a partial settings object keeps the default for any missing field.
fn merge_over_defaults(parsed: Value) -> Result<StorageData, serde_json::Error> {
    let mut fields = match parsed {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };

    let habits = match fields.remove("habits") {
        None => Vec::new(),
        Some(Value::Array(items)) => decode_stored_habits(items),
        Some(other) => serde_json::from_value(other)?,
    };
    let settings = merge_settings(fields.remove("settings"))?;

    Ok(StorageData { habits, settings })
}

fn decode_stored_habits(items: Vec<Value>) -> Vec<Habit> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Habit>(item) {
            Ok(habit) => Some(habit),
            Err(e) => {
                warn!("⚠️ Skipping stored habit #{}: {}", index, e);
                None
            }
        })
        .collect()
}

fn merge_settings(stored: Option<Value>) -> Result<Settings, serde_json::Error> {
    let mut settings = match serde_json::to_value(Settings::default())? {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };

    if let Some(Value::Object(stored)) = stored {
        settings.extend(stored);
    }

    serde_json::from_value(Value::Object(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::storage::json::test_utils::TestEnvironment;
    use crate::storage::MemoryStorage;
    use chrono::NaiveDate;
    use shared::Theme;
    use std::collections::BTreeMap;

    fn calendar() -> CalendarService {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        CalendarService::with_clock(Arc::new(FixedClock::at_date(date)))
    }

    fn setup_test() -> (PersistenceService, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let service = PersistenceService::new(storage.clone(), calendar());
        (service, storage)
    }

    fn sample_data() -> StorageData {
        StorageData {
            habits: vec![Habit {
                id: "m5x1abc".to_string(),
                name: "Read".to_string(),
                color: "#10b981".to_string(),
                completions: BTreeMap::from([
                    ("2025-01-13".to_string(), true),
                    ("2025-01-14".to_string(), false),
                ]),
                notes: "20 pages".to_string(),
                created_at: "2025-01-01T08:00:00.000Z".to_string(),
                updated_at: "2025-01-14T08:00:00.000Z".to_string(),
            }],
            settings: Settings {
                theme: Theme::Light,
                first_day_of_week: 0,
            },
        }
    }

    #[test]
    fn test_load_missing_key_returns_defaults() {
        let (service, _storage) = setup_test();
        let data = service.load();
        assert!(data.habits.is_empty());
        assert_eq!(data.settings.theme, Theme::Dark);
        assert_eq!(data.settings.first_day_of_week, 1);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let (service, _storage) = setup_test();
        let data = sample_data();
        service.save(&data);
        assert_eq!(service.load(), data);
    }

    #[test]
    fn test_load_corrupt_blob_returns_defaults() {
        let (service, storage) = setup_test();
        storage.set_item(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        assert_eq!(service.load(), StorageData::default());
    }

    #[test]
    fn test_load_merges_partial_settings() {
        let (service, storage) = setup_test();
        storage
            .set_item(DEFAULT_STORAGE_KEY, r#"{"habits":[],"settings":{"theme":"light"}}"#)
            .unwrap();

        let data = service.load();
        assert_eq!(data.settings.theme, Theme::Light);
        assert_eq!(data.settings.first_day_of_week, 1);
    }

    #[test]
    fn test_load_missing_habits_keeps_default() {
        let (service, storage) = setup_test();
        storage
            .set_item(DEFAULT_STORAGE_KEY, r#"{"settings":{"firstDayOfWeek":0}}"#)
            .unwrap();

        let data = service.load();
        assert!(data.habits.is_empty());
        assert_eq!(data.settings.first_day_of_week, 0);
        assert_eq!(data.settings.theme, Theme::Dark);
    }

    #[test]
    fn test_load_read_failure_returns_defaults() {
        let env = TestEnvironment::new().unwrap();
        std::fs::create_dir(env.connection.key_file_path(DEFAULT_STORAGE_KEY)).unwrap();
        let service = PersistenceService::new(env.storage(), calendar());

        assert!(env.repository.get_item(DEFAULT_STORAGE_KEY).is_err());
        assert_eq!(service.load(), StorageData::default());
    }

    #[test]
    fn test_load_skips_only_undecodable_habits() {
        let (service, storage) = setup_test();
        storage
            .set_item(
                DEFAULT_STORAGE_KEY,
                r#"{"habits":[{"id":"a1","name":"Read"},{"id":"b2","name":"Run","notes":null}],"settings":{"theme":"light"}}"#,
            )
            .unwrap();

        let data = service.load();
        assert_eq!(data.habits.len(), 1);
        assert_eq!(data.habits[0].id, "a1");
        assert_eq!(data.settings.theme, Theme::Light);
    }

    #[test]
    fn test_load_non_array_habits_returns_defaults() {
        let (service, storage) = setup_test();
        storage
            .set_item(DEFAULT_STORAGE_KEY, r#"{"habits":"oops","settings":{"theme":"light"}}"#)
            .unwrap();
        assert_eq!(service.load(), StorageData::default());
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let storage = Arc::new(MemoryStorage::with_quota(10));
        let service = PersistenceService::new(storage.clone(), calendar());

        service.save(&sample_data());
        assert!(storage.is_empty());
        assert_eq!(service.load(), StorageData::default());
    }

    #[test]
    fn test_custom_storage_key() {
        let storage = Arc::new(MemoryStorage::new());
        let service = PersistenceService::with_key(storage.clone(), "other", calendar());
        service.save(&sample_data());
        assert!(storage.get_item("other").unwrap().is_some());
        assert!(storage.get_item(DEFAULT_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_export_to_string_is_pretty_printed() {
        let (service, _storage) = setup_test();
        service.save(&sample_data());

        let json = service.export_to_string().unwrap();
        assert!(json.starts_with("{\n  \"habits\": ["));
        assert!(json.contains("\"createdAt\": \"2025-01-01T08:00:00.000Z\""));
    }

    #[test]
    fn test_export_to_file_uses_dated_name() {
        let env = TestEnvironment::new().unwrap();
        let service = PersistenceService::new(env.storage(), calendar());
        service.save(&sample_data());

        let export_dir = env.base_directory().join("exports");
        let path = service.export_to_file(&export_dir).unwrap();

        assert_eq!(path, export_dir.join("habits-export-2025-01-15.json"));
        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: StorageData = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, sample_data());
    }

    #[test]
    fn test_parse_import_rejects_non_array_habits() {
        let err = parse_import(r#"{"habits": "not-an-array"}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingHabits));
    }

    #[test]
    fn test_parse_import_rejects_missing_habits() {
        assert!(matches!(
            parse_import(r#"{"settings": {}}"#),
            Err(ImportError::MissingHabits)
        ));
        assert!(matches!(parse_import("[]"), Err(ImportError::MissingHabits)));
    }

    #[test]
    fn test_parse_import_rejects_duplicate_ids() {
        let content = r#"{"habits": [{"id": "a", "name": "Run"}, {"id": "b", "name": "Read"}, {"id": "a", "name": "Walk"}]}"#;
        match parse_import(content) {
            Err(ImportError::DuplicateId { id, index }) => {
                assert_eq!(id, "a");
                assert_eq!(index, 2);
            }
            other => panic!("expected DuplicateId, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_import_rejects_invalid_json() {
        assert!(matches!(parse_import("{oops"), Err(ImportError::InvalidJson(_))));
    }

    #[test]
    fn test_parse_import_rejects_habit_without_name() {
        let content = r#"{"habits": [{"id": "a", "name": "Run"}, {"id": "b", "name": ""}]}"#;
        match parse_import(content) {
            Err(ImportError::InvalidHabit { index }) => assert_eq!(index, 1),
            other => panic!("expected InvalidHabit, got {:?}", other),
        }

        let content = r#"{"habits": [{"name": "Run"}]}"#;
        assert!(matches!(
            parse_import(content),
            Err(ImportError::InvalidHabit { index: 0 })
        ));
    }

    #[test]
    fn test_parse_import_fills_defaults() {
        let content = r#"{"habits": [{"id": "a", "name": "Run"}], "settings": {"theme": "light"}}"#;
        let data = parse_import(content).unwrap();
        assert_eq!(data.habits.len(), 1);
        assert!(data.habits[0].completions.is_empty());
        assert_eq!(data.settings.theme, Theme::Light);
        assert_eq!(data.settings.first_day_of_week, 1);
    }

    #[test]
    fn test_import_failure_leaves_storage_untouched() {
        let (service, _storage) = setup_test();
        service.save(&sample_data());

        let result = service.import_from_str(r#"{"habits": "not-an-array"}"#);
        assert!(result.is_err());
        assert_eq!(service.load(), sample_data());
    }

    #[tokio::test]
    async fn test_import_from_file_persists() {
        let env = TestEnvironment::new().unwrap();
        let service = PersistenceService::new(env.storage(), calendar());

        let file = env.base_directory().join("import.json");
        std::fs::write(&file, serde_json::to_string_pretty(&sample_data()).unwrap()).unwrap();

        let imported = service.import_from_file(&file).await.unwrap();
        assert_eq!(imported, sample_data());
        assert_eq!(service.load(), sample_data());
    }

    #[tokio::test]
    async fn test_import_from_missing_file_is_read_error() {
        let env = TestEnvironment::new().unwrap();
        let service = PersistenceService::new(env.storage(), calendar());

        let result = service
            .import_from_file(&env.base_directory().join("nope.json"))
            .await;
        assert!(matches!(result, Err(ImportError::Read { .. })));
    }
}
