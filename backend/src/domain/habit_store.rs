//! Habit store: the authoritative in-memory collection of habits.
//!
//! The store owns the habits and settings, and writes the complete snapshot
//! through [`PersistenceService`] at the end of every mutation. There is no
//! batching: each action is its own synchronous flush.
//!
//! Consumers that render the data subscribe to [`StoreEvent`]s instead of
//! polling the store.

use chrono::NaiveDate;
use log::{debug, info, warn};
use shared::{Habit, HabitStats, Settings, StorageData};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use super::calendar::CalendarService;
use super::models::habit::{generate_id, random_color, validate_name, HabitError, HabitUpdate};
use super::persistence_service::{ImportError, PersistenceService};

/// Handle returned by [`HabitStore::subscribe`]
pub type SubscriptionId = u64;

/// Change notification delivered to subscribers after a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// State was replaced from storage
    Loaded,
    HabitAdded(String),
    HabitUpdated(String),
    HabitDeleted(String),
    /// The whole collection was replaced (bulk set or import)
    HabitsReplaced,
    SettingsChanged,
}

type Listener = Box<dyn Fn(&StoreEvent) + Send>;

/// Store holding every habit plus the user's settings
pub struct HabitStore {
    habits: Vec<Habit>,
    settings: Settings,
    persistence: PersistenceService,
    calendar: CalendarService,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription_id: SubscriptionId,
}

impl HabitStore {
    /// Create an empty store; call [`HabitStore::load_from_storage`] once at startup
    pub fn new(persistence: PersistenceService, calendar: CalendarService) -> Self {
        Self {
            habits: Vec::new(),
            settings: Settings::default(),
            persistence,
            calendar,
            listeners: Vec::new(),
            next_subscription_id: 1,
        }
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Register a listener called after every successful mutation
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent) + Send + 'static,
    {
        let id = self.next_subscription_id;
        self.next_subscription_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn notify(&self, event: StoreEvent) {
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    /// Replace in-memory habits and settings with the stored snapshot
    pub fn load_from_storage(&mut self) {
        let data = self.persistence.load();
        info!("📂 Loaded {} habits from storage", data.habits.len());
        self.habits = data.habits;
        self.settings = data.settings;
        self.notify(StoreEvent::Loaded);
    }

    /// Flush the full current snapshot to storage
    pub fn save_to_storage(&self) {
        self.persistence.save(&self.snapshot());
    }

    /// Copy of the current state in its persisted shape
    pub fn snapshot(&self) -> StorageData {
        StorageData {
            habits: self.habits.clone(),
            settings: self.settings.clone(),
        }
    }

    fn timestamp(&self) -> String {
        self.calendar.clock().timestamp()
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Habit> {
        self.habits.iter_mut().find(|habit| habit.id == id)
    }

    /// Create a habit with a fresh id and a random palette color
    pub fn add_habit(&mut self, name: &str) -> Result<Habit, HabitError> {
        let name = validate_name(name)?;

        let now_millis = self.calendar.clock().now().timestamp_millis().max(0) as u64;
        let mut id = generate_id(now_millis);
        while self.habits.iter().any(|habit| habit.id == id) {
            warn!("Habit id collision on {}, regenerating", id);
            id = generate_id(now_millis);
        }

        let now = self.timestamp();
        let habit = Habit {
            id,
            name,
            color: random_color().to_string(),
            completions: BTreeMap::new(),
            notes: String::new(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.habits.push(habit.clone());
        self.save_to_storage();

        info!("✅ Created habit '{}' with ID: {}", habit.name, habit.id);
        self.notify(StoreEvent::HabitAdded(habit.id.clone()));
        Ok(habit)
    }

    /// Delete a habit; returns false (and saves nothing) if the id is unknown
    pub fn delete_habit(&mut self, id: &str) -> bool {
        let Some(index) = self.habits.iter().position(|habit| habit.id == id) else {
            debug!("Delete ignored, habit not found: {}", id);
            return false;
        };

        let removed = self.habits.remove(index);
        self.save_to_storage();

        info!("🗑️ Deleted habit '{}' with ID: {}", removed.name, removed.id);
        self.notify(StoreEvent::HabitDeleted(removed.id));
        true
    }

    /// Shallow-merge `update` onto a habit and refresh its `updatedAt`.
    ///
    /// Returns `Ok(false)` if the id is unknown.
    pub fn update_habit(&mut self, id: &str, mut update: HabitUpdate) -> Result<bool, HabitError> {
        if let Some(name) = update.name.take() {
            update.name = Some(validate_name(&name)?);
        }

        let now = self.timestamp();
        let Some(habit) = self.find_mut(id) else {
            debug!("Update ignored, habit not found: {}", id);
            return Ok(false);
        };

        update.apply_to(habit);
        habit.updated_at = now;
        self.save_to_storage();

        self.notify(StoreEvent::HabitUpdated(id.to_string()));
        Ok(true)
    }

    /// Flip the completion flag for `date`.
    ///
    /// A missing or `false` entry becomes `true`, `true` becomes `false`; the
    /// key is never removed. Returns the new flag, `None` if the id is unknown.
    pub fn toggle_completion(&mut self, habit_id: &str, date: NaiveDate) -> Option<bool> {
        let key = CalendarService::format_date(&date);
        let now = self.timestamp();
        let habit = self.find_mut(habit_id)?;

        let completed = !habit.completions.get(&key).copied().unwrap_or(false);
        habit.completions.insert(key.clone(), completed);
        habit.updated_at = now;
        self.save_to_storage();

        debug!("Toggled {} on {} -> {}", habit_id, key, completed);
        self.notify(StoreEvent::HabitUpdated(habit_id.to_string()));
        Some(completed)
    }

    /// Overwrite a habit's notes; returns false if the id is unknown
    pub fn set_notes(&mut self, habit_id: &str, notes: &str) -> bool {
        let now = self.timestamp();
        let Some(habit) = self.find_mut(habit_id) else {
            return false;
        };

        habit.notes = notes.to_string();
        habit.updated_at = now;
        self.save_to_storage();

        self.notify(StoreEvent::HabitUpdated(habit_id.to_string()));
        true
    }

    /// Replace the whole collection and persist it
    pub fn set_habits(&mut self, habits: Vec<Habit>) {
        let mut seen = HashSet::new();
        for habit in &habits {
            if !seen.insert(habit.id.as_str()) {
                warn!("⚠️ Duplicate habit id in replacement set: {}", habit.id);
            }
        }

        info!("Replacing habit collection with {} habits", habits.len());
        self.habits = habits;
        self.save_to_storage();
        self.notify(StoreEvent::HabitsReplaced);
    }

    /// Replace the settings and persist them
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.save_to_storage();
        self.notify(StoreEvent::SettingsChanged);
    }

    /// Import an export file and adopt its habits and settings.
    ///
    /// On failure the store and the stored blob are left untouched.
    pub async fn import_from_file(&mut self, path: &Path) -> Result<StorageData, ImportError> {
        let data = self.persistence.import_from_file(path).await?;

        self.habits = data.habits.clone();
        self.settings = data.settings.clone();
        self.notify(StoreEvent::HabitsReplaced);
        self.notify(StoreEvent::SettingsChanged);
        Ok(data)
    }

    /// Write the stored blob to a dated export file inside `directory`
    pub fn export_to_file(&self, directory: &Path) -> anyhow::Result<PathBuf> {
        self.persistence.export_to_file(directory)
    }

    /// Pretty-printed JSON of the stored blob
    pub fn export_to_string(&self) -> anyhow::Result<String> {
        self.persistence.export_to_string()
    }

    pub fn get_habit_by_id(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    /// Recorded completions of a habit within one month (`month` 0-indexed).
    ///
    /// Days without an entry are omitted rather than reported as `false`.
    pub fn get_habit_completions_by_month(
        &self,
        habit_id: &str,
        year: i32,
        month: i32,
    ) -> BTreeMap<String, bool> {
        let Some(habit) = self.get_habit_by_id(habit_id) else {
            return BTreeMap::new();
        };

        self.calendar
            .month_dates(year, month)
            .iter()
            .filter_map(|date| {
                let key = CalendarService::format_date(date);
                habit
                    .completions
                    .get(&key)
                    .map(|completed| (key, *completed))
            })
            .collect()
    }

    /// Totals, streak and completion percentage; zeroes for an unknown id
    pub fn get_habit_stats(&self, habit_id: &str) -> HabitStats {
        let Some(habit) = self.get_habit_by_id(habit_id) else {
            return HabitStats::default();
        };

        let total = habit.completions.len() as u32;
        let completed = habit.completions.values().filter(|done| **done).count() as u32;
        let streak = calculate_streak(&habit.completions, self.calendar.today());
        let percentage = if total > 0 {
            ((f64::from(completed) / f64::from(total)) * 100.0).round() as u32
        } else {
            0
        };

        HabitStats {
            total,
            completed,
            streak,
            percentage,
        }
    }
}

/// Count consecutive completed days walking backward from `today`.
///
/// An unrecorded or `false` today does not break the streak, it just adds
/// nothing; the first such day before today ends the count. The walk never
/// goes past the earliest date recorded as completed.
pub fn calculate_streak(completions: &BTreeMap<String, bool>, today: NaiveDate) -> u32 {
    let earliest = completions
        .iter()
        .filter(|(_, done)| **done)
        .filter_map(|(date, _)| CalendarService::parse_date(date))
        .min();
    let Some(earliest) = earliest else {
        return 0;
    };

    let mut streak = 0;
    let mut date = today;
    let mut offset = 0u32;

    while date >= earliest {
        let key = CalendarService::format_date(&date);
        if completions.get(&key).copied().unwrap_or(false) {
            streak += 1;
        } else if offset > 0 {
            break;
        }

        match date.pred_opt() {
            Some(previous) => date = previous,
            None => break,
        }
        offset += 1;
    }

    streak
}
