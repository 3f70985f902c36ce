use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Palette habits draw their display color from
pub const HABIT_COLORS: [&str; 6] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899",
];

/// A tracked recurring behavior with its daily completion record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Opaque unique identifier, immutable after creation
    pub id: String,
    /// Display label
    pub name: String,
    /// Display color tag from `HABIT_COLORS`
    #[serde(default)]
    pub color: String,
    /// Sparse map of "YYYY-MM-DD" to completion flag (absent = not recorded)
    #[serde(default)]
    pub completions: BTreeMap<String, bool>,
    #[serde(default)]
    pub notes: String,
    /// ISO-8601 UTC timestamp (RFC 3339, millisecond precision)
    #[serde(default)]
    pub created_at: String,
    /// ISO-8601 UTC timestamp, refreshed on every mutation
    #[serde(default)]
    pub updated_at: String,
}

/// Statistics derived from a habit's completions; never persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitStats {
    /// Number of recorded completion entries
    pub total: u32,
    /// Number of entries recorded as completed
    pub completed: u32,
    /// Consecutive completed days ending today (today's absence tolerated)
    pub streak: u32,
    /// Rounded completed/total ratio in percent, 0 when nothing is recorded
    pub percentage: u32,
}

/// Color scheme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

/// User preferences stored alongside the habits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    /// 0 = Sunday, 1 = Monday
    pub first_day_of_week: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            first_day_of_week: 1,
        }
    }
}

/// The full persisted snapshot: every habit plus settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageData {
    pub habits: Vec<Habit>,
    pub settings: Settings,
}

/// Severity of a toast notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastType {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastType {
    /// Display time used when the caller does not pick one
    pub fn default_duration_ms(&self) -> u64 {
        match self {
            ToastType::Error => 5000,
            _ => 3000,
        }
    }
}

impl fmt::Display for ToastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToastType::Success => "success",
            ToastType::Error => "error",
            ToastType::Info => "info",
            ToastType::Warning => "warning",
        };
        write!(f, "{}", label)
    }
}

/// A transient notification shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub toast_type: ToastType,
    /// Milliseconds until auto-removal; 0 keeps the toast until removed
    pub duration: u64,
}

/// One row of a month grid: seven slots, empty slots pad the first and last week
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarWeek {
    pub days: Vec<Option<u32>>,
    pub dates: Vec<Option<String>>,
}

impl CalendarWeek {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Iterate `(day, date)` slot pairs in column order
    pub fn slots(&self) -> impl Iterator<Item = (Option<u32>, Option<&str>)> + '_ {
        self.days
            .iter()
            .zip(self.dates.iter())
            .map(|(day, date)| (*day, date.as_deref()))
    }
}

/// A calendar month reference; `month` is 0-indexed (0 = January)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthYear {
    pub month: u32,
    pub year: i32,
    /// Short month name, e.g. "Jan"
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_habit_serializes_with_camel_case_keys() {
        let habit = Habit {
            id: "abc".to_string(),
            name: "Read".to_string(),
            color: HABIT_COLORS[0].to_string(),
            completions: BTreeMap::from([("2025-01-01".to_string(), true)]),
            notes: String::new(),
            created_at: "2025-01-01T10:00:00.000Z".to_string(),
            updated_at: "2025-01-01T10:00:00.000Z".to_string(),
        };

        let json = serde_json::to_value(&habit).unwrap();
        assert_eq!(json["createdAt"], "2025-01-01T10:00:00.000Z");
        assert_eq!(json["updatedAt"], "2025-01-01T10:00:00.000Z");
        assert_eq!(json["completions"]["2025-01-01"], true);
    }

    #[test]
    fn test_habit_optional_fields_default_when_missing() {
        let habit: Habit = serde_json::from_str(r#"{"id":"x1","name":"Walk"}"#).unwrap();
        assert_eq!(habit.id, "x1");
        assert!(habit.completions.is_empty());
        assert!(habit.notes.is_empty());
        assert!(habit.color.is_empty());
    }

    #[test]
    fn test_settings_wire_format() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(json, r#"{"theme":"dark","firstDayOfWeek":1}"#);

        let light: Settings =
            serde_json::from_str(r#"{"theme":"light","firstDayOfWeek":0}"#).unwrap();
        assert_eq!(light.theme, Theme::Light);
        assert_eq!(light.first_day_of_week, 0);
    }

    #[test]
    fn test_toast_type_default_durations() {
        assert_eq!(ToastType::Error.default_duration_ms(), 5000);
        assert_eq!(ToastType::Success.default_duration_ms(), 3000);
        assert_eq!(ToastType::Info.default_duration_ms(), 3000);
        assert_eq!(ToastType::Warning.default_duration_ms(), 3000);
    }

    #[test]
    fn test_toast_type_field_is_named_type() {
        let toast = Toast {
            id: "t1".to_string(),
            message: "Saved".to_string(),
            toast_type: ToastType::Success,
            duration: 3000,
        };
        let json = serde_json::to_value(&toast).unwrap();
        assert_eq!(json["type"], "success");
    }
}
