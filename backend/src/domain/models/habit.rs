use rand::seq::SliceRandom;
use rand::Rng;
use shared::{Habit, HABIT_COLORS};
use std::collections::BTreeMap;

/// Partial update applied to an existing habit.
///
/// Only the fields that are `Some` are written. `id` and `createdAt` are
/// not updatable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub completions: Option<BTreeMap<String, bool>>,
}

impl HabitUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.notes.is_none()
            && self.completions.is_none()
    }

    /// Shallow-merge the present fields onto `habit`
    pub(crate) fn apply_to(self, habit: &mut Habit) {
        if let Some(name) = self.name {
            habit.name = name;
        }
        if let Some(color) = self.color {
            habit.color = color;
        }
        if let Some(notes) = self.notes {
            habit.notes = notes;
        }
        if let Some(completions) = self.completions {
            habit.completions = completions;
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HabitError {
    #[error("Habit name cannot be empty")]
    EmptyName,
}

/// Trim a habit name and reject names that are empty afterwards
pub fn validate_name(name: &str) -> Result<String, HabitError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HabitError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Generate a habit id: base-36 millisecond timestamp followed by a random base-36 suffix
pub fn generate_id(now_millis: u64) -> String {
    let suffix: u64 = rand::thread_rng().gen();
    format!("{}{}", to_base36(now_millis), to_base36(suffix))
}

/// Pick a display color uniformly at random from the palette
pub fn random_color() -> &'static str {
    HABIT_COLORS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(HABIT_COLORS[0])
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_generate_id_has_timestamp_prefix() {
        let id = generate_id(1_700_000_000_000);
        assert!(id.starts_with("loyw3v28"));
        assert!(id.len() > "loyw3v28".len());
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_id_is_unique_within_same_millisecond() {
        let ids: HashSet<String> = (0..500).map(|_| generate_id(42)).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_random_color_comes_from_palette() {
        for _ in 0..50 {
            assert!(HABIT_COLORS.contains(&random_color()));
        }
    }

    #[test]
    fn test_random_color_uses_whole_palette() {
        let seen: HashSet<&str> = (0..600).map(|_| random_color()).collect();
        assert_eq!(seen.len(), HABIT_COLORS.len());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Read  "), Ok("Read".to_string()));
        assert_eq!(validate_name(""), Err(HabitError::EmptyName));
        assert_eq!(validate_name("   "), Err(HabitError::EmptyName));
    }

    #[test]
    fn test_update_applies_only_present_fields() {
        let mut habit = Habit {
            id: "h1".to_string(),
            name: "Old".to_string(),
            color: "#3b82f6".to_string(),
            completions: BTreeMap::new(),
            notes: "keep".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        };

        HabitUpdate::name("New").apply_to(&mut habit);
        assert_eq!(habit.name, "New");
        assert_eq!(habit.notes, "keep");
        assert_eq!(habit.color, "#3b82f6");
        assert!(HabitUpdate::default().is_empty());
    }
}
