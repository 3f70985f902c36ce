pub mod habit;

pub use habit::{HabitError, HabitUpdate};
