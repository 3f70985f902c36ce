//! Time source used by the calendar and the habit store.
//!
//! Production code reads the system clock; tests pin "now" with a
//! [`FixedClock`] so that streaks and date windows are deterministic.

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use std::sync::{Arc, Mutex};

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Today's date in the local calendar
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Current instant as an ISO-8601 UTC timestamp, e.g. `2025-01-15T12:00:00.000Z`
    fn timestamp(&self) -> String {
        self.now()
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Reads the operating system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock pinned to a settable instant
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Pin the clock to noon of the given local date
    pub fn at_date(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .and_then(|naive| naive.and_local_timezone(Local).earliest())
            .unwrap_or_else(Local::now);
        Self::new(noon)
    }

    pub fn set(&self, now: DateTime<Local>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_today() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let clock = FixedClock::at_date(date);
        assert_eq!(clock.today(), date);
    }

    #[test]
    fn test_timestamp_format() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        let ts = clock.timestamp();
        assert!(ts.ends_with('Z'));
        // "YYYY-MM-DDTHH:MM:SS.mmmZ"
        assert_eq!(ts.len(), 24);
    }

    #[test]
    fn test_fixed_clock_set() {
        let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        let later = FixedClock::at_date(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()).now();
        clock.set(later);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
    }
}
