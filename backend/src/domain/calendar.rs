//! Calendar domain logic for the habit tracker.
//!
//! This module contains the date computations behind the habit views:
//! date strings, weekday names, month grids and rolling day/month windows.
//! Everything is derived from the injected clock, so results are
//! deterministic for a given "now". Date arithmetic is delegated to chrono,
//! which normalizes month and year boundaries.

use chrono::{Datelike, Days, Months, NaiveDate};
use log::debug;
use shared::{CalendarWeek, MonthYear};
use std::sync::Arc;

use super::clock::{Clock, SystemClock};

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

const SHORT_MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Format used for completion keys and date slots
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar service that handles all calendar-related computations
#[derive(Clone)]
pub struct CalendarService {
    clock: Arc<dyn Clock>,
}

impl CalendarService {
    /// Create a new CalendarService reading the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a CalendarService bound to a specific clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// The clock this service reads "now" from
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Format a date as a zero-padded "YYYY-MM-DD" string
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Parse a "YYYY-MM-DD" string; a trailing time part ("...T09:00:00Z") is ignored
    pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
        let date_part = date_str.split('T').next()?.trim();
        NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
    }

    /// Today's date in the local calendar
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Today's date as a "YYYY-MM-DD" string
    pub fn today_string(&self) -> String {
        Self::format_date(&self.today())
    }

    /// The last `n` days as date strings, oldest first, ending today
    pub fn last_n_days(&self, n: usize) -> Vec<String> {
        let today = self.today();
        (0..n)
            .rev()
            .filter_map(|offset| today.checked_sub_days(Days::new(offset as u64)))
            .map(|date| Self::format_date(&date))
            .collect()
    }

    /// Short weekday name ("Sun".."Sat"); unparseable input falls back to "Sun"
    pub fn day_name(&self, date_str: &str) -> &'static str {
        Self::parse_date(date_str)
            .map(|date| DAY_NAMES[date.weekday().num_days_from_sunday() as usize])
            .unwrap_or(DAY_NAMES[0])
    }

    /// Day of month for a date string
    pub fn day_number(&self, date_str: &str) -> Option<u32> {
        Self::parse_date(date_str).map(|date| date.day())
    }

    /// Month grid with weeks starting on Monday.
    ///
    /// `month` is 0-indexed; values outside 0..12 roll into the neighbouring
    /// years the same way a normalizing date type does.
    pub fn month_calendar(&self, year: i32, month: i32) -> Vec<CalendarWeek> {
        self.month_calendar_starting(year, month, 1)
    }

    /// Month grid with weeks starting on `first_day_of_week` (0 = Sunday, 1 = Monday, ...)
    pub fn month_calendar_starting(
        &self,
        year: i32,
        month: i32,
        first_day_of_week: u8,
    ) -> Vec<CalendarWeek> {
        let Some(first_day) = first_of_month(year, month) else {
            debug!("🗓️ No calendar for out-of-range month {}/{}", month, year);
            return Vec::new();
        };
        let Some(days_in_month) = days_in_month_of(first_day) else {
            return Vec::new();
        };

        let week_start = u32::from(first_day_of_week) % 7;
        let leading = (first_day.weekday().num_days_from_sunday() + 7 - week_start) % 7;

        let mut weeks = Vec::new();
        let mut current = CalendarWeek::default();

        for _ in 0..leading {
            current.days.push(None);
            current.dates.push(None);
        }

        for date in first_day.iter_days().take(days_in_month as usize) {
            current.days.push(Some(date.day()));
            current.dates.push(Some(Self::format_date(&date)));

            if current.len() == 7 {
                weeks.push(std::mem::take(&mut current));
            }
        }

        if !current.is_empty() {
            while current.len() < 7 {
                current.days.push(None);
                current.dates.push(None);
            }
            weeks.push(current);
        }

        debug!(
            "🗓️ Built calendar for {}/{}: {} leading blanks, {} weeks",
            first_day.month(),
            first_day.year(),
            leading,
            weeks.len()
        );
        weeks
    }

    /// Number of days in a month (`month` 0-indexed, normalized like `month_calendar`)
    pub fn days_in_month(&self, year: i32, month: i32) -> u32 {
        first_of_month(year, month)
            .and_then(days_in_month_of)
            .unwrap_or(0)
    }

    /// Every date of a month, first to last (`month` 0-indexed)
    pub fn month_dates(&self, year: i32, month: i32) -> Vec<NaiveDate> {
        match first_of_month(year, month) {
            Some(first_day) => {
                let count = days_in_month_of(first_day).unwrap_or(0) as usize;
                first_day.iter_days().take(count).collect()
            }
            None => Vec::new(),
        }
    }

    /// The last twelve months, oldest first, ending with the current month
    pub fn last_12_months(&self) -> Vec<MonthYear> {
        self.last_n_months(12)
    }

    /// The last `n` months, oldest first, ending with the current month
    pub fn last_n_months(&self, n: usize) -> Vec<MonthYear> {
        let today = self.today();
        let Some(current_month) = today.with_day(1) else {
            return Vec::new();
        };

        (0..n)
            .rev()
            .filter_map(|offset| current_month.checked_sub_months(Months::new(offset as u32)))
            .map(|date| MonthYear {
                month: date.month0(),
                year: date.year(),
                label: self.short_month_name(date.month0() as i32).to_string(),
            })
            .collect()
    }

    /// Full month name for a 0-indexed month; out-of-range falls back to "January"
    pub fn month_name(&self, month: i32) -> &'static str {
        lookup(&MONTH_NAMES, month)
    }

    /// Short month name for a 0-indexed month; out-of-range falls back to "Jan"
    pub fn short_month_name(&self, month: i32) -> &'static str {
        lookup(&SHORT_MONTH_NAMES, month)
    }

    /// Whether the date string is today's date
    pub fn is_today(&self, date_str: &str) -> bool {
        date_str == self.today_string()
    }
}

impl Default for CalendarService {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup(table: &[&'static str; 12], index: i32) -> &'static str {
    usize::try_from(index)
        .ok()
        .and_then(|i| table.get(i))
        .copied()
        .unwrap_or(table[0])
}

/// First day of a 0-indexed month, normalizing overflowing months into years
fn first_of_month(year: i32, month: i32) -> Option<NaiveDate> {
    let total = i64::from(year) * 12 + i64::from(month);
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month0 = total.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
}

fn days_in_month_of(first_day: NaiveDate) -> Option<u32> {
    first_day
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
}
