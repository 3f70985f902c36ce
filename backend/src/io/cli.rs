//! Command line interface.
//!
//! Habits are addressed by id or by (case-insensitive) name. Command output
//! goes to the supplied writer; toasts raised while a command runs are
//! printed afterwards by [`print_toasts`].

use anyhow::{anyhow, bail, Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use shared::{CalendarWeek, Settings, Theme, ToastType};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use crate::domain::{CalendarService, HabitUpdate, ToastQueue};
use crate::AppState;

/// Weekday labels indexed from Sunday
const WEEKDAY_LABELS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

#[derive(Parser, Debug)]
#[command(name = "habit-tracker", version, about = "Track daily habits from the terminal")]
pub struct Cli {
    /// Directory holding the habit data (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file (default: <config dir>/habit-tracker/config.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Cmd {
    /// List every habit with today's status
    List,
    /// Add a new habit
    Add { name: String },
    /// Delete a habit
    Delete { habit: String },
    /// Rename a habit
    Rename { habit: String, name: String },
    /// Flip a day's completion (today unless --date is given)
    Toggle {
        habit: String,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
    },
    /// Replace a habit's notes
    Notes { habit: String, text: String },
    /// Show a habit with its statistics
    Show { habit: String },
    /// Completion statistics for one habit
    Stats { habit: String },
    /// Month grid, marked with a habit's completions when one is given
    Calendar {
        habit: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        /// Month number, 1-12
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Completion table for the last few days
    Recent {
        #[arg(long, default_value_t = 7)]
        days: usize,
    },
    /// Completed days per month over the last twelve months
    Months { habit: String },
    /// Show or set the theme
    Theme {
        #[arg(value_enum)]
        theme: Option<ThemeArg>,
    },
    /// Show or set the first day of the week used by `calendar`
    WeekStart {
        #[arg(value_enum)]
        day: Option<WeekStartArg>,
    },
    /// Write all data to habits-export-YYYY-MM-DD.json
    Export {
        /// Target directory (default: export_directory from the config)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Print the export instead of writing a file
        #[arg(long, conflicts_with = "dir")]
        stdout: bool,
    },
    /// Replace all data with the contents of an export file
    Import { path: PathBuf },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Dark,
    Light,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum WeekStartArg {
    Sunday,
    Monday,
}

impl WeekStartArg {
    fn first_day_of_week(self) -> u8 {
        match self {
            WeekStartArg::Sunday => 0,
            WeekStartArg::Monday => 1,
        }
    }
}

/// Execute one command against the application state
pub async fn run(cmd: Cmd, state: &mut AppState, out: &mut dyn Write) -> Result<()> {
    match cmd {
        Cmd::List => list_habits(state, out),
        Cmd::Add { name } => {
            let habit = state.habit_store.add_habit(&name)?;
            writeln!(out, "{}  {}", habit.id, habit.name)?;
            state
                .toast_queue
                .success(format!("Added \"{}\"", habit.name), None);
            Ok(())
        }
        Cmd::Delete { habit } => {
            let id = resolve_habit_id(state, &habit)?;
            state.habit_store.delete_habit(&id);
            state.toast_queue.info(format!("Deleted {}", habit), None);
            Ok(())
        }
        Cmd::Rename { habit, name } => {
            let id = resolve_habit_id(state, &habit)?;
            state
                .habit_store
                .update_habit(&id, HabitUpdate::name(name.as_str()))?;
            state
                .toast_queue
                .success(format!("Renamed to \"{}\"", name.trim()), None);
            Ok(())
        }
        Cmd::Toggle { habit, date } => toggle(state, &habit, date.as_deref(), out),
        Cmd::Notes { habit, text } => {
            let id = resolve_habit_id(state, &habit)?;
            state.habit_store.set_notes(&id, &text);
            state.toast_queue.success("Notes saved", None);
            Ok(())
        }
        Cmd::Show { habit } => show_habit(state, &habit, out),
        Cmd::Stats { habit } => {
            let id = resolve_habit_id(state, &habit)?;
            let stats = state.habit_store.get_habit_stats(&id);
            writeln!(
                out,
                "total {}  completed {}  streak {}  {}%",
                stats.total, stats.completed, stats.streak, stats.percentage
            )?;
            Ok(())
        }
        Cmd::Calendar { habit, year, month } => {
            print_calendar(state, habit.as_deref(), year, month, out)
        }
        Cmd::Recent { days } => print_recent(state, days, out),
        Cmd::Months { habit } => print_months(state, &habit, out),
        Cmd::Theme { theme } => {
            match theme {
                Some(theme) => {
                    let settings = Settings {
                        theme: theme.into(),
                        ..state.habit_store.settings().clone()
                    };
                    state.habit_store.update_settings(settings);
                    state
                        .toast_queue
                        .success(format!("Theme set to {}", state.habit_store.settings().theme), None);
                }
                None => writeln!(out, "{}", state.habit_store.settings().theme)?,
            }
            Ok(())
        }
        Cmd::WeekStart { day } => {
            match day {
                Some(day) => {
                    let settings = Settings {
                        first_day_of_week: day.first_day_of_week(),
                        ..state.habit_store.settings().clone()
                    };
                    state.habit_store.update_settings(settings);
                    state.toast_queue.success("Week start updated", None);
                }
                None => {
                    let first = usize::from(state.habit_store.settings().first_day_of_week) % 7;
                    writeln!(out, "{}", WEEKDAY_LABELS[first])?;
                }
            }
            Ok(())
        }
        Cmd::Export { dir, stdout } => {
            if stdout {
                writeln!(out, "{}", state.habit_store.export_to_string()?)?;
                return Ok(());
            }
            let directory = dir.unwrap_or_else(|| state.config.resolve_export_directory());
            let path = state.habit_store.export_to_file(&directory)?;
            writeln!(out, "{}", path.display())?;
            state.toast_queue.success("Data exported", None);
            Ok(())
        }
        Cmd::Import { path } => match state.habit_store.import_from_file(&path).await {
            Ok(data) => {
                info!("📥 Imported {} habits from {:?}", data.habits.len(), path);
                state
                    .toast_queue
                    .success(format!("Imported {} habits", data.habits.len()), None);
                Ok(())
            }
            Err(e) => {
                warn!("❌ Import from {:?} failed: {}", path, e);
                state.toast_queue.error(format!("Import failed: {}", e), None);
                Err(e.into())
            }
        },
    }
}

/// Print and clear every pending toast
pub fn print_toasts(queue: &ToastQueue, out: &mut dyn Write) -> Result<()> {
    for toast in queue.toasts() {
        let marker = match toast.toast_type {
            ToastType::Success => "✓",
            ToastType::Error => "✗",
            ToastType::Warning => "!",
            ToastType::Info => "i",
        };
        writeln!(out, "{} {}", marker, toast.message)?;
    }
    queue.clear();
    Ok(())
}

/// Find a habit by exact id, then by unique case-insensitive name
fn resolve_habit_id(state: &AppState, key: &str) -> Result<String> {
    let habits = state.habit_store.habits();
    if let Some(habit) = habits.iter().find(|habit| habit.id == key) {
        return Ok(habit.id.clone());
    }

    let wanted = key.trim().to_lowercase();
    let mut matches = habits
        .iter()
        .filter(|habit| habit.name.to_lowercase() == wanted);
    match (matches.next(), matches.next()) {
        (Some(habit), None) => Ok(habit.id.clone()),
        (Some(_), Some(_)) => bail!("More than one habit is named \"{}\", use its id", key),
        (None, _) => Err(anyhow!("No habit matches \"{}\"", key)),
    }
}

fn completion_marker(completions: &BTreeMap<String, bool>, date: &str) -> char {
    match completions.get(date) {
        Some(true) => '*',
        Some(false) => '.',
        None => ' ',
    }
}

fn list_habits(state: &AppState, out: &mut dyn Write) -> Result<()> {
    let store = &state.habit_store;
    if store.habits().is_empty() {
        writeln!(out, "No habits yet. Add one with `habit-tracker add <name>`.")?;
        return Ok(());
    }

    let today = state.calendar_service.today_string();
    for habit in store.habits() {
        let done = habit.completions.get(&today).copied().unwrap_or(false);
        let stats = store.get_habit_stats(&habit.id);
        writeln!(
            out,
            "[{}] {}  ({})  streak {}",
            if done { 'x' } else { ' ' },
            habit.name,
            habit.id,
            stats.streak
        )?;
    }
    Ok(())
}

fn toggle(state: &mut AppState, habit: &str, date: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let id = resolve_habit_id(state, habit)?;
    let date = match date {
        Some(text) => CalendarService::parse_date(text)
            .with_context(|| format!("Invalid date \"{}\", expected YYYY-MM-DD", text))?,
        None => state.calendar_service.today(),
    };

    let completed = state
        .habit_store
        .toggle_completion(&id, date)
        .ok_or_else(|| anyhow!("No habit matches \"{}\"", habit))?;
    writeln!(
        out,
        "{} {}",
        CalendarService::format_date(&date),
        if completed { "done" } else { "not done" }
    )?;
    Ok(())
}

fn show_habit(state: &AppState, key: &str, out: &mut dyn Write) -> Result<()> {
    let id = resolve_habit_id(state, key)?;
    let habit = state
        .habit_store
        .get_habit_by_id(&id)
        .ok_or_else(|| anyhow!("No habit matches \"{}\"", key))?;
    let stats = state.habit_store.get_habit_stats(&id);

    writeln!(out, "{}", habit.name)?;
    writeln!(out, "  id:        {}", habit.id)?;
    writeln!(out, "  color:     {}", habit.color)?;
    writeln!(out, "  created:   {}", habit.created_at)?;
    writeln!(out, "  updated:   {}", habit.updated_at)?;
    writeln!(
        out,
        "  completed: {}/{} ({}%), streak {}",
        stats.completed, stats.total, stats.percentage, stats.streak
    )?;
    if !habit.notes.is_empty() {
        writeln!(out, "  notes:     {}", habit.notes)?;
    }
    Ok(())
}

fn print_calendar(
    state: &AppState,
    habit: Option<&str>,
    year: Option<i32>,
    month: Option<u32>,
    out: &mut dyn Write,
) -> Result<()> {
    let calendar = &state.calendar_service;
    let today = calendar.today();
    let year = year.unwrap_or_else(|| today.year());
    let month0 = match month {
        Some(month) => month as i32 - 1,
        None => today.month0() as i32,
    };

    let completions = match habit {
        Some(key) => {
            let id = resolve_habit_id(state, key)?;
            state
                .habit_store
                .get_habit_completions_by_month(&id, year, month0)
        }
        None => BTreeMap::new(),
    };

    let first_day_of_week = state.habit_store.settings().first_day_of_week;
    let weeks = calendar.month_calendar_starting(year, month0, first_day_of_week);

    writeln!(out, "{} {}", calendar.month_name(month0), year)?;
    let header: String = (0..7)
        .map(|offset| {
            let label = WEEKDAY_LABELS[(usize::from(first_day_of_week) + offset) % 7];
            format!("{:>3} ", label)
        })
        .collect();
    writeln!(out, "{}", header.trim_end())?;

    for week in &weeks {
        writeln!(out, "{}", render_week(week, &completions).trim_end())?;
    }
    Ok(())
}

fn render_week(week: &CalendarWeek, completions: &BTreeMap<String, bool>) -> String {
    week.slots()
        .map(|slot| match slot {
            (Some(day), Some(date)) => format!("{:>3}{}", day, completion_marker(completions, date)),
            _ => "    ".to_string(),
        })
        .collect()
}

fn print_recent(state: &AppState, days: usize, out: &mut dyn Write) -> Result<()> {
    let calendar = &state.calendar_service;
    let dates = calendar.last_n_days(days);
    let name_width = state
        .habit_store
        .habits()
        .iter()
        .map(|habit| habit.name.chars().count())
        .max()
        .unwrap_or(0);

    let header: String = dates
        .iter()
        .map(|date| format!(" {}", &calendar.day_name(date)[..2]))
        .collect();
    writeln!(out, "{:width$}{}", "", header, width = name_width)?;

    for habit in state.habit_store.habits() {
        let row: String = dates
            .iter()
            .map(|date| format!("  {}", completion_marker(&habit.completions, date)))
            .collect();
        writeln!(out, "{:width$}{}", habit.name, row, width = name_width)?;
    }
    Ok(())
}

fn print_months(state: &AppState, key: &str, out: &mut dyn Write) -> Result<()> {
    let id = resolve_habit_id(state, key)?;
    for month in state.calendar_service.last_12_months() {
        let completions =
            state
                .habit_store
                .get_habit_completions_by_month(&id, month.year, month.month as i32);
        let completed = completions.values().filter(|done| **done).count();
        let days = state
            .calendar_service
            .days_in_month(month.year, month.month as i32);
        writeln!(out, "{} {}  {:>2}/{}", month.label, month.year, completed, days)?;
    }
    Ok(())
}
