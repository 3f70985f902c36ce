//! # Domain Module
//!
//! Contains all business logic for the habit tracker.
//!
//! ## Module Organization
//!
//! - **calendar**: date strings, weekday names, month grids, rolling windows
//! - **habit_store**: the habit collection, its mutations and statistics
//! - **persistence_service**: load/save/export/import of the application blob
//! - **toast_service**: transient notifications with timed dismissal
//! - **clock**: injectable time source
//! - **models**: update commands, id generation and validation errors
//!
//! ## Business Rules
//!
//! - Habit names must be non-empty after trimming
//! - Habit ids are unique within the collection and never change
//! - Completions are sparse: an absent date is "not recorded", not "missed"
//! - Every mutation persists the complete snapshot immediately
//! - Unknown habit ids are not errors: operations no-op or return empty results

pub mod calendar;
pub mod clock;
pub mod habit_store;
pub mod models;
pub mod persistence_service;
pub mod toast_service;

pub use calendar::*;
pub use clock::*;
pub use habit_store::*;
pub use models::*;
pub use persistence_service::*;
pub use toast_service::*;
