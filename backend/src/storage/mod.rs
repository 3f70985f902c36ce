//! # Storage Module
//!
//! Handles data persistence for the habit tracker.
//!
//! The domain layer only sees the [`KeyValueStorage`] trait: a flat
//! namespace of string keys holding whole JSON blobs. Two implementations
//! ship with the crate:
//!
//! - **json**: one file per key inside the data directory, written
//!   atomically (temp file + rename)
//! - **memory**: process-local map, used in tests and for quota simulation

pub mod json;
pub mod memory;
pub mod traits;

pub use json::{FileKeyValueRepository, JsonConnection};
pub use memory::MemoryStorage;
pub use traits::KeyValueStorage;
