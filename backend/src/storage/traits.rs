//! # Storage Traits
//!
//! This module defines the storage abstraction the domain layer persists
//! through. It mirrors a browser-style local storage: a flat namespace of
//! string keys, each holding one complete string value.

use anyhow::Result;

/// Durable key-value storage holding whole string blobs per key
///
/// Every write fully replaces the value stored under the key; there are no
/// partial updates. Implementations decide what "durable" means (files on
/// disk, process memory for tests).
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, `None` if the key was never written
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;
}
