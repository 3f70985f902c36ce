//! In-memory key-value storage.
//!
//! Used by tests and by callers that want a throwaway store. An optional
//! quota makes writes fail the way a full browser storage area does.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;

use super::traits::KeyValueStorage;

/// Key-value storage kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects values larger than `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory storage lock poisoned"))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            if value.len() > quota {
                return Err(anyhow::anyhow!(
                    "Storage quota exceeded: {} bytes requested, {} allowed",
                    value.len(),
                    quota
                ));
            }
        }

        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory storage lock poisoned"))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory storage lock poisoned"))?;
        items.remove(key);
        Ok(())
    }
}
