use std::collections::HashMap;
use std::sync::RwLock;

use crate::app::{Result, SubwatchError};
use crate::store::{validate_key, Store};

/// Process-local [`Store`], useful for tests and one-off runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let entries = self
            .entries
            .read()
            .map_err(|e| SubwatchError::Other(format!("Store lock poisoned: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<bool> {
        validate_key(key)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|e| SubwatchError::Other(format!("Store lock poisoned: {}", e)))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }
}
