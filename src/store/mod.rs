pub mod memory;
pub mod sqlite;

use crate::app::{Result, SubwatchError};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Authoritative key-value persistence for JSON documents.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Returns whether the value was written.
    fn put(&self, key: &str, value: &str) -> Result<bool>;
}

pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        tracing::error!("Store key cannot be empty or whitespace");
        return Err(SubwatchError::Validation(
            "'key' cannot be empty or whitespace".to_string(),
        ));
    }
    Ok(())
}
