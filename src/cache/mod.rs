//! Advisory in-memory cache sitting in front of the [`Store`](crate::store::Store).

pub mod memory;

use std::time::Duration;

pub use memory::MokaCache;

pub trait Cache {
    /// Insert `value` for `key`, expiring after `ttl`. Returns whether it was cached.
    fn try_set(&self, key: &str, value: String, ttl: Duration) -> bool;

    fn try_get(&self, key: &str) -> Option<String>;
}
