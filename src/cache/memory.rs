use std::time::{Duration, Instant};

use moka::sync::Cache as MokaInner;
use moka::Expiry;

use crate::cache::Cache;

pub const DEFAULT_MAX_CAPACITY: u64 = 1000;

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the ttl it was inserted with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// [`Cache`] backed by a bounded moka cache with per-entry expiry.
pub struct MokaCache {
    inner: MokaInner<String, Entry>,
}

impl Default for MokaCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY)
    }
}

impl MokaCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = MokaInner::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }
}

impl Cache for MokaCache {
    fn try_set(&self, key: &str, value: String, ttl: Duration) -> bool {
        if ttl.is_zero() {
            return false;
        }
        self.inner.insert(key.to_string(), Entry { value, ttl });
        true
    }

    fn try_get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|entry| entry.value)
    }
}
