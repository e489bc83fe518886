//! In-process cache backed by a sharded concurrent map.

use dashmap::DashMap;
use std::time::Duration;

use crate::domain::error::DeskError;
use crate::ports::cache_port::{now_ms, CacheEntry, CachePort};

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CachePort for MemoryCache {
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), DeskError> {
        self.entries
            .insert(key.to_string(), CacheEntry::new(key, value, ttl));
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, DeskError> {
        match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }
        // removing while the read guard is alive would deadlock the shard
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    fn remove(&self, key: &str) -> Result<(), DeskError> {
        self.entries.remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, DeskError> {
        let now = now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}
