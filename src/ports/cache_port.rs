//! Expiring key-value cache port.
//!
//! Values are stored as serialized JSON strings so the same port can be
//! backed by process memory or by a table on disk.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::domain::error::DeskError;

/// A cached value together with its expiry bookkeeping.
///
/// Timestamps are Unix milliseconds so entries survive a process restart.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub inserted_at_ms: i64,
    /// `None` never expires.
    pub ttl_ms: Option<i64>,
}

impl CacheEntry {
    pub fn new(key: &str, value: String, ttl: Option<Duration>) -> Self {
        CacheEntry {
            key: key.to_string(),
            value,
            inserted_at_ms: now_ms(),
            ttl_ms: ttl.map(|d| d.as_millis().min(i64::MAX as u128) as i64),
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        match self.ttl_ms {
            Some(ttl) => now_ms.saturating_sub(self.inserted_at_ms) >= ttl,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_ms())
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Expiring key-value store shared between request handlers and job workers.
///
/// Implementations must tolerate concurrent readers and writers. Each key is
/// written by a single owner at a time; last write wins.
pub trait CachePort: Send + Sync {
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), DeskError>;

    /// Absent and expired keys both read as `None`.
    fn get(&self, key: &str) -> Result<Option<String>, DeskError>;

    fn remove(&self, key: &str) -> Result<(), DeskError>;

    /// Drop every expired entry, returning how many were removed.
    fn purge_expired(&self) -> Result<usize, DeskError>;
}

/// Typed JSON helpers over any [`CachePort`].
pub trait CacheExt {
    fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>)
        -> Result<(), DeskError>;

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DeskError>;
}

impl<C: CachePort + ?Sized> CacheExt for C {
    fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), DeskError> {
        let encoded = serde_json::to_string(value)?;
        self.set(key, encoded, ttl)
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DeskError> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

/// A TTL of zero seconds in config means "keep forever".
pub fn ttl_from_secs(secs: i64) -> Option<Duration> {
    if secs <= 0 {
        None
    } else {
        Some(Duration::from_secs(secs as u64))
    }
}
