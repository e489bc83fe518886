//! Sliding-window request limiter keyed by client.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Tracked clients above which idle ones are swept on the next hit.
const PRUNE_THRESHOLD: usize = 1024;

pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    /// A limit of zero or a zero-length window is raised to one.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window: window.max(Duration::from_secs(1)),
            hits: DashMap::new(),
        }
    }

    /// Record a hit for `key`, returning false once the window is full.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        if self.hits.len() > PRUNE_THRESHOLD {
            self.prune(now);
        }
        let mut hits = self.hits.entry(key.to_string()).or_default();
        self.trim(&mut hits, now);
        if hits.len() >= self.limit {
            return false;
        }
        hits.push_back(now);
        true
    }

    fn trim(&self, hits: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = hits.front() {
            if now.saturating_duration_since(oldest) > self.window {
                hits.pop_front();
            } else {
                break;
            }
        }
    }

    /// Forget clients with no hits left inside the window.
    fn prune(&self, now: Instant) {
        self.hits.retain(|_, hits| {
            self.trim(hits, now);
            !hits.is_empty()
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.len()
    }

    pub fn reset(&self) {
        self.hits.clear();
    }
}
