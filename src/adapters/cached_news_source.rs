//! Memoises headlines in the result cache.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::domain::error::DeskError;
use crate::domain::news::NewsItem;
use crate::ports::cache_port::{CacheExt, CachePort};
use crate::ports::news_port::NewsPort;

pub struct CachedNewsSource {
    inner: Arc<dyn NewsPort>,
    cache: Arc<dyn CachePort>,
    ttl: Option<Duration>,
}

impl CachedNewsSource {
    pub fn new(inner: Arc<dyn NewsPort>, cache: Arc<dyn CachePort>, ttl: Option<Duration>) -> Self {
        Self { inner, cache, ttl }
    }

    pub fn cache_key(limit: usize) -> String {
        format!("news:{limit}")
    }
}

impl NewsPort for CachedNewsSource {
    fn fetch(&self, limit: usize) -> Result<Vec<NewsItem>, DeskError> {
        let key = Self::cache_key(limit);
        match self.cache.get_json::<Vec<NewsItem>>(&key) {
            Ok(Some(items)) => {
                debug!("news cache hit for {key}");
                return Ok(items);
            }
            Ok(None) => {}
            Err(e) => warn!("news cache read failed for {key}: {e}"),
        }

        let items = self.inner.fetch(limit)?;
        if let Err(e) = self.cache.set_json(&key, &items, self.ttl) {
            warn!("news cache write failed for {key}: {e}");
        }
        Ok(items)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_cache::MemoryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Headlines {
        calls: AtomicUsize,
        fail: bool,
    }

    impl NewsPort for Headlines {
        fn fetch(&self, limit: usize) -> Result<Vec<NewsItem>, DeskError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DeskError::data_unavailable("news", "all 3 feeds failed"));
            }
            Ok((0..limit)
                .map(|i| NewsItem {
                    source: "Wire".into(),
                    title: format!("headline {i}"),
                    link: format!("https://example.com/{i}"),
                })
                .collect())
        }
        fn name(&self) -> &'static str {
            "headlines"
        }
    }

    fn headlines(fail: bool) -> Arc<Headlines> {
        Arc::new(Headlines {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[test]
    fn limit_is_part_of_the_key() {
        let inner = headlines(false);
        let cached = CachedNewsSource::new(inner.clone(), Arc::new(MemoryCache::new()), None);
        assert_eq!(cached.fetch(5).unwrap().len(), 5);
        assert_eq!(cached.fetch(5).unwrap().len(), 5);
        assert_eq!(cached.fetch(2).unwrap().len(), 2);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(CachedNewsSource::cache_key(40), "news:40");
        assert_eq!(cached.name(), "headlines");
    }

    #[test]
    fn failures_are_not_cached() {
        let inner = headlines(true);
        let cache = Arc::new(MemoryCache::new());
        let cached = CachedNewsSource::new(inner.clone(), cache.clone(), None);
        assert!(cached.fetch(5).is_err());
        assert!(cached.fetch(5).is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
