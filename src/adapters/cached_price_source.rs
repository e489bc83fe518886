//! Memoises any price source in the result cache.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::domain::error::DeskError;
use crate::domain::price_bar::{normalize_symbol, PriceBar};
use crate::ports::cache_port::{CacheExt, CachePort};
use crate::ports::price_port::PricePort;

pub struct CachedPriceSource {
    inner: Arc<dyn PricePort>,
    cache: Arc<dyn CachePort>,
    ttl: Option<Duration>,
}

impl CachedPriceSource {
    pub fn new(inner: Arc<dyn PricePort>, cache: Arc<dyn CachePort>, ttl: Option<Duration>) -> Self {
        Self { inner, cache, ttl }
    }

    pub fn cache_key(symbol: &str, days: usize) -> String {
        format!("prices:{}:{days}", normalize_symbol(symbol))
    }
}

impl PricePort for CachedPriceSource {
    /// Failures are never cached. A cache that cannot be read or written is
    /// bypassed with a warning.
    fn fetch(&self, symbol: &str, days: usize) -> Result<Vec<PriceBar>, DeskError> {
        let key = Self::cache_key(symbol, days);
        match self.cache.get_json::<Vec<PriceBar>>(&key) {
            Ok(Some(bars)) => {
                debug!("price cache hit for {key}");
                return Ok(bars);
            }
            Ok(None) => {}
            Err(e) => warn!("price cache read failed for {key}: {e}"),
        }

        let bars = self.inner.fetch(symbol, days)?;
        if let Err(e) = self.cache.set_json(&key, &bars, self.ttl) {
            warn!("price cache write failed for {key}: {e}");
        }
        Ok(bars)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
