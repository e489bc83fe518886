//! Concrete adapter implementations for ports, plus startup wiring.

pub mod cached_news_source;
pub mod cached_price_source;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod memory_cache;
pub mod rss_news_adapter;
pub mod sqlite_adapter;
pub mod stooq_adapter;
pub mod synthetic_adapter;
#[cfg(feature = "web")]
pub mod web;

use std::sync::Arc;

use log::info;

use crate::domain::config_validation::{CacheBackend, DataSourceKind, Settings};
use crate::domain::error::DeskError;
use crate::ports::cache_port::CachePort;
use crate::ports::journal_port::JournalPort;
use crate::ports::news_port::NewsPort;
use crate::ports::price_port::PricePort;

use cached_news_source::CachedNewsSource;
use cached_price_source::CachedPriceSource;
use csv_adapter::CsvAdapter;
use memory_cache::MemoryCache;
use rss_news_adapter::RssNewsAdapter;
use sqlite_adapter::SqliteAdapter;
use stooq_adapter::StooqAdapter;
use synthetic_adapter::SyntheticAdapter;

/// Everything the job runner and front ends need, built once at startup.
#[derive(Clone)]
pub struct Services {
    pub cache: Arc<dyn CachePort>,
    pub journal: Arc<dyn JournalPort>,
    pub prices: Arc<dyn PricePort>,
    pub news: Arc<dyn NewsPort>,
}

/// The raw price source named by `[data] source`.
pub fn build_price_source(settings: &Settings) -> Arc<dyn PricePort> {
    match &settings.source {
        DataSourceKind::Synthetic => Arc::new(SyntheticAdapter::new()),
        DataSourceKind::Csv { dir } => Arc::new(CsvAdapter::new(dir.clone())),
        DataSourceKind::Stooq => Arc::new(StooqAdapter::new(settings.fetch_timeout)),
    }
}

/// Open the database, create the schema and wire the cache, journal and
/// memoised price and news sources together.
pub fn build_services(settings: &Settings) -> Result<Services, DeskError> {
    let db = Arc::new(SqliteAdapter::open(&settings.db_path, settings.db_pool_size)?);
    db.initialize_schema()?;

    let cache: Arc<dyn CachePort> = match settings.cache_backend {
        CacheBackend::Sqlite => Arc::clone(&db) as Arc<dyn CachePort>,
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
    };
    let purged = cache.purge_expired()?;
    if purged > 0 {
        info!("purged {purged} expired cache entries");
    }

    let raw = build_price_source(settings);
    info!(
        "price source: {}, cache: {:?}, database: {}",
        raw.name(),
        settings.cache_backend,
        settings.db_path
    );
    let prices: Arc<dyn PricePort> =
        Arc::new(CachedPriceSource::new(raw, Arc::clone(&cache), settings.lookup_ttl));

    let feeds = Arc::new(RssNewsAdapter::new(settings.news_feeds.clone(), settings.fetch_timeout));
    let news: Arc<dyn NewsPort> =
        Arc::new(CachedNewsSource::new(feeds, Arc::clone(&cache), settings.lookup_ttl));

    Ok(Services {
        cache,
        journal: db,
        prices,
        news,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn settings(extra: &str, db: &std::path::Path) -> Settings {
        let content = format!("[database]\npath = {}\n{extra}", db.display());
        Settings::from_config(&FileConfigAdapter::from_string(&content).unwrap()).unwrap()
    }

    #[test]
    fn builds_sqlite_backed_services() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings("", &dir.path().join("desk.db"));
        let services = build_services(&s).unwrap();
        assert_eq!(services.prices.name(), "synthetic");
        assert_eq!(services.news.name(), "rss");
        services.cache.set("k", "v".into(), None).unwrap();
        assert!(services.journal.list(None).unwrap().is_empty());

        // sqlite cache survives a rebuild
        let again = build_services(&s).unwrap();
        assert_eq!(again.cache.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn memory_backend_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings("[cache]\nbackend = memory\n", &dir.path().join("desk.db"));
        build_services(&s).unwrap().cache.set("k", "v".into(), None).unwrap();
        assert_eq!(build_services(&s).unwrap().cache.get("k").unwrap(), None);
    }

    #[test]
    fn disabled_news_serves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings("[news]\nenabled = false\n", &dir.path().join("desk.db"));
        assert!(build_services(&s).unwrap().news.fetch(10).unwrap().is_empty());
    }

    #[test]
    fn csv_source_selected() {
        let dir = tempfile::tempdir().unwrap();
        let extra = format!("[data]\nsource = csv\ncsv_dir = {}\n", dir.path().display());
        let s = settings(&extra, &dir.path().join("desk.db"));
        assert_eq!(build_price_source(&s).name(), "csv");
    }
}
