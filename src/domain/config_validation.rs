//! Typed settings read from the INI config, validated up front.
//!
//! Every key has a default so an empty file is a valid configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::backtest::BacktestParams;
use crate::domain::error::DeskError;
use crate::domain::news::{default_feeds, parse_feed_list, NewsFeed};
use crate::domain::screener::{default_watchlist, parse_watchlist};
use crate::ports::cache_port::ttl_from_secs;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::MAX_HISTORY_DAYS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceKind {
    Synthetic,
    Csv { dir: PathBuf },
    Stooq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source: DataSourceKind,
    pub days: usize,
    /// Largest `days` any request may ask for; larger requests are clamped.
    pub max_days: usize,
    pub fetch_timeout: Duration,
    pub cache_backend: CacheBackend,
    pub lookup_ttl: Option<Duration>,
    pub job_ttl: Option<Duration>,
    pub db_path: String,
    pub db_pool_size: u32,
    pub max_concurrent: usize,
    pub backtest: BacktestParams,
    pub listen: String,
    pub health_rate_limit: usize,
    pub health_rate_window: Duration,
    /// Key the health rate limit on `X-Forwarded-For` instead of the peer
    /// address. Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
    pub max_risk_dollars: f64,
    /// Empty when `[news] enabled = false`.
    pub news_feeds: Vec<NewsFeed>,
    pub news_limit: usize,
    pub watchlist: Vec<String>,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DeskError> {
        let backtest = BacktestParams {
            short_window: positive_int(config, "backtest", "short_window", 10)?,
            long_window: positive_int(config, "backtest", "long_window", 20)?,
            fee_bps: config.get_double("backtest", "fee_bps", 1.0),
            ..BacktestParams::default()
        };
        validate_backtest(&backtest)?;

        let max_risk_dollars = config.get_double("risk", "max_risk_dollars", 10_000.0);
        if !max_risk_dollars.is_finite() || max_risk_dollars <= 0.0 {
            return Err(invalid("risk", "max_risk_dollars", "must be positive"));
        }

        let max_days = positive_int(config, "data", "max_days", MAX_HISTORY_DAYS as i64)?;
        if max_days > MAX_HISTORY_DAYS {
            return Err(invalid(
                "data",
                "max_days",
                &format!("must be at most {MAX_HISTORY_DAYS}"),
            ));
        }
        let days = positive_int(config, "data", "days", 252)?;
        if days > max_days {
            return Err(invalid("data", "days", "must not exceed max_days"));
        }

        Ok(Settings {
            source: parse_source(config)?,
            days,
            max_days,
            fetch_timeout: Duration::from_secs(positive_int(config, "data", "timeout_secs", 10)? as u64),
            cache_backend: parse_cache_backend(config)?,
            lookup_ttl: ttl_from_secs(non_negative_int(config, "cache", "lookup_ttl_secs", 600)?),
            job_ttl: ttl_from_secs(non_negative_int(config, "cache", "job_ttl_secs", 86_400)?),
            db_path: config.get_string_or("database", "path", "data/chartdesk.db"),
            db_pool_size: positive_int(config, "database", "pool_size", 4)? as u32,
            max_concurrent: positive_int(config, "jobs", "max_concurrent", 4)?,
            backtest,
            listen: config.get_string_or("web", "listen", "127.0.0.1:8050"),
            health_rate_limit: positive_int(config, "web", "health_rate_limit", 60)?,
            health_rate_window: Duration::from_secs(
                positive_int(config, "web", "health_rate_window_secs", 60)? as u64,
            ),
            trust_forwarded_for: config.get_bool("web", "trust_forwarded_for", false),
            max_risk_dollars,
            news_feeds: parse_news_feeds(config)?,
            news_limit: positive_int(config, "news", "limit", 40)?,
            watchlist: parse_watchlist_key(config)?,
        })
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> DeskError {
    DeskError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<usize, DeskError> {
    let value = config.get_int(section, key, default);
    if value < 1 {
        return Err(invalid(section, key, "must be at least 1"));
    }
    Ok(value as usize)
}

fn non_negative_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, DeskError> {
    let value = config.get_int(section, key, default);
    if value < 0 {
        return Err(invalid(section, key, "must be non-negative"));
    }
    Ok(value)
}

fn validate_backtest(params: &BacktestParams) -> Result<(), DeskError> {
    if params.short_window >= params.long_window {
        return Err(invalid(
            "backtest",
            "short_window",
            "short_window must be less than long_window",
        ));
    }
    if !params.fee_bps.is_finite() || !(0.0..=10_000.0).contains(&params.fee_bps) {
        return Err(invalid(
            "backtest",
            "fee_bps",
            "fee_bps must be between 0 and 10000",
        ));
    }
    Ok(())
}

fn parse_source(config: &dyn ConfigPort) -> Result<DataSourceKind, DeskError> {
    match config.get_string_or("data", "source", "synthetic").to_lowercase().as_str() {
        "synthetic" => Ok(DataSourceKind::Synthetic),
        "stooq" => Ok(DataSourceKind::Stooq),
        "csv" => {
            let dir = config
                .get_string("data", "csv_dir")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| DeskError::ConfigMissing {
                    section: "data".to_string(),
                    key: "csv_dir".to_string(),
                })?;
            Ok(DataSourceKind::Csv {
                dir: PathBuf::from(dir),
            })
        }
        other => Err(invalid(
            "data",
            "source",
            &format!("unknown source '{other}', expected synthetic, csv or stooq"),
        )),
    }
}

fn parse_news_feeds(config: &dyn ConfigPort) -> Result<Vec<NewsFeed>, DeskError> {
    if !config.get_bool("news", "enabled", true) {
        return Ok(Vec::new());
    }
    match config.get_string("news", "feeds") {
        Some(raw) if !raw.trim().is_empty() => {
            let feeds = parse_feed_list(&raw).map_err(|e| match e {
                DeskError::Validation { reason } => invalid("news", "feeds", &reason),
                other => other,
            })?;
            if feeds.is_empty() {
                return Err(invalid("news", "feeds", "no feeds listed"));
            }
            Ok(feeds)
        }
        _ => Ok(default_feeds()),
    }
}

fn parse_watchlist_key(config: &dyn ConfigPort) -> Result<Vec<String>, DeskError> {
    match config.get_string("screener", "watchlist") {
        Some(raw) if !raw.trim().is_empty() => {
            let symbols = parse_watchlist(&raw);
            if symbols.is_empty() {
                return Err(invalid("screener", "watchlist", "no symbols listed"));
            }
            Ok(symbols)
        }
        _ => Ok(default_watchlist()),
    }
}

fn parse_cache_backend(config: &dyn ConfigPort) -> Result<CacheBackend, DeskError> {
    match config.get_string_or("cache", "backend", "sqlite").to_lowercase().as_str() {
        "memory" => Ok(CacheBackend::Memory),
        "sqlite" => Ok(CacheBackend::Sqlite),
        other => Err(invalid(
            "cache",
            "backend",
            &format!("unknown backend '{other}', expected memory or sqlite"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn load(content: &str) -> Result<Settings, DeskError> {
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        Settings::from_config(&adapter)
    }

    #[test]
    fn empty_config_uses_defaults() {
        let s = load("").unwrap();
        assert_eq!(s.source, DataSourceKind::Synthetic);
        assert_eq!(s.days, 252);
        assert_eq!(s.cache_backend, CacheBackend::Sqlite);
        assert_eq!(s.lookup_ttl, Some(Duration::from_secs(600)));
        assert_eq!(s.job_ttl, Some(Duration::from_secs(86_400)));
        assert_eq!(s.db_path, "data/chartdesk.db");
        assert_eq!(s.max_concurrent, 4);
        assert_eq!(s.backtest, BacktestParams::default());
        assert_eq!(s.listen, "127.0.0.1:8050");
        assert_eq!(s.health_rate_limit, 60);
        assert_eq!(s.max_risk_dollars, 10_000.0);
        assert_eq!(s.max_days, MAX_HISTORY_DAYS);
        assert!(!s.trust_forwarded_for);
        assert_eq!(s.news_feeds, default_feeds());
        assert_eq!(s.news_limit, 40);
        assert_eq!(s.watchlist, default_watchlist());
    }

    #[test]
    fn full_config() {
        let s = load(
            r#"
[data]
source = csv
csv_dir = /tmp/prices
days = 500

[cache]
backend = memory
job_ttl_secs = 0

[jobs]
max_concurrent = 2

[backtest]
short_window = 5
long_window = 50
fee_bps = 2.5
"#,
        )
        .unwrap();
        assert_eq!(
            s.source,
            DataSourceKind::Csv {
                dir: PathBuf::from("/tmp/prices")
            }
        );
        assert_eq!(s.days, 500);
        assert_eq!(s.cache_backend, CacheBackend::Memory);
        assert_eq!(s.job_ttl, None);
        assert_eq!(s.max_concurrent, 2);
        assert_eq!(s.backtest.short_window, 5);
        assert_eq!(s.backtest.long_window, 50);
        assert_eq!(s.backtest.fee_bps, 2.5);
    }

    #[test]
    fn csv_requires_dir() {
        let err = load("[data]\nsource = csv\n").unwrap_err();
        assert!(matches!(err, DeskError::ConfigMissing { ref key, .. } if key == "csv_dir"));
    }

    #[test]
    fn unknown_source_rejected() {
        let err = load("[data]\nsource = bloomberg\n").unwrap_err();
        assert!(matches!(err, DeskError::ConfigInvalid { ref key, .. } if key == "source"));
    }

    #[test]
    fn short_window_must_be_below_long() {
        let err = load("[backtest]\nshort_window = 20\nlong_window = 20\n").unwrap_err();
        assert!(matches!(err, DeskError::ConfigInvalid { ref key, .. } if key == "short_window"));
    }

    #[test]
    fn zero_window_rejected() {
        assert!(load("[backtest]\nshort_window = 0\n").is_err());
    }

    #[test]
    fn fee_out_of_range_rejected() {
        let err = load("[backtest]\nfee_bps = -1\n").unwrap_err();
        assert!(matches!(err, DeskError::ConfigInvalid { ref key, .. } if key == "fee_bps"));
        assert!(load("[backtest]\nfee_bps = 10001\n").is_err());
    }

    #[test]
    fn max_concurrent_must_be_positive() {
        let err = load("[jobs]\nmax_concurrent = 0\n").unwrap_err();
        assert!(matches!(err, DeskError::ConfigInvalid { ref key, .. } if key == "max_concurrent"));
    }

    #[test]
    fn negative_ttl_rejected() {
        assert!(load("[cache]\nlookup_ttl_secs = -5\n").is_err());
    }

    #[test]
    fn max_days_bounds_days() {
        let s = load("[data]\nmax_days = 500\ndays = 500\n").unwrap();
        assert_eq!(s.max_days, 500);
        let err = load("[data]\nmax_days = 100\ndays = 252\n").unwrap_err();
        assert!(matches!(err, DeskError::ConfigInvalid { ref key, .. } if key == "days"));
        let err = load("[data]\nmax_days = 1000000\n").unwrap_err();
        assert!(matches!(err, DeskError::ConfigInvalid { ref key, .. } if key == "max_days"));
    }

    #[test]
    fn news_and_watchlist_sections() {
        let s = load(
            "[news]\nfeeds = Wire|https://example.com/rss\nlimit = 5\n\n[screener]\nwatchlist = spy, qqq, spy\n\n[web]\ntrust_forwarded_for = true\n",
        )
        .unwrap();
        assert_eq!(s.news_feeds, vec![NewsFeed::new("Wire", "https://example.com/rss")]);
        assert_eq!(s.news_limit, 5);
        assert_eq!(s.watchlist, vec!["SPY", "QQQ"]);
        assert!(s.trust_forwarded_for);
    }

    #[test]
    fn news_disabled_has_no_feeds() {
        assert!(load("[news]\nenabled = false\n").unwrap().news_feeds.is_empty());
    }

    #[test]
    fn bad_feed_url_rejected() {
        let err = load("[news]\nfeeds = Local|ftp://example.com/rss\n").unwrap_err();
        assert!(matches!(err, DeskError::ConfigInvalid { ref key, .. } if key == "feeds"));
        let err = load("[screener]\nwatchlist = , ,\n").unwrap_err();
        assert!(matches!(err, DeskError::ConfigInvalid { ref key, .. } if key == "watchlist"));
    }
}
