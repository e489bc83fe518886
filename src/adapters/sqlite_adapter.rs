//! SQLite storage: the trade journal and the durable result cache.

use crate::domain::error::DeskError;
use crate::domain::journal::{Side, Trade};
use crate::ports::cache_port::{now_ms, CacheEntry, CachePort};
use crate::ports::journal_port::JournalPort;
use chrono::NaiveDate;
use log::debug;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use std::time::Duration;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn open(path: &str, pool_size: u32) -> Result<Self, DeskError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")
        });
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;
        debug!("opened sqlite database at {path} (pool size {pool_size})");

        Ok(Self { pool })
    }

    /// Each in-memory connection is its own database, so the pool holds one.
    pub fn in_memory() -> Result<Self, DeskError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), DeskError> {
        let conn = self.pool.get()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                ticker TEXT NOT NULL,
                side TEXT CHECK(side IN ('long','short')) NOT NULL,
                entry REAL,
                exit REAL,
                stop REAL,
                qty REAL,
                risk REAL,
                reward REAL,
                rr REAL,
                thesis TEXT,
                notes TEXT,
                tags TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_trades_date ON trades(date);
            CREATE INDEX IF NOT EXISTS idx_trades_ticker ON trades(ticker);
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                inserted_at_ms INTEGER NOT NULL,
                ttl_ms INTEGER
            );",
        )?;

        Ok(())
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            raw.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn parse_side(raw: &str) -> Result<Side, rusqlite::Error> {
    raw.parse::<Side>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(raw.len(), rusqlite::types::Type::Text, Box::new(e))
    })
}

impl JournalPort for SqliteAdapter {
    fn insert(&self, trade: &Trade) -> Result<(), DeskError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR REPLACE INTO trades
                (id, date, ticker, side, entry, exit, stop, qty, risk, reward, rr, thesis, notes, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                trade.id,
                trade.date.format("%Y-%m-%d").to_string(),
                trade.ticker,
                trade.side.to_string(),
                trade.entry,
                trade.exit,
                trade.stop,
                trade.qty,
                trade.risk,
                trade.reward,
                trade.rr,
                trade.thesis,
                trade.notes,
                trade.tags,
            ],
        )?;
        Ok(())
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<Trade>, DeskError> {
        let conn = self.pool.get()?;

        // LIMIT -1 is "no limit" in SQLite
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let mut stmt = conn.prepare(
            "SELECT id, date, ticker, side, entry, exit, stop, qty, risk, reward, rr, thesis, notes, tags
             FROM trades
             ORDER BY date DESC, ROWID DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            let date: String = row.get(1)?;
            let side: String = row.get(3)?;
            Ok(Trade {
                id: row.get(0)?,
                date: parse_date(&date)?,
                ticker: row.get(2)?,
                side: parse_side(&side)?,
                entry: row.get(4)?,
                exit: row.get(5)?,
                stop: row.get(6)?,
                qty: row.get::<_, Option<f64>>(7)?.unwrap_or(0.0),
                risk: row.get::<_, Option<f64>>(8)?.unwrap_or(0.0),
                reward: row.get::<_, Option<f64>>(9)?.unwrap_or(0.0),
                rr: row.get(10)?,
                thesis: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
                notes: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
                tags: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
            })
        })?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row?);
        }
        Ok(trades)
    }
}

impl CachePort for SqliteAdapter {
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), DeskError> {
        let entry = CacheEntry::new(key, value, ttl);
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, inserted_at_ms, ttl_ms)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.key, entry.value, entry.inserted_at_ms, entry.ttl_ms],
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, DeskError> {
        let conn = self.pool.get()?;
        let entry = conn
            .query_row(
                "SELECT key, value, inserted_at_ms, ttl_ms FROM cache_entries WHERE key = ?1",
                params![key],
                |row| {
                    Ok(CacheEntry {
                        key: row.get(0)?,
                        value: row.get(1)?,
                        inserted_at_ms: row.get(2)?,
                        ttl_ms: row.get(3)?,
                    })
                },
            )
            .optional()?;

        match entry {
            Some(entry) if entry.is_expired() => {
                conn.execute(
                    "DELETE FROM cache_entries WHERE key = ?1 AND inserted_at_ms = ?2",
                    params![key, entry.inserted_at_ms],
                )?;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    fn remove(&self, key: &str) -> Result<(), DeskError> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, DeskError> {
        let conn = self.pool.get()?;
        let removed = conn.execute(
            "DELETE FROM cache_entries
             WHERE ttl_ms IS NOT NULL AND ?1 - inserted_at_ms >= ttl_ms",
            params![now_ms()],
        )?;
        Ok(removed)
    }
}
