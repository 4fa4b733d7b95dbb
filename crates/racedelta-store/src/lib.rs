//! Durable key→value cache tier backed by `DuckDB`.
//!
//! This is the slow, long-lived half of the layered cache: fully computed
//! results (timelines, standings, metric bundles) are stored as JSON text
//! keyed by a composite of their inputs, with a per-entry expiry. The store
//! has no schema beyond the single `cache_entries` table.

pub mod pool;

use std::path::Path;
use std::time::Duration;

use duckdb::params;
use thiserror::Error;
use time::OffsetDateTime;

pub use pool::{ConnectionManager, PooledConnection};

/// Default lifetime for durable entries: six hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

const MAX_POOL_SIZE: usize = 4;

/// Errors surfaced by the durable cache tier.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("cache key cannot be empty")]
    EmptyKey,
}

/// Disk-backed cache with per-entry expiry.
///
/// Expired entries are not deleted on read so that callers can still prefer
/// a stale entry over a failed recomputation; [`DurableCache::purge_expired`]
/// reclaims space when convenient.
#[derive(Clone)]
pub struct DurableCache {
    manager: ConnectionManager,
    default_ttl: Duration,
}

impl DurableCache {
    /// Open (or create) the cache database at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the table cannot be
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_ttl(path, DEFAULT_TTL)
    }

    /// Open the cache database with a non-default entry lifetime.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the table cannot be
    /// created.
    pub fn open_with_ttl(path: impl AsRef<Path>, default_ttl: Duration) -> Result<Self, StoreError> {
        let manager = ConnectionManager::open(path.as_ref(), MAX_POOL_SIZE)?;
        let connection = manager.acquire()?;
        connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at BIGINT NOT NULL
            );",
        )?;
        drop(connection);

        Ok(Self {
            manager,
            default_ttl,
        })
    }

    /// Fetch a non-expired entry.
    ///
    /// # Errors
    /// Returns an error only for database failures; a missing or expired key
    /// is `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(key, false)
    }

    /// Fetch an entry even if it has expired.
    pub fn get_stale(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(key, true)
    }

    /// Insert or replace an entry.
    ///
    /// # Errors
    /// Returns [`StoreError::EmptyKey`] for an empty key, or a database error.
    pub fn put(
        &self,
        key: &str,
        value: &str,
        ttl_override: Option<Duration>,
    ) -> Result<(), StoreError> {
        if key.trim().is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let ttl = ttl_override.unwrap_or(self.default_ttl);
        let expires_at = now_unix() + ttl.as_secs() as i64;

        let connection = self.manager.acquire()?;
        connection.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)",
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    /// Delete every expired entry, returning how many were removed.
    ///
    /// # Errors
    /// Returns an error for database failures.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let connection = self.manager.acquire()?;
        let removed = connection.execute(
            "DELETE FROM cache_entries WHERE expires_at <= ?",
            params![now_unix()],
        )?;
        Ok(removed)
    }

    /// Number of entries currently stored, including expired ones.
    ///
    /// # Errors
    /// Returns an error for database failures.
    pub fn len(&self) -> Result<usize, StoreError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare("SELECT COUNT(*) FROM cache_entries")?;
        let mut rows = statement.query([])?;
        let count: i64 = match rows.next()? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(count.max(0) as usize)
    }

    /// Whether the store holds no entries at all.
    ///
    /// # Errors
    /// Returns an error for database failures.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn read(&self, key: &str, allow_stale: bool) -> Result<Option<String>, StoreError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection
            .prepare("SELECT value, expires_at FROM cache_entries WHERE key = ?")?;
        let mut rows = statement.query(params![key])?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let value: String = row.get(0)?;
        let expires_at: i64 = row.get(1)?;

        if !allow_stale && expires_at <= now_unix() {
            return Ok(None);
        }

        Ok(Some(value))
    }
}

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
