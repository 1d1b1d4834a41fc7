use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::data::CacheSummary;
use crate::error::{BenchError, Result};

/// Key under which the file at `index` is cached
pub fn entry_key(index: usize) -> String {
    format!("img-{}", index)
}

/// The Cache is a persistent key-value store of raw image bytes,
/// backed by a single SQLite table.
///
/// It only remembers the database path. Each operation opens its own
/// connection so the handle can be cloned into background tasks.
#[derive(Clone)]
pub struct Cache {
    db_path: Option<PathBuf>,
}

impl Cache {
    /// Open (or create) the cache database at `db_path`.
    ///
    /// Never fails: if the store cannot be created the returned cache is
    /// unavailable and every operation reports [`BenchError::CacheUnavailable`].
    pub fn open(db_path: Option<PathBuf>) -> Self {
        let Some(db_path) = db_path else {
            warn!("⚠️  No cache directory on this system, cache disabled");
            return Self::unavailable();
        };

        match Self::init_schema(&db_path) {
            Ok(()) => {
                info!("📁 Cache initialized at: {}", db_path.display());
                Self {
                    db_path: Some(db_path),
                }
            }
            Err(e) => {
                error!("❌ Cache unavailable at {}: {}", db_path.display(), e);
                Self::unavailable()
            }
        }
    }

    pub fn unavailable() -> Self {
        Self { db_path: None }
    }

    pub fn is_available(&self) -> bool {
        self.db_path.is_some()
    }

    /// Create the entries table if it doesn't exist
    fn init_schema(db_path: &Path) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS entries (
                key         TEXT PRIMARY KEY,
                value       BLOB NOT NULL,
                stored_at   INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn connection(&self) -> Result<Connection> {
        let path = self.db_path.as_ref().ok_or(BenchError::CacheUnavailable)?;
        Ok(Connection::open(path)?)
    }

    /// Store `bytes` under `key`, replacing any previous value
    pub fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.connection()?.execute(
            "INSERT OR REPLACE INTO entries (key, value, stored_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, bytes, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .connection()?
            .query_row(
                "SELECT value FROM entries WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn list_keys(&self) -> Result<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT key FROM entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.connection()?
            .execute("DELETE FROM entries WHERE key = ?1", [key])?;
        Ok(())
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<()> {
        self.connection()?.execute("DELETE FROM entries", [])?;
        Ok(())
    }

    /// Count entries and total stored bytes.
    ///
    /// Walks every key and reads its value back. Any failure is reported
    /// as an unavailable cache, never as an error.
    pub fn summary(&self) -> CacheSummary {
        match self.try_summary() {
            Ok(summary) => summary,
            Err(BenchError::CacheUnavailable) => CacheSummary::unavailable(),
            Err(e) => {
                error!("❌ Cache summary failed: {}", e);
                CacheSummary::unavailable()
            }
        }
    }

    fn try_summary(&self) -> Result<CacheSummary> {
        let keys = self.list_keys()?;
        let mut total_bytes = 0u64;
        for key in &keys {
            if let Some(value) = self.get(key)? {
                total_bytes += value.len() as u64;
            }
        }

        Ok(CacheSummary {
            available: true,
            entry_count: keys.len(),
            total_bytes,
        })
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("db_path", &self.db_path)
            .finish()
    }
}
