//! On-disk enrichment cache.
//!
//! Enriched records are stored as JSON in SQLite, one row per dataset path,
//! under a key built from the dataset digest, the extractor fingerprint and
//! the recognizer's model fingerprint. A lookup with any other key is a miss,
//! so a changed file, extractor table or NER model never serves stale records.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use reviewgraph_core::{Error, Result};

use crate::schema::CACHE_SCHEMA_SQL;

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

pub struct EnrichmentCache {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl EnrichmentCache {
    /// Open or create the cache database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Database(e.to_string()))?;
            }
        }

        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA cache_size = -65536;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        conn.execute_batch(CACHE_SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let cache = Self {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
        };
        info!(
            "EnrichmentCache opened: {} entries, path={}",
            cache.entry_count()?,
            cache.db_path.display()
        );
        Ok(cache)
    }

    /// Key for a dataset digest, extractor fingerprint and recognizer model fingerprint.
    pub fn cache_key(dataset_digest: &str, fingerprint: &str, recognizer: &str) -> String {
        format!("{}:{}:{}", dataset_digest, fingerprint, recognizer)
    }

    fn dataset_id(dataset: &Path) -> String {
        std::fs::canonicalize(dataset)
            .unwrap_or_else(|_| dataset.to_path_buf())
            .display()
            .to_string()
    }

    /// Cached value for `dataset` if it was stored under `key`.
    ///
    /// An entry that no longer deserializes is treated as a miss.
    pub fn get<T: DeserializeOwned>(&self, dataset: &Path, key: &str) -> Result<Option<T>> {
        let id = Self::dataset_id(dataset);
        let conn = self.conn.lock();
        let row: Option<(String, String)> = conn
            .prepare_cached(
                "SELECT cache_key, records_json FROM enrichment_cache WHERE dataset_path = ?1",
            )
            .map_err(db_err)?
            .query_row(params![id], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()
            .map_err(db_err)?;

        match row {
            Some((stored_key, json)) if stored_key == key => match serde_json::from_str(&json) {
                Ok(value) => {
                    debug!("Cache hit for {}", id);
                    Ok(Some(value))
                }
                Err(e) => {
                    warn!("Discarding unreadable cache entry for {}: {}", id, e);
                    Ok(None)
                }
            },
            Some(_) => {
                debug!("Cache key changed for {}", id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Store `value` for `dataset` under `key`, replacing any prior entry.
    pub fn store<T: Serialize>(
        &self,
        dataset: &Path,
        key: &str,
        record_count: usize,
        value: &T,
    ) -> Result<()> {
        let id = Self::dataset_id(dataset);
        let json = serde_json::to_string(value)?;
        let created_at = chrono::Utc::now().to_rfc3339();
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT OR REPLACE INTO enrichment_cache
                 (dataset_path, cache_key, record_count, records_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(db_err)?
        .execute(params![id, key, record_count as i64, json, created_at])
        .map_err(db_err)?;
        debug!("Cached {} records for {}", record_count, id);
        Ok(())
    }

    /// Drop the entry for `dataset`. Returns whether one existed.
    pub fn invalidate(&self, dataset: &Path) -> Result<bool> {
        let id = Self::dataset_id(dataset);
        let conn = self.conn.lock();
        let removed = conn
            .execute("DELETE FROM enrichment_cache WHERE dataset_path = ?1", params![id])
            .map_err(db_err)?;
        Ok(removed > 0)
    }

    pub fn entry_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM enrichment_cache", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(count as usize)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
