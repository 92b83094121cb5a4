//! SQLite cache backend.

use super::traits::{CacheBackend, CacheRecord};
use crate::error::{HubError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// SQLite-based cache backend.
///
/// All records live in one table keyed by `(namespace, key)`. Thread-safe
/// via internal mutex on the connection.
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open (or create) the database at `db_path`.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HubError::Io {
                message: format!("Failed to create cache directory: {}", e),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| HubError::Database {
            message: format!("Failed to open cache database: {}", e),
            source: Some(e),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| HubError::Database {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        Self::with_connection(conn)
    }

    /// In-memory database, for tests and throwaway sessions.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_records (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                payload TEXT NOT NULL,
                stored_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            );
            "#,
        )
        .map_err(|e| HubError::Database {
            message: format!("Failed to initialize cache schema: {}", e),
            source: Some(e),
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| HubError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }
}

impl CacheBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn load(&self, namespace: &str, key: &str) -> Result<Option<CacheRecord>> {
        let conn = self.lock()?;

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT payload, stored_at FROM cache_records WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| HubError::Database {
                message: format!("Failed to query cache record: {}", e),
                source: Some(e),
            })?;

        let Some((payload, stored_at)) = row else {
            return Ok(None);
        };

        let payload = serde_json::from_str(&payload).map_err(|e| HubError::Json {
            message: format!("Corrupt payload for {}/{}: {}", namespace, key, e),
            source: Some(e),
        })?;
        let stored_at = DateTime::parse_from_rfc3339(&stored_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                HubError::Other(format!(
                    "Corrupt timestamp for {}/{}: {}",
                    namespace, key, e
                ))
            })?;

        Ok(Some(CacheRecord {
            key: key.to_string(),
            payload,
            stored_at,
        }))
    }

    fn store(&self, namespace: &str, record: &CacheRecord) -> Result<()> {
        let payload = serde_json::to_string(&record.payload)?;
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO cache_records (namespace, key, payload, stored_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![namespace, record.key, payload, record.stored_at.to_rfc3339()],
        )
        .map_err(|e| HubError::Database {
            message: format!("Failed to store cache record: {}", e),
            source: Some(e),
        })?;

        Ok(())
    }

    fn clear_all(&self) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM cache_records", [])?;
        debug!("Deleted {} cache records", deleted);
        Ok(deleted)
    }

    fn has_any(&self) -> Result<bool> {
        let conn = self.lock()?;
        let exists: bool =
            conn.query_row("SELECT EXISTS(SELECT 1 FROM cache_records)", [], |row| {
                row.get(0)
            })?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(key: &str, payload: serde_json::Value) -> CacheRecord {
        CacheRecord {
            key: key.to_string(),
            payload,
            stored_at: Utc::now(),
        }
    }

    #[test]
    fn test_store_and_load() {
        let backend = SqliteBackend::in_memory().unwrap();
        let rec = record("kolosal", json!(["kolosal/a"]));
        backend.store("entries", &rec).unwrap();

        let loaded = backend.load("entries", "kolosal").unwrap().unwrap();
        assert_eq!(loaded.payload, rec.payload);
        assert_eq!(loaded.stored_at.timestamp(), rec.stored_at.timestamp());
    }

    #[test]
    fn test_namespace_isolation() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.store("entries", &record("k", json!([1]))).unwrap();
        backend.store("files", &record("k", json!([2]))).unwrap();

        assert_eq!(backend.load("entries", "k").unwrap().unwrap().payload, json!([1]));
        assert_eq!(backend.load("files", "k").unwrap().unwrap().payload, json!([2]));
    }

    #[test]
    fn test_store_replaces() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.store("entries", &record("k", json!(["old"]))).unwrap();
        backend.store("entries", &record("k", json!(["new"]))).unwrap();
        assert_eq!(
            backend.load("entries", "k").unwrap().unwrap().payload,
            json!(["new"])
        );
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("cache").join("catalog.sqlite");
        {
            let backend = SqliteBackend::new(&db).unwrap();
            backend.store("entries", &record("k", json!(["a"]))).unwrap();
        }
        let backend = SqliteBackend::new(&db).unwrap();
        assert!(backend.has_any().unwrap());
        assert!(backend.load("entries", "k").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_payload_is_error() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO cache_records VALUES ('entries', 'k', '{broken', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        assert!(backend.load("entries", "k").is_err());
    }

    #[test]
    fn test_clear_all() {
        let backend = SqliteBackend::in_memory().unwrap();
        assert!(!backend.has_any().unwrap());
        backend.store("entries", &record("a", json!([1]))).unwrap();
        backend.store("files", &record("b", json!([2]))).unwrap();

        assert_eq!(backend.clear_all().unwrap(), 2);
        assert!(!backend.has_any().unwrap());
    }
}
