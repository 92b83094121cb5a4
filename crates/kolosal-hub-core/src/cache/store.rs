//! Typed cache store over a [`CacheBackend`].
//!
//! Reads never fail: an absent, unreadable or undecodable record is a miss.
//! Writes of empty listings are skipped so a failed or empty fetch never
//! clobbers earlier data.

use super::json_file::JsonFileBackend;
use super::sqlite::SqliteBackend;
use super::traits::{CacheBackend, CacheRecord};
use crate::config::{CacheConfig, HubConfig};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Kind of listing a record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// Entry search results, keyed by namespace filter.
    Entries,
    /// File listings, keyed by entry id.
    Files,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 2] = [CacheNamespace::Entries, CacheNamespace::Files];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Entries => "entries",
            CacheNamespace::Files => "files",
        }
    }
}

/// True when a record stored at `stored_at` is still inside `window` at
/// `now`. Records stamped in the future count as fresh.
pub fn is_fresh(stored_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    let age = now.signed_duration_since(stored_at);
    match age.to_std() {
        Ok(age) => age < window,
        Err(_) => true,
    }
}

/// Cache of catalog listings with per-namespace freshness windows.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    entries_ttl: Duration,
    files_ttl: Duration,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &HubConfig) -> Self {
        Self {
            backend,
            entries_ttl: config.entries_ttl(),
            files_ttl: config.files_ttl(),
        }
    }

    /// Store backed by JSON files in `dir`.
    pub fn json_files(dir: impl AsRef<Path>, config: &HubConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(JsonFileBackend::new(dir)?), config))
    }

    /// Store backed by a SQLite database inside `dir`.
    pub fn sqlite(dir: impl AsRef<Path>, config: &HubConfig) -> Result<Self> {
        let db_path = dir.as_ref().join(CacheConfig::SQLITE_FILENAME);
        Ok(Self::new(Arc::new(SqliteBackend::new(db_path)?), config))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Freshness window for `namespace`.
    pub fn window(&self, namespace: CacheNamespace) -> Duration {
        match namespace {
            CacheNamespace::Entries => self.entries_ttl,
            CacheNamespace::Files => self.files_ttl,
        }
    }

    fn load<T: DeserializeOwned>(
        &self,
        namespace: CacheNamespace,
        key: &str,
    ) -> Option<CacheRecord<Vec<T>>> {
        let record = match self.backend.load(namespace.as_str(), key) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(
                    "Unreadable cache record {}/{}, treating as miss: {}",
                    namespace.as_str(),
                    key,
                    e
                );
                return None;
            }
        };

        match serde_json::from_value::<Vec<T>>(record.payload) {
            Ok(payload) => Some(CacheRecord {
                key: record.key,
                payload,
                stored_at: record.stored_at,
            }),
            Err(e) => {
                warn!(
                    "Cache record {}/{} has unexpected shape, treating as miss: {}",
                    namespace.as_str(),
                    key,
                    e
                );
                None
            }
        }
    }

    /// Payload for `key` if it was stored within the freshness window.
    pub fn read_fresh<T: DeserializeOwned>(
        &self,
        namespace: CacheNamespace,
        key: &str,
    ) -> Option<Vec<T>> {
        self.read_fresh_at(namespace, key, Utc::now())
    }

    /// [`read_fresh`](Self::read_fresh) evaluated at `now`.
    pub fn read_fresh_at<T: DeserializeOwned>(
        &self,
        namespace: CacheNamespace,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<Vec<T>> {
        let record = self.load::<T>(namespace, key)?;
        if is_fresh(record.stored_at, now, self.window(namespace)) {
            debug!("Fresh cache hit for {}/{}", namespace.as_str(), key);
            Some(record.payload)
        } else {
            debug!(
                "Cache record {}/{} expired (stored {})",
                namespace.as_str(),
                key,
                record.stored_at
            );
            None
        }
    }

    /// Payload for `key` regardless of age.
    pub fn read_offline<T: DeserializeOwned>(
        &self,
        namespace: CacheNamespace,
        key: &str,
    ) -> Option<Vec<T>> {
        self.load::<T>(namespace, key).map(|record| record.payload)
    }

    /// Store `payload` for `key`, stamped now.
    ///
    /// An empty payload is skipped. Returns whether a record was written.
    pub fn write<T: Serialize>(&self, namespace: CacheNamespace, key: &str, payload: &[T]) -> bool {
        self.write_at(namespace, key, payload, Utc::now())
    }

    /// [`write`](Self::write) with an explicit timestamp.
    pub fn write_at<T: Serialize>(
        &self,
        namespace: CacheNamespace,
        key: &str,
        payload: &[T],
        stored_at: DateTime<Utc>,
    ) -> bool {
        if payload.is_empty() {
            debug!("Not caching empty {} listing for {}", namespace.as_str(), key);
            return false;
        }

        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to encode cache record {}/{}: {}", namespace.as_str(), key, e);
                return false;
            }
        };
        let record = CacheRecord {
            key: key.to_string(),
            payload: value,
            stored_at,
        };

        match self.backend.store(namespace.as_str(), &record) {
            Ok(()) => {
                debug!(
                    "Cached {} {} items for {}",
                    payload.len(),
                    namespace.as_str(),
                    key
                );
                true
            }
            Err(e) => {
                warn!("Failed to write cache record {}/{}: {}", namespace.as_str(), key, e);
                false
            }
        }
    }

    /// Remove every record. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        self.backend.clear_all()
    }

    /// True when anything is cached. Errors count as "nothing".
    pub fn has_any_records(&self) -> bool {
        self.backend.has_any().unwrap_or_else(|e| {
            warn!("Failed to inspect cache: {}", e);
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ArtifactFile, CatalogEntry};
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    fn stores(temp: &TempDir) -> Vec<CacheStore> {
        let config = HubConfig::default();
        vec![
            CacheStore::json_files(temp.path().join("json"), &config).unwrap(),
            CacheStore::sqlite(temp.path().join("db"), &config).unwrap(),
        ]
    }

    fn entries(ids: &[&str]) -> Vec<CatalogEntry> {
        ids.iter().map(|id| CatalogEntry::new(*id)).collect()
    }

    #[test]
    fn test_is_fresh_boundary() {
        let t = Utc::now();
        let window = Duration::from_secs(3600);
        let eps = ChronoDuration::milliseconds(1);
        let w = ChronoDuration::seconds(3600);

        assert!(is_fresh(t, t, window));
        assert!(is_fresh(t, t + w - eps, window));
        assert!(!is_fresh(t, t + w, window));
        assert!(!is_fresh(t, t + w + eps, window));
        assert!(is_fresh(t, t - ChronoDuration::seconds(5), window));
    }

    #[test]
    fn test_freshness_boundary_through_store() {
        let temp = TempDir::new().unwrap();
        for store in stores(&temp) {
            let t = Utc::now() - ChronoDuration::hours(10);
            let payload = entries(&["kolosal/a"]);
            assert!(store.write_at(CacheNamespace::Entries, "kolosal", &payload, t));

            let w = ChronoDuration::seconds(3600);
            let eps = ChronoDuration::seconds(1);
            let before: Option<Vec<CatalogEntry>> =
                store.read_fresh_at(CacheNamespace::Entries, "kolosal", t + w - eps);
            let after: Option<Vec<CatalogEntry>> =
                store.read_fresh_at(CacheNamespace::Entries, "kolosal", t + w + eps);
            assert_eq!(before, Some(payload.clone()));
            assert_eq!(after, None);

            let offline: Option<Vec<CatalogEntry>> =
                store.read_offline(CacheNamespace::Entries, "kolosal");
            assert_eq!(offline, Some(payload));
        }
    }

    #[test]
    fn test_files_use_shorter_window() {
        let temp = TempDir::new().unwrap();
        let stores = stores(&temp);
        let store = &stores[0];
        let t = Utc::now() - ChronoDuration::seconds(2700);
        let files = vec![ArtifactFile::new("k/m", "m.Q8_0.gguf", "https://h", "main")];

        store.write_at(CacheNamespace::Files, "k/m", &files, t);
        store.write_at(CacheNamespace::Entries, "k", &entries(&["k/m"]), t);

        assert!(store
            .read_fresh::<ArtifactFile>(CacheNamespace::Files, "k/m")
            .is_none());
        assert!(store
            .read_fresh::<CatalogEntry>(CacheNamespace::Entries, "k")
            .is_some());
    }

    #[test]
    fn test_write_is_idempotent() {
        let temp = TempDir::new().unwrap();
        for store in stores(&temp) {
            let payload = entries(&["kolosal/a", "kolosal/b"]);
            store.write(CacheNamespace::Entries, "kolosal", &payload);
            store.write(CacheNamespace::Entries, "kolosal", &payload);

            assert_eq!(
                store.read_fresh::<CatalogEntry>(CacheNamespace::Entries, "kolosal"),
                Some(payload.clone())
            );
            assert_eq!(
                store.read_offline::<CatalogEntry>(CacheNamespace::Entries, "kolosal"),
                Some(payload)
            );
        }
    }

    #[test]
    fn test_empty_write_is_noop() {
        let temp = TempDir::new().unwrap();
        for store in stores(&temp) {
            let payload = entries(&["kolosal/a"]);
            store.write(CacheNamespace::Entries, "kolosal", &payload);

            let empty: Vec<CatalogEntry> = Vec::new();
            assert!(!store.write(CacheNamespace::Entries, "kolosal", &empty));
            assert!(!store.write(CacheNamespace::Entries, "fresh-key", &empty));

            assert_eq!(
                store.read_offline::<CatalogEntry>(CacheNamespace::Entries, "kolosal"),
                Some(payload)
            );
            assert!(store
                .read_offline::<CatalogEntry>(CacheNamespace::Entries, "fresh-key")
                .is_none());
        }
    }

    #[test]
    fn test_artifact_round_trip_keeps_order_and_fields() {
        let temp = TempDir::new().unwrap();
        for store in stores(&temp) {
            let files = vec![
                ArtifactFile::new("kolosal/m", "m.F16.gguf", "https://h", "main"),
                ArtifactFile::new("kolosal/m", "m.Q4_K_M.gguf", "https://h", "main"),
            ];
            store.write(CacheNamespace::Files, "kolosal/m", &files);
            assert_eq!(
                store.read_offline::<ArtifactFile>(CacheNamespace::Files, "kolosal/m"),
                Some(files)
            );
        }
    }

    #[test]
    fn test_corrupt_record_is_miss() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("json");
        let backend = JsonFileBackend::new(&dir).unwrap();
        std::fs::write(backend.record_path("entries", "kolosal"), "{{{").unwrap();

        let store = CacheStore::new(Arc::new(backend), &HubConfig::default());
        assert!(store
            .read_fresh::<CatalogEntry>(CacheNamespace::Entries, "kolosal")
            .is_none());
        assert!(store
            .read_offline::<CatalogEntry>(CacheNamespace::Entries, "kolosal")
            .is_none());
    }

    #[test]
    fn test_wrong_payload_shape_is_miss() {
        let temp = TempDir::new().unwrap();
        let stores = stores(&temp);
        let store = &stores[0];
        store.write(CacheNamespace::Entries, "kolosal", &[42, 43]);
        assert!(store
            .read_offline::<ArtifactFile>(CacheNamespace::Entries, "kolosal")
            .is_none());
    }

    #[test]
    fn test_clear_and_has_any() {
        let temp = TempDir::new().unwrap();
        for store in stores(&temp) {
            assert!(!store.has_any_records());
            store.write(CacheNamespace::Entries, "kolosal", &entries(&["kolosal/a"]));
            assert!(store.has_any_records());

            assert_eq!(store.clear().unwrap(), 1);
            assert!(!store.has_any_records());
            assert!(store
                .read_offline::<CatalogEntry>(CacheNamespace::Entries, "kolosal")
                .is_none());
        }
    }
}
