//! Cache backend trait and record type.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cached listing.
///
/// Backends hold the payload as an untyped JSON value; the store decodes it
/// into the listing type on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord<P = serde_json::Value> {
    /// Query identity (namespace filter or entry id).
    pub key: String,
    /// The cached listing.
    pub payload: P,
    /// When the listing was fetched.
    pub stored_at: DateTime<Utc>,
}

/// Durable storage for cache records.
///
/// Records are isolated by namespace and replaced wholesale on store. All
/// operations are synchronous; both implementations are backed by local
/// files.
pub trait CacheBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Load the record for `key`, regardless of age.
    ///
    /// Returns `Ok(None)` when nothing is stored, and an error when stored
    /// data can't be read or decoded.
    fn load(&self, namespace: &str, key: &str) -> Result<Option<CacheRecord>>;

    /// Store `record`, replacing any prior record with the same key.
    fn store(&self, namespace: &str, record: &CacheRecord) -> Result<()>;

    /// Remove every record. Returns the number removed.
    fn clear_all(&self) -> Result<usize>;

    /// True when at least one record is stored.
    fn has_any(&self) -> Result<bool>;
}
