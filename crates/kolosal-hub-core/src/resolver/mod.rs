//! Cache-first resolution of catalog listings.
//!
//! Every resolve call walks the same ladder:
//! 1. a fresh cache record, if one exists and is non-empty
//! 2. a live fetch, written back to the cache when non-empty
//! 3. an expired cache record, if the live fetch came back empty
//! 4. an empty list
//!
//! An empty live result is not distinguished from a failed one at this
//! level; both fall through to the offline record.

mod unified;

pub use unified::{CandidateOrigin, UnifiedItem, SEPARATOR_LABEL};

use crate::cache::{CacheNamespace, CacheStore};
use crate::catalog::{ArtifactFile, CatalogEntry, CatalogSource};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Which step of the ladder produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionOrigin {
    /// Fresh cache record.
    Cache,
    /// Live registry response.
    Live,
    /// Expired cache record used because the live fetch gave nothing.
    Offline,
    /// Nothing anywhere.
    Unavailable,
}

impl ResolutionOrigin {
    /// Advisory text for users.
    pub fn advisory(&self) -> &'static str {
        match self {
            ResolutionOrigin::Cache => "Using cached catalog data.",
            ResolutionOrigin::Live => "Fetched from the model registry.",
            ResolutionOrigin::Offline => {
                "Could not reach the model registry; showing previously cached data, which may be out of date."
            }
            ResolutionOrigin::Unavailable => {
                "Could not reach the model registry and no cached data is available."
            }
        }
    }
}

impl fmt::Display for ResolutionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionOrigin::Cache => "cache",
            ResolutionOrigin::Live => "live",
            ResolutionOrigin::Offline => "offline",
            ResolutionOrigin::Unavailable => "none",
        };
        f.write_str(name)
    }
}

/// A resolved listing and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub items: Vec<T>,
    pub origin: ResolutionOrigin,
}

impl<T> Resolved<T> {
    fn new(items: Vec<T>, origin: ResolutionOrigin) -> Self {
        Self { items, origin }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Combines a [`CatalogSource`] with a [`CacheStore`].
#[derive(Clone)]
pub struct Resolver {
    source: Arc<dyn CatalogSource>,
    cache: CacheStore,
    default_namespace: String,
}

impl Resolver {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        cache: CacheStore,
        default_namespace: impl Into<String>,
    ) -> Self {
        Self {
            source,
            cache,
            default_namespace: default_namespace.into(),
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Entries under `namespace`, from wherever they are available.
    pub async fn resolve_entries(&self, namespace: &str) -> Vec<CatalogEntry> {
        self.resolve_entries_traced(namespace).await.items
    }

    /// Artifacts of `entry_id`, best quantization first.
    pub async fn resolve_files(&self, entry_id: &str) -> Vec<ArtifactFile> {
        self.resolve_files_traced(entry_id).await.items
    }

    /// [`resolve_entries`](Self::resolve_entries) with the origin attached.
    pub async fn resolve_entries_traced(&self, namespace: &str) -> Resolved<CatalogEntry> {
        self.resolve(CacheNamespace::Entries, namespace, || {
            self.source.list_entries(namespace)
        })
        .await
    }

    /// [`resolve_files`](Self::resolve_files) with the origin attached.
    pub async fn resolve_files_traced(&self, entry_id: &str) -> Resolved<ArtifactFile> {
        self.resolve(CacheNamespace::Files, entry_id, || {
            self.source.list_files(entry_id)
        })
        .await
    }

    async fn resolve<T, F, Fut>(&self, namespace: CacheNamespace, key: &str, fetch: F) -> Resolved<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<T>>,
    {
        let kind = namespace.as_str();

        if let Some(items) = self.cache.read_fresh::<T>(namespace, key) {
            if !items.is_empty() {
                info!("Resolved {} for {} from cache ({} items)", kind, key, items.len());
                return Resolved::new(items, ResolutionOrigin::Cache);
            }
        }

        let live = fetch().await;
        if !live.is_empty() {
            self.cache.write(namespace, key, &live);
            info!("Resolved {} for {} from registry ({} items)", kind, key, live.len());
            return Resolved::new(live, ResolutionOrigin::Live);
        }

        if let Some(items) = self.cache.read_offline::<T>(namespace, key) {
            if !items.is_empty() {
                info!(
                    "Registry gave no {} for {}; using expired cache ({} items)",
                    kind,
                    key,
                    items.len()
                );
                return Resolved::new(items, ResolutionOrigin::Offline);
            }
        }

        info!("No {} available for {}", kind, key);
        Resolved::new(Vec::new(), ResolutionOrigin::Unavailable)
    }
}
