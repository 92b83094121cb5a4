//! Kolosal Hub - model catalog discovery with an offline-tolerant cache.
//!
//! Lists model entries and their downloadable GGUF artifacts from the
//! Hugging Face registry, ranks artifacts by quantization, and caches every
//! non-empty listing so that later runs can answer even without network.
//!
//! # Example
//!
//! ```rust,ignore
//! use kolosal_hub::ModelHub;
//!
//! #[tokio::main]
//! async fn main() -> kolosal_hub::Result<()> {
//!     let hub = ModelHub::builder().auto_create_dirs(true).build()?;
//!
//!     let resolved = hub.resolve_entries_traced("kolosal").await;
//!     println!("{} entries ({})", resolved.items.len(), resolved.origin);
//!
//!     for file in hub.resolve_files("kolosal/qwen3-8b").await {
//!         println!("{} [{}]", file.filename, file.quantization_tag);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gguf;
pub mod input;
pub mod memory;
pub mod platform;
pub mod quant;
pub mod resolver;

mod builder;

pub use builder::{BackendKind, ModelHubBuilder};
pub use cache::{CacheBackend, CacheNamespace, CacheRecord, CacheStore, JsonFileBackend, SqliteBackend};
pub use catalog::{ArtifactFile, CatalogEntry, CatalogSource, HubClient};
pub use config::HubConfig;
pub use error::{HubError, Result};
pub use gguf::ModelParams;
pub use input::{classify_input, ModelReference};
pub use memory::MemoryEstimate;
pub use quant::{classify, Quantization};
pub use resolver::{CandidateOrigin, Resolved, ResolutionOrigin, Resolver, UnifiedItem};

use std::path::{Path, PathBuf};

/// Entry point bundling configuration, registry client, cache and resolver.
pub struct ModelHub {
    config: HubConfig,
    cache_dir: PathBuf,
    client: HubClient,
    resolver: Resolver,
}

impl ModelHub {
    pub fn builder() -> ModelHubBuilder {
        ModelHubBuilder::new()
    }

    /// Hub with `config`, creating the cache directory if needed.
    pub fn new(config: HubConfig) -> Result<Self> {
        Self::builder().config(config).auto_create_dirs(true).build()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn client(&self) -> &HubClient {
        &self.client
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub async fn resolve_entries(&self, namespace: &str) -> Vec<CatalogEntry> {
        self.resolver.resolve_entries(namespace).await
    }

    pub async fn resolve_entries_traced(&self, namespace: &str) -> Resolved<CatalogEntry> {
        self.resolver.resolve_entries_traced(namespace).await
    }

    pub async fn resolve_files(&self, entry_id: &str) -> Vec<ArtifactFile> {
        self.resolver.resolve_files(entry_id).await
    }

    pub async fn resolve_files_traced(&self, entry_id: &str) -> Resolved<ArtifactFile> {
        self.resolver.resolve_files_traced(entry_id).await
    }

    /// See [`Resolver::resolve_unified`].
    pub async fn resolve_unified(
        &self,
        configured: &[String],
        downloaded: &[String],
    ) -> Vec<UnifiedItem> {
        self.resolver.resolve_unified(configured, downloaded).await
    }

    /// Engine libraries for this platform in `repo`, or in the configured
    /// engines entry when `repo` is `None`.
    pub async fn list_engine_files(&self, repo: Option<&str>) -> Vec<String> {
        let repo = repo.unwrap_or(&self.config.engines_repo);
        self.client.list_engine_files(repo).await
    }

    /// Classify a user-supplied model reference.
    pub fn classify_input(&self, input: &str) -> ModelReference {
        classify_input(input, &self.config.artifact_extension)
    }

    /// Remove every cached listing. Returns how many records were removed.
    pub fn clear_cache(&self) -> Result<usize> {
        self.resolver.cache().clear()
    }

    pub fn has_cached_data(&self) -> bool {
        self.resolver.cache().has_any_records()
    }
}
