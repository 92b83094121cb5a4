//! Configuration for the Kolosal hub library.
//!
//! Defaults live in the constant groups below. [`HubConfig`] is the value
//! actually handed to the catalog client and cache store at construction.

use crate::cache::atomic_read_json;
use crate::error::{HubError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const API_BASE: &'static str = "https://huggingface.co/api";
    pub const HUB_BASE: &'static str = "https://huggingface.co";
    pub const USER_AGENT: &'static str = "Kolosal-CLI/1.0";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Raw response bodies are cut to this many characters in logs.
    pub const BODY_EXCERPT_CHARS: usize = 500;
}

/// Registry catalog configuration.
pub struct CatalogConfig;

impl CatalogConfig {
    pub const DEFAULT_NAMESPACE: &'static str = "kolosal";
    pub const ARTIFACT_EXTENSION: &'static str = ".gguf";
    pub const SEARCH_LIMIT: u32 = 50;
    pub const ENGINES_REPO: &'static str = "kolosal/engines";
    pub const REVISION: &'static str = "main";
}

/// Cache configuration.
pub struct CacheConfig;

impl CacheConfig {
    pub const ENTRIES_TTL: Duration = Duration::from_secs(3600);
    pub const FILES_TTL: Duration = Duration::from_secs(1800);
    pub const CACHE_DIR_NAME: &'static str = "kolosal-cli";
    pub const FALLBACK_CACHE_DIR: &'static str = "./cache";
    pub const SQLITE_FILENAME: &'static str = "catalog-cache.sqlite";
    /// Records kept in the JSON backend's in-memory tier.
    pub const MEMORY_CAPACITY: u64 = 256;
    pub const MEMORY_TTL: Duration = Duration::from_secs(1800);
}

/// Memory estimation configuration.
pub struct MemoryConfig;

impl MemoryConfig {
    pub const BYTES_PER_MB: u64 = 1000 * 1000;
    pub const KV_BYTES_PER_ELEMENT: u64 = 4;
    pub const DEFAULT_CONTEXT_SIZE: u32 = 4096;
    /// Most bytes read from the start of an artifact when looking for its
    /// model dimensions.
    pub const HEADER_FETCH_LIMIT: usize = 4 * 1024 * 1024;
}

/// Runtime configuration passed into the client and the cache store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct HubConfig {
    /// Base URL of the registry API (search and tree endpoints).
    pub api_base: String,
    /// Base URL used to build artifact download links.
    pub hub_base: String,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Total timeout for a single request, in seconds.
    pub request_timeout_secs: u64,
    /// `limit` query parameter for the entry search.
    pub search_limit: u32,
    /// Namespace used by the unified listing.
    pub default_namespace: String,
    /// Suffix an artifact filename must end with (case-sensitive).
    pub artifact_extension: String,
    /// Freshness window for entry listings, in seconds.
    pub entries_ttl_secs: u64,
    /// Freshness window for file listings, in seconds.
    pub files_ttl_secs: u64,
    /// Registry entry holding engine libraries.
    pub engines_repo: String,
    /// Cache directory; `None` means the platform default.
    pub cache_dir: Option<PathBuf>,
    /// Read artifact headers to add a KV cache term to memory estimates.
    pub memory_estimates: bool,
    /// Context length, in tokens, the KV cache term is sized for.
    pub context_size: u32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            api_base: NetworkConfig::API_BASE.to_string(),
            hub_base: NetworkConfig::HUB_BASE.to_string(),
            user_agent: NetworkConfig::USER_AGENT.to_string(),
            request_timeout_secs: NetworkConfig::REQUEST_TIMEOUT.as_secs(),
            search_limit: CatalogConfig::SEARCH_LIMIT,
            default_namespace: CatalogConfig::DEFAULT_NAMESPACE.to_string(),
            artifact_extension: CatalogConfig::ARTIFACT_EXTENSION.to_string(),
            entries_ttl_secs: CacheConfig::ENTRIES_TTL.as_secs(),
            files_ttl_secs: CacheConfig::FILES_TTL.as_secs(),
            engines_repo: CatalogConfig::ENGINES_REPO.to_string(),
            cache_dir: None,
            memory_estimates: true,
            context_size: MemoryConfig::DEFAULT_CONTEXT_SIZE,
        }
    }
}

impl HubConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults. Keys absent from the file keep
    /// their default values.
    pub fn load(path: &Path) -> Result<Self> {
        let config = match atomic_read_json::<HubConfig>(path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                return Err(HubError::Config {
                    message: format!("Failed to load {}: {}", path.display(), e),
                })
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the client or the store cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("api_base", &self.api_base), ("hub_base", &self.hub_base)] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(HubError::Config {
                    message: format!("{} must be an http(s) URL, got '{}'", field, value),
                });
            }
        }
        if self.default_namespace.trim().is_empty() {
            return Err(HubError::Config {
                message: "default_namespace must not be empty".to_string(),
            });
        }
        if self.artifact_extension.is_empty() {
            return Err(HubError::Config {
                message: "artifact_extension must not be empty".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(HubError::Config {
                message: "request_timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.search_limit == 0 {
            return Err(HubError::Config {
                message: "search_limit must be greater than zero".to_string(),
            });
        }
        if self.context_size == 0 {
            return Err(HubError::Config {
                message: "context_size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn entries_ttl(&self) -> Duration {
        Duration::from_secs(self.entries_ttl_secs)
    }

    pub fn files_ttl(&self) -> Duration {
        Duration::from_secs(self.files_ttl_secs)
    }

    /// Configured cache directory, or the platform default.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(crate::platform::default_cache_dir)
    }
}
