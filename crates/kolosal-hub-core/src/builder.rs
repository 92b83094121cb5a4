//! Builder for configuring ModelHub initialization.

use crate::cache::CacheStore;
use crate::catalog::{CatalogSource, HubClient};
use crate::config::HubConfig;
use crate::error::{HubError, Result};
use crate::resolver::Resolver;
use crate::ModelHub;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Storage used by the cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// One JSON file per record.
    #[default]
    JsonFiles,
    /// A single SQLite database.
    Sqlite,
}

/// Builder for configuring ModelHub initialization.
///
/// # Example
///
/// ```rust,ignore
/// use kolosal_hub::{BackendKind, ModelHub};
///
/// let hub = ModelHub::builder()
///     .cache_dir("/tmp/kolosal-cache")
///     .backend(BackendKind::Sqlite)
///     .auto_create_dirs(true)
///     .build()?;
/// ```
pub struct ModelHubBuilder {
    config: HubConfig,
    cache_dir: Option<PathBuf>,
    backend: BackendKind,
    auto_create_dirs: bool,
    source: Option<Arc<dyn CatalogSource>>,
}

impl Default for ModelHubBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelHubBuilder {
    pub fn new() -> Self {
        Self {
            config: HubConfig::default(),
            cache_dir: None,
            backend: BackendKind::default(),
            auto_create_dirs: false,
            source: None,
        }
    }

    /// Use `config` instead of the defaults.
    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the cache directory from the configuration.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Select the cache backend.
    ///
    /// Default: [`BackendKind::JsonFiles`]
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Create the cache directory if it doesn't exist.
    ///
    /// Default: `false` (the directory must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Resolve listings through `source` instead of the registry client.
    pub fn catalog_source(mut self, source: Arc<dyn CatalogSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the ModelHub instance.
    pub fn build(self) -> Result<ModelHub> {
        self.config.validate()?;

        let cache_dir = self
            .cache_dir
            .unwrap_or_else(|| self.config.resolved_cache_dir());

        if !cache_dir.exists() {
            if !self.auto_create_dirs {
                return Err(HubError::Config {
                    message: format!("Cache directory does not exist: {}", cache_dir.display()),
                });
            }
            std::fs::create_dir_all(&cache_dir).map_err(|e| HubError::Io {
                message: format!("Failed to create cache directory: {}", cache_dir.display()),
                path: Some(cache_dir.clone()),
                source: Some(e),
            })?;
        }

        let cache = match self.backend {
            BackendKind::JsonFiles => CacheStore::json_files(&cache_dir, &self.config)?,
            BackendKind::Sqlite => CacheStore::sqlite(&cache_dir, &self.config)?,
        };
        debug!(
            "Using {} cache at {}",
            cache.backend_name(),
            cache_dir.display()
        );

        let client = HubClient::new(&self.config)?;
        let source: Arc<dyn CatalogSource> = match self.source {
            Some(source) => source,
            None => Arc::new(client.clone()),
        };
        let resolver = Resolver::new(source, cache, self.config.default_namespace.clone());

        Ok(ModelHub {
            config: self.config,
            cache_dir,
            client,
            resolver,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_dir_without_auto_create_fails() {
        let temp = TempDir::new().unwrap();
        let result = ModelHubBuilder::new()
            .cache_dir(temp.path().join("absent"))
            .build();
        assert!(matches!(result, Err(HubError::Config { .. })));
    }

    #[test]
    fn test_auto_create_dirs() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("cache");
        let hub = ModelHubBuilder::new()
            .cache_dir(&dir)
            .auto_create_dirs(true)
            .build()
            .unwrap();
        assert!(dir.is_dir());
        assert_eq!(hub.cache_dir(), dir.as_path());
    }

    #[test]
    fn test_cache_dir_from_config() {
        let temp = TempDir::new().unwrap();
        let config = HubConfig {
            cache_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let hub = ModelHubBuilder::new().config(config).build().unwrap();
        assert_eq!(hub.cache_dir(), temp.path());
    }

    #[test]
    fn test_sqlite_backend() {
        let temp = TempDir::new().unwrap();
        let hub = ModelHubBuilder::new()
            .cache_dir(temp.path())
            .backend(BackendKind::Sqlite)
            .build()
            .unwrap();
        assert_eq!(hub.resolver().cache().backend_name(), "sqlite");
        assert!(temp
            .path()
            .join(crate::config::CacheConfig::SQLITE_FILENAME)
            .exists());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp = TempDir::new().unwrap();
        let config = HubConfig {
            search_limit: 0,
            ..Default::default()
        };
        let result = ModelHubBuilder::new()
            .config(config)
            .cache_dir(temp.path())
            .build();
        assert!(matches!(result, Err(HubError::Config { .. })));
    }
}
