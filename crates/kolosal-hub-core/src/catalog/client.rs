//! HTTP client for the remote model registry.
//!
//! Two queries are supported: an entry search filtered by namespace and a
//! per-entry file tree. File listings can be enriched with model dimensions
//! read from the start of each artifact. The `fetch_*` methods report
//! failures as [`HubError`]; the [`CatalogSource`] implementation logs them
//! and returns an empty list, leaving any fallback decision to the caller.

use super::types::{ArtifactFile, CatalogEntry};
use super::wire::{decode_engine_files, decode_entries, decode_files, excerpt};
use super::CatalogSource;
use crate::config::{CatalogConfig, HubConfig, MemoryConfig, NetworkConfig};
use crate::error::{HubError, Result};
use crate::gguf::{scan_header, HeaderScan, ModelParams};
use crate::platform::engine_library_extension;
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, warn};

/// Client for registry API operations.
#[derive(Debug, Clone)]
pub struct HubClient {
    client: Client,
    api_base: String,
    hub_base: String,
    search_limit: u32,
    artifact_extension: String,
    timeout: Duration,
    memory_estimates: bool,
    context_size: u32,
}

impl HubClient {
    /// Create a client from configuration.
    ///
    /// The configured user agent and request timeout apply to every call.
    pub fn new(config: &HubConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| HubError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            hub_base: config.hub_base.trim_end_matches('/').to_string(),
            search_limit: config.search_limit,
            artifact_extension: config.artifact_extension.clone(),
            timeout: config.request_timeout(),
            memory_estimates: config.memory_estimates,
            context_size: config.context_size,
        })
    }

    fn search_url(&self, namespace: &str) -> String {
        format!(
            "{}/models?search={}&limit={}",
            self.api_base,
            urlencoding::encode(namespace),
            self.search_limit
        )
    }

    fn tree_url(&self, entry_id: &str) -> String {
        format!(
            "{}/models/{}/tree/{}",
            self.api_base,
            entry_id,
            CatalogConfig::REVISION
        )
    }

    /// Map a reqwest failure while sending or reading a body.
    fn transport_error(&self, e: reqwest::Error) -> HubError {
        if e.is_timeout() {
            HubError::Timeout(self.timeout)
        } else {
            HubError::Network {
                message: format!("Registry request failed: {}", e),
                cause: Some(e.to_string()),
            }
        }
    }

    /// GET `url` and return the body of a 2xx response.
    async fn get_body(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| self.transport_error(e))
    }

    /// Log a decode failure together with the start of the offending body.
    fn log_decode_failure(&self, url: &str, body: &str, err: &HubError) {
        warn!("Unexpected response from {}: {}", url, err);
        warn!(
            "Raw response (first {} chars): {}",
            NetworkConfig::BODY_EXCERPT_CHARS,
            excerpt(body, NetworkConfig::BODY_EXCERPT_CHARS)
        );
    }

    /// Search the registry and keep entries under `namespace/`.
    pub async fn fetch_entries(&self, namespace: &str) -> Result<Vec<CatalogEntry>> {
        let url = self.search_url(namespace);
        let body = self.get_body(&url).await?;
        decode_entries(&body, namespace).inspect_err(|e| self.log_decode_failure(&url, &body, e))
    }

    /// List the artifacts of one entry, best quantization first.
    ///
    /// With memory estimates enabled, each sized artifact's header is read
    /// to add a KV cache term. Header failures leave the size-only estimate.
    pub async fn fetch_files(&self, entry_id: &str) -> Result<Vec<ArtifactFile>> {
        let url = self.tree_url(entry_id);
        let body = self.get_body(&url).await?;
        let mut files = decode_files(
            &body,
            entry_id,
            &self.artifact_extension,
            &self.hub_base,
            CatalogConfig::REVISION,
        )
        .inspect_err(|e| self.log_decode_failure(&url, &body, e))?;

        if self.memory_estimates {
            for file in files.iter_mut().filter(|f| f.size_bytes.is_some()) {
                match self.fetch_model_params(&file.download_url).await {
                    Ok(Some(params)) => file.attach_model_params(&params, self.context_size),
                    Ok(None) => debug!("No model dimensions in {}", file.filename),
                    Err(e) => debug!("Could not read header of {}: {}", file.filename, e),
                }
            }
        }
        Ok(files)
    }

    /// Read model dimensions from the start of the artifact at `url`.
    ///
    /// Requests a byte range and reads chunks until the header yields both
    /// values or [`MemoryConfig::HEADER_FETCH_LIMIT`] bytes have arrived.
    /// Servers that ignore the range are cut off at the same limit.
    pub async fn fetch_model_params(&self, url: &str) -> Result<Option<ModelParams>> {
        debug!("GET {} (header)", url);

        let mut response = self
            .client
            .get(url)
            .header(
                header::RANGE,
                format!("bytes=0-{}", MemoryConfig::HEADER_FETCH_LIMIT - 1),
            )
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut buf: Vec<u8> = Vec::new();
        while buf.len() < MemoryConfig::HEADER_FETCH_LIMIT {
            let chunk = response.chunk().await.map_err(|e| self.transport_error(e))?;
            let Some(chunk) = chunk else {
                break;
            };
            buf.extend_from_slice(&chunk);
            match scan_header(&buf)? {
                HeaderScan::Found(params) => return Ok(Some(params)),
                HeaderScan::Missing => return Ok(None),
                HeaderScan::Incomplete => {}
            }
        }
        Ok(None)
    }

    /// List engine libraries for this platform from `repo`.
    ///
    /// Returns an empty list on any failure. Not cached.
    pub async fn list_engine_files(&self, repo: &str) -> Vec<String> {
        let url = self.tree_url(repo);
        let result = match self.get_body(&url).await {
            Ok(body) => decode_engine_files(&body, engine_library_extension())
                .inspect_err(|e| self.log_decode_failure(&url, &body, e)),
            Err(e) => Err(e),
        };

        match result {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list engine files from {}: {}", repo, e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl CatalogSource for HubClient {
    async fn list_entries(&self, namespace: &str) -> Vec<CatalogEntry> {
        match self.fetch_entries(namespace).await {
            Ok(entries) => {
                debug!("Registry returned {} entries for '{}'", entries.len(), namespace);
                entries
            }
            Err(e) => {
                warn!("Failed to fetch entries for '{}': {}", namespace, e);
                Vec::new()
            }
        }
    }

    async fn list_files(&self, entry_id: &str) -> Vec<ArtifactFile> {
        match self.fetch_files(entry_id).await {
            Ok(files) => {
                debug!("Registry returned {} artifacts for {}", files.len(), entry_id);
                files
            }
            Err(e) => {
                warn!("Failed to fetch files for {}: {}", entry_id, e);
                Vec::new()
            }
        }
    }
}
