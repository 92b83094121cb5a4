//! Registry response decoding.
//!
//! Bodies are decoded against a fixed shape. Any deviation (not an array,
//! an element without a string `id`, a tree item without string `type` and
//! `path`) rejects the whole body rather than yielding a partial list.

use super::types::{sort_by_priority, ArtifactFile, CatalogEntry};
use crate::error::{HubError, Result};
use serde::Deserialize;

/// Element of the entry search response.
#[derive(Debug, Deserialize)]
pub(crate) struct EntrySummary {
    pub id: String,
}

/// Element of the per-entry tree listing.
#[derive(Debug, Deserialize)]
pub(crate) struct TreeItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    /// Absent for directories.
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeItem {
    fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

fn decode_array<T: for<'de> Deserialize<'de>>(body: &str, what: &str) -> Result<Vec<T>> {
    serde_json::from_str(body).map_err(|e| HubError::Json {
        message: format!("Failed to parse {}: {}", what, e),
        source: Some(e),
    })
}

/// Decode an entry search body, keeping identifiers under `namespace/`
/// in response order.
pub fn decode_entries(body: &str, namespace: &str) -> Result<Vec<CatalogEntry>> {
    let summaries: Vec<EntrySummary> = decode_array(body, "entry search response")?;
    Ok(summaries
        .into_iter()
        .map(|s| CatalogEntry::new(s.id))
        .filter(|entry| entry.is_in_namespace(namespace))
        .collect())
}

/// Decode a tree listing body into ranked artifacts.
///
/// Keeps files whose path ends with `extension` (exact, case-sensitive
/// suffix), then sorts stably by priority rank. Reported sizes are kept and
/// give each artifact a size-only memory estimate.
pub fn decode_files(
    body: &str,
    entry_id: &str,
    extension: &str,
    hub_base: &str,
    revision: &str,
) -> Result<Vec<ArtifactFile>> {
    let items: Vec<TreeItem> = decode_array(body, "file listing")?;
    let mut files: Vec<ArtifactFile> = items
        .iter()
        .filter(|item| item.is_file() && item.path.ends_with(extension))
        .map(|item| {
            ArtifactFile::new(entry_id, &item.path, hub_base, revision).with_size(item.size)
        })
        .collect();
    sort_by_priority(&mut files);
    Ok(files)
}

/// Decode a tree listing body into engine library paths.
///
/// Versioned names such as `libengine.so.1` count, so this matches on
/// containment rather than suffix.
pub fn decode_engine_files(body: &str, library_extension: &str) -> Result<Vec<String>> {
    let items: Vec<TreeItem> = decode_array(body, "engine listing")?;
    Ok(items
        .into_iter()
        .filter(|item| item.is_file() && item.path.contains(library_extension))
        .map(|item| item.path)
        .collect())
}

/// First `max_chars` characters of `body`, cut on a char boundary.
pub fn excerpt(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
