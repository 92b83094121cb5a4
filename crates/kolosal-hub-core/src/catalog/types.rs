//! Catalog value types.

use crate::gguf::ModelParams;
use crate::memory::MemoryEstimate;
use crate::quant::classify;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registry entry, in `namespace/name` form.
///
/// Compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogEntry(String);

impl CatalogEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the first `/`.
    pub fn namespace(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    /// Part after the last `/`.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// True when the identifier lives under `namespace/`.
    pub fn is_in_namespace(&self, namespace: &str) -> bool {
        self.0
            .strip_prefix(namespace)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CatalogEntry {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A downloadable artifact belonging to a registry entry.
///
/// Only constructed for filenames carrying the artifact extension. The
/// quantization fields are a pure function of `filename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFile {
    /// Path of the file inside the entry.
    pub filename: String,
    /// Quantization tag, e.g. `Q4_K_M`.
    pub quantization_tag: String,
    /// Lower sorts first.
    pub priority_rank: u32,
    /// Human-readable description of the quantization.
    pub quantization_description: String,
    /// Entry the file was listed under.
    pub entry_id: String,
    /// Direct download link.
    pub download_url: String,
    /// File size reported by the registry.
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub memory: Option<MemoryEstimate>,
}

impl ArtifactFile {
    /// Build an artifact for `filename` listed under `entry_id`.
    ///
    /// `hub_base` and `revision` form the download link
    /// `{hub_base}/{entry_id}/resolve/{revision}/{filename}`.
    pub fn new(entry_id: &str, filename: &str, hub_base: &str, revision: &str) -> Self {
        let quant = classify(filename);
        Self {
            filename: filename.to_string(),
            quantization_tag: quant.tag.to_string(),
            priority_rank: quant.rank,
            quantization_description: quant.description.to_string(),
            entry_id: entry_id.to_string(),
            download_url: format!(
                "{}/{}/resolve/{}/{}",
                hub_base.trim_end_matches('/'),
                entry_id,
                revision,
                filename
            ),
            size_bytes: None,
            memory: None,
        }
    }

    /// Record the file size and derive a size-only memory estimate.
    pub fn with_size(mut self, size_bytes: Option<u64>) -> Self {
        self.size_bytes = size_bytes;
        self.memory = size_bytes.and_then(MemoryEstimate::model_only);
        self
    }

    /// Extend the memory estimate with a KV cache term.
    ///
    /// No-op when the size is unknown.
    pub fn attach_model_params(&mut self, params: &ModelParams, context_size: u32) {
        if let Some(size) = self.size_bytes {
            self.memory = MemoryEstimate::new(size, Some(params), context_size);
        }
    }

    /// Short label of the form `model-name:Q4_K_M`.
    ///
    /// The entry name is lowercased with underscores turned into hyphens.
    pub fn display_name(&self) -> String {
        let name = self.entry_id.rsplit('/').next().unwrap_or(&self.entry_id);
        let name: String = name
            .chars()
            .map(|c| if c == '_' { '-' } else { c.to_ascii_lowercase() })
            .collect();
        format!("{}:{}", name, self.quantization_tag)
    }

    /// [`ArtifactFile::display_name`] followed by the memory estimate, if any.
    pub fn display_name_with_memory(&self) -> String {
        match &self.memory {
            Some(memory) => format!("{} [Memory: {}]", self.display_name(), memory.display),
            None => self.display_name(),
        }
    }
}

/// Sort artifacts best-first by priority rank.
///
/// The sort is stable: equal ranks keep their listing order.
pub fn sort_by_priority(files: &mut [ArtifactFile]) {
    files.sort_by_key(|f| f.priority_rank);
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUB: &str = "https://huggingface.co";

    #[test]
    fn test_entry_parts() {
        let entry = CatalogEntry::new("kolosal/qwen3-8b");
        assert_eq!(entry.namespace(), "kolosal");
        assert_eq!(entry.name(), "qwen3-8b");
        assert_eq!(entry.to_string(), "kolosal/qwen3-8b");
    }

    #[test]
    fn test_namespace_requires_slash() {
        assert!(CatalogEntry::new("kolosal/a").is_in_namespace("kolosal"));
        assert!(!CatalogEntry::new("kolosalx/a").is_in_namespace("kolosal"));
        assert!(!CatalogEntry::new("kolosal").is_in_namespace("kolosal"));
        assert!(!CatalogEntry::new("other/kolosal").is_in_namespace("kolosal"));
    }

    #[test]
    fn test_entry_serializes_as_plain_string() {
        let json = serde_json::to_string(&vec![CatalogEntry::new("kolosal/a")]).unwrap();
        assert_eq!(json, r#"["kolosal/a"]"#);
    }

    #[test]
    fn test_artifact_fields_follow_filename() {
        let file = ArtifactFile::new("kolosal/Qwen_3", "Qwen_3.Q4_K_M.gguf", HUB, "main");
        assert_eq!(file.quantization_tag, "Q4_K_M");
        assert_eq!(file.priority_rank, crate::quant::classify("Qwen_3.Q4_K_M.gguf").rank);
        assert_eq!(
            file.download_url,
            "https://huggingface.co/kolosal/Qwen_3/resolve/main/Qwen_3.Q4_K_M.gguf"
        );
        assert_eq!(file.display_name(), "qwen-3:Q4_K_M");
    }

    #[test]
    fn test_size_and_memory_label() {
        let mut file = ArtifactFile::new("kolosal/qwen3-8b", "m.Q4_K_M.gguf", HUB, "main")
            .with_size(Some(4_920_000_000));
        assert_eq!(file.size_bytes, Some(4_920_000_000));
        assert_eq!(
            file.display_name_with_memory(),
            "qwen3-8b:Q4_K_M [Memory: 4.9 GB (model only)]"
        );

        file.attach_model_params(
            &ModelParams {
                hidden_size: 4096,
                hidden_layers: 32,
            },
            4096,
        );
        assert_eq!(
            file.display_name_with_memory(),
            "qwen3-8b:Q4_K_M [Memory: 7.1 GB (Model: 4.9 GB + KV: 2.1 GB)]"
        );
    }

    #[test]
    fn test_unknown_size_has_plain_label() {
        let mut file = ArtifactFile::new("k/m", "m.Q8_0.gguf", HUB, "main").with_size(None);
        file.attach_model_params(
            &ModelParams {
                hidden_size: 1,
                hidden_layers: 1,
            },
            4096,
        );
        assert!(file.memory.is_none());
        assert_eq!(file.display_name_with_memory(), "m:Q8_0");
    }

    #[test]
    fn test_records_without_size_still_decode() {
        let json = r#"{
            "filename": "m.Q8_0.gguf",
            "quantization_tag": "Q8_0",
            "priority_rank": 5,
            "quantization_description": "8-bit",
            "entry_id": "k/m",
            "download_url": "https://huggingface.co/k/m/resolve/main/m.Q8_0.gguf"
        }"#;
        let file: ArtifactFile = serde_json::from_str(json).unwrap();
        assert!(file.size_bytes.is_none());
        assert!(file.memory.is_none());
    }

    #[test]
    fn test_sort_is_stable() {
        let mut files = vec![
            ArtifactFile::new("k/m", "b.gguf", HUB, "main"),
            ArtifactFile::new("k/m", "m.Q4_K_M.gguf", HUB, "main"),
            ArtifactFile::new("k/m", "a.gguf", HUB, "main"),
            ArtifactFile::new("k/m", "m.Q8_0.gguf", HUB, "main"),
        ];
        sort_by_priority(&mut files);
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, ["m.Q8_0.gguf", "m.Q4_K_M.gguf", "b.gguf", "a.gguf"]);
    }
}
