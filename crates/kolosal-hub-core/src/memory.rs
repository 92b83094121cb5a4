//! Memory needed to load an artifact.
//!
//! Sizes use decimal megabytes (1 MB = 1,000,000 bytes) so they match what
//! browsers and file managers show for the same file.

use crate::config::MemoryConfig;
use crate::gguf::ModelParams;
use serde::{Deserialize, Serialize};

/// Estimated memory for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEstimate {
    /// File size in MB.
    pub model_size_mb: u64,
    /// KV cache size in MB, when the model dimensions are known.
    pub kv_cache_mb: Option<u64>,
    /// `model_size_mb` plus the KV cache.
    pub total_mb: u64,
    /// e.g. `7.1 GB (Model: 4.9 GB + KV: 2.1 GB)`
    pub display: String,
}

impl MemoryEstimate {
    /// Estimate for a file of `size_bytes`, adding a KV cache term for
    /// `context_size` tokens when `params` is known.
    ///
    /// Returns `None` for a zero size.
    pub fn new(size_bytes: u64, params: Option<&ModelParams>, context_size: u32) -> Option<Self> {
        if size_bytes == 0 {
            return None;
        }

        let model_size_mb = size_bytes / MemoryConfig::BYTES_PER_MB;
        let kv_cache_mb = params.map(|p| kv_cache_mb(p, context_size));
        let total_mb = model_size_mb.saturating_add(kv_cache_mb.unwrap_or(0));
        let display = match kv_cache_mb {
            Some(kv) => format!(
                "{} (Model: {} + KV: {})",
                format_memory_size(total_mb),
                format_memory_size(model_size_mb),
                format_memory_size(kv)
            ),
            None => format!("{} (model only)", format_memory_size(model_size_mb)),
        };

        Some(Self {
            model_size_mb,
            kv_cache_mb,
            total_mb,
            display,
        })
    }

    /// Estimate from the file size alone.
    pub fn model_only(size_bytes: u64) -> Option<Self> {
        Self::new(size_bytes, None, 0)
    }

    pub fn has_kv_cache(&self) -> bool {
        self.kv_cache_mb.is_some()
    }
}

/// KV cache size in MB: `bytes_per_element * hidden_size * layers * context`.
pub fn kv_cache_mb(params: &ModelParams, context_size: u32) -> u64 {
    let bytes = u128::from(MemoryConfig::KV_BYTES_PER_ELEMENT)
        * u128::from(params.hidden_size)
        * u128::from(params.hidden_layers)
        * u128::from(context_size);
    u64::try_from(bytes / u128::from(MemoryConfig::BYTES_PER_MB)).unwrap_or(u64::MAX)
}

/// `512 MB`, or `4.9 GB` from 1000 MB up.
pub fn format_memory_size(size_mb: u64) -> String {
    if size_mb >= 1000 {
        format!("{:.1} GB", size_mb as f64 / 1000.0)
    } else {
        format!("{} MB", size_mb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: ModelParams = ModelParams {
        hidden_size: 4096,
        hidden_layers: 32,
    };

    #[test]
    fn test_format_memory_size() {
        assert_eq!(format_memory_size(0), "0 MB");
        assert_eq!(format_memory_size(512), "512 MB");
        assert_eq!(format_memory_size(999), "999 MB");
        assert_eq!(format_memory_size(1000), "1.0 GB");
        assert_eq!(format_memory_size(4920), "4.9 GB");
    }

    #[test]
    fn test_kv_cache_term() {
        // 4 * 4096 * 32 * 4096 bytes
        assert_eq!(kv_cache_mb(&PARAMS, 4096), 2147);
        assert_eq!(kv_cache_mb(&PARAMS, 0), 0);
    }

    #[test]
    fn test_estimate_with_model_params() {
        let estimate = MemoryEstimate::new(4_920_000_000, Some(&PARAMS), 4096).unwrap();
        assert_eq!(estimate.model_size_mb, 4920);
        assert_eq!(estimate.kv_cache_mb, Some(2147));
        assert_eq!(estimate.total_mb, 7067);
        assert_eq!(estimate.display, "7.1 GB (Model: 4.9 GB + KV: 2.1 GB)");
        assert!(estimate.has_kv_cache());
    }

    #[test]
    fn test_estimate_from_size_only() {
        let estimate = MemoryEstimate::model_only(640_500_000).unwrap();
        assert_eq!(estimate.model_size_mb, 640);
        assert_eq!(estimate.total_mb, 640);
        assert_eq!(estimate.display, "640 MB (model only)");
        assert!(!estimate.has_kv_cache());
    }

    #[test]
    fn test_zero_size_has_no_estimate() {
        assert!(MemoryEstimate::new(0, Some(&PARAMS), 4096).is_none());
    }
}
