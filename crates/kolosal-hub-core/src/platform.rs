//! Platform-specific paths and file naming.

use crate::config::CacheConfig;
use std::path::PathBuf;

/// Get the default cache directory.
///
/// # Platform Behavior
/// - **Linux**: `~/.cache/kolosal-cli` (XDG cache dir)
/// - **Windows**: `%LOCALAPPDATA%\kolosal-cli`
/// - **macOS**: `~/Library/Caches/kolosal-cli`
///
/// Falls back to `./cache` when the platform directory cannot be determined.
pub fn default_cache_dir() -> PathBuf {
    match dirs::cache_dir() {
        Some(dir) => dir.join(CacheConfig::CACHE_DIR_NAME),
        None => PathBuf::from(CacheConfig::FALLBACK_CACHE_DIR),
    }
}

/// Get the file extension of dynamic libraries on the current platform.
///
/// # Platform Behavior
/// - **Windows**: `.dll`
/// - **macOS**: `.dylib`
/// - **Other**: `.so`
pub fn engine_library_extension() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        ".dll"
    }
    #[cfg(target_os = "macos")]
    {
        ".dylib"
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        ".so"
    }
}
