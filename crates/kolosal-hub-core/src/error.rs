//! Error types for the Kolosal hub library.
//!
//! None of these escape the resolve operations: the catalog client and the
//! cache store log them and degrade to "no data". They are public so that
//! configuration loading, store construction and the fallible `fetch_*`
//! calls can report what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the hub library.
#[derive(Debug, Error)]
pub enum HubError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Artifact header errors
    #[error("GGUF header error: {message}")]
    Gguf { message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for hub operations.
pub type Result<T> = std::result::Result<T, HubError>;

impl From<std::io::Error> for HubError {
    fn from(err: std::io::Error) -> Self {
        HubError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for HubError {
    fn from(err: rusqlite::Error) -> Self {
        HubError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl HubError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        HubError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True when the request never produced a usable response
    /// (connection refused, DNS, timeout, non-2xx status).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            HubError::Network { .. } | HubError::Timeout(_) | HubError::HttpStatus { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HubError::HttpStatus {
            url: "https://huggingface.co/api/models".into(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "https://huggingface.co/api/models returned HTTP 503"
        );
    }

    #[test]
    fn test_transport_classification() {
        assert!(HubError::Timeout(std::time::Duration::from_secs(30)).is_transport());
        assert!(HubError::Network {
            message: "connection refused".into(),
            cause: None,
        }
        .is_transport());
        assert!(!HubError::Json {
            message: "expected array".into(),
            source: None,
        }
        .is_transport());
        assert!(!HubError::Config {
            message: "bad".into()
        }
        .is_transport());
    }

    #[test]
    fn test_io_with_path_keeps_path() {
        let err = HubError::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/tmp/x.json",
        );
        match err {
            HubError::Io { path, .. } => assert_eq!(path, Some(PathBuf::from("/tmp/x.json"))),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
