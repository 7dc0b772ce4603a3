//! Error types shared across Versecast crates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level error type for Versecast operations.
#[derive(Debug, thiserror::Error)]
pub enum VersecastError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Cache entry corrupted: {key}")]
    CacheCorruption { key: String },

    #[error("Composition error: {message}")]
    Composition { message: String },

    #[error("Insufficient storage: {needed_bytes} bytes needed, {available_bytes} available")]
    InsufficientStorage {
        needed_bytes: u64,
        available_bytes: u64,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using VersecastError.
pub type VersecastResult<T> = Result<T, VersecastError>;

/// Coarse error classification delivered with a job's terminal failure event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    NotFound,
    CacheCorruption,
    Composition,
    InsufficientStorage,
    Config,
    Io,
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::NotFound => "not_found",
            ErrorKind::CacheCorruption => "cache_corruption",
            ErrorKind::Composition => "composition",
            ErrorKind::InsufficientStorage => "insufficient_storage",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
            ErrorKind::Other => "other",
        }
    }
}

impl VersecastError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound {
            message: msg.into(),
        }
    }

    pub fn cache_corruption(key: impl Into<String>) -> Self {
        Self::CacheCorruption { key: key.into() }
    }

    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Classification used by job observers and the CLI exit path.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VersecastError::Network { .. } => ErrorKind::Network,
            VersecastError::NotFound { .. } | VersecastError::FileNotFound { .. } => {
                ErrorKind::NotFound
            }
            VersecastError::CacheCorruption { .. } => ErrorKind::CacheCorruption,
            VersecastError::Composition { .. } => ErrorKind::Composition,
            VersecastError::InsufficientStorage { .. } => ErrorKind::InsufficientStorage,
            VersecastError::Config { .. } => ErrorKind::Config,
            VersecastError::Io(_) => ErrorKind::Io,
            VersecastError::Json(_) | VersecastError::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether the fetch layer is allowed to retry after this failure.
    ///
    /// Only transport-level failures are retryable; an invalid verse
    /// reference stays invalid no matter how often it is requested.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VersecastError::Network { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_retryable() {
        assert!(VersecastError::network("timeout").is_retryable());
        assert!(!VersecastError::not_found("surah 115").is_retryable());
        assert!(!VersecastError::composition("encoder died").is_retryable());
    }

    #[test]
    fn kind_maps_every_variant() {
        assert_eq!(VersecastError::network("x").kind(), ErrorKind::Network);
        assert_eq!(VersecastError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(
            VersecastError::cache_corruption("audio/ar.alafasy/2/255").kind(),
            ErrorKind::CacheCorruption
        );
        assert_eq!(
            VersecastError::InsufficientStorage {
                needed_bytes: 10,
                available_bytes: 5
            }
            .kind(),
            ErrorKind::InsufficientStorage
        );
    }
}
