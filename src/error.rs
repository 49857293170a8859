//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem failure while creating, listing, or writing the cache directory
    #[error("Persistence failure at {path}: {source}")]
    Persistence {
        /// Path the failed operation targeted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Persisted entry whose on-disk files cannot be parsed into a valid entry
    #[error("Tampered cache entry: {0}")]
    Tampered(String),

    /// Payload could not be serialized to or from the interchange format
    #[error("Serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Directory watcher could not be initialized
    #[error("Watch failure: {0}")]
    Watch(#[from] notify::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
