//! Configuration Module
//!
//! Handles cache construction options and their environment-variable overrides.

use std::env;
use std::path::PathBuf;

/// Cache construction options.
///
/// All values have sensible defaults; the default configuration is a
/// memory-only cache with a five minute TTL.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Disables all disk I/O and the directory watcher when true
    pub memory_only: bool,
    /// Root directory for persisted entries; ignored when memory_only is true
    pub cache_directory: PathBuf,
    /// TTL in milliseconds used when `set` is called without an explicit expiry
    pub default_expire: u64,
    /// Expiration monitor tick period in milliseconds
    pub check_interval: u64,
    /// Whether to delete unreadable entry directories at startup
    pub discard_tampered_cache: bool,
}

impl CacheOptions {
    /// Creates CacheOptions by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MEMORY_ONLY` - Disable disk persistence (default: true)
    /// - `CACHE_DIRECTORY` - Root directory for persisted entries (default: .cache)
    /// - `CACHE_DEFAULT_EXPIRE_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_CHECK_INTERVAL_MS` - Expiry check interval in milliseconds (default: 250)
    /// - `CACHE_DISCARD_TAMPERED` - Delete corrupt entry directories at startup (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            memory_only: env::var("CACHE_MEMORY_ONLY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.memory_only),
            cache_directory: env::var("CACHE_DIRECTORY")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_directory),
            default_expire: env::var("CACHE_DEFAULT_EXPIRE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_expire),
            check_interval: env::var("CACHE_CHECK_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.check_interval),
            discard_tampered_cache: env::var("CACHE_DISCARD_TAMPERED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.discard_tampered_cache),
        }
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            memory_only: true,
            cache_directory: PathBuf::from(".cache"),
            default_expire: 5 * 60 * 1000,
            check_interval: 250,
            discard_tampered_cache: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options = CacheOptions::default();
        assert!(options.memory_only);
        assert_eq!(options.cache_directory, PathBuf::from(".cache"));
        assert_eq!(options.default_expire, 300_000);
        assert_eq!(options.check_interval, 250);
        assert!(!options.discard_tampered_cache);
    }

    #[test]
    fn test_options_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_MEMORY_ONLY");
        env::remove_var("CACHE_DIRECTORY");
        env::remove_var("CACHE_DEFAULT_EXPIRE_MS");
        env::remove_var("CACHE_CHECK_INTERVAL_MS");
        env::remove_var("CACHE_DISCARD_TAMPERED");

        let options = CacheOptions::from_env();
        assert!(options.memory_only);
        assert_eq!(options.default_expire, 300_000);
        assert_eq!(options.check_interval, 250);
        assert!(!options.discard_tampered_cache);
    }
}
