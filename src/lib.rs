//! Mirror Cache - An embeddable key-value cache with disk persistence
//!
//! Provides TTL-based expiration surfaced as "outdated" events, filtered
//! change notifications, and an optional on-disk mirror of the in-memory
//! store that is reconciled when the cache directory changes out-of-band.

pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod persist;
mod tasks;

pub use cache::{CacheEntry, CacheEvent, NameFilter};
pub use config::CacheOptions;
pub use error::{CacheError, Result};
pub use manager::CacheManager;
