//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with absolute expiry tracking.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A single named cache entry: arbitrary structured data plus an absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored payload, kept as structured JSON
    pub data: Value,
    /// Expiration timestamp (Unix milliseconds); always absolute in memory
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry from a payload and a relative TTL.
    ///
    /// The TTL is converted to an absolute timestamp immediately, so the
    /// in-memory representation never carries relative durations.
    ///
    /// # Arguments
    /// * `data` - The payload to store
    /// * `ttl_ms` - TTL in milliseconds, relative to now
    pub fn new(data: Value, ttl_ms: u64) -> Self {
        Self {
            data,
            expires_at: current_timestamp_ms() + ttl_ms,
        }
    }

    // == From Absolute ==
    /// Creates an entry from an already-absolute expiry timestamp.
    ///
    /// Used when reconstructing entries from disk, where the persisted
    /// `expires` value is absolute.
    pub fn from_absolute(data: Value, expires_at: u64) -> Self {
        Self { data, expires_at }
    }

    // == Is Expired ==
    /// Checks whether the entry is past its expiry.
    ///
    /// An entry is outdated once the current time is strictly greater than
    /// its expiry timestamp.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() > self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_stores_absolute_expiry() {
        let before = current_timestamp_ms();
        let entry = CacheEntry::new(json!({"v": 1}), 60_000);
        let after = current_timestamp_ms();

        // The relative TTL must have been converted to an absolute timestamp
        assert!(entry.expires_at >= before + 60_000);
        assert!(entry.expires_at <= after + 60_000);
    }

    #[test]
    fn test_entry_not_expired_with_positive_ttl() {
        let entry = CacheEntry::new(json!("payload"), 60_000);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(json!("payload"), 50);

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(100));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        // An entry expiring exactly one millisecond ago is outdated; one
        // expiring well in the future is not
        let now = current_timestamp_ms();
        let past = CacheEntry::from_absolute(json!(null), now.saturating_sub(1));
        let future = CacheEntry::from_absolute(json!(null), now + 10_000);

        assert!(past.is_expired());
        assert!(!future.is_expired());
    }

    #[test]
    fn test_from_absolute_preserves_timestamp() {
        let entry = CacheEntry::from_absolute(json!([1, 2, 3]), 1234567890);
        assert_eq!(entry.expires_at, 1234567890);
        assert_eq!(entry.data, json!([1, 2, 3]));
    }
}
