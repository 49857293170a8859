//! Entry Store Module
//!
//! In-memory source of truth mapping entry names to cache entries.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Entry Store ==
/// Mapping from entry name to cache entry.
///
/// Entries are only ever created or replaced; there is no removal
/// operation. An entry lives until it is overwritten, the process ends, or
/// an external directory mutation replaces it during reconciliation.
#[derive(Debug, Default)]
pub struct EntryStore {
    /// Name-to-entry storage
    entries: HashMap<String, CacheEntry>,
}

impl EntryStore {
    // == Constructor ==
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with entries reconstructed from disk.
    pub fn from_entries(entries: HashMap<String, CacheEntry>) -> Self {
        Self { entries }
    }

    // == Insert ==
    /// Creates or replaces the entry for `name`.
    pub fn insert(&mut self, name: String, entry: CacheEntry) {
        self.entries.insert(name, entry);
    }

    // == Get ==
    /// Returns the entry for `name`, expired or not.
    ///
    /// Expiration is not checked here; callers interested in freshness use
    /// [`EntryStore::is_expired`].
    pub fn get(&self, name: &str) -> Option<&CacheEntry> {
        self.entries.get(name)
    }

    // == Is Expired ==
    /// Checks whether `name` is past its expiry.
    ///
    /// Unknown names count as expired rather than being an error.
    pub fn is_expired(&self, name: &str) -> bool {
        match self.entries.get(name) {
            Some(entry) => entry.is_expired(),
            None => true,
        }
    }

    // == Views ==
    /// Returns a snapshot of all entry names.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Returns a snapshot of all entries.
    pub fn values(&self) -> Vec<CacheEntry> {
        self.entries.values().cloned().collect()
    }

    /// Returns a snapshot of all (name, entry) pairs taken in a single pass.
    ///
    /// Background scans iterate this snapshot instead of pairing separate
    /// `keys()` and `values()` calls by index, which would misalign if the
    /// store mutated between the two calls.
    pub fn entries(&self) -> Vec<(String, CacheEntry)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect()
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
