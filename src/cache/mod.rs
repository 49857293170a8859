//! Cache Module
//!
//! Core entry storage, entry lifecycle types, and event subscriptions.

mod entry;
mod events;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use events::{CacheEvent, ListenerCallback, ListenerRegistry, NameFilter};
pub use store::EntryStore;
