//! Background Tasks Module
//!
//! Contains background tasks owned by a cache instance.
//!
//! # Tasks
//! - Expiration monitor: fires "outdated" events for entries past their expiry
//! - Directory watcher: reconciles out-of-band changes to the cache directory

mod expiration;
mod watcher;

pub use expiration::spawn_expiration_task;
pub use watcher::spawn_watch_task;
