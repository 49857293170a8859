//! Event Subscription Module
//!
//! Synchronous pub/sub registry for cache state-change notifications.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use tracing::error;

// == Event Kinds ==
/// The three kinds of cache state-change events.
///
/// The kinds are distinct and non-overlapping: a `set` call fires `Update`
/// only, a reconciled disk change fires `DiskCacheUpdate` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEvent {
    /// An entry was created or replaced through the public write API
    Update,
    /// An entry was observed past its expiry by the expiration monitor
    Outdated,
    /// An entry was reconciled from an external change to the cache directory
    DiskCacheUpdate,
}

// == Name Filter ==
/// Restricts a subscription to a single entry name or a set of names.
///
/// Absence of a filter matches every name.
#[derive(Debug, Clone)]
pub enum NameFilter {
    /// Exact-equality match against one name
    Single(String),
    /// Membership test against a set of names
    Many(HashSet<String>),
}

impl NameFilter {
    /// Checks whether this filter includes `name`.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameFilter::Single(only) => only == name,
            NameFilter::Many(names) => names.contains(name),
        }
    }
}

impl From<&str> for NameFilter {
    fn from(name: &str) -> Self {
        NameFilter::Single(name.to_string())
    }
}

impl From<String> for NameFilter {
    fn from(name: String) -> Self {
        NameFilter::Single(name)
    }
}

impl From<Vec<String>> for NameFilter {
    fn from(names: Vec<String>) -> Self {
        NameFilter::Many(names.into_iter().collect())
    }
}

impl From<Vec<&str>> for NameFilter {
    fn from(names: Vec<&str>) -> Self {
        NameFilter::Many(names.into_iter().map(String::from).collect())
    }
}

// == Listener Callback ==
/// Callback invoked with the entry name and its data for all event kinds.
pub type ListenerCallback = Box<dyn Fn(&str, &Value) + Send + Sync>;

// == Subscription ==
/// One registered listener: event kind, optional name filter, callback.
struct Subscription {
    event: CacheEvent,
    filter: Option<NameFilter>,
    callback: ListenerCallback,
}

// == Listener Registry ==
/// Append-only registry of event subscriptions.
///
/// The same callback may be registered multiple times and will be invoked
/// once per registration. There is no unregistration; subscriptions live as
/// long as the cache instance.
#[derive(Default)]
pub struct ListenerRegistry {
    subscriptions: Vec<Subscription>,
}

impl ListenerRegistry {
    // == Constructor ==
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // == On ==
    /// Registers a listener for `event`, optionally restricted by `filter`.
    pub fn on(&mut self, event: CacheEvent, filter: Option<NameFilter>, callback: ListenerCallback) {
        self.subscriptions.push(Subscription {
            event,
            filter,
            callback,
        });
    }

    // == Dispatch ==
    /// Invokes every matching listener synchronously, in registration order.
    ///
    /// A listener matches when its event kind equals `event` and its filter
    /// (if any) includes `name`. A panicking listener is caught and logged
    /// so fan-out reaches the remaining listeners.
    pub fn dispatch(&self, event: CacheEvent, name: &str, data: &Value) {
        for sub in &self.subscriptions {
            if sub.event != event {
                continue;
            }
            if let Some(filter) = &sub.filter {
                if !filter.matches(name) {
                    continue;
                }
            }
            if catch_unwind(AssertUnwindSafe(|| (sub.callback)(name, data))).is_err() {
                error!(?event, name, "cache listener panicked during dispatch");
            }
        }
    }

    // == Length ==
    /// Returns the number of registered subscriptions.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns true if no subscriptions are registered.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
