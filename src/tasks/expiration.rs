//! Expiration Monitor Task
//!
//! Background task that periodically scans for entries past their expiry
//! and fires "outdated" notifications.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{current_timestamp_ms, CacheEvent};
use crate::manager::CacheShared;

/// Spawns the expiration monitor.
///
/// Each tick takes a single snapshot of the store and dispatches an
/// "outdated" notification, carrying the entry's name and data, for every
/// entry past its expiry. Expiration is purely observational: entries are
/// never removed, and an expired entry keeps firing on every tick until it
/// is overwritten.
///
/// # Arguments
/// * `shared` - State shared with the owning cache manager
/// * `check_interval_ms` - Tick period in milliseconds
///
/// # Returns
/// A JoinHandle for the spawned task, aborted when the cache manager shuts
/// down.
pub fn spawn_expiration_task(shared: Arc<CacheShared>, check_interval_ms: u64) -> JoinHandle<()> {
    let interval = Duration::from_millis(check_interval_ms);

    tokio::spawn(async move {
        info!(
            "starting expiration monitor with interval of {} ms",
            check_interval_ms
        );

        loop {
            tokio::time::sleep(interval).await;

            // One snapshot per tick; dispatch happens outside the store lock
            let snapshot = {
                let store = shared.store.read().await;
                store.entries()
            };

            let now = current_timestamp_ms();
            let mut outdated = 0usize;
            for (name, entry) in snapshot {
                if now > entry.expires_at {
                    shared
                        .dispatch(CacheEvent::Outdated, &name, &entry.data)
                        .await;
                    outdated += 1;
                }
            }

            if outdated > 0 {
                debug!("expiration monitor: {} outdated entries", outdated);
            }
        }
    })
}
