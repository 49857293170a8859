//! Directory Watch Task
//!
//! Observes the cache directory for out-of-band modifications and
//! reconciles the entry store with what is on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheEvent;
use crate::error::Result;
use crate::manager::CacheShared;
use crate::persist;

/// Spawns the external change observer for the cache directory.
///
/// Filesystem events are forwarded from the notify callback thread over a
/// channel to a Tokio task that performs the reconciliation. Watch errors
/// are logged and suppressed; they are not actionable from inside the
/// cache.
///
/// # Arguments
/// * `shared` - State shared with the owning cache manager
/// * `dir` - Canonical cache directory to observe
///
/// # Returns
/// The watcher alongside the task handle. The watcher must stay alive for
/// change notifications to keep flowing; dropping it stops the stream.
pub fn spawn_watch_task(
    shared: Arc<CacheShared>,
    dir: PathBuf,
) -> Result<(RecommendedWatcher, JoinHandle<()>)> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut watcher = notify::recommended_watcher(
        move |res: std::result::Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                let _ = tx.send(event);
            }
            Err(e) => debug!("directory watch error: {}", e),
        },
    )?;
    watcher.watch(&dir, RecursiveMode::Recursive)?;
    info!("watching cache directory {}", dir.display());

    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            for path in &event.paths {
                if let Some(name) = entry_name_for(&dir, path) {
                    reconcile(&shared, &dir, &name).await;
                }
            }
        }
    });

    Ok((watcher, handle))
}

/// Derives the candidate entry name from a changed path: the first
/// component below the cache directory.
///
/// Changes to the root directory itself, or paths outside it, yield None.
fn entry_name_for(dir: &Path, changed: &Path) -> Option<String> {
    let relative = changed.strip_prefix(dir).ok()?;
    let first = relative.components().next()?;
    let name = first.as_os_str().to_str()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Re-reads one entry from disk and updates the store.
///
/// Events for entries whose directory or files have gone missing are
/// dropped, which covers racing against a concurrent deletion. Successful
/// reconciliation fires a "diskCacheUpdate" notification.
async fn reconcile(shared: &Arc<CacheShared>, dir: &Path, name: &str) {
    if !persist::entry_files_exist(dir, name) {
        debug!("ignoring change for '{}': entry files incomplete", name);
        return;
    }

    match persist::read_entry_lenient(&dir.join(name)) {
        Ok(entry) => {
            let data = entry.data.clone();
            {
                let mut store = shared.store.write().await;
                store.insert(name.to_string(), entry);
            }
            debug!("reconciled entry '{}' from disk change", name);
            shared
                .dispatch(CacheEvent::DiskCacheUpdate, name, &data)
                .await;
        }
        Err(err) => warn!("failed to reconcile entry '{}': {}", name, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name_from_nested_path() {
        let dir = Path::new("/tmp/cache");
        assert_eq!(
            entry_name_for(dir, Path::new("/tmp/cache/foo/data")),
            Some("foo".to_string())
        );
    }

    #[test]
    fn test_entry_name_from_entry_directory() {
        let dir = Path::new("/tmp/cache");
        assert_eq!(
            entry_name_for(dir, Path::new("/tmp/cache/foo")),
            Some("foo".to_string())
        );
    }

    #[test]
    fn test_root_directory_change_ignored() {
        let dir = Path::new("/tmp/cache");
        assert_eq!(entry_name_for(dir, Path::new("/tmp/cache")), None);
    }

    #[test]
    fn test_path_outside_directory_ignored() {
        let dir = Path::new("/tmp/cache");
        assert_eq!(entry_name_for(dir, Path::new("/tmp/other/foo")), None);
    }
}
