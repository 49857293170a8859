//! Persistence Module
//!
//! Mirrors the entry store to a directory-per-entry layout and rebuilds it
//! at startup.
//!
//! Layout, one subdirectory per entry name:
//!
//! ```text
//! <cache_directory>/<name>/data      JSON envelope: {"data": <payload>}
//! <cache_directory>/<name>/expires   absolute expiry as a decimal ms string
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

// == File Names ==
/// Name of the per-entry payload file
pub const DATA_FILE: &str = "data";
/// Name of the per-entry expiry file
pub const EXPIRES_FILE: &str = "expires";

// == Data Envelope ==
/// Wrapper object written to the `data` file.
#[derive(Debug, Deserialize)]
struct DataEnvelope {
    data: Value,
}

/// Borrowing counterpart of [`DataEnvelope`] for the write path.
#[derive(Serialize)]
struct DataEnvelopeRef<'a> {
    data: &'a Value,
}

fn io_err(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

// == Load ==
/// Rebuilds the entry map from the cache directory.
///
/// Creates the directory when missing (empty cache). Otherwise every
/// immediate subdirectory is one candidate entry. Subdirectories that
/// cannot be parsed into a valid entry are tampered: deleted when
/// `discard_tampered` is set, otherwise skipped and left on disk.
pub fn load_all(dir: &Path, discard_tampered: bool) -> Result<HashMap<String, CacheEntry>> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        return Ok(HashMap::new());
    }

    let mut entries = HashMap::new();
    for dirent in fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let dirent = dirent.map_err(|e| io_err(dir, e))?;
        let path = dirent.path();
        if !path.is_dir() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        match read_entry_strict(&path) {
            Ok(entry) => {
                entries.insert(name, entry);
            }
            Err(err) if discard_tampered => {
                warn!("discarding tampered cache entry '{}': {}", name, err);
                if let Err(remove_err) = fs::remove_dir_all(&path) {
                    warn!(
                        "failed to remove tampered entry directory {}: {}",
                        path.display(),
                        remove_err
                    );
                }
            }
            Err(err) => {
                warn!("skipping tampered cache entry '{}': {}", name, err);
            }
        }
    }

    debug!("loaded {} persisted cache entries", entries.len());
    Ok(entries)
}

/// Strict per-entry read used at startup: both files must parse.
fn read_entry_strict(entry_dir: &Path) -> Result<CacheEntry> {
    let raw = fs::read_to_string(entry_dir.join(DATA_FILE))
        .map_err(|e| CacheError::Tampered(format!("unreadable data file: {e}")))?;
    let envelope: DataEnvelope = serde_json::from_str(&raw)
        .map_err(|e| CacheError::Tampered(format!("malformed data envelope: {e}")))?;
    let expires_at = read_expiry(entry_dir)?;
    Ok(CacheEntry::from_absolute(envelope.data, expires_at))
}

/// Parses the `expires` file as an absolute millisecond timestamp.
fn read_expiry(entry_dir: &Path) -> Result<u64> {
    let raw = fs::read_to_string(entry_dir.join(EXPIRES_FILE))
        .map_err(|e| CacheError::Tampered(format!("unreadable expires file: {e}")))?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| CacheError::Tampered(format!("non-numeric expiry '{}'", raw.trim())))
}

// == Write ==
/// Writes one entry to its subdirectory.
///
/// The two files are written independently, not atomically; a crash in
/// between leaves a tampered entry that the startup discard policy can
/// clean up.
pub fn write_entry(dir: &Path, name: &str, data: &Value, expires_at: u64) -> Result<()> {
    let entry_dir = dir.join(name);
    fs::create_dir_all(&entry_dir).map_err(|e| io_err(&entry_dir, e))?;

    let data_path = entry_dir.join(DATA_FILE);
    let envelope = serde_json::to_string(&DataEnvelopeRef { data })?;
    fs::write(&data_path, envelope).map_err(|e| io_err(&data_path, e))?;

    let expires_path = entry_dir.join(EXPIRES_FILE);
    fs::write(&expires_path, expires_at.to_string()).map_err(|e| io_err(&expires_path, e))?;

    Ok(())
}

// == Reconcile Read ==
/// Lenient per-entry read used by the directory watcher.
///
/// Unparseable payload data degrades to an empty JSON object instead of
/// failing the reconciliation; an unreadable or non-numeric expiry still
/// fails so the caller can drop the event.
pub fn read_entry_lenient(entry_dir: &Path) -> Result<CacheEntry> {
    let data_path = entry_dir.join(DATA_FILE);
    let raw = fs::read_to_string(&data_path).map_err(|e| io_err(&data_path, e))?;
    let data = serde_json::from_str::<DataEnvelope>(&raw)
        .map(|envelope| envelope.data)
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
    let expires_at = read_expiry(entry_dir)?;
    Ok(CacheEntry::from_absolute(data, expires_at))
}

// == Existence Check ==
/// True when the entry directory and both of its files are present.
///
/// The watcher validates this before reconciling, which avoids racing a
/// concurrent deletion.
pub fn entry_files_exist(dir: &Path, name: &str) -> bool {
    let entry_dir = dir.join(name);
    entry_dir.is_dir()
        && entry_dir.join(DATA_FILE).is_file()
        && entry_dir.join(EXPIRES_FILE).is_file()
}
