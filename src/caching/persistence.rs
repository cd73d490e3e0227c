//! # Snapshot Persistence
//!
//! Best-effort persistence of cached responses across restarts: a JSON file
//! mapping cache key to `{content, timestamp}`, written with owner-only
//! permissions. A corrupted or unreadable snapshot degrades to an empty
//! cache with a logged warning; it never fails startup.

use super::store::ResponseCache;
use super::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// One persisted response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A snapshot of the cache contents.
pub type CacheSnapshot = HashMap<String, SnapshotEntry>;

/// Export the live entries of `cache` as a snapshot.
pub fn export_snapshot(cache: &ResponseCache) -> CacheSnapshot {
    cache.with_entries(|entries| {
        entries
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    SnapshotEntry {
                        content: entry.value.clone(),
                        timestamp: entry.created_at,
                    },
                )
            })
            .collect()
    })
}

/// Write the cache contents to `path` with owner-only permissions.
pub fn save_snapshot(cache: &ResponseCache, path: &Path) -> CacheResult<()> {
    let snapshot = export_snapshot(cache);
    let json = serde_json::to_vec_pretty(&snapshot)?;

    fs::write(path, json).map_err(|e| CacheError::Snapshot {
        message: format!("failed to write {}: {}", path.display(), e),
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
            CacheError::Snapshot {
                message: format!("failed to set permissions on {}: {}", path.display(), e),
            }
        })?;
    }

    info!(
        path = %path.display(),
        entries = snapshot.len(),
        "cache snapshot written"
    );
    Ok(())
}

/// Read a snapshot from `path`, degrading to an empty snapshot on any error.
pub fn load_snapshot(path: &Path) -> CacheSnapshot {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no cache snapshot to restore");
            return CacheSnapshot::new();
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "cache snapshot unreadable, starting with an empty cache"
            );
            return CacheSnapshot::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "cache snapshot corrupted, starting with an empty cache"
            );
            CacheSnapshot::new()
        }
    }
}

/// Re-insert snapshot entries through the normal `set` path so capacity
/// limits hold. Entries already past the default TTL are skipped.
///
/// Returns the number of entries restored.
pub fn restore_snapshot(cache: &ResponseCache, snapshot: CacheSnapshot) -> usize {
    let now = Utc::now();
    let default_ttl = cache.config().default_ttl;
    let mut restored = 0usize;

    for (key, entry) in snapshot {
        if let Some(ttl) = default_ttl.and_then(|t| chrono::Duration::from_std(t).ok()) {
            if now - entry.timestamp > ttl {
                continue;
            }
        }
        if cache.set(&key, entry.content).is_ok() {
            restored += 1;
        }
    }

    if restored > 0 {
        info!(restored, "cache entries restored from snapshot");
    }
    restored
}
