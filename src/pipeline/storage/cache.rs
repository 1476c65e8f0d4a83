//! Memoized fact table.
//!
//! The cache is never a source of truth: anything wrong with it (missing,
//! unreadable, stale, another format) just means the join is recomputed.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::constants::CACHE_FORMAT_VERSION;
use crate::error::{NetworkError, Result};
use crate::pipeline::processing::join::FactTable;
use crate::pipeline::storage::write_atomic;

#[derive(Debug, Serialize, Deserialize)]
struct CachedFactTable {
    version: u32,
    fingerprint: String,
    #[serde(flatten)]
    table: FactTable,
}

/// Cached table for these sources, if there is a usable one
pub fn load(path: &Path, fingerprint: &str) -> Option<FactTable> {
    if !path.exists() {
        debug!("No fact table cache at {}", path.display());
        return None;
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Ignoring unreadable cache {}: {}", path.display(), e);
            return None;
        }
    };

    let cached: CachedFactTable = match serde_json::from_slice(&bytes) {
        Ok(cached) => cached,
        Err(e) => {
            warn!("Ignoring corrupt cache {}: {}", path.display(), e);
            return None;
        }
    };

    if cached.version != CACHE_FORMAT_VERSION {
        warn!(
            "Ignoring cache {} written in format v{} (current v{})",
            path.display(),
            cached.version,
            CACHE_FORMAT_VERSION
        );
        return None;
    }
    if cached.fingerprint != fingerprint {
        info!("Source files changed since {} was written; rebuilding", path.display());
        return None;
    }

    metrics::counter!("club_network_cache_hits_total").increment(1);
    Some(cached.table)
}

/// Best effort: a cache that can't be written only costs the next run a rebuild.
pub fn store(path: &Path, fingerprint: &str, table: &FactTable) {
    match try_store(path, fingerprint, table) {
        Ok(()) => debug!("Cached {} fact rows at {}", table.len(), path.display()),
        Err(e) => warn!("Could not write cache {}: {}", path.display(), e),
    }
}

fn try_store(path: &Path, fingerprint: &str, table: &FactTable) -> Result<()> {
    let cached = CachedFactTable {
        version: CACHE_FORMAT_VERSION,
        fingerprint: fingerprint.to_string(),
        table: table.clone(),
    };
    let bytes = serde_json::to_vec(&cached)?;
    write_atomic(path, &bytes)
}

/// Remove the cache file; returns whether there was one.
pub fn clear(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(NetworkError::io(path, e)),
    }
}
