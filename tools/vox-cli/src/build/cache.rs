//! Content-addressed rebuild markers.
//!
//! One JSON record per artifact, stored under the cache root away from
//! the shipped output tree. A record proves which recipe fingerprint
//! (and, for file-backed recipes, which source bytes) produced the
//! artifact that is on disk. Anything off forces a rebuild; timestamps
//! play no part.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vox_common::resolve::safe_file_stem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Recipe fingerprint at the time the artifact was produced.
    pub fingerprint: String,
    /// Content hash of the referenced source file, for samples and
    /// songs. Synthesized entries have no file input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_hash: Option<String>,
    pub output_rel: String,
    pub duration_seconds: f64,
    pub content_hash: String,
    pub size_bytes: u64,
}

pub fn record_path(cache_root: &Path, slot: &str, id: &str) -> PathBuf {
    cache_root
        .join(slot)
        .join(format!("{}.json", safe_file_stem(id)))
}

/// Load a record if it exists and parses. Anything else means rebuild,
/// never an error.
pub fn load(path: &Path) -> Option<CacheRecord> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn store(path: &Path, record: &CacheRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut json = serde_json::to_string_pretty(record).context("Failed to serialize cache record")?;
    json.push('\n');
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Decide whether the artifact on disk can be kept. Returns the record
/// backing the skip, or None when a rebuild is due.
pub fn check(
    artifact_path: &Path,
    record_path: &Path,
    fingerprint: &str,
    input_hash: Option<&str>,
) -> Option<CacheRecord> {
    if !artifact_path.is_file() {
        return None;
    }
    let record = load(record_path)?;
    if record.fingerprint != fingerprint {
        return None;
    }
    if record.input_hash.as_deref() != input_hash {
        return None;
    }
    Some(record)
}
