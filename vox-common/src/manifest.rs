//! Build manifest: the machine-readable record of what a build produced.
//!
//! The manifest preserves wordlist section order and groups each entry's
//! artifacts by sex channel. Nothing in it depends on when or where the
//! build ran, so byte-identical inputs give a byte-identical manifest.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::codegen::CodebaseTarget;
use crate::entry::WordlistEntry;
use crate::error::{IdCollision, ManifestError};

/// Bumped when the manifest layout changes shape.
pub const VOX_DATA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub id: String,
    pub engine_voice: String,
}

/// One produced artifact, as recorded per channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Path relative to the output root, forward slashes.
    pub path: String,
    pub duration_seconds: f64,
    /// SHA-256 of the encoded artifact.
    pub content_hash: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub word_count: u32,
    pub unlisted: bool,
    /// Channel code ("fem", "mas") to artifact. Samples carry the same
    /// shared artifact under every channel.
    pub files: BTreeMap<String, ManifestFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestSection {
    pub name: String,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub codebase: CodebaseTarget,
    pub voices: BTreeMap<String, VoiceInfo>,
    /// Wordlist sections in first-encounter order.
    pub sections: Vec<ManifestSection>,
}

impl Manifest {
    pub fn new(codebase: CodebaseTarget, voices: BTreeMap<String, VoiceInfo>) -> Manifest {
        Manifest {
            version: VOX_DATA_VERSION,
            codebase,
            voices,
            sections: Vec::new(),
        }
    }

    /// Find or append the section with this name.
    pub fn section_mut(&mut self, name: &str) -> &mut ManifestSection {
        let idx = match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(ManifestSection {
                    name: name.to_string(),
                    entries: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json =
            serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        json.push('\n');
        Ok(json)
    }
}

/// Verify that no id is claimed twice across the combined wordlists.
/// Ids differing only by case count as duplicates, since they would
/// collide as file names on case-insensitive filesystems.
pub fn check_unique_ids(entries: &[WordlistEntry]) -> Result<(), ManifestError> {
    let mut seen: BTreeMap<String, (&Path, usize)> = BTreeMap::new();
    let mut collisions = Vec::new();
    for entry in entries.iter().filter(|e| e.is_buildable()) {
        let key = entry.id.to_lowercase();
        match seen.get(&key) {
            Some((first_file, first_line)) => collisions.push(IdCollision {
                id: entry.id.clone(),
                file: entry.file.clone(),
                line: entry.line,
                first_file: first_file.to_path_buf(),
                first_line: *first_line,
            }),
            None => {
                seen.insert(key, (entry.file.as_path(), entry.line));
            }
        }
    }
    if collisions.is_empty() {
        Ok(())
    } else {
        Err(ManifestError::DuplicateIds { collisions })
    }
}
