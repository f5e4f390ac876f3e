//! Wordlist reorganization.
//!
//! Rewrites a wordlist grouped by section with entries sorted by id and
//! comments kept with their entries. Sample references regroup under a
//! dedicated SFX section. Running it on its own output changes nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::entry::{load_wordlist, EntryKind, WordlistEntry};

/// Section that sample references are regrouped under.
pub const SFX_SECTION: &str = "SFX";

#[derive(Debug)]
pub struct OrganizeOutcome {
    pub written: PathBuf,
    /// Ids dropped because an earlier entry already claimed them.
    pub dropped_duplicates: Vec<String>,
}

pub fn organize_file(
    path: &Path,
    out: Option<&Path>,
    sort_sections: bool,
) -> Result<OrganizeOutcome> {
    let entries = load_wordlist(path)?;
    let (text, dropped_duplicates) = organize_entries(&entries, sort_sections);
    let target = out.unwrap_or(path).to_path_buf();
    fs::write(&target, text)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(OrganizeOutcome {
        written: target,
        dropped_duplicates,
    })
}

/// Render entries back into wordlist text. Returns the text and the ids
/// of duplicate entries that were dropped.
pub fn organize_entries(
    entries: &[WordlistEntry],
    sort_sections: bool,
) -> (String, Vec<String>) {
    let mut order: Vec<String> = Vec::new();
    let mut groups: BTreeMap<String, Vec<&WordlistEntry>> = BTreeMap::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut dropped = Vec::new();

    for entry in entries.iter().filter(|e| e.is_buildable()) {
        if !seen.insert(entry.id.to_lowercase()) {
            dropped.push(entry.id.clone());
            continue;
        }
        let section = match entry.kind {
            EntryKind::SampleReference { .. } => SFX_SECTION.to_string(),
            _ => entry.section.clone(),
        };
        if !groups.contains_key(&section) {
            order.push(section.clone());
        }
        groups.entry(section).or_default().push(entry);
    }

    if sort_sections {
        order.sort();
    }

    let max_name = order
        .iter()
        .filter(|n| !n.is_empty())
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0);
    let divider = "#".repeat(max_name.max(4) + 4);

    let mut out = String::new();
    for name in &order {
        let Some(group) = groups.get_mut(name) else {
            continue;
        };
        group.sort_by(|a, b| a.id.cmp(&b.id));
        if !name.is_empty() {
            out.push('\n');
            out.push_str(&divider);
            out.push_str("\n## ");
            out.push_str(name);
            out.push('\n');
            out.push_str(&divider);
            out.push_str("\n\n");
        }
        for entry in group.iter() {
            for comment in &entry.comments_before {
                out.push('#');
                out.push_str(comment);
                out.push('\n');
            }
            out.push_str(&render_entry(entry));
            out.push('\n');
        }
    }
    (out, dropped)
}

fn render_entry(entry: &WordlistEntry) -> String {
    match &entry.kind {
        EntryKind::Word { spoken_text } => spoken_text.clone(),
        EntryKind::PhraseWithId { spoken_text } => format!("{} = {}", entry.id, spoken_text),
        EntryKind::SampleReference { source_path } => format!("{} = @{}", entry.id, source_path),
        EntryKind::SongReference { source_path } => format!("{} = &{}", entry.id, source_path),
        EntryKind::SectionHeader { .. } | EntryKind::Comment { .. } => String::new(),
    }
}
