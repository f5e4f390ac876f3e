//! Wordlist parsing.
//!
//! A wordlist is a plain text file, one entry per line:
//!
//! ```text
//! ####################
//! ## Announcements
//! ####################
//!
//! # Hull breach warning.
//! engineering_breach = engineering breach detected
//! red_alert    # short form
//! @samples/klaxon.wav
//! &songs/closing_time.xml
//! ```
//!
//! `##` opens a section, `#` is a comment, `@` copies a pre-recorded
//! sample, `&` renders a song document, `id = phrase` binds an explicit
//! id, and anything else is a bare word whose id is derived from its
//! text. Comments directly above an entry travel with it; a blank line
//! orphans them.

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use crate::error::ParseError;

/// Section name for entries above the first `##` header.
pub const DEFAULT_SECTION: &str = "";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Bare line: the text is spoken as-is and also names the entry.
    Word { spoken_text: String },
    /// `id = spoken text`.
    PhraseWithId { spoken_text: String },
    /// `@path` or `id = @path`, relative to the samples root.
    SampleReference { source_path: String },
    /// `&path` or `id = &path`, relative to the songs root.
    SongReference { source_path: String },
    /// `## name`.
    SectionHeader { name: String },
    /// `# text`.
    Comment { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordlistEntry {
    pub kind: EntryKind,
    /// The line as it appeared in the file, untrimmed.
    pub raw_text: String,
    /// Canonical identifier. Empty for headers and comments.
    pub id: String,
    pub file: PathBuf,
    pub line: usize,
    /// Enclosing section name; [`DEFAULT_SECTION`] before the first header.
    pub section: String,
    /// Comment lines immediately above this entry.
    pub comments_before: Vec<String>,
}

impl WordlistEntry {
    /// True for kinds that produce an audio artifact.
    pub fn is_buildable(&self) -> bool {
        matches!(
            self.kind,
            EntryKind::Word { .. }
                | EntryKind::PhraseWithId { .. }
                | EntryKind::SampleReference { .. }
                | EntryKind::SongReference { .. }
        )
    }

    pub fn spoken_text(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Word { spoken_text } | EntryKind::PhraseWithId { spoken_text } => {
                Some(spoken_text)
            }
            _ => None,
        }
    }

    pub fn source_path(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::SampleReference { source_path }
            | EntryKind::SongReference { source_path } => Some(source_path),
            _ => None,
        }
    }

    /// Number of whitespace-separated words in the spoken text. Samples
    /// and songs count as one word; headers and comments as zero.
    pub fn word_count(&self) -> u32 {
        match &self.kind {
            EntryKind::Word { spoken_text } | EntryKind::PhraseWithId { spoken_text } => {
                spoken_text.split_whitespace().count() as u32
            }
            EntryKind::SampleReference { .. } | EntryKind::SongReference { .. } => 1,
            EntryKind::SectionHeader { .. } | EntryKind::Comment { .. } => 0,
        }
    }
}

/// Derive an id from spoken text: lowercased, every non-alphanumeric
/// character replaced by an underscore.
pub fn derive_id(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// The portion of a reference path that names the entry: the file stem.
pub fn path_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Why an explicit id is unusable, if it is. Ids become artifact file
/// names, so the rules are the filesystem's.
pub fn id_problem(id: &str) -> Option<&'static str> {
    if id.contains('/') || id.contains('\\') {
        return Some("path separators are not allowed");
    }
    if id.chars().any(|c| c.is_whitespace()) {
        return Some("whitespace is not allowed");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Some("only ASCII letters, digits, '_', '-' and '.' are allowed");
    }
    if id.starts_with('.') || id.ends_with('.') {
        return Some("leading and trailing dots are not allowed");
    }
    None
}

fn strip_inline_comment(text: &str) -> &str {
    match text.find('#') {
        Some(idx) => &text[..idx],
        None => text,
    }
}

pub fn load_wordlist(path: &Path) -> Result<Vec<WordlistEntry>, ParseError> {
    let text = fs::read_to_string(path).map_err(|source| ParseError::Io {
        file: path.to_path_buf(),
        source,
    })?;
    parse_wordlist_text(path, &text)
}

pub fn parse_wordlist_text(file: &Path, text: &str) -> Result<Vec<WordlistEntry>, ParseError> {
    let mut entries = Vec::new();
    let mut section = DEFAULT_SECTION.to_string();
    let mut comments: Vec<String> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();

        let make = |kind: EntryKind, id: String, comments_before: Vec<String>| WordlistEntry {
            kind,
            raw_text: raw.to_string(),
            id,
            file: file.to_path_buf(),
            line,
            section: section.clone(),
            comments_before,
        };

        if trimmed.is_empty() {
            comments.clear();
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("##") {
            let name = rest.trim().to_string();
            let entry = WordlistEntry {
                kind: EntryKind::SectionHeader { name: name.clone() },
                raw_text: raw.to_string(),
                id: String::new(),
                file: file.to_path_buf(),
                line,
                section: name.clone(),
                comments_before: Vec::new(),
            };
            entries.push(entry);
            section = name;
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('#') {
            let text = rest.to_string();
            comments.push(text.clone());
            entries.push(make(EntryKind::Comment { text }, String::new(), Vec::new()));
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('@') {
            let entry = reference_entry(file, line, '@', rest)?;
            entries.push(make(entry.0, entry.1, mem::take(&mut comments)));
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('&') {
            let entry = reference_entry(file, line, '&', rest)?;
            entries.push(make(entry.0, entry.1, mem::take(&mut comments)));
            continue;
        }

        if let Some(eq) = trimmed.find('=') {
            let id = trimmed[..eq].trim().to_string();
            let value = strip_inline_comment(&trimmed[eq + 1..]).trim().to_string();
            if id.is_empty() {
                return Err(ParseError::EmptyId {
                    file: file.to_path_buf(),
                    line,
                });
            }
            if let Some(reason) = id_problem(&id) {
                return Err(ParseError::InvalidId {
                    file: file.to_path_buf(),
                    line,
                    id,
                    reason: reason.to_string(),
                });
            }
            if value.is_empty() {
                return Err(ParseError::EmptyPhrase {
                    file: file.to_path_buf(),
                    line,
                    id,
                });
            }
            let kind = if let Some(path) = value.strip_prefix('@') {
                let path = path.trim();
                if path.is_empty() {
                    return Err(ParseError::EmptyReference {
                        file: file.to_path_buf(),
                        line,
                        sigil: '@',
                    });
                }
                EntryKind::SampleReference {
                    source_path: path.to_string(),
                }
            } else if let Some(path) = value.strip_prefix('&') {
                let path = path.trim();
                if path.is_empty() {
                    return Err(ParseError::EmptyReference {
                        file: file.to_path_buf(),
                        line,
                        sigil: '&',
                    });
                }
                EntryKind::SongReference {
                    source_path: path.to_string(),
                }
            } else {
                EntryKind::PhraseWithId { spoken_text: value }
            };
            entries.push(make(kind, id, mem::take(&mut comments)));
            continue;
        }

        let word = strip_inline_comment(trimmed).trim();
        if word.is_empty() {
            comments.clear();
            continue;
        }
        let id = derive_id(word);
        entries.push(make(
            EntryKind::Word {
                spoken_text: word.to_string(),
            },
            id,
            mem::take(&mut comments),
        ));
    }

    Ok(entries)
}

fn reference_entry(
    file: &Path,
    line: usize,
    sigil: char,
    rest: &str,
) -> Result<(EntryKind, String), ParseError> {
    let path = rest.trim().to_string();
    if path.is_empty() {
        return Err(ParseError::EmptyReference {
            file: file.to_path_buf(),
            line,
            sigil,
        });
    }
    let id = derive_id(&path_stem(&path));
    if id.is_empty() {
        return Err(ParseError::InvalidId {
            file: file.to_path_buf(),
            line,
            id: path,
            reason: "cannot derive an id from this path".to_string(),
        });
    }
    let kind = match sigil {
        '@' => EntryKind::SampleReference { source_path: path },
        _ => EntryKind::SongReference { source_path: path },
    };
    Ok((kind, id))
}
