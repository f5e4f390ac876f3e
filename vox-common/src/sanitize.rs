//! Spoken-text sanitization.
//!
//! Synthesized text is embedded in commands handed to the speech engine,
//! and the engine itself evaluates untrusted-looking input. Shell and
//! Scheme metacharacters are stripped outright; anything left outside a
//! small punctuation whitelist rejects the entry.

use std::collections::BTreeSet;

use thiserror::Error;

/// Hard ceiling on spoken text length, in characters.
pub const MAX_SPOKEN_LEN: usize = 500;

/// Characters removed before the whitelist check.
const STRIP_CHARS: &[char] = &['(', ')', ';', '`', '$', '\\', '|', '&', '<', '>'];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("text is empty")]
    Empty,

    #[error("text is {len} characters long (limit {max})")]
    TooLong { len: usize, max: usize },

    #[error("text contains characters the speech engine will not accept: {chars}")]
    InvalidChars { chars: String },
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_ascii_whitespace()
        || matches!(c, '.' | ',' | '!' | '?' | '\'' | '"' | '-')
}

/// Normalize raw wordlist text into something safe to synthesize.
///
/// Strips dangerous characters, collapses whitespace runs to single
/// spaces, and rejects whatever survives outside the whitelist.
pub fn sanitize_spoken_text(text: &str) -> Result<String, SanitizeError> {
    if text.is_empty() {
        return Err(SanitizeError::Empty);
    }
    let len = text.chars().count();
    if len > MAX_SPOKEN_LEN {
        return Err(SanitizeError::TooLong {
            len,
            max: MAX_SPOKEN_LEN,
        });
    }

    let stripped: String = text.chars().filter(|c| !STRIP_CHARS.contains(c)).collect();
    let normalized = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    let bad: BTreeSet<char> = normalized.chars().filter(|c| !is_safe_char(*c)).collect();
    if !bad.is_empty() {
        let chars = bad
            .iter()
            .map(|c| format!("'{c}'"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(SanitizeError::InvalidChars { chars });
    }

    if normalized.is_empty() {
        return Err(SanitizeError::Empty);
    }
    Ok(normalized)
}
