//! Error taxonomy for the build.
//!
//! Four families, matching how far a failure is allowed to spread:
//! [`ParseError`] and [`ManifestError`] abort the whole run before any
//! audio work starts, while [`ResolutionError`] and [`PipelineError`]
//! stay confined to the entry that raised them.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::sanitize::SanitizeError;
use crate::voices::Channel;

/// A malformed wordlist line. Fatal to the file that contains it.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}: {source}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: entry has an empty id before '='", file.display())]
    EmptyId { file: PathBuf, line: usize },

    #[error("{}:{line}: entry '{id}' has nothing after '='", file.display())]
    EmptyPhrase {
        file: PathBuf,
        line: usize,
        id: String,
    },

    #[error("{}:{line}: reference has no path after '{sigil}'", file.display())]
    EmptyReference {
        file: PathBuf,
        line: usize,
        sigil: char,
    },

    #[error("{}:{line}: invalid id '{id}': {reason}", file.display())]
    InvalidId {
        file: PathBuf,
        line: usize,
        id: String,
        reason: String,
    },
}

/// An entry that cannot be turned into a production recipe. Confined to
/// the entry; the rest of the build continues.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("entry '{entry}' requests unknown voice '{voice}'")]
    UnknownVoice { entry: String, voice: String },

    #[error("entry '{entry}' needs a {channel} voice but none is configured")]
    NoVoiceForChannel { entry: String, channel: Channel },

    #[error("entry '{entry}' has unknown flag '{flag}'")]
    UnknownFlag { entry: String, flag: String },

    #[error("entry '{entry}' cannot be spoken: {source}")]
    Unspeakable {
        entry: String,
        #[source]
        source: SanitizeError,
    },
}

/// Which stage of the audio pipeline a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Acquire,
    Process,
    Encode,
    Measure,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Acquire => "acquire",
            PipelineStage::Process => "process",
            PipelineStage::Encode => "encode",
            PipelineStage::Measure => "measure",
        };
        f.write_str(name)
    }
}

/// A failure inside the external audio toolchain, tagged with the stage
/// that raised it. Confined to the entry being built.
#[derive(Debug, Clone, Error)]
#[error("{stage} stage failed: {message}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub message: String,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> PipelineError {
        PipelineError {
            stage,
            message: message.into(),
        }
    }
}

/// One id claimed by two wordlist entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCollision {
    pub id: String,
    pub file: PathBuf,
    pub line: usize,
    pub first_file: PathBuf,
    pub first_line: usize,
}

impl fmt::Display for IdCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "duplicate id '{}' in {}:{} (first seen in {}:{})",
            self.id,
            self.file.display(),
            self.line,
            self.first_file.display(),
            self.first_line
        )
    }
}

/// The combined wordlists violate a global guarantee. Fatal.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{}", format_collisions(collisions))]
    DuplicateIds { collisions: Vec<IdCollision> },
}

fn format_collisions(collisions: &[IdCollision]) -> String {
    let mut out = format!("{} duplicate id(s) across wordlists:", collisions.len());
    for c in collisions {
        out.push_str("\n  ");
        out.push_str(&c.to_string());
    }
    out
}
