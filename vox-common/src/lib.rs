//! Shared core for the voxpack build tool.
//!
//! Everything here is pure data plumbing: wordlist parsing, entry
//! resolution, manifest assembly, and game-code generation. Nothing in
//! this crate touches the audio toolchain; the `vox` binary owns all
//! process spawning and filesystem layout.

pub mod codegen;
pub mod config;
pub mod entry;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod organize;
pub mod resolve;
pub mod sanitize;
pub mod voices;

pub use entry::{EntryKind, WordlistEntry};
pub use error::{ManifestError, ParseError, PipelineError, PipelineStage, ResolutionError};
pub use voices::Channel;
