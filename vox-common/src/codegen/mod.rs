//! Game code generation.
//!
//! The build emits a DM source file binding every produced clip into the
//! game's sound lists. The two supported codebases want very different
//! shapes: /vg/ loads through batched init procs to stay under the
//! interpreter's per-proc instruction limit, while /tg/ takes a single
//! global list literal.

pub mod tg;
pub mod vg;

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::manifest::Manifest;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodebaseTarget {
    #[default]
    Vg,
    Tg,
}

impl CodebaseTarget {
    /// Where the binding file conventionally lives, relative to the
    /// output root.
    pub fn default_binding_path(self) -> &'static str {
        match self {
            CodebaseTarget::Vg => "code/defines/vox_sounds.dm",
            CodebaseTarget::Tg => "code/modules/mob/living/silicon/ai/vox_sounds.dm",
        }
    }
}

impl fmt::Display for CodebaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodebaseTarget::Vg => f.write_str("vg"),
            CodebaseTarget::Tg => f.write_str("tg"),
        }
    }
}

pub fn generate(target: CodebaseTarget, manifest: &Manifest) -> Result<String> {
    match target {
        CodebaseTarget::Vg => vg::generate(manifest),
        CodebaseTarget::Tg => tg::generate(manifest),
    }
}
