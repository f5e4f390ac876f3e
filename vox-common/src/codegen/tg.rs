//! /tg/station binding generator.
//!
//! /tg/ loads the whole library as a single global list literal, keyed
//! by channel code, guarded by the AI_VOX define.

use std::fmt::Write as FmtWrite;

use anyhow::Result;

use crate::manifest::Manifest;

pub fn generate(manifest: &Manifest) -> Result<String> {
    let mut output = String::new();
    writeln!(output, "// GENERATED FILE - DO NOT EDIT")?;
    writeln!(output, "// Generator: vox build")?;
    writeln!(output)?;
    writeln!(output, "#ifdef AI_VOX")?;
    writeln!(output)?;
    writeln!(output, "GLOBAL_LIST_INIT(vox_sounds, list(")?;
    let channel_count = manifest.voices.len();
    for (idx, code) in manifest.voices.keys().enumerate() {
        writeln!(output, "\t\"{code}\" = list(")?;
        for section in &manifest.sections {
            for entry in &section.entries {
                if entry.unlisted {
                    continue;
                }
                let Some(file) = entry.files.get(code.as_str()) else {
                    continue;
                };
                writeln!(output, "\t\t\"{}\" = '{}',", entry.id, file.path)?;
            }
        }
        if idx + 1 == channel_count {
            writeln!(output, "\t)")?;
        } else {
            writeln!(output, "\t),")?;
        }
    }
    writeln!(output, "))")?;
    writeln!(output)?;
    writeln!(output, "#endif // AI_VOX")?;
    Ok(output)
}
