//! /vg/station binding generator.
//!
//! The game interpreter caps every proc at a fixed instruction count,
//! and a full library blows past it in a single init body. Assignments
//! are batched into numbered procs, each kept under the cap, all called
//! from New() on a meta object constructed at world load.

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite;

use anyhow::Result;

use crate::manifest::Manifest;

/// Interpreter's per-proc instruction cap.
const INSTRUCTION_LIMIT: u32 = 65535;
/// Baseline cost of an empty proc.
const PROC_BASE_COST: u32 = 5;
/// Cost of `vox_sounds["fem"] = list()`.
const LIST_INIT_COST: u32 = 11;
/// Cost of `vox_sounds["fem"]["id"] = 'file'`.
const SOUND_ASSIGN_COST: u32 = 16;
/// Cost of `vox_sound_lengths['file'] = n`.
const LENGTH_ASSIGN_COST: u32 = 13;
/// Cost of `vox_wordlen["id"] = n`.
const WORDLEN_ASSIGN_COST: u32 = 13;

/// Splits init lines into procs that each stay under the instruction
/// cap. Lines pushed as one group never straddle a split.
struct ProcBatcher {
    limit: u32,
    procs: Vec<Vec<String>>,
    current_cost: u32,
    total_cost: u32,
}

impl ProcBatcher {
    fn new() -> ProcBatcher {
        ProcBatcher::with_limit(INSTRUCTION_LIMIT)
    }

    fn with_limit(limit: u32) -> ProcBatcher {
        ProcBatcher {
            limit,
            procs: vec![Vec::new()],
            current_cost: PROC_BASE_COST,
            total_cost: PROC_BASE_COST,
        }
    }

    fn push_group(&mut self, lines: Vec<String>, cost: u32) {
        let last = self.procs.len() - 1;
        if self.current_cost + cost > self.limit && !self.procs[last].is_empty() {
            self.procs.push(Vec::new());
            self.current_cost = PROC_BASE_COST;
            self.total_cost += PROC_BASE_COST;
        }
        self.current_cost += cost;
        self.total_cost += cost;
        let last = self.procs.len() - 1;
        self.procs[last].extend(lines);
    }
}

pub fn generate(manifest: &Manifest) -> Result<String> {
    let mut batcher = ProcBatcher::new();
    let mut emitted_lengths: BTreeSet<&str> = BTreeSet::new();

    for code in manifest.voices.keys() {
        batcher.push_group(
            vec![format!("vox_sounds[\"{code}\"] = list()")],
            LIST_INIT_COST,
        );
        for section in &manifest.sections {
            let mut banner_pending = !section.name.is_empty();
            for entry in &section.entries {
                if entry.unlisted {
                    continue;
                }
                let Some(file) = entry.files.get(code.as_str()) else {
                    continue;
                };
                let mut lines = Vec::new();
                let mut cost = SOUND_ASSIGN_COST;
                if banner_pending {
                    lines.push(format!("// === {} ===", section.name));
                    banner_pending = false;
                }
                lines.push(format!(
                    "vox_sounds[\"{code}\"][\"{}\"] = '{}'",
                    entry.id, file.path
                ));
                if emitted_lengths.insert(file.path.as_str()) {
                    lines.push(format!(
                        "vox_sound_lengths['{}'] = {}",
                        file.path,
                        format_sig4(file.duration_seconds * 10.0)
                    ));
                    cost += LENGTH_ASSIGN_COST;
                }
                batcher.push_group(lines, cost);
            }
        }
    }

    for section in &manifest.sections {
        for entry in &section.entries {
            if entry.unlisted || entry.word_count <= 1 || entry.files.is_empty() {
                continue;
            }
            batcher.push_group(
                vec![format!(
                    "vox_wordlen[\"{}\"] = {}",
                    entry.id, entry.word_count
                )],
                WORDLEN_ASSIGN_COST,
            );
        }
    }

    let mut output = String::new();
    writeln!(output, "// GENERATED FILE - DO NOT EDIT")?;
    writeln!(output, "// Generator: vox build")?;
    writeln!(output)?;
    writeln!(output, "#ifndef DISABLE_VOX")?;
    writeln!(output)?;
    writeln!(
        output,
        "// {} instructions across {} init procs",
        batcher.total_cost,
        batcher.procs.len()
    )?;
    writeln!(output, "var/list/vox_sounds = list()")?;
    writeln!(output, "var/list/vox_wordlen = list()")?;
    writeln!(output, "var/list/vox_sound_lengths = list()")?;
    writeln!(output)?;
    writeln!(output, "/__vox_sound_meta_init/New()")?;
    writeln!(output, "\t..()")?;
    for idx in 0..batcher.procs.len() {
        writeln!(output, "\tsrc.__init_{idx}()")?;
    }
    writeln!(output)?;
    for (idx, body) in batcher.procs.iter().enumerate() {
        writeln!(output, "/__vox_sound_meta_init/proc/__init_{idx}()")?;
        for line in body {
            writeln!(output, "\t{line}")?;
        }
        writeln!(output)?;
    }
    writeln!(output, "var/global/__vox_sound_meta_init/__vox_sound_meta = new()")?;
    writeln!(output)?;
    writeln!(output, "#endif // DISABLE_VOX")?;
    Ok(output)
}

/// Durations go into the file as deciseconds with four significant
/// digits, trailing zeros dropped.
fn format_sig4(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (3 - magnitude).max(0) as usize;
    let mut text = format!("{value:.decimals$}");
    if text.contains('.') {
        text = text
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string();
    }
    text
}
