//! External tool pipeline: acquire, process, encode, measure.
//!
//! Every artifact passes through the same four stages. Acquire raises
//! source audio (speech synthesis, sample decode, or song rendering),
//! process runs the sox trim and effect chain, encode produces the
//! distribution Vorbis file, and measure reads the result back for the
//! manifest. Failures carry the stage that raised them and never spread
//! past the entry being built.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Result};
use serde::Deserialize;

use vox_common::error::{PipelineError, PipelineStage};
use vox_common::hash;
use vox_common::resolve::{
    safe_file_stem, ProductionRecipe, RecipeMode, ENCODE_ARGS, PRE_TRIM_ARGS,
    SILENCE_PADDING_SECONDS,
};

/// Locations of the external executables the pipeline shells out to.
pub struct Tools {
    pub text2wave: PathBuf,
    pub sox: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Tools {
    /// Locate every required executable up front, before any audio work.
    pub fn locate() -> Result<Tools> {
        let mut missing = Vec::new();
        let mut find = |name: &'static str, missing: &mut Vec<&'static str>| {
            which::which(name).unwrap_or_else(|_| {
                missing.push(name);
                PathBuf::new()
            })
        };
        let tools = Tools {
            text2wave: find("text2wave", &mut missing),
            sox: find("sox", &mut missing),
            ffmpeg: find("ffmpeg", &mut missing),
            ffprobe: find("ffprobe", &mut missing),
        };
        if !missing.is_empty() {
            bail!(
                "Required external tools not found: {}\n\
                The build shells out to the Festival speech tools and the usual\n\
                audio toolchain. Install:\n\
                - festival (provides text2wave)\n\
                - sox\n\
                - ffmpeg (provides ffmpeg and ffprobe)",
                missing.join(", ")
            );
        }
        Ok(tools)
    }
}

/// Everything a pipeline run needs besides the recipe itself.
pub struct PipelineContext<'a> {
    pub tools: &'a Tools,
    pub samples_root: &'a Path,
    pub songs_root: &'a Path,
    pub output_root: &'a Path,
    pub scratch_root: &'a Path,
    pub lexicon: Option<&'a Path>,
    /// Print every external command before running it.
    pub echo: bool,
}

/// Intermediate file locations for one artifact. Names carry the slot
/// so parallel workers never collide.
struct ScratchPaths {
    text: PathBuf,
    raw: PathBuf,
    trimmed: PathBuf,
    effected: PathBuf,
}

impl ScratchPaths {
    fn new(scratch_root: &Path, slot: &str, id: &str) -> ScratchPaths {
        let stem = format!("{slot}-{}", safe_file_stem(id));
        ScratchPaths {
            text: scratch_root.join(format!("{stem}.txt")),
            raw: scratch_root.join(format!("{stem}.raw.wav")),
            trimmed: scratch_root.join(format!("{stem}.trim.wav")),
            effected: scratch_root.join(format!("{stem}.fx.wav")),
        }
    }
}

/// What measure reads back off a finished artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Measured {
    pub duration_seconds: f64,
    pub content_hash: String,
    pub size_bytes: u64,
}

/// Produce one artifact under the output root.
pub fn run_recipe(
    ctx: &PipelineContext<'_>,
    recipe: &ProductionRecipe,
    slot: &str,
) -> Result<Measured, PipelineError> {
    let scratch = ScratchPaths::new(ctx.scratch_root, slot, &recipe.id);
    acquire(ctx, recipe, &scratch)?;
    let processed = post_process(ctx, recipe, &scratch)?;

    let artifact = ctx.output_root.join(&recipe.output_rel);
    if let Some(parent) = artifact.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PipelineError::new(
                PipelineStage::Encode,
                format!("failed to create {}: {e}", parent.display()),
            )
        })?;
    }
    encode(ctx, &processed, &artifact)?;
    measure(ctx, recipe, &artifact)
}

fn acquire(
    ctx: &PipelineContext<'_>,
    recipe: &ProductionRecipe,
    scratch: &ScratchPaths,
) -> Result<(), PipelineError> {
    match &recipe.mode {
        RecipeMode::Synthesize { voice, spoken_text } => {
            fs::write(&scratch.text, format!("{spoken_text}\n")).map_err(|e| {
                PipelineError::new(
                    PipelineStage::Acquire,
                    format!("failed to write {}: {e}", scratch.text.display()),
                )
            })?;
            let mut cmd = Command::new(&ctx.tools.text2wave);
            cmd.arg("-eval").arg(format!("(voice_{})", voice.engine_voice));
            if let Some(lexicon) = ctx.lexicon {
                if lexicon.is_file() {
                    cmd.arg("-eval").arg(lexicon);
                }
            }
            cmd.arg(&scratch.text).arg("-o").arg(&scratch.raw);
            run_tool(cmd, PipelineStage::Acquire, ctx.echo)?;
        }
        RecipeMode::RenderSong { voice, source_path } => {
            let song = ctx.songs_root.join(source_path);
            if !song.is_file() {
                return Err(PipelineError::new(
                    PipelineStage::Acquire,
                    format!("song document not found: {}", song.display()),
                ));
            }
            let mut cmd = Command::new(&ctx.tools.text2wave);
            cmd.arg("-eval")
                .arg(format!("(voice_{})", voice.engine_voice))
                .arg("-mode")
                .arg("singing")
                .arg(&song)
                .arg("-o")
                .arg(&scratch.raw);
            run_tool(cmd, PipelineStage::Acquire, ctx.echo)?;
        }
        RecipeMode::CopySample { source_path } => {
            let sample = ctx.samples_root.join(source_path);
            if !sample.is_file() {
                return Err(PipelineError::new(
                    PipelineStage::Acquire,
                    format!("sample file not found: {}", sample.display()),
                ));
            }
            let mut cmd = Command::new(&ctx.tools.ffmpeg);
            cmd.arg("-y").arg("-i").arg(&sample).arg(&scratch.raw);
            run_tool(cmd, PipelineStage::Acquire, ctx.echo)?;
        }
    }

    // The speech engine sometimes exits clean having written nothing.
    match fs::metadata(&scratch.raw) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(PipelineError::new(
            PipelineStage::Acquire,
            format!("no audio was produced at {}", scratch.raw.display()),
        )),
    }
}

fn post_process<'a>(
    ctx: &PipelineContext<'_>,
    recipe: &ProductionRecipe,
    scratch: &'a ScratchPaths,
) -> Result<&'a Path, PipelineError> {
    let mut current: &Path = &scratch.raw;

    if recipe.trim_enabled() {
        let mut cmd = Command::new(&ctx.tools.sox);
        cmd.arg(current).arg(&scratch.trimmed).args(PRE_TRIM_ARGS);
        run_tool(cmd, PipelineStage::Process, ctx.echo)?;
        current = &scratch.trimmed;
    }

    let chain = recipe.effect_chain();
    if !chain.is_empty() {
        let mut cmd = Command::new(&ctx.tools.sox);
        cmd.arg(current).arg(&scratch.effected).args(&chain);
        run_tool(cmd, PipelineStage::Process, ctx.echo)?;
        current = &scratch.effected;
    }

    Ok(current)
}

fn encode(
    ctx: &PipelineContext<'_>,
    processed: &Path,
    artifact: &Path,
) -> Result<(), PipelineError> {
    let mut cmd = Command::new(&ctx.tools.ffmpeg);
    cmd.arg("-i").arg(processed).args(ENCODE_ARGS).arg(artifact);
    run_tool(cmd, PipelineStage::Encode, ctx.echo)
}

fn measure(
    ctx: &PipelineContext<'_>,
    recipe: &ProductionRecipe,
    artifact: &Path,
) -> Result<Measured, PipelineError> {
    let mut cmd = Command::new(&ctx.tools.ffprobe);
    cmd.args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(artifact);
    if ctx.echo {
        eprintln!("+ {}", render_command(&cmd));
    }
    let output = cmd.output().map_err(|e| {
        PipelineError::new(
            PipelineStage::Measure,
            format!("failed to launch ffprobe: {e}"),
        )
    })?;
    if !output.status.success() {
        return Err(PipelineError::new(
            PipelineStage::Measure,
            format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    let (raw_duration, size_bytes) = parse_probe(&output.stdout)
        .map_err(|msg| PipelineError::new(PipelineStage::Measure, msg))?;
    let duration_seconds = adjusted_duration(recipe.synthesized(), raw_duration);

    let content_hash = hash::sha256_file(artifact).map_err(|e| {
        PipelineError::new(
            PipelineStage::Measure,
            format!("failed to hash {}: {e}", artifact.display()),
        )
    })?;

    Ok(Measured {
        duration_seconds,
        content_hash,
        size_bytes,
    })
}

#[derive(Deserialize)]
struct Probe {
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    size: Option<String>,
}

/// Pull duration and size out of ffprobe's JSON. ffprobe prints both as
/// strings.
fn parse_probe(stdout: &[u8]) -> Result<(f64, u64), String> {
    let probe: Probe =
        serde_json::from_slice(stdout).map_err(|e| format!("unexpected ffprobe output: {e}"))?;
    let format = probe.format.ok_or("ffprobe output has no format block")?;
    let duration: f64 = format
        .duration
        .ok_or("ffprobe reported no duration")?
        .parse()
        .map_err(|e| format!("bad duration in ffprobe output: {e}"))?;
    if duration <= 0.0 {
        return Err(format!("invalid audio duration {duration}"));
    }
    let size: u64 = format
        .size
        .ok_or("ffprobe reported no size")?
        .parse()
        .map_err(|e| format!("bad size in ffprobe output: {e}"))?;
    Ok((duration, size))
}

/// Synthesized clips come back padded with trailing silence; durations
/// past the padding length get it subtracted.
fn adjusted_duration(synthesized: bool, raw: f64) -> f64 {
    if synthesized && raw > SILENCE_PADDING_SECONDS {
        raw - SILENCE_PADDING_SECONDS
    } else {
        raw
    }
}

pub(crate) fn run_tool(
    mut cmd: Command,
    stage: PipelineStage,
    echo: bool,
) -> Result<(), PipelineError> {
    if echo {
        eprintln!("+ {}", render_command(&cmd));
    }
    let program = cmd.get_program().to_string_lossy().into_owned();
    let output = cmd
        .output()
        .map_err(|e| PipelineError::new(stage, format!("failed to launch {program}: {e}")))?;
    if !output.status.success() {
        return Err(PipelineError::new(
            stage,
            format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }
    Ok(())
}

fn render_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_reads_format_block() {
        let json = br#"{
            "streams": [{"codec_name": "vorbis"}],
            "format": {"duration": "1.93", "size": "12345", "format_name": "ogg"}
        }"#;
        assert_eq!(parse_probe(json).unwrap(), (1.93, 12345));
    }

    #[test]
    fn test_parse_probe_rejects_missing_duration() {
        let json = br#"{"format": {"size": "12345"}}"#;
        assert!(parse_probe(json).unwrap_err().contains("no duration"));
    }

    #[test]
    fn test_parse_probe_rejects_nonpositive_duration() {
        let json = br#"{"format": {"duration": "0.0", "size": "10"}}"#;
        assert!(parse_probe(json).unwrap_err().contains("invalid audio duration"));
        let json = br#"{"format": {"duration": "-2.5", "size": "10"}}"#;
        assert!(parse_probe(json).is_err());
    }

    #[test]
    fn test_parse_probe_rejects_garbage() {
        assert!(parse_probe(b"not json").is_err());
        assert!(parse_probe(b"{}").is_err());
    }

    #[test]
    fn test_padding_subtracted_for_synthesized_only() {
        assert_eq!(adjusted_duration(true, 12.5), 2.5);
        assert_eq!(adjusted_duration(true, 9.0), 9.0);
        assert_eq!(adjusted_duration(true, 10.0), 10.0);
        assert_eq!(adjusted_duration(false, 12.5), 12.5);
    }

    #[test]
    fn test_scratch_paths_are_slot_scoped() {
        let root = Path::new("/tmp/vox");
        let fem = ScratchPaths::new(root, "fem", "red_alert");
        let mas = ScratchPaths::new(root, "mas", "red_alert");
        assert_eq!(fem.raw, Path::new("/tmp/vox/fem-red_alert.raw.wav"));
        assert_ne!(fem.raw, mas.raw);
        assert_ne!(fem.text, fem.trimmed);
    }

    #[test]
    fn test_scratch_paths_defuse_reserved_names() {
        let root = Path::new("/tmp/vox");
        let paths = ScratchPaths::new(root, "fem", "con");
        assert_eq!(paths.raw, Path::new("/tmp/vox/fem-c_on.raw.wav"));
    }

    #[test]
    fn test_render_command_is_readable() {
        let mut cmd = Command::new("sox");
        cmd.arg("in.wav").arg("out.wav").args(PRE_TRIM_ARGS);
        assert_eq!(render_command(&cmd), "sox in.wav out.wav trim 0 -0.1");
    }

    #[test]
    fn test_missing_sample_is_an_acquire_error() {
        use vox_common::resolve::EntryFlags;

        let dir = tempfile::tempdir().unwrap();
        // The source check runs before any tool launch, so these paths
        // pointing nowhere proves nothing was spawned.
        let tools = Tools {
            text2wave: PathBuf::from("/nonexistent/text2wave"),
            sox: PathBuf::from("/nonexistent/sox"),
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
            ffprobe: PathBuf::from("/nonexistent/ffprobe"),
        };
        let ctx = PipelineContext {
            tools: &tools,
            samples_root: dir.path(),
            songs_root: dir.path(),
            output_root: dir.path(),
            scratch_root: dir.path(),
            lexicon: None,
            echo: false,
        };
        let recipe = ProductionRecipe {
            id: "klaxon".to_string(),
            mode: RecipeMode::CopySample {
                source_path: "klaxon.wav".to_string(),
            },
            flags: EntryFlags::default(),
            output_rel: "sound/vox_sfx/klaxon.ogg".to_string(),
        };
        let err = run_recipe(&ctx, &recipe, "sfx").unwrap_err();
        assert_eq!(err.stage, PipelineStage::Acquire);
        assert!(err.message.contains("klaxon.wav"));
    }
}
