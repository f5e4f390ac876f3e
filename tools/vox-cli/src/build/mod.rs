//! Build command - produce every clip the wordlists describe.
//!
//! Orchestrates: parse → uniqueness check → resolve → produce → emit.
//!
//! Parsing and the global id check happen before any audio tooling is
//! touched, so a broken wordlist never costs a synthesis run. Entries
//! that resolve cleanly become jobs, one per configured sex channel
//! (samples collapse to a single shared job), and the jobs fan out over
//! a worker pool. Failures stay per-entry: the default is to finish
//! everything else and exit nonzero at the end.

mod cache;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Context, Result};
use clap::Args;
use rayon::prelude::*;
use walkdir::WalkDir;

use vox_common::codegen;
use vox_common::config::{load_config, BuildConfig};
use vox_common::entry::{load_wordlist, WordlistEntry};
use vox_common::hash;
use vox_common::manifest::{check_unique_ids, Manifest, ManifestEntry, ManifestFile, VoiceInfo};
use vox_common::resolve::{self, ProductionRecipe, RecipeMode};
use vox_common::voices::{self, Channel};

use crate::pipeline::{run_recipe, Measured, PipelineContext, Tools};

/// Arguments for the build command
#[derive(Args)]
pub struct BuildArgs {
    /// Path to the vox.toml configuration
    #[arg(short, long, default_value = "vox.toml")]
    pub config: PathBuf,

    /// Worker threads (defaults to available parallelism)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Echo every external command before running it
    #[arg(short, long)]
    pub echo: bool,

    /// Stop scheduling new entries after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Rebuild everything, ignoring cache records
    #[arg(long)]
    pub force: bool,

    /// Delete output files no wordlist entry produces anymore
    #[arg(long)]
    pub delete_orphans: bool,
}

/// One artifact to produce.
struct Job {
    /// Cache and scratch namespace: a channel code, or "sfx".
    slot: &'static str,
    /// Channels whose manifest group records this artifact.
    channels: Vec<Channel>,
    recipe: ProductionRecipe,
}

enum Outcome {
    Built(Measured),
    Skipped(Measured),
    Failed(String),
    Cancelled,
}

struct EntryFailure {
    id: String,
    message: String,
}

struct BuildSummary {
    manifest: Manifest,
    failures: Vec<EntryFailure>,
    built: usize,
    skipped: usize,
    cancelled: usize,
}

/// Execute the build command
pub fn execute(args: BuildArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    println!("Building VOX library ({} target)", config.codebase_target);

    // Step 1: Parse every wordlist and check id uniqueness globally.
    let entries = gather_entries(&config)?;
    let buildable = entries.iter().filter(|e| e.is_buildable()).count();
    println!(
        "  {} buildable entries across {} wordlist(s)",
        buildable,
        config.wordlists.len()
    );

    // Step 2: Resolve entries into production jobs.
    let (jobs, resolution_failures) = plan_jobs(&entries, &config);
    println!("  {} job(s) planned", jobs.len());

    // Step 3: Locate tools and prepare directories.
    let tools = Tools::locate()?;
    for dir in [&config.paths.output, &config.paths.cache, &config.paths.scratch] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let ctx = PipelineContext {
        tools: &tools,
        samples_root: &config.paths.samples,
        songs_root: &config.paths.songs,
        output_root: &config.paths.output,
        scratch_root: &config.paths.scratch,
        lexicon: config.paths.lexicon.as_deref(),
        echo: args.echo,
    };

    // Step 4: Produce artifacts on the worker pool.
    let cancelled = AtomicBool::new(false);
    let worker = |job: &Job| {
        if args.fail_fast && cancelled.load(Ordering::Relaxed) {
            return Outcome::Cancelled;
        }
        let outcome = run_job(job, &ctx, &config.paths.cache, args.force);
        if matches!(outcome, Outcome::Failed(_)) {
            cancelled.store(true, Ordering::Relaxed);
        }
        outcome
    };
    let run = || jobs.par_iter().map(worker).collect::<Vec<_>>();
    let outcomes = match args.jobs {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("Failed to build worker pool")?
            .install(run),
        None => run(),
    };

    // Step 5: Assemble the manifest and emit data + game code.
    let summary = assemble(&config, &entries, &jobs, &outcomes, resolution_failures);

    let data_path = config.paths.output.join("data").join("vox_data.json");
    if let Some(parent) = data_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&data_path, summary.manifest.to_json()?)
        .with_context(|| format!("Failed to write {}", data_path.display()))?;
    println!("  Wrote {}", data_path.display());

    let code_path = config.paths.binding_path(config.codebase_target);
    if let Some(parent) = code_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let code = codegen::generate(config.codebase_target, &summary.manifest)?;
    fs::write(&code_path, code)
        .with_context(|| format!("Failed to write {}", code_path.display()))?;
    println!("  Wrote {}", code_path.display());

    // Step 6: Report files nothing produces anymore.
    let sound_root = config.paths.output.join("sound");
    let keep: BTreeSet<PathBuf> = jobs
        .iter()
        .map(|job| config.paths.output.join(&job.recipe.output_rel))
        .collect();
    let orphans = find_orphans(&sound_root, &keep);
    report_orphans(&orphans, args.delete_orphans);

    println!();
    println!(
        "Done! {} built, {} skipped, {} failed",
        summary.built,
        summary.skipped,
        summary.failures.len()
    );
    if summary.cancelled > 0 {
        println!("  {} job(s) cancelled after the first failure", summary.cancelled);
    }
    if !summary.failures.is_empty() {
        for failure in &summary.failures {
            println!("  FAILED {}: {}", failure.id, failure.message);
        }
        if summary.failures.len() == 1 {
            bail!("1 entry failed to build");
        }
        bail!("{} entries failed to build", summary.failures.len());
    }
    Ok(())
}

/// Parse every configured wordlist, in order, and verify that no id is
/// claimed twice. Runs before any audio tooling is touched.
fn gather_entries(config: &BuildConfig) -> Result<Vec<WordlistEntry>> {
    let mut entries = Vec::new();
    for path in &config.wordlists {
        entries.extend(load_wordlist(path)?);
    }
    check_unique_ids(&entries)?;
    Ok(entries)
}

/// Resolve entries into jobs. Samples resolve to the same shared
/// artifact on every channel, so they get one job serving all channels.
/// Resolution failures are recorded per entry, never fatal.
fn plan_jobs(entries: &[WordlistEntry], config: &BuildConfig) -> (Vec<Job>, Vec<EntryFailure>) {
    let channels = config.voices.configured_channels();
    let mut jobs = Vec::new();
    let mut failures = Vec::new();
    let mut claimed_outputs: BTreeSet<String> = BTreeSet::new();

    for entry in entries.iter().filter(|e| e.is_buildable()) {
        for &channel in &channels {
            match resolve::resolve(entry, config, channel) {
                Ok(Some(recipe)) => {
                    if !claimed_outputs.insert(recipe.output_rel.clone()) {
                        continue;
                    }
                    let (slot, job_channels) = match recipe.mode {
                        RecipeMode::CopySample { .. } => ("sfx", channels.clone()),
                        _ => (channel.code(), vec![channel]),
                    };
                    jobs.push(Job {
                        slot,
                        channels: job_channels,
                        recipe,
                    });
                }
                Ok(None) => break,
                Err(err) => {
                    failures.push(EntryFailure {
                        id: entry.id.clone(),
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }
    }
    (jobs, failures)
}

/// Produce one artifact, or prove the one on disk is already right.
fn run_job(job: &Job, ctx: &PipelineContext<'_>, cache_root: &Path, force: bool) -> Outcome {
    let input_hash = source_input_hash(job, ctx);
    let fingerprint = job.recipe.fingerprint();
    let marker = cache::record_path(cache_root, job.slot, &job.recipe.id);
    let artifact = ctx.output_root.join(&job.recipe.output_rel);

    if !force {
        if let Some(record) = cache::check(&artifact, &marker, &fingerprint, input_hash.as_deref())
        {
            println!("  [{}] {}: up to date", job.slot, job.recipe.id);
            return Outcome::Skipped(Measured {
                duration_seconds: record.duration_seconds,
                content_hash: record.content_hash,
                size_bytes: record.size_bytes,
            });
        }
    }

    match run_recipe(ctx, &job.recipe, job.slot) {
        Ok(measured) => {
            let record = cache::CacheRecord {
                fingerprint,
                input_hash,
                output_rel: job.recipe.output_rel.clone(),
                duration_seconds: measured.duration_seconds,
                content_hash: measured.content_hash.clone(),
                size_bytes: measured.size_bytes,
            };
            if let Err(err) = cache::store(&marker, &record) {
                eprintln!(
                    "  warning: could not write cache record for {}: {err:#}",
                    job.recipe.id
                );
            }
            println!(
                "  [{}] {}: built ({:.2}s)",
                job.slot, job.recipe.id, measured.duration_seconds
            );
            Outcome::Built(measured)
        }
        Err(err) => {
            eprintln!("  [{}] {}: {err}", job.slot, job.recipe.id);
            Outcome::Failed(err.to_string())
        }
    }
}

/// Content hash of the source file behind a sample or song job. None
/// for synthesis, and None when the file cannot be read; the mismatch
/// against the cache record then forces the pipeline to run and report
/// the missing file properly.
fn source_input_hash(job: &Job, ctx: &PipelineContext<'_>) -> Option<String> {
    let path = match &job.recipe.mode {
        RecipeMode::CopySample { source_path } => ctx.samples_root.join(source_path),
        RecipeMode::RenderSong { source_path, .. } => ctx.songs_root.join(source_path),
        RecipeMode::Synthesize { .. } => return None,
    };
    hash::sha256_file(&path).ok()
}

/// Fold job outcomes into the manifest, preserving wordlist section
/// order and grouping artifacts by channel. Resolution failures come in
/// from planning; pipeline failures are appended after them.
fn assemble(
    config: &BuildConfig,
    entries: &[WordlistEntry],
    jobs: &[Job],
    outcomes: &[Outcome],
    mut failures: Vec<EntryFailure>,
) -> BuildSummary {
    let mut built = 0;
    let mut skipped = 0;
    let mut cancelled = 0;
    let mut files_by_id: BTreeMap<String, BTreeMap<String, ManifestFile>> = BTreeMap::new();

    for (job, outcome) in jobs.iter().zip(outcomes) {
        let measured = match outcome {
            Outcome::Built(m) => {
                built += 1;
                m
            }
            Outcome::Skipped(m) => {
                skipped += 1;
                m
            }
            Outcome::Failed(message) => {
                failures.push(EntryFailure {
                    id: job.recipe.id.clone(),
                    message: message.clone(),
                });
                continue;
            }
            Outcome::Cancelled => {
                cancelled += 1;
                continue;
            }
        };
        let files = files_by_id.entry(job.recipe.id.clone()).or_default();
        for channel in &job.channels {
            files.insert(
                channel.code().to_string(),
                ManifestFile {
                    path: job.recipe.output_rel.clone(),
                    duration_seconds: measured.duration_seconds,
                    content_hash: measured.content_hash.clone(),
                    size_bytes: measured.size_bytes,
                },
            );
        }
    }

    let mut voice_info = BTreeMap::new();
    for channel in config.voices.configured_channels() {
        let voice = config
            .voices
            .for_channel(channel)
            .and_then(voices::find_voice);
        if let Some(voice) = voice {
            voice_info.insert(
                channel.code().to_string(),
                VoiceInfo {
                    id: voice.id.to_string(),
                    engine_voice: voice.engine_voice.to_string(),
                },
            );
        }
    }

    let mut manifest = Manifest::new(config.codebase_target, voice_info);
    for entry in entries.iter().filter(|e| e.is_buildable()) {
        let Some(files) = files_by_id.remove(&entry.id) else {
            continue;
        };
        manifest.section_mut(&entry.section).entries.push(ManifestEntry {
            id: entry.id.clone(),
            word_count: resolve::resolved_word_count(entry, config),
            unlisted: resolve::flags_for(config, &entry.id).unlisted,
            files,
        });
    }

    BuildSummary {
        manifest,
        failures,
        built,
        skipped,
        cancelled,
    }
}

/// Files under the sound tree that no current job produces.
fn find_orphans(sound_root: &Path, keep: &BTreeSet<PathBuf>) -> Vec<PathBuf> {
    WalkDir::new(sound_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| !keep.contains(path))
        .collect()
}

fn report_orphans(orphans: &[PathBuf], delete: bool) {
    if orphans.is_empty() {
        return;
    }
    if delete {
        for path in orphans {
            match fs::remove_file(path) {
                Ok(()) => println!("  Deleted orphan {}", path.display()),
                Err(err) => eprintln!("  warning: could not delete {}: {err}", path.display()),
            }
        }
        return;
    }
    println!(
        "  {} orphaned file(s) in the output tree (use --delete-orphans to remove):",
        orphans.len()
    );
    for path in orphans.iter().take(10) {
        println!("    {}", path.display());
    }
    if orphans.len() > 10 {
        println!("    ... and {} more", orphans.len() - 10);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_common::config::parse_config;
    use vox_common::entry::parse_wordlist_text;

    fn config(toml: &str) -> BuildConfig {
        parse_config(toml).unwrap()
    }

    fn entries(text: &str) -> Vec<WordlistEntry> {
        parse_wordlist_text(Path::new("a.txt"), text).unwrap()
    }

    fn measured(duration: f64) -> Measured {
        Measured {
            duration_seconds: duration,
            content_hash: "d".repeat(64),
            size_bytes: 2048,
        }
    }

    fn fake_tools() -> Tools {
        Tools {
            text2wave: PathBuf::from("/nonexistent/text2wave"),
            sox: PathBuf::from("/nonexistent/sox"),
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
            ffprobe: PathBuf::from("/nonexistent/ffprobe"),
        }
    }

    #[test]
    fn test_gather_entries_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        fs::write(&first, "alpha\n").unwrap();
        fs::write(&second, "bravo\n").unwrap();
        let cfg = config(&format!(
            "wordlists = [{:?}, {:?}]\n",
            first.display().to_string(),
            second.display().to_string()
        ));
        let entries = gather_entries(&cfg).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "alpha");
        assert_eq!(entries[1].id, "bravo");
    }

    #[test]
    fn test_duplicate_id_across_wordlists_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        fs::write(&first, "red_alert\n").unwrap();
        fs::write(&second, "## Alerts\nred_alert\n").unwrap();
        let cfg = config(&format!(
            "wordlists = [{:?}, {:?}]\n",
            first.display().to_string(),
            second.display().to_string()
        ));
        let err = gather_entries(&cfg).unwrap_err();
        assert!(err.to_string().contains("duplicate id 'red_alert'"));
    }

    #[test]
    fn test_skipped_entry_still_reserves_its_id() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.txt");
        fs::write(&list, "klaxon\n@samples/klaxon.wav\n").unwrap();
        let cfg = config(&format!(
            "wordlists = [{:?}]\n\n[overrides.klaxon]\nskip = true\n",
            list.display().to_string()
        ));
        assert!(gather_entries(&cfg).is_err());
    }

    #[test]
    fn test_plan_jobs_one_per_channel() {
        let cfg = config("wordlists = [\"a.txt\"]\n");
        let (jobs, failures) = plan_jobs(&entries("red_alert\n"), &cfg);
        assert!(failures.is_empty());
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].slot, "fem");
        assert_eq!(jobs[0].channels, vec![Channel::Female]);
        assert_eq!(jobs[1].slot, "mas");
        assert_eq!(jobs[1].channels, vec![Channel::Male]);
    }

    #[test]
    fn test_plan_jobs_collapses_samples_to_one_shared_job() {
        let cfg = config("wordlists = [\"a.txt\"]\n");
        let (jobs, failures) = plan_jobs(&entries("@samples/klaxon.wav\n"), &cfg);
        assert!(failures.is_empty());
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].slot, "sfx");
        assert_eq!(jobs[0].channels, vec![Channel::Female, Channel::Male]);
        assert_eq!(jobs[0].recipe.output_rel, "sound/vox_sfx/klaxon.ogg");
    }

    #[test]
    fn test_plan_jobs_skip_override() {
        let cfg = config("wordlists = [\"a.txt\"]\n\n[overrides.red_alert]\nskip = true\n");
        let (jobs, failures) = plan_jobs(&entries("red_alert\nhello\n"), &cfg);
        assert!(failures.is_empty());
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.recipe.id == "hello"));
    }

    #[test]
    fn test_plan_jobs_single_channel() {
        let cfg = config("wordlists = [\"a.txt\"]\n\n[voices]\nfemale = \"us-clb\"\n");
        let (jobs, _) = plan_jobs(&entries("hello\n@samples/x.wav\n"), &cfg);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].slot, "fem");
        assert_eq!(jobs[1].slot, "sfx");
        assert_eq!(jobs[1].channels, vec![Channel::Female]);
    }

    #[test]
    fn test_plan_jobs_records_resolution_failure_and_continues() {
        let cfg = config("wordlists = [\"a.txt\"]\n");
        let (jobs, failures) =
            plan_jobs(&entries("umlaut = f\u{00fc}r alle\nhello\n"), &cfg);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, "umlaut");
        assert!(failures[0].message.contains("cannot be spoken"));
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.recipe.id == "hello"));
    }

    #[test]
    fn test_cached_artifact_skips_without_touching_tools() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dist");
        let cache_root = dir.path().join("cache");
        let scratch = dir.path().join("tmp");
        fs::create_dir_all(&scratch).unwrap();

        let cfg = config("wordlists = [\"a.txt\"]\n\n[voices]\nfemale = \"us-clb\"\n");
        let (jobs, _) = plan_jobs(&entries("hello\n"), &cfg);
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];

        // Pretend a previous run produced the artifact.
        let artifact = output.join(&job.recipe.output_rel);
        fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        fs::write(&artifact, b"OggS").unwrap();
        let marker = cache::record_path(&cache_root, job.slot, &job.recipe.id);
        cache::store(
            &marker,
            &cache::CacheRecord {
                fingerprint: job.recipe.fingerprint(),
                input_hash: None,
                output_rel: job.recipe.output_rel.clone(),
                duration_seconds: 1.5,
                content_hash: "e".repeat(64),
                size_bytes: 4,
            },
        )
        .unwrap();

        // Tools point nowhere; a cache hit must not need them.
        let tools = fake_tools();
        let ctx = PipelineContext {
            tools: &tools,
            samples_root: dir.path(),
            songs_root: dir.path(),
            output_root: &output,
            scratch_root: &scratch,
            lexicon: None,
            echo: false,
        };
        match run_job(job, &ctx, &cache_root, false) {
            Outcome::Skipped(m) => assert_eq!(m.duration_seconds, 1.5),
            _ => panic!("expected a cache hit"),
        }

        // --force ignores the record and fails against the fake tools.
        assert!(matches!(
            run_job(job, &ctx, &cache_root, true),
            Outcome::Failed(_)
        ));
    }

    #[test]
    fn test_assemble_groups_sections_and_channels() {
        let cfg = config("wordlists = [\"a.txt\"]\n");
        let parsed = entries("## Alerts\nred_alert\n@samples/klaxon.wav\n## Misc\nhello\n");
        let (jobs, _) = plan_jobs(&parsed, &cfg);
        assert_eq!(jobs.len(), 5);
        let outcomes: Vec<Outcome> = (0..jobs.len())
            .map(|i| Outcome::Built(measured(1.0 + i as f64)))
            .collect();

        let summary = assemble(&cfg, &parsed, &jobs, &outcomes, Vec::new());
        assert_eq!(summary.built, 5);
        assert_eq!(summary.skipped, 0);
        assert!(summary.failures.is_empty());

        let manifest = &summary.manifest;
        let names: Vec<_> = manifest.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Alerts", "Misc"]);

        let alerts = &manifest.sections[0];
        assert_eq!(alerts.entries[0].id, "red_alert");
        assert_eq!(alerts.entries[0].files.len(), 2);
        assert_eq!(
            alerts.entries[0].files["fem"].path,
            "sound/vox_fem/red_alert.ogg"
        );
        let klaxon = &alerts.entries[1];
        assert_eq!(klaxon.files["fem"].path, klaxon.files["mas"].path);
        assert_eq!(klaxon.files["fem"].path, "sound/vox_sfx/klaxon.ogg");

        assert_eq!(manifest.voices["fem"].id, "us-clb");
        assert_eq!(manifest.voices["mas"].id, "us-rms");
    }

    #[test]
    fn test_assemble_leaves_failed_entries_out() {
        let cfg = config("wordlists = [\"a.txt\"]\n\n[voices]\nfemale = \"us-clb\"\n");
        let parsed = entries("broken\nhealthy\n");
        let (jobs, _) = plan_jobs(&parsed, &cfg);
        assert_eq!(jobs.len(), 2);
        let outcomes = vec![
            Outcome::Failed("acquire stage failed: no dice".into()),
            Outcome::Built(measured(2.0)),
        ];
        let summary = assemble(&cfg, &parsed, &jobs, &outcomes, Vec::new());
        assert_eq!(summary.built, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].id, "broken");
        let ids: Vec<_> = summary.manifest.sections[0]
            .entries
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["healthy"]);
    }

    #[test]
    fn test_assemble_counts_cancellations() {
        let cfg = config("wordlists = [\"a.txt\"]\n\n[voices]\nfemale = \"us-clb\"\n");
        let parsed = entries("one\ntwo\n");
        let (jobs, _) = plan_jobs(&parsed, &cfg);
        let outcomes = vec![
            Outcome::Failed("encode stage failed: disk full".into()),
            Outcome::Cancelled,
        ];
        let summary = assemble(&cfg, &parsed, &jobs, &outcomes, Vec::new());
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.manifest.sections.is_empty());
    }

    #[test]
    fn test_assemble_marks_unlisted_entries() {
        let cfg = config(
            "wordlists = [\"a.txt\"]\n\n[voices]\nfemale = \"us-clb\"\n\n[overrides.secret]\nflags = [\"unlisted\"]\n",
        );
        let parsed = entries("secret\n");
        let (jobs, _) = plan_jobs(&parsed, &cfg);
        let outcomes = vec![Outcome::Built(measured(1.0))];
        let summary = assemble(&cfg, &parsed, &jobs, &outcomes, Vec::new());
        assert!(summary.manifest.sections[0].entries[0].unlisted);
    }

    #[test]
    fn test_find_orphans_spares_kept_files() {
        let dir = tempfile::tempdir().unwrap();
        let sound = dir.path().join("sound");
        fs::create_dir_all(sound.join("vox_fem")).unwrap();
        let kept = sound.join("vox_fem").join("hello.ogg");
        let stray = sound.join("vox_fem").join("old.ogg");
        fs::write(&kept, b"a").unwrap();
        fs::write(&stray, b"b").unwrap();

        let keep: BTreeSet<PathBuf> = [kept].into_iter().collect();
        let orphans = find_orphans(&sound, &keep);
        assert_eq!(orphans, vec![stray]);
    }

    #[test]
    fn test_find_orphans_with_missing_root_is_empty() {
        let keep = BTreeSet::new();
        assert!(find_orphans(Path::new("/no/such/dir"), &keep).is_empty());
    }
}
