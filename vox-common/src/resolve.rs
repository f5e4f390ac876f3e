//! Entry resolution: wordlist entries to production recipes.
//!
//! A recipe says everything the audio pipeline needs to produce one
//! artifact, and nothing else. Resolution is pure; whether a referenced
//! file actually exists is the pipeline's problem.

use crate::config::BuildConfig;
use crate::entry::{EntryKind, WordlistEntry};
use crate::error::ResolutionError;
use crate::hash;
use crate::voices::{self, Channel, Voice};

/// sox arguments that cut the synthesis engine's trailing artifacts.
pub const PRE_TRIM_ARGS: &[&str] = &["trim", "0", "-0.1"];

/// Fixed distribution encode: Vorbis, mono, 16 kHz, quality 0.
pub const ENCODE_ARGS: &[&str] = &[
    "-c:a", "libvorbis", "-ac", "1", "-ar", "16000", "-q:a", "0", "-speed", "0", "-y",
];

/// Trailing silence the synthesis engine pads clips with. Measured
/// durations above this get it subtracted.
pub const SILENCE_PADDING_SECONDS: f64 = 10.0;

/// Output subdirectory for copied samples, shared by both channels.
pub const SFX_DIR: &str = "vox_sfx";

/// Per-entry production flags, set through vox.toml overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFlags {
    /// The source audio is already mastered; apply no effects.
    pub pre_mastered: bool,
    /// Combined with `pre_mastered`, also skip the tail trim.
    pub no_trim: bool,
    /// Build the artifact but keep it out of the generated game lists.
    pub unlisted: bool,
}

impl EntryFlags {
    /// Parse override flag names. Returns the offending name on failure.
    pub fn from_names(names: &[String]) -> Result<EntryFlags, String> {
        let mut flags = EntryFlags::default();
        for name in names {
            match name.as_str() {
                "pre-mastered" => flags.pre_mastered = true,
                "no-trim" => flags.no_trim = true,
                "unlisted" => flags.unlisted = true,
                other => return Err(other.to_string()),
            }
        }
        Ok(flags)
    }
}

/// How an artifact's audio comes into existence.
#[derive(Debug, Clone, PartialEq)]
pub enum RecipeMode {
    /// Speech synthesis of sanitized text.
    Synthesize {
        voice: &'static Voice,
        spoken_text: String,
    },
    /// Decode an existing file under the samples root.
    CopySample { source_path: String },
    /// Sing a song document under the songs root.
    RenderSong {
        voice: &'static Voice,
        source_path: String,
    },
}

/// Everything needed to produce one artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRecipe {
    pub id: String,
    pub mode: RecipeMode,
    pub flags: EntryFlags,
    /// Artifact location relative to the output root, forward slashes.
    pub output_rel: String,
}

impl ProductionRecipe {
    /// The sox effect chain the pipeline will apply.
    pub fn effect_chain(&self) -> Vec<String> {
        if self.flags.pre_mastered {
            return Vec::new();
        }
        match &self.mode {
            RecipeMode::Synthesize { voice, .. } => voice.effect_args(),
            RecipeMode::CopySample { .. } => voices::sample_effect_args(),
            RecipeMode::RenderSong { .. } => voices::song_effect_args(),
        }
    }

    /// The tail trim runs unless both pre-mastered and no-trim are set.
    pub fn trim_enabled(&self) -> bool {
        !(self.flags.pre_mastered && self.flags.no_trim)
    }

    /// True when the speech engine produces the source audio, which is
    /// when the silence padding correction applies.
    pub fn synthesized(&self) -> bool {
        !matches!(self.mode, RecipeMode::CopySample { .. })
    }

    /// Stable content fingerprint over every input that shapes the
    /// artifact's bytes. Two runs with identical inputs agree on it;
    /// touching any input changes it.
    pub fn fingerprint(&self) -> String {
        let mut buf = String::from("recipe.v1");
        let mut push = |part: &str| {
            buf.push('\n');
            buf.push_str(part);
        };
        match &self.mode {
            RecipeMode::Synthesize { voice, spoken_text } => {
                push("synthesize");
                push(voice.id);
                push(voice.engine_voice);
                push(spoken_text);
            }
            RecipeMode::CopySample { source_path } => {
                push("copy-sample");
                push(source_path);
            }
            RecipeMode::RenderSong { voice, source_path } => {
                push("render-song");
                push(voice.id);
                push(voice.engine_voice);
                push(source_path);
            }
        }
        if self.trim_enabled() {
            for arg in PRE_TRIM_ARGS {
                push(arg);
            }
        }
        for arg in self.effect_chain() {
            push(&arg);
        }
        for arg in ENCODE_ARGS {
            push(arg);
        }
        push(&self.output_rel);
        hash::sha256_hex(buf.as_bytes())
    }
}

// Windows chokes on these as file basenames.
const RESERVED_STEMS: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// File stem for an id, with reserved device names defused by an
/// underscore after the first character.
pub fn safe_file_stem(id: &str) -> String {
    let lower = id.to_lowercase();
    if RESERVED_STEMS.contains(&lower.as_str()) {
        let mut chars = id.chars();
        match chars.next() {
            Some(first) => format!("{first}_{}", chars.as_str()),
            None => id.to_string(),
        }
    } else {
        id.to_string()
    }
}

pub fn artifact_file_name(id: &str) -> String {
    format!("{}.ogg", safe_file_stem(id))
}

fn output_rel_path(id: &str, dir: &str) -> String {
    format!("sound/{dir}/{}", artifact_file_name(id))
}

/// Resolve one entry for one sex channel.
///
/// `Ok(None)` means the entry produces nothing here: a comment or
/// header, or an entry configured out with `skip` (whose id stays
/// reserved regardless).
pub fn resolve(
    entry: &WordlistEntry,
    config: &BuildConfig,
    channel: Channel,
) -> Result<Option<ProductionRecipe>, ResolutionError> {
    let ov = config.overrides.get(&entry.id);
    if ov.is_some_and(|o| o.skip) {
        return Ok(None);
    }
    let flags = match ov {
        Some(o) => EntryFlags::from_names(&o.flags).map_err(|flag| {
            ResolutionError::UnknownFlag {
                entry: entry.id.clone(),
                flag,
            }
        })?,
        None => EntryFlags::default(),
    };

    let mode = match &entry.kind {
        EntryKind::SampleReference { source_path } => RecipeMode::CopySample {
            source_path: source_path.clone(),
        },
        EntryKind::SongReference { source_path } => RecipeMode::RenderSong {
            voice: pick_voice(entry, config, channel)?,
            source_path: source_path.clone(),
        },
        EntryKind::Word { spoken_text } | EntryKind::PhraseWithId { spoken_text } => {
            let spoken = crate::sanitize::sanitize_spoken_text(spoken_text).map_err(|source| {
                ResolutionError::Unspeakable {
                    entry: entry.id.clone(),
                    source,
                }
            })?;
            RecipeMode::Synthesize {
                voice: pick_voice(entry, config, channel)?,
                spoken_text: spoken,
            }
        }
        EntryKind::SectionHeader { .. } | EntryKind::Comment { .. } => return Ok(None),
    };

    let dir = match mode {
        RecipeMode::CopySample { .. } => SFX_DIR,
        _ => channel.dir_name(),
    };
    Ok(Some(ProductionRecipe {
        id: entry.id.clone(),
        mode,
        flags,
        output_rel: output_rel_path(&entry.id, dir),
    }))
}

fn pick_voice(
    entry: &WordlistEntry,
    config: &BuildConfig,
    channel: Channel,
) -> Result<&'static Voice, ResolutionError> {
    if let Some(name) = config.overrides.get(&entry.id).and_then(|o| o.voice.as_deref()) {
        return voices::find_voice(name).ok_or_else(|| ResolutionError::UnknownVoice {
            entry: entry.id.clone(),
            voice: name.to_string(),
        });
    }
    let name = config
        .voices
        .for_channel(channel)
        .ok_or(ResolutionError::NoVoiceForChannel {
            entry: entry.id.clone(),
            channel,
        })?;
    voices::find_voice(name).ok_or_else(|| ResolutionError::UnknownVoice {
        entry: entry.id.clone(),
        voice: name.to_string(),
    })
}

/// Manifest word count: override wins over the parsed count, then the
/// configured cap applies.
pub fn resolved_word_count(entry: &WordlistEntry, config: &BuildConfig) -> u32 {
    let base = entry.word_count();
    let count = config
        .overrides
        .get(&entry.id)
        .and_then(|o| o.word_count)
        .unwrap_or(base);
    count.min(config.max_word_len)
}

/// Flags for an id as configured, for entries that never went through
/// [`resolve`]. Assumes a validated config.
pub fn flags_for(config: &BuildConfig, id: &str) -> EntryFlags {
    config
        .overrides
        .get(id)
        .map(|ov| EntryFlags::from_names(&ov.flags).unwrap_or_default())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::entry::parse_wordlist_text;
    use std::path::Path;

    fn config(toml: &str) -> BuildConfig {
        parse_config(toml).unwrap()
    }

    fn default_config() -> BuildConfig {
        config("wordlists = [\"a.txt\"]\n")
    }

    fn entries(text: &str) -> Vec<WordlistEntry> {
        parse_wordlist_text(Path::new("a.txt"), text).unwrap()
    }

    fn resolve_one(text: &str, cfg: &BuildConfig, channel: Channel) -> ProductionRecipe {
        let parsed = entries(text);
        resolve(&parsed[0], cfg, channel).unwrap().unwrap()
    }

    #[test]
    fn test_word_synthesizes_with_channel_voice() {
        let cfg = default_config();
        let fem = resolve_one("red_alert\n", &cfg, Channel::Female);
        match &fem.mode {
            RecipeMode::Synthesize { voice, spoken_text } => {
                assert_eq!(voice.id, "us-clb");
                assert_eq!(spoken_text, "red_alert");
            }
            other => panic!("unexpected mode {other:?}"),
        }
        assert_eq!(fem.output_rel, "sound/vox_fem/red_alert.ogg");

        let mas = resolve_one("red_alert\n", &cfg, Channel::Male);
        match &mas.mode {
            RecipeMode::Synthesize { voice, .. } => assert_eq!(voice.id, "us-rms"),
            other => panic!("unexpected mode {other:?}"),
        }
        assert_eq!(mas.output_rel, "sound/vox_mas/red_alert.ogg");
    }

    #[test]
    fn test_sample_reference_wins_and_lands_in_sfx() {
        let cfg = default_config();
        let recipe = resolve_one("@samples/klaxon.wav\n", &cfg, Channel::Female);
        assert_eq!(recipe.id, "klaxon");
        assert_eq!(
            recipe.mode,
            RecipeMode::CopySample {
                source_path: "samples/klaxon.wav".into()
            }
        );
        assert_eq!(recipe.output_rel, "sound/vox_sfx/klaxon.ogg");
        // Same artifact path regardless of channel.
        let other = resolve_one("@samples/klaxon.wav\n", &cfg, Channel::Male);
        assert_eq!(other.output_rel, recipe.output_rel);
    }

    #[test]
    fn test_song_reference_uses_channel_voice() {
        let cfg = default_config();
        let recipe = resolve_one("&songs/closing_time.xml\n", &cfg, Channel::Male);
        match &recipe.mode {
            RecipeMode::RenderSong { voice, source_path } => {
                assert_eq!(voice.id, "us-rms");
                assert_eq!(source_path, "songs/closing_time.xml");
            }
            other => panic!("unexpected mode {other:?}"),
        }
        assert_eq!(recipe.output_rel, "sound/vox_mas/closing_time.ogg");
    }

    #[test]
    fn test_voice_override_beats_channel_voice() {
        let cfg = config(
            "wordlists = [\"a.txt\"]\n\n[overrides.red_alert]\nvoice = \"us-slt\"\n",
        );
        let recipe = resolve_one("red_alert\n", &cfg, Channel::Male);
        match &recipe.mode {
            RecipeMode::Synthesize { voice, .. } => assert_eq!(voice.id, "us-slt"),
            other => panic!("unexpected mode {other:?}"),
        }
    }

    #[test]
    fn test_skip_override_resolves_to_nothing() {
        let cfg = config("wordlists = [\"a.txt\"]\n\n[overrides.red_alert]\nskip = true\n");
        let parsed = entries("red_alert\n");
        assert!(resolve(&parsed[0], &cfg, Channel::Female).unwrap().is_none());
    }

    #[test]
    fn test_missing_channel_voice_is_a_resolution_error() {
        let cfg = config("wordlists = [\"a.txt\"]\n\n[voices]\nfemale = \"us-clb\"\n");
        let parsed = entries("red_alert\n");
        let err = resolve(&parsed[0], &cfg, Channel::Male).unwrap_err();
        assert!(matches!(err, ResolutionError::NoVoiceForChannel { .. }));
    }

    #[test]
    fn test_unspeakable_text_is_a_resolution_error() {
        let cfg = default_config();
        let parsed = entries("umlaut = f\u{00fc}r alle\n");
        let err = resolve(&parsed[0], &cfg, Channel::Female).unwrap_err();
        assert!(matches!(err, ResolutionError::Unspeakable { .. }));
    }

    #[test]
    fn test_headers_and_comments_resolve_to_nothing() {
        let cfg = default_config();
        for entry in entries("## Section\n# note\nword\n") {
            if !entry.is_buildable() {
                assert!(resolve(&entry, &cfg, Channel::Female).unwrap().is_none());
            }
        }
    }

    #[test]
    fn test_fingerprint_tracks_every_input() {
        let cfg = default_config();
        let base = resolve_one("alert = the station is fine\n", &cfg, Channel::Female);
        assert_eq!(base.fingerprint(), base.fingerprint());

        let text = resolve_one("alert = the station is not fine\n", &cfg, Channel::Female);
        assert_ne!(base.fingerprint(), text.fingerprint());

        let channel = resolve_one("alert = the station is fine\n", &cfg, Channel::Male);
        assert_ne!(base.fingerprint(), channel.fingerprint());

        let slt = config("wordlists = [\"a.txt\"]\n\n[voices]\nfemale = \"us-slt\"\n");
        let voice = resolve_one("alert = the station is fine\n", &slt, Channel::Female);
        assert_ne!(base.fingerprint(), voice.fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_flags() {
        let plain = config("wordlists = [\"a.txt\"]\n");
        let mastered = config(
            "wordlists = [\"a.txt\"]\n\n[overrides.klaxon]\nflags = [\"pre-mastered\"]\n",
        );
        let a = resolve_one("@samples/klaxon.wav\n", &plain, Channel::Female);
        let b = resolve_one("@samples/klaxon.wav\n", &mastered, Channel::Female);
        assert!(b.effect_chain().is_empty());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_trim_skipped_only_with_both_flags() {
        let mk = |flags: &[&str]| ProductionRecipe {
            id: "x".into(),
            mode: RecipeMode::CopySample {
                source_path: "samples/x.wav".into(),
            },
            flags: EntryFlags::from_names(
                &flags.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
            )
            .unwrap(),
            output_rel: "sound/vox_sfx/x.ogg".into(),
        };
        assert!(mk(&[]).trim_enabled());
        assert!(mk(&["pre-mastered"]).trim_enabled());
        assert!(mk(&["no-trim"]).trim_enabled());
        assert!(!mk(&["pre-mastered", "no-trim"]).trim_enabled());
    }

    #[test]
    fn test_reserved_device_names_are_defused() {
        assert_eq!(safe_file_stem("con"), "c_on");
        assert_eq!(safe_file_stem("COM1"), "C_OM1");
        assert_eq!(safe_file_stem("control"), "control");
        assert_eq!(artifact_file_name("nul"), "n_ul.ogg");
        assert_eq!(artifact_file_name("hello"), "hello.ogg");
    }

    #[test]
    fn test_word_count_override_and_cap() {
        let cfg = config(
            "max_word_len = 4\nwordlists = [\"a.txt\"]\n\n[overrides.long_one]\nword_count = 2\n",
        );
        let parsed = entries(
            "long_one = alpha bravo charlie delta echo\n\
             longer = one two three four five six\n\
             short = hi\n",
        );
        assert_eq!(resolved_word_count(&parsed[0], &cfg), 2);
        assert_eq!(resolved_word_count(&parsed[1], &cfg), 4);
        assert_eq!(resolved_word_count(&parsed[2], &cfg), 1);
    }

    #[test]
    fn test_padding_applies_to_synthesized_modes_only() {
        let cfg = default_config();
        assert!(resolve_one("word\n", &cfg, Channel::Female).synthesized());
        assert!(resolve_one("&songs/x.xml\n", &cfg, Channel::Female).synthesized());
        assert!(!resolve_one("@samples/x.wav\n", &cfg, Channel::Female).synthesized());
    }
}
