//! vox.toml loading and validation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::codegen::CodebaseTarget;
use crate::resolve::EntryFlags;
use crate::voices::{self, Channel};

/// Project configuration, deserialized from vox.toml.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Which game codebase the generated bindings target.
    #[serde(default)]
    pub codebase_target: CodebaseTarget,

    /// Cap applied to per-entry word counts in the manifest.
    #[serde(default = "default_max_word_len")]
    pub max_word_len: u32,

    #[serde(default)]
    pub voices: VoiceTable,

    /// Wordlist files, processed in order.
    pub wordlists: Vec<PathBuf>,

    #[serde(default)]
    pub paths: PathsConfig,

    /// Per-entry tweaks, keyed by entry id.
    #[serde(default)]
    pub overrides: BTreeMap<String, EntryOverride>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceTable {
    #[serde(default)]
    pub female: Option<String>,
    #[serde(default)]
    pub male: Option<String>,
}

impl Default for VoiceTable {
    fn default() -> VoiceTable {
        VoiceTable {
            female: Some("us-clb".to_string()),
            male: Some("us-rms".to_string()),
        }
    }
}

impl VoiceTable {
    pub fn for_channel(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Female => self.female.as_deref(),
            Channel::Male => self.male.as_deref(),
        }
    }

    /// Channels that have a voice assigned, in fixed order.
    pub fn configured_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| self.for_channel(*c).is_some())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Root of the distributable output tree.
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,

    /// Root that `@` sample references are resolved against.
    #[serde(default = "default_samples_dir")]
    pub samples: PathBuf,

    /// Root that `&` song references are resolved against.
    #[serde(default = "default_songs_dir")]
    pub songs: PathBuf,

    /// Rebuild markers live here, outside the output tree.
    #[serde(default = "default_cache_dir")]
    pub cache: PathBuf,

    /// Intermediate wav files live here during a build.
    #[serde(default = "default_scratch_dir")]
    pub scratch: PathBuf,

    /// Optional pronunciation lexicon passed to the speech engine.
    #[serde(default)]
    pub lexicon: Option<PathBuf>,

    /// Where the generated game code goes. Defaults to the target's
    /// conventional location under the output root.
    #[serde(default)]
    pub codegen: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> PathsConfig {
        PathsConfig {
            output: default_output_dir(),
            samples: default_samples_dir(),
            songs: default_songs_dir(),
            cache: default_cache_dir(),
            scratch: default_scratch_dir(),
            lexicon: None,
            codegen: None,
        }
    }
}

impl PathsConfig {
    pub fn binding_path(&self, target: CodebaseTarget) -> PathBuf {
        match &self.codegen {
            Some(path) => path.clone(),
            None => self.output.join(target.default_binding_path()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryOverride {
    /// Produce this entry with a specific voice on every channel.
    #[serde(default)]
    pub voice: Option<String>,

    /// Leave the entry out of the build entirely. Its id stays reserved.
    #[serde(default)]
    pub skip: bool,

    /// Production flags: "pre-mastered", "no-trim", "unlisted".
    #[serde(default)]
    pub flags: Vec<String>,

    /// Manifest word count, replacing the parsed one.
    #[serde(default)]
    pub word_count: Option<u32>,
}

fn default_max_word_len() -> u32 {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_samples_dir() -> PathBuf {
    PathBuf::from("samples")
}

fn default_songs_dir() -> PathBuf {
    PathBuf::from("songs")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("tmp")
}

pub fn load_config(path: &Path) -> Result<BuildConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<BuildConfig> {
    let config: BuildConfig = toml::from_str(content).context("Failed to parse vox.toml")?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &BuildConfig) -> Result<()> {
    if config.wordlists.is_empty() {
        bail!("vox.toml must list at least one wordlist");
    }
    if config.max_word_len == 0 || config.max_word_len > 100 {
        bail!(
            "max_word_len must be between 1 and 100, got {}",
            config.max_word_len
        );
    }
    if config.voices.configured_channels().is_empty() {
        bail!("Configure at least one of voices.female / voices.male");
    }
    for channel in Channel::ALL {
        let Some(id) = config.voices.for_channel(channel) else {
            continue;
        };
        let voice = match voices::find_voice(id) {
            Some(v) => v,
            None => bail!(
                "Unknown voice '{}' for the {} channel (known voices: {})",
                id,
                channel,
                voices::voice_ids().join(", ")
            ),
        };
        if voice.channel != channel {
            bail!(
                "Voice '{}' is a {} voice but is assigned to the {} channel",
                id,
                voice.channel,
                channel
            );
        }
    }
    for (id, ov) in &config.overrides {
        if let Some(voice) = &ov.voice {
            if voices::find_voice(voice).is_none() {
                bail!(
                    "Override for '{}' names unknown voice '{}' (known voices: {})",
                    id,
                    voice,
                    voices::voice_ids().join(", ")
                );
            }
        }
        if let Err(flag) = EntryFlags::from_names(&ov.flags) {
            bail!(
                "Override for '{}' has unknown flag '{}' (valid flags: pre-mastered, no-trim, unlisted)",
                id,
                flag
            );
        }
        if ov.word_count == Some(0) {
            bail!("Override for '{}' sets word_count to 0; use skip instead", id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
wordlists = ["wordlists/announcements.txt"]
"#;
        let config = parse_config(toml).unwrap();
        assert_eq!(config.codebase_target, CodebaseTarget::Vg);
        assert_eq!(config.max_word_len, 30);
        assert_eq!(config.voices.female.as_deref(), Some("us-clb"));
        assert_eq!(config.voices.male.as_deref(), Some("us-rms"));
        assert_eq!(config.paths.output, PathBuf::from("dist"));
        assert_eq!(config.paths.scratch, PathBuf::from("tmp"));
        assert!(config.overrides.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
codebase_target = "tg"
max_word_len = 20
wordlists = ["a.txt", "b.txt"]

[voices]
female = "us-slt"
male = "scot-awb"

[paths]
output = "out"
samples = "clips"
codegen = "generated/vox.dm"

[overrides.klaxon]
flags = ["pre-mastered", "no-trim"]

[overrides.intercom_test]
voice = "us-slt"
skip = true
"#;
        let config = parse_config(toml).unwrap();
        assert_eq!(config.codebase_target, CodebaseTarget::Tg);
        assert_eq!(config.wordlists.len(), 2);
        assert_eq!(config.voices.male.as_deref(), Some("scot-awb"));
        assert_eq!(
            config.paths.binding_path(CodebaseTarget::Tg),
            PathBuf::from("generated/vox.dm")
        );
        let ov = &config.overrides["klaxon"];
        assert_eq!(ov.flags, vec!["pre-mastered", "no-trim"]);
        assert!(config.overrides["intercom_test"].skip);
    }

    #[test]
    fn test_binding_path_defaults_under_output() {
        let toml = r#"
wordlists = ["a.txt"]
"#;
        let config = parse_config(toml).unwrap();
        assert_eq!(
            config.paths.binding_path(CodebaseTarget::Vg),
            PathBuf::from("dist/code/defines/vox_sounds.dm")
        );
    }

    #[test]
    fn test_single_channel_config() {
        let toml = r#"
wordlists = ["a.txt"]

[voices]
female = "us-clb"
"#;
        let config = parse_config(toml).unwrap();
        assert_eq!(config.voices.configured_channels(), vec![Channel::Female]);
        assert_eq!(config.voices.male, None);
    }

    #[test]
    fn test_empty_wordlists_rejected() {
        let toml = r#"
wordlists = []
"#;
        let err = parse_config(toml).unwrap_err();
        assert!(err.to_string().contains("at least one wordlist"));
    }

    #[test]
    fn test_unknown_voice_rejected() {
        let toml = r#"
wordlists = ["a.txt"]

[voices]
female = "gs-alpha"
"#;
        let err = parse_config(toml).unwrap_err();
        assert!(err.to_string().contains("Unknown voice 'gs-alpha'"));
    }

    #[test]
    fn test_wrong_channel_voice_rejected() {
        let toml = r#"
wordlists = ["a.txt"]

[voices]
female = "us-rms"
"#;
        let err = parse_config(toml).unwrap_err();
        assert!(err.to_string().contains("male voice"));
    }

    #[test]
    fn test_unknown_override_flag_rejected() {
        let toml = r#"
wordlists = ["a.txt"]

[overrides.klaxon]
flags = ["loud"]
"#;
        let err = parse_config(toml).unwrap_err();
        assert!(err.to_string().contains("unknown flag 'loud'"));
    }

    #[test]
    fn test_max_word_len_bounds() {
        let toml = r#"
max_word_len = 0
wordlists = ["a.txt"]
"#;
        assert!(parse_config(toml).is_err());
        let toml = r#"
max_word_len = 101
wordlists = ["a.txt"]
"#;
        assert!(parse_config(toml).is_err());
    }
}
