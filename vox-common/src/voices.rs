//! Built-in voice registry and sox effect chains.
//!
//! Four synthesis voices ship with the tool, two per sex channel. Every
//! clip in a channel runs through the same effect chain so the whole
//! library sounds like one announcement system coming out of the same
//! speakers.

use std::fmt;

/// The two announcement channels. Every buildable entry is produced
/// once per configured channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Female,
    Male,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Female, Channel::Male];

    /// Short code used in manifests and generated game code.
    pub fn code(self) -> &'static str {
        match self {
            Channel::Female => "fem",
            Channel::Male => "mas",
        }
    }

    /// Output subdirectory for this channel's clips.
    pub fn dir_name(self) -> &'static str {
        match self {
            Channel::Female => "vox_fem",
            Channel::Male => "vox_mas",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Female => f.write_str("female"),
            Channel::Male => f.write_str("male"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Voice {
    /// Name used in vox.toml and overrides.
    pub id: &'static str,
    pub channel: Channel,
    /// Voice pack the speech engine loads.
    pub engine_voice: &'static str,
    pitch: Option<&'static str>,
    stretch: Option<&'static str>,
}

// Male voices get a pitch drop; every voice is slowed slightly.
const PITCH_DROP: &str = "-100";
const STRETCH: &str = "1.1";

const CHORUS: &[&str] = &["chorus", "0.7", "0.9", "55", "0.4", "0.25", "2", "-t"];
const PHASER: &[&str] = &["phaser", "0.9", "0.85", "4", "0.23", "1.3", "-s"];
const BASS: &[&str] = &["bass", "-10"];
const HIGHPASS: &[&str] = &["highpass", "22"];
const ECHOS: &[&str] = &["echos", "0.3", "0.5", "100", "0.25", "10", "0.25"];
const COMPAND: &[&str] = &[
    "compand",
    "0.01,1",
    "-90,-90,-70,-70,-60,-20,0,0",
    "-5",
];

pub const VOICES: &[Voice] = &[
    Voice {
        id: "us-clb",
        channel: Channel::Female,
        engine_voice: "cmu_us_clb_arctic_clunits",
        pitch: None,
        stretch: Some(STRETCH),
    },
    Voice {
        id: "us-slt",
        channel: Channel::Female,
        engine_voice: "cmu_us_slt_arctic_hts",
        pitch: None,
        stretch: Some(STRETCH),
    },
    Voice {
        id: "us-rms",
        channel: Channel::Male,
        engine_voice: "cmu_us_rms_arctic_clunits",
        pitch: Some(PITCH_DROP),
        stretch: Some(STRETCH),
    },
    Voice {
        id: "scot-awb",
        channel: Channel::Male,
        engine_voice: "cmu_us_awb_arctic_clunits",
        pitch: Some(PITCH_DROP),
        stretch: Some(STRETCH),
    },
];

pub fn find_voice(id: &str) -> Option<&'static Voice> {
    VOICES.iter().find(|v| v.id == id)
}

pub fn voice_ids() -> Vec<&'static str> {
    VOICES.iter().map(|v| v.id).collect()
}

fn extend(args: &mut Vec<String>, effect: &[&str]) {
    args.extend(effect.iter().map(|a| a.to_string()));
}

impl Voice {
    /// Full sox chain for announcement clips in this voice: pitch and
    /// tempo corrections, normalization, then the PA coloration with
    /// the compander last.
    pub fn effect_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(pitch) = self.pitch {
            args.push("pitch".to_string());
            args.push(pitch.to_string());
        }
        if let Some(stretch) = self.stretch {
            args.push("stretch".to_string());
            args.push(stretch.to_string());
        }
        args.push("norm".to_string());
        extend(&mut args, CHORUS);
        extend(&mut args, PHASER);
        extend(&mut args, BASS);
        extend(&mut args, HIGHPASS);
        extend(&mut args, ECHOS);
        extend(&mut args, COMPAND);
        args
    }
}

/// Chain for copied samples: the PA room character without the voice
/// coloration.
pub fn sample_effect_args() -> Vec<String> {
    let mut args = vec!["norm".to_string()];
    extend(&mut args, BASS);
    extend(&mut args, HIGHPASS);
    extend(&mut args, ECHOS);
    extend(&mut args, COMPAND);
    args
}

/// Songs keep their own dynamics; normalization only.
pub fn song_effect_args() -> Vec<String> {
    vec!["norm".to_string()]
}
