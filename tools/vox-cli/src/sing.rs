//! Sing command - render the Daisy Bell duet.
//!
//! A nod to the first song a computer ever sang, on an IBM 7094 in
//! 1961. The two configured voices trade lines of the chorus through
//! the same singing mode that `&` song references use, and the result
//! gets the standard distribution encode.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Args;

use vox_common::config::load_config;
use vox_common::error::PipelineStage;
use vox_common::resolve::ENCODE_ARGS;
use vox_common::voices::{self, Channel, Voice};

use crate::pipeline::{run_tool, Tools};

/// Arguments for the sing command
#[derive(Args)]
pub struct SingArgs {
    /// Where the finished song goes
    #[arg(short, long, default_value = "daisy_bell.ogg")]
    pub out: PathBuf,

    /// Path to the vox.toml configuration
    #[arg(short, long, default_value = "vox.toml")]
    pub config: PathBuf,

    /// Echo every external command before running it
    #[arg(short, long)]
    pub echo: bool,
}

/// One sung word: notes, beats, text. Multi-syllable words carry one
/// comma-separated note and beat per syllable.
type SungWord = (&'static str, &'static str, &'static str);

const VERSE_DAISY: &[SungWord] = &[
    ("D5,B4", "3,3", "daisy"),
    ("G4,D4", "3,3", "daisy"),
    ("E4", "1", "give"),
    ("F#4", "1", "me"),
    ("G4", "1", "your"),
    ("E4,G4", "1.5,0.5", "answer"),
    ("A4", "4", "do"),
];

const VERSE_CRAZY: &[SungWord] = &[
    ("B4", "2", "i'm"),
    ("D5", "1", "half"),
    ("B4,G4", "2,1", "crazy"),
    ("E4", "2", "all"),
    ("G4", "1", "for"),
    ("E4", "1", "the"),
    ("D4", "1", "love"),
    ("E4", "1", "of"),
    ("G4", "4", "you"),
];

const VERSE_MARRIAGE: &[SungWord] = &[
    ("D5", "1", "it"),
    ("D5", "1", "won't"),
    ("B4", "1", "be"),
    ("D5", "1", "a"),
    ("B4,G4", "1.5,0.5", "stylish"),
    ("A4,D4", "1,2", "marriage"),
    ("E4", "1", "i"),
    ("A4", "1", "can't"),
    ("A4,G4", "1,1", "afford"),
    ("A4", "1", "a"),
    ("F#4,D4", "1,2", "carriage"),
];

const VERSE_BICYCLE: &[SungWord] = &[
    ("D4", "1", "but"),
    ("G4", "1", "you'll"),
    ("B4", "1", "look"),
    ("A4", "2", "sweet"),
    ("G4,B4", "0.5,0.5", "upon"),
    ("A4", "1", "the"),
    ("D5", "2", "seat"),
    ("B4", "1", "of"),
    ("G4", "1", "a"),
    ("B4,A4,G4", "1,0.5,0.5", "bicycle"),
    ("A4", "1", "built"),
    ("D4", "1", "for"),
    ("G4", "4", "two"),
];

/// Execute the sing command
pub fn execute(args: SingArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let Some(lead) = config
        .voices
        .for_channel(Channel::Female)
        .and_then(voices::find_voice)
    else {
        bail!("The duet needs a female lead; configure voices.female in vox.toml");
    };
    let Some(response) = config
        .voices
        .for_channel(Channel::Male)
        .and_then(voices::find_voice)
    else {
        bail!("The duet needs a male response; configure voices.male in vox.toml");
    };

    let tools = Tools::locate()?;
    fs::create_dir_all(&config.paths.scratch)
        .with_context(|| format!("Failed to create {}", config.paths.scratch.display()))?;

    println!("Singing Daisy Bell with {} and {}", lead.id, response.id);

    let verses: [(&Voice, &[SungWord]); 4] = [
        (lead, VERSE_DAISY),
        (response, VERSE_CRAZY),
        (lead, VERSE_MARRIAGE),
        (response, VERSE_BICYCLE),
    ];
    let mut rendered = Vec::new();
    for (i, (voice, verse)) in verses.iter().enumerate() {
        let score = config.paths.scratch.join(format!("sing-{i}.xml"));
        let wav = config.paths.scratch.join(format!("sing-{i}.wav"));
        fs::write(&score, singing_xml(verse))
            .with_context(|| format!("Failed to write {}", score.display()))?;
        let mut cmd = Command::new(&tools.text2wave);
        cmd.arg("-eval")
            .arg(format!("(voice_{})", voice.engine_voice))
            .arg("-mode")
            .arg("singing")
            .arg(&score)
            .arg("-o")
            .arg(&wav);
        run_tool(cmd, PipelineStage::Acquire, args.echo)?;
        rendered.push(wav);
    }

    // One sox call concatenates the verses and evens out the level.
    let combined = config.paths.scratch.join("sing-combined.wav");
    let mut cmd = Command::new(&tools.sox);
    cmd.args(&rendered)
        .arg(&combined)
        .args(voices::song_effect_args());
    run_tool(cmd, PipelineStage::Process, args.echo)?;

    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let mut cmd = Command::new(&tools.ffmpeg);
    cmd.arg("-i").arg(&combined).args(ENCODE_ARGS).arg(&args.out);
    run_tool(cmd, PipelineStage::Encode, args.echo)?;

    println!("Wrote {}", args.out.display());
    Ok(())
}

fn singing_xml(verse: &[SungWord]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\"?>\n\
         <!DOCTYPE SINGING PUBLIC \"-//SINGING//DTD SINGING mark up//EN\" \"Singing.v0_1.dtd\" []>\n\
         <SINGING BPM=\"90\">\n",
    );
    for (notes, beats, word) in verse {
        xml.push_str(&format!(
            "<PITCH NOTE=\"{notes}\"><DURATION BEATS=\"{beats}\">{word}</DURATION></PITCH>\n"
        ));
    }
    xml.push_str("</SINGING>\n");
    xml
}
