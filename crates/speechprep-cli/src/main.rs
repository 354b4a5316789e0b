use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use speechprep::example::{Example, ExampleAssembler, LabelType, Paradigm};
use speechprep::{ExampleConfig, FeatureType, indices_to_char};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "speechprep")]
#[command(about = "Prepare one speech-recognition training example", long_about = None)]
struct Args {
    /// Example config (JSON) with wav / transcript / phone map paths.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a WAV file (overrides the config).
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Word transcript: last line is `<start> <end> <words...>`.
    #[arg(long)]
    word_transcript: Option<PathBuf>,

    /// Phone transcript: one `<start> <end> <phone>` line per phone.
    #[arg(long)]
    phone_transcript: Option<PathBuf>,

    /// Phone-to-index table (`<phone> <index>` per line).
    #[arg(long)]
    phone_map: Option<PathBuf>,

    /// mfcc or logmelfbank (defaults to the config value, then logmelfbank).
    #[arg(long)]
    feature_type: Option<FeatureType>,

    /// character or phone.
    #[arg(long, default_value = "character")]
    label_type: LabelType,

    /// ctc or attention.
    #[arg(long, default_value = "ctc")]
    paradigm: Paradigm,

    /// Write the prepared example as JSON.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log the labels decoded back to text.
    #[arg(long, default_value_t = false)]
    decode: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let assembler = ExampleAssembler::new(config).context("set up example assembler")?;

    let example = assembler
        .assemble(args.label_type, args.paradigm)
        .with_context(|| format!("assemble {} / {} example", args.label_type, args.paradigm))?;

    if args.decode {
        log_decoded(&assembler, args.label_type, &example)?;
    }

    if let Some(path) = &args.output {
        write_example(path, &example)?;
    }

    let (batch, frames, dim) = example.inputs.dim();
    println!(
        "inputs=({batch}, {frames}, {dim}) seq_len={:?} labels={}",
        example.seq_len,
        example.labels.first().map_or(0, Vec::len)
    );
    Ok(())
}

fn build_config(args: &Args) -> Result<ExampleConfig> {
    let mut config = match (&args.config, &args.audio) {
        (Some(path), _) => ExampleConfig::from_path(path)
            .with_context(|| format!("load config {}", path.display()))?,
        (None, Some(audio)) => ExampleConfig::new(audio),
        (None, None) => anyhow::bail!("choose an input: --config or --audio"),
    };

    if let Some(audio) = &args.audio {
        config.wav = audio.clone();
    }
    for (slot, flag) in [
        (&mut config.word_transcript, &args.word_transcript),
        (&mut config.phone_transcript, &args.phone_transcript),
        (&mut config.phone_map, &args.phone_map),
    ] {
        if flag.is_some() {
            slot.clone_from(flag);
        }
    }
    if let Some(feature_type) = args.feature_type {
        config.feature_type = feature_type;
    }
    config.validate().context("validate config")?;
    Ok(config)
}

fn log_decoded(
    assembler: &ExampleAssembler,
    label_type: LabelType,
    example: &Example,
) -> Result<()> {
    let Some(labels) = example.labels.first() else {
        return Ok(());
    };
    let text = match label_type {
        LabelType::Character => indices_to_char(labels).context("decode character labels")?,
        LabelType::Phone => assembler
            .phone_map()
            .context("phone labels without a phone map")?
            .decode(labels)
            .context("decode phone labels")?,
    };
    info!(decoded = %text, "labels");
    Ok(())
}

fn write_example(path: &PathBuf, example: &Example) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("create {path:?}"))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, example)
        .with_context(|| format!("write example to {path:?}"))?;
    out.flush().with_context(|| format!("flush {path:?}"))?;
    info!(path = %path.display(), "wrote example");
    Ok(())
}
