// Utilities for authoring path, effects and image-map data

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};

use keyframe_compositor::{
    compositor::render_preview,
    motion::{merge_effect_records, EffectParams},
    path::{
        self,
        bezier::{sample_paths, Anchor, SampleOptions},
        Keyframe, Metadata, OutputEncoding, PathDocument, DEFAULT_SAMPLES_PER_SEGMENT,
    },
};

#[derive(Parser)]
#[command(name = "path-tool", version, about = "Inspect and convert keyframe path data")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum Format {
    Json,
    Legacy,
}

impl From<Format> for OutputEncoding {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputEncoding::Structured,
            Format::Legacy => OutputEncoding::Legacy,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Check that path data is well formed
    Validate {
        /// A file, or the path text itself
        input: String,
    },

    /// Re-encode path data
    Convert {
        input: String,
        #[arg(long, value_enum, default_value = "json")]
        to: Format,
    },

    /// Clamp points to a canvas and drop jitter and empty keyframes
    Tidy {
        input: String,
        #[arg(long, default_value_t = 512)]
        width: u32,
        #[arg(long, default_value_t = 512)]
        height: u32,
        #[arg(long, value_enum, default_value = "json")]
        to: Format,
    },

    /// Draw every keyframe path into a PNG
    Preview {
        input: String,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 512)]
        width: u32,
        #[arg(long, default_value_t = 512)]
        height: u32,
        /// Draw the authored polylines instead of the smoothed spline
        #[arg(long)]
        raw: bool,
    },

    /// Flatten pen-tool anchors (JSON list of anchor lists) into one keyframe
    Sample {
        /// JSON file with `[[{"point": {"x":..,"y":..}, "handle_in": .., "handle_out": ..}, ..], ..]`
        anchors: PathBuf,
        #[arg(long, default_value_t = 0)]
        frame: u32,
        #[arg(long, value_enum, default_value = "json")]
        to: Format,
    },

    /// Print one effects record
    EffectRecord {
        keyframe: u32,
        #[arg(long, default_value_t = 1.0)]
        scale_x: f64,
        #[arg(long, default_value_t = 1.0)]
        scale_y: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        rotation: f64,
        #[arg(long)]
        flip_x: bool,
        #[arg(long)]
        flip_y: bool,
        #[arg(long, default_value_t = 1.0)]
        opacity: f64,
    },

    /// Join effects strings into one track
    MergeEffects {
        records: Vec<String>,
    },
}

fn text_or_file(value: &str) -> Result<String> {
    let candidate = Path::new(value);
    if candidate.is_file() {
        return std::fs::read_to_string(candidate).with_context(|| format!("Failed to read {}", value));
    }
    Ok(value.to_string())
}

fn encode(document: &PathDocument, format: Format) -> Result<String> {
    Ok(path::serialize(&document.keyframes, &document.metadata, format.into())?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Validate { input } => {
            let text = text_or_file(&input)?;
            path::validate(&text)?;
            let document = path::parse(&text)?;
            info!(
                "Valid path data: version {}, {} keyframes, frames {:?}",
                document.version,
                document.keyframes.len(),
                document.frame_span()
            );
        }
        Command::Convert { input, to } => {
            let document = path::normalize(path::parse(&text_or_file(&input)?)?);
            println!("{}", encode(&document, to)?);
        }
        Command::Tidy { input, width, height, to } => {
            let document = path::parse(&text_or_file(&input)?)?;
            let tidied = path::tidy(&document, width, height);
            info!("Kept {} of {} keyframes", tidied.keyframes.len(), document.keyframes.len());
            println!("{}", encode(&tidied, to)?);
        }
        Command::Preview { input, output, width, height, raw } => {
            let document = path::parse(&text_or_file(&input)?)?;
            let image = render_preview(&document, width, height, !raw, DEFAULT_SAMPLES_PER_SEGMENT);
            image.save(&output).with_context(|| format!("Failed to save preview {:?}", output))?;
            info!("Preview saved to: {:?}", output);
        }
        Command::Sample { anchors, frame, to } => {
            let content = std::fs::read_to_string(&anchors).with_context(|| format!("Failed to read {:?}", anchors))?;
            let paths: Vec<Vec<Anchor>> = serde_json::from_str(&content).context("Invalid anchor JSON")?;
            let points = sample_paths(&paths, &SampleOptions::default());
            info!("Sampled {} anchor paths into {} points", paths.len(), points.len());

            let document = PathDocument::new(path::types::CURRENT_VERSION, vec![Keyframe::new(frame, points)], Metadata::new());
            println!("{}", encode(&document, to)?);
        }
        Command::EffectRecord { keyframe, scale_x, scale_y, rotation, flip_x, flip_y, opacity } => {
            let params = EffectParams { scale_x, scale_y, rotation, flip_x, flip_y, opacity };
            println!("{}", params.to_record(keyframe));
        }
        Command::MergeEffects { records } => {
            println!("{}", merge_effect_records(&records));
        }
    }

    Ok(())
}
