use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use keyframe_compositor::{
    compositor::{load_mask, load_rgb, load_rgba, CompositionEngine, CompositionInputs, ForegroundSource, SizeMode},
    config::Config,
    motion::{EffectsTrack, ImageMap},
    path,
};

#[derive(Parser)]
#[command(
    name = "keyframe-compositor",
    version,
    about = "Animate a sprite along keyframed paths over a background",
    long_about = "Keyframe-Compositor moves a foreground image along hand-drawn keyframe paths, applies per-keyframe scale, rotation, flip and opacity, and writes every composited frame and its mask as PNG files."
)]
struct Cli {
    /// Background image
    #[arg(short, long)]
    background: PathBuf,

    /// Single foreground image
    #[arg(short, long)]
    foreground: Option<PathBuf>,

    /// Mask for the single foreground (white keeps, black hides)
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Batch foreground images, in index order (repeatable; overrides --foreground)
    #[arg(long = "foreground-batch")]
    foreground_batch: Vec<PathBuf>,

    /// Masks for the batch foregrounds, in the same order (repeatable)
    #[arg(long = "masks")]
    masks: Vec<PathBuf>,

    /// Path data: a file, or the JSON / legacy text itself
    #[arg(short, long)]
    path: String,

    /// Effects track: a file, or `frame:sx,sy,rot,fx,fy,opacity|...`
    #[arg(short, long)]
    effects: Option<String>,

    /// Keyframe image map for batch foregrounds: a file, or `frame:index|...`
    #[arg(long)]
    image_map: Option<String>,

    /// Output directory for frame_NNNNNN.png / mask_NNNNNN.png
    #[arg(short, long)]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Canvas width (overrides config)
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height (overrides config)
    #[arg(long)]
    height: Option<u32>,

    /// Number of frames to render (overrides config)
    #[arg(long)]
    frames: Option<u32>,

    /// Static foreground scale (overrides config)
    #[arg(long)]
    scale: Option<f64>,

    /// Anchor the foreground at its top-left corner instead of its centre
    #[arg(long)]
    corner_anchor: bool,

    /// Follow the authored polylines without spline smoothing
    #[arg(long)]
    no_smooth: bool,

    /// Blend first points between distinct paths, as older releases did
    #[arg(long)]
    legacy: bool,

    /// Batch size normalization: largest, first, custom or original
    #[arg(long)]
    size_mode: Option<SizeMode>,

    /// Edge length for --size-mode custom
    #[arg(long)]
    custom_size: Option<u32>,

    /// Rendering threads (overrides config)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(width) = self.width {
            config.canvas.width = width;
        }
        if let Some(height) = self.height {
            config.canvas.height = height;
        }
        if let Some(frames) = self.frames {
            config.animation.total_frames = frames;
        }
        if let Some(scale) = self.scale {
            config.foreground.scale = scale;
        }
        if self.corner_anchor {
            config.foreground.center_anchor = false;
        }
        if self.no_smooth {
            config.animation.smooth_path = false;
        }
        if self.legacy {
            config.animation.legacy_interpolation = true;
        }
        if let Some(mode) = self.size_mode {
            config.foreground.size_mode = mode;
        }
        if let Some(size) = self.custom_size {
            config.foreground.custom_size = size;
        }
        if let Some(threads) = self.threads {
            config.processing.threads = threads;
        }
    }
}

/// Inline text, or the contents of the file it names
fn text_or_file(value: &str) -> Result<String> {
    let candidate = Path::new(value);
    if candidate.is_file() {
        return std::fs::read_to_string(candidate).with_context(|| format!("Failed to read {}", value));
    }
    Ok(value.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Keyframe-Compositor v{}", env!("CARGO_PKG_VERSION"));
    info!("Background: {:?}", cli.background);
    info!("Output: {:?}", cli.output);

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    let path_document = path::parse_or_empty(&text_or_file(&cli.path)?);
    let effects = match &cli.effects {
        Some(value) => EffectsTrack::parse(&text_or_file(value)?),
        None => EffectsTrack::new(),
    };
    let image_map = match &cli.image_map {
        Some(value) => ImageMap::parse(&text_or_file(value)?),
        None => ImageMap::new(),
    };

    let single = cli.foreground.as_ref().map(load_rgba).transpose()?;
    let single_mask = cli.mask.as_ref().map(load_mask).transpose()?;
    let batch = cli.foreground_batch.iter().map(load_rgba).collect::<keyframe_compositor::Result<Vec<_>>>()?;
    let batch_masks = cli.masks.iter().map(load_mask).collect::<keyframe_compositor::Result<Vec<_>>>()?;

    let foreground = ForegroundSource::from_parts(single, single_mask, batch, batch_masks)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let inputs = CompositionInputs {
        background: load_rgb(&cli.background)?,
        path: path_document,
        effects,
        image_map,
        foreground,
    };

    let engine = CompositionEngine::new(config);
    let written = engine.compose(&inputs, &cli.output)?;

    info!("Done: {} frames written to {:?}", written, cli.output);
    Ok(())
}
