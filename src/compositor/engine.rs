use std::path::Path;

use image::{imageops, GrayImage, RgbImage, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    compositor::{
        traits::{AlphaOverCompositor, Compositor},
        transform,
        types::{Frame, RenderedFrame},
    },
    config::Config,
    error::{CompositionError, Result},
    motion::{EffectsResolver, EffectsTrack, ImageMap, PositionResolver},
    path::PathDocument,
};

/// Where the animated foreground comes from
#[derive(Debug, Clone)]
pub enum ForegroundSource {
    /// One image, optionally masked, drawn on every frame
    Single { image: RgbaImage, mask: Option<GrayImage> },
    /// Several images switched by an [`ImageMap`], with per-image masks
    Batch { images: Vec<RgbaImage>, masks: Vec<GrayImage> },
}

impl ForegroundSource {
    /// Pick the source from whatever the caller supplied.
    ///
    /// A non-empty batch takes precedence over a single image; supplying
    /// neither is an error.
    pub fn from_parts(
        single: Option<RgbaImage>,
        single_mask: Option<GrayImage>,
        batch: Vec<RgbaImage>,
        batch_masks: Vec<GrayImage>,
    ) -> Result<Self> {
        if !batch.is_empty() {
            if single.is_some() {
                debug!("Both single and batch foregrounds supplied; using the batch");
            }
            return Ok(ForegroundSource::Batch { images: batch, masks: batch_masks });
        }

        match single {
            Some(image) => Ok(ForegroundSource::Single { image, mask: single_mask }),
            None => Err(CompositionError::MissingForeground.into()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ForegroundSource::Single { .. } => 1,
            ForegroundSource::Batch { images, .. } => images.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a render needs besides configuration
#[derive(Debug, Clone)]
pub struct CompositionInputs {
    pub background: RgbImage,
    pub path: PathDocument,
    pub effects: EffectsTrack,
    /// Only consulted for batch foregrounds
    pub image_map: ImageMap,
    pub foreground: ForegroundSource,
}

/// Shared, read-only state for the frame loop
struct RenderContext<'a> {
    background: RgbImage,
    sprites: Vec<RgbaImage>,
    positions: PositionResolver<'a>,
    effects: EffectsResolver<'a>,
    image_map: &'a ImageMap,
}

/// Renders keyframed foreground animation over a background
///
/// The pipeline:
/// 1. Foreground preparation - masks, batch size normalization, static scale
/// 2. Background fitting - resize to the canvas
/// 3. Frame rendering - per frame: position, effects, image selection,
///    transform and composite, in parallel across frames
/// 4. Output - `frame_NNNNNN.png` / `mask_NNNNNN.png` pairs
pub struct CompositionEngine {
    config: Config,
    compositor: Box<dyn Compositor>,
}

impl CompositionEngine {
    /// Create an engine that blends with [`AlphaOverCompositor`]
    pub fn new(config: Config) -> Self {
        Self::with_compositor(config, Box::new(AlphaOverCompositor::new()))
    }

    pub fn with_compositor(config: Config, compositor: Box<dyn Compositor>) -> Self {
        Self { config, compositor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render every frame and write it to `output_dir`, returning the frame count
    pub fn compose<P: AsRef<Path>>(&self, inputs: &CompositionInputs, output_dir: P) -> Result<usize> {
        let output_dir = output_dir.as_ref();

        info!("Starting keyframe composition");
        info!("   Canvas: {}x{}", self.config.canvas.width, self.config.canvas.height);
        info!("   Frames: {}", self.config.animation.total_frames);
        info!("   Keyframes: {}", inputs.path.keyframes.len());
        info!("   Output: {:?}", output_dir);
        info!("   Compositor: {}", self.compositor.name());

        let frames = self.render(inputs)?;
        let written = self.write_frames(&frames, output_dir)?;

        info!("Composition complete! {} frames saved to: {:?}", written, output_dir);
        Ok(written)
    }

    /// Render all frames in memory
    pub fn render(&self, inputs: &CompositionInputs) -> Result<Vec<RenderedFrame>> {
        self.config.validate()?;

        let animation = &self.config.animation;
        let mode = animation.interpolation_mode();

        if inputs.path.is_empty() {
            warn!("No keyframes found in path data; every frame will show the background only");
        }

        // Step 1: foregrounds
        let sprites = self.prepare_foregrounds(&inputs.foreground);

        // Step 2: background
        let background = self.fit_background(&inputs.background);

        // Step 3: frames
        info!("Step 3: Rendering {} frames ({:?} interpolation)...", animation.total_frames, mode);
        let context = RenderContext {
            background,
            sprites,
            positions: PositionResolver::with_samples(&inputs.path, mode, animation.samples_per_segment),
            effects: EffectsResolver::new(&inputs.effects),
            image_map: &inputs.image_map,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.processing.threads)
            .build()
            .map_err(|e| CompositionError::InvalidParameters {
                details: format!("Failed to build render thread pool: {}", e),
            })?;

        let frames = pool.install(|| {
            (0..animation.total_frames)
                .into_par_iter()
                .map(|index| self.render_frame(&context, index))
                .collect::<Result<Vec<_>>>()
        })?;

        info!("   Rendered {} frames", frames.len());
        Ok(frames)
    }

    fn prepare_foregrounds(&self, source: &ForegroundSource) -> Vec<RgbaImage> {
        info!("Step 1: Preparing {} foreground image(s)...", source.len());

        let settings = &self.config.foreground;
        let prepared = match source {
            ForegroundSource::Single { image, mask } => {
                let mut image = image.clone();
                if let Some(mask) = mask {
                    transform::apply_mask(&mut image, mask);
                }
                vec![image]
            }
            ForegroundSource::Batch { images, masks } => {
                if !masks.is_empty() && masks.len() != images.len() {
                    debug!("{} masks for {} foreground images", masks.len(), images.len());
                }
                transform::prepare_batch(images.clone(), masks, settings.size_mode, settings.custom_size)
            }
        };

        prepared
            .iter()
            .map(|image| transform::scale(image, settings.scale, settings.scale))
            .collect()
    }

    fn fit_background(&self, background: &RgbImage) -> RgbImage {
        let (width, height) = (self.config.canvas.width, self.config.canvas.height);
        info!("Step 2: Fitting background to canvas...");

        if background.dimensions() == (width, height) {
            return background.clone();
        }

        debug!("Resizing background {:?} -> {}x{}", background.dimensions(), width, height);
        imageops::resize(background, width, height, imageops::FilterType::Lanczos3)
    }

    fn render_frame(&self, context: &RenderContext<'_>, index: u32) -> Result<RenderedFrame> {
        let resolved = context.positions.resolve(index);

        let Some(position) = resolved.position else {
            return Ok(RenderedFrame::background_only(index, &context.background));
        };

        let effects = context.effects.resolve(resolved.bracket.as_ref(), index);
        let sprite_index = context.image_map.index_for_frame(index, context.sprites.len());
        let Some(sprite) = context.sprites.get(sprite_index) else {
            return Ok(RenderedFrame::background_only(index, &context.background));
        };

        let sprite = transform::apply_effects(sprite, &effects);
        let origin = self.compositor.origin_for(position, &sprite, self.config.foreground.center_anchor);

        let mut canvas = Frame::new(context.background.clone());
        let mut mask = GrayImage::new(canvas.width(), canvas.height());
        self.compositor.composite(&mut canvas, &mut mask, &sprite, origin)?;

        debug!(
            "Frame {}: position ({:.1}, {:.1}), image {}, bracket {:?}",
            index, position.x, position.y, sprite_index, resolved.bracket
        );

        Ok(RenderedFrame { index, image: canvas.into_image(), mask })
    }

    /// Write frames as numbered PNG pairs into `output_dir`
    pub fn write_frames<P: AsRef<Path>>(&self, frames: &[RenderedFrame], output_dir: P) -> Result<usize> {
        let output_dir = output_dir.as_ref();
        info!("Step 4: Writing {} frames...", frames.len());

        std::fs::create_dir_all(output_dir).map_err(|e| CompositionError::OutputFailed {
            reason: format!("Cannot create output directory {:?}: {}", output_dir, e),
        })?;
        for frame in frames {
            frame.save_to_dir(output_dir)?;
        }

        Ok(frames.len())
    }
}
