//! # Frame Compositor
//!
//! Turns resolved positions and effects into output frames: foreground
//! preparation, raster transforms, the [`Compositor`] seam that places a
//! sprite on the canvas, and the parallel [`CompositionEngine`].

pub mod engine;
pub mod preview;
pub mod traits;
pub mod transform;
pub mod types;

pub use engine::{CompositionEngine, CompositionInputs, ForegroundSource};
pub use preview::render_preview;
pub use traits::{AlphaOverCompositor, Compositor};
pub use transform::SizeMode;
pub use types::{load_mask, load_rgb, load_rgba, Frame, RenderedFrame};
