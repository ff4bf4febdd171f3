//! # Keyframe-Compositor
//!
//! Animate a sprite along hand-drawn keyframed paths and composite it over a
//! background, frame by frame.
//!
//! A path document maps keyframe numbers to polylines. For every output frame
//! the library finds the surrounding keyframes, moves along their (optionally
//! spline-smoothed) paths at constant speed, blends the per-keyframe visual
//! effects and draws the transformed foreground onto the background.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keyframe_compositor::{
//!     compositor::{load_rgb, load_rgba, CompositionEngine, CompositionInputs, ForegroundSource},
//!     config::Config,
//!     motion::{EffectsTrack, ImageMap},
//!     path,
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let inputs = CompositionInputs {
//!     background: load_rgb("background.png")?,
//!     path: path::parse("0:0,0|30:100,40;200,200")?,
//!     effects: EffectsTrack::parse("30:1.5,1.5,90,0,0,1"),
//!     image_map: ImageMap::new(),
//!     foreground: ForegroundSource::from_parts(Some(load_rgba("sprite.png")?), None, vec![], vec![])?,
//! };
//!
//! let engine = CompositionEngine::new(Config::default());
//! engine.compose(&inputs, "frames/")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`path`] - Path documents, their encodings and path geometry
//! - [`motion`] - Per-frame position, effects and image selection
//! - [`compositor`] - Raster transforms and frame rendering
//! - [`config`] - Configuration management
//!
//! ## Resolving positions directly
//!
//! ```rust
//! use keyframe_compositor::{motion::{InterpolationMode, PositionResolver}, path};
//!
//! let doc = path::parse("0:0,0|10:0,0;10,0;10,10").unwrap();
//! let resolver = PositionResolver::new(&doc, InterpolationMode::Polyline);
//! let at = resolver.resolve(5).position.unwrap();
//! assert!((at.x - 10.0).abs() < 1e-9 && at.y.abs() < 1e-9);
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod motion;
pub mod path;

// Re-export commonly used types for convenience
pub use crate::{
    compositor::{CompositionEngine, Compositor},
    config::Config,
    error::{CompositorError, Result},
    motion::{EffectParams, EffectsTrack, InterpolationMode, PositionResolver},
    path::{PathDocument, Point},
};
