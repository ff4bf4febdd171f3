//! # Motion
//!
//! Per-frame resolution of foreground position, visual effects and, for
//! batch foregrounds, which image to draw.

pub mod effects;
pub mod image_map;
pub mod resolver;

pub use effects::{merge_effect_records, shortest_rotation, EffectParams, EffectsResolver, EffectsTrack};
pub use image_map::ImageMap;
pub use resolver::{same_path, Bracket, InterpolationMode, PositionResolver, Resolved};
