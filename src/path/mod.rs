//! # Path Documents
//!
//! The path model, its two textual encodings, and the geometry used to move
//! along a path: Catmull-Rom smoothing, arc-length lookup, Bézier anchor
//! sampling and canvas tidying.

pub mod arc_length;
pub mod bezier;
pub mod codec;
pub mod smooth;
pub mod tidy;
pub mod types;

pub use arc_length::{bridge, locate, locate_across, path_length};
pub use codec::{normalize, parse, parse_or_empty, serialize, validate, OutputEncoding};
pub use smooth::{smooth_path, DEFAULT_SAMPLES_PER_SEGMENT};
pub use tidy::tidy;
pub use types::{Direction, Keyframe, Metadata, PathDocument, Point};
