use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version tag written by the structured (JSON) encoding
pub const CURRENT_VERSION: &str = "1.0";

/// Version tag assigned to documents read from the legacy `frame:x,y;...|...` grammar
pub const LEGACY_VERSION: &str = "0.0";

/// Tolerance used when comparing path endpoints
pub const POINT_EPSILON: f64 = 0.01;

/// Opaque key/value metadata carried through parse and serialize untouched
pub type Metadata = Map<String, Value>;

/// A 2D point in canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear blend towards `other`
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            self.x * (1.0 - t) + other.x * t,
            self.y * (1.0 - t) + other.y * t,
        )
    }

    /// True when both axes differ by less than [`POINT_EPSILON`]
    pub fn approx_eq(&self, other: &Point) -> bool {
        (self.x - other.x).abs() < POINT_EPSILON && (self.y - other.y).abs() < POINT_EPSILON
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Travel direction authored for a keyframe's path.
///
/// Stored as `1` / `-1` in the structured encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn as_i8(self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

impl Serialize for Direction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

/// One authored anchor: a polyline attached to a frame index
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Keyframe {
    pub frame: u32,
    pub points: Vec<Point>,
    pub direction: Direction,
    pub metadata: Metadata,
}

impl Keyframe {
    pub fn new(frame: u32, points: Vec<Point>) -> Self {
        Self {
            frame,
            points,
            direction: Direction::Forward,
            metadata: Metadata::new(),
        }
    }

    /// A keyframe without points cannot place the foreground on its own
    pub fn is_degenerate(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }
}

/// Normalized in-memory path description.
///
/// Keyframes are always sorted by frame; the sort is stable so keyframes that
/// share a frame keep their authored order.
#[derive(Debug, Clone, PartialEq)]
pub struct PathDocument {
    pub version: String,
    pub keyframes: Vec<Keyframe>,
    pub metadata: Metadata,
}

impl PathDocument {
    pub fn new(version: impl Into<String>, mut keyframes: Vec<Keyframe>, metadata: Metadata) -> Self {
        keyframes.sort_by_key(|kf| kf.frame);
        Self {
            version: version.into(),
            keyframes,
            metadata,
        }
    }

    /// An empty structured document
    pub fn empty() -> Self {
        Self::new(CURRENT_VERSION, Vec::new(), Metadata::new())
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// True when this document came from the legacy textual grammar
    pub fn is_legacy(&self) -> bool {
        self.version == LEGACY_VERSION
    }

    /// Compare keyframes and metadata, ignoring the diagnostic version tag
    pub fn same_content(&self, other: &PathDocument) -> bool {
        self.keyframes == other.keyframes && self.metadata == other.metadata
    }

    /// Smallest and largest keyframe frame numbers
    pub fn frame_span(&self) -> Option<(u32, u32)> {
        let first = self.keyframes.first()?.frame;
        let last = self.keyframes.last()?.frame;
        Some((first, last))
    }
}

impl Default for PathDocument {
    fn default() -> Self {
        Self::empty()
    }
}
