//! Reading and writing path documents.
//!
//! Two encodings exist. The structured one is a JSON object
//! `{"version","keyframes":[{"frame","points":[{"x","y"}],"direction","metadata"}],"metadata"}`.
//! The legacy one is `frame:x,y;x,y|frame:x,y`. The encoding is detected once
//! in [`parse`]; everything downstream only sees a [`PathDocument`].

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::PathError;
use crate::path::types::{
    Direction, Keyframe, Metadata, PathDocument, Point, CURRENT_VERSION, LEGACY_VERSION,
};

/// Text encoding selected for [`serialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    #[default]
    Structured,
    Legacy,
}

/// Input encoding, resolved once per parse
enum Encoded<'a> {
    Structured(Value),
    Legacy(&'a str),
}

fn detect(trimmed: &str) -> Encoded<'_> {
    if trimmed.starts_with('{') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => return Encoded::Structured(value),
            Err(e) => debug!("Path data looks structured but is not valid JSON ({}), trying legacy grammar", e),
        }
    }
    Encoded::Legacy(trimmed)
}

/// Parse path data in either encoding.
///
/// Empty or whitespace-only input yields an empty document. Structured input
/// that cannot be decoded falls back to the legacy grammar; only a legacy
/// grammar failure is reported as an error.
pub fn parse(text: &str) -> Result<PathDocument, PathError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(PathDocument::empty());
    }

    match detect(trimmed) {
        Encoded::Structured(value) => match decode_structured(&value) {
            Ok(document) => Ok(document),
            Err(reason) => {
                debug!("Structured path data rejected ({}), trying legacy grammar", reason);
                parse_legacy(trimmed)
            }
        },
        Encoded::Legacy(text) => parse_legacy(text),
    }
}

/// Parse, substituting an empty document when the text is malformed
pub fn parse_or_empty(text: &str) -> PathDocument {
    parse(text).unwrap_or_else(|e| {
        tracing::warn!("{}; continuing with an empty path", e);
        PathDocument::empty()
    })
}

/// Re-establish the document invariants (stable frame order)
pub fn normalize(mut document: PathDocument) -> PathDocument {
    document.keyframes.sort_by_key(|kf| kf.frame);
    document
}

#[derive(Serialize)]
struct StructuredDocument<'a> {
    version: &'a str,
    keyframes: Vec<&'a Keyframe>,
    metadata: &'a Metadata,
}

/// Serialize keyframes and document metadata.
///
/// The structured output is compact JSON. The legacy output drops keyframes
/// without points along with direction and metadata.
pub fn serialize(
    keyframes: &[Keyframe],
    metadata: &Metadata,
    encoding: OutputEncoding,
) -> Result<String, PathError> {
    let mut sorted: Vec<&Keyframe> = keyframes.iter().collect();
    sorted.sort_by_key(|kf| kf.frame);

    match encoding {
        OutputEncoding::Structured => {
            let document = StructuredDocument {
                version: CURRENT_VERSION,
                keyframes: sorted,
                metadata,
            };
            serde_json::to_string(&document).map_err(|e| PathError::Encode { reason: e.to_string() })
        }
        OutputEncoding::Legacy => Ok(sorted
            .into_iter()
            .filter(|kf| !kf.points.is_empty())
            .map(|kf| {
                let points: Vec<String> = kf.points.iter().map(|p| format!("{},{}", p.x, p.y)).collect();
                format!("{}:{}", kf.frame, points.join(";"))
            })
            .collect::<Vec<_>>()
            .join("|")),
    }
}

impl PathDocument {
    /// Compact structured encoding of this document
    pub fn to_json(&self) -> Result<String, PathError> {
        serialize(&self.keyframes, &self.metadata, OutputEncoding::Structured)
    }
}

/// Check that path data is well formed.
///
/// Structured input must give every keyframe a `frame` and a `points` field
/// and every point numeric `x`/`y`. The first violation found is returned.
pub fn validate(text: &str) -> Result<(), PathError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    if let Encoded::Structured(value) = detect(trimmed) {
        check_structured(&value).map_err(|reason| PathError::Invalid { reason })?;
    }

    parse(trimmed).map(|_| ())
}

fn check_structured(value: &Value) -> Result<(), String> {
    let keyframes = match value.get("keyframes") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(keyframes)) => keyframes,
        Some(_) => return Err("'keyframes' must be an array".to_string()),
    };

    for keyframe in keyframes {
        let frame = keyframe.get("frame").ok_or("Keyframe missing 'frame' field")?;
        let points = keyframe
            .get("points")
            .ok_or_else(|| format!("Keyframe {} missing 'points' field", frame))?;
        let points = points
            .as_array()
            .ok_or_else(|| format!("Invalid point list in keyframe {}", frame))?;

        for point in points {
            let (Some(x), Some(y)) = (point.get("x"), point.get("y")) else {
                return Err(format!("Invalid point format in keyframe {}", frame));
            };
            if coerce_f64(Some(x)).is_err() || coerce_f64(Some(y)).is_err() {
                return Err(format!("Invalid point coordinates in keyframe {}", frame));
            }
        }
    }
    Ok(())
}

// ==========================================
// STRUCTURED DECODING
// ==========================================

fn decode_structured(value: &Value) -> Result<PathDocument, String> {
    let object = value.as_object().ok_or("top level is not an object")?;

    let version = match object.get("version") {
        None | Some(Value::Null) => CURRENT_VERSION.to_string(),
        Some(Value::String(version)) => version.clone(),
        Some(other) => other.to_string(),
    };

    let keyframes = match object.get("keyframes") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(decode_keyframe).collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err("'keyframes' is not an array".to_string()),
    };

    let metadata = decode_metadata(object.get("metadata"))?;

    Ok(PathDocument::new(version, keyframes, metadata))
}

fn decode_keyframe(value: &Value) -> Result<Keyframe, String> {
    let object = value.as_object().ok_or("keyframe is not an object")?;

    let frame = coerce_frame(object.get("frame"))?;
    let points = match object.get("points") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| -> Result<Point, String> {
                let point = item.as_object().ok_or("point is not an object")?;
                Ok(Point::new(coerce_f64(point.get("x"))?, coerce_f64(point.get("y"))?))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(format!("points of keyframe {} are not an array", frame)),
    };

    Ok(Keyframe {
        frame,
        points,
        direction: coerce_direction(object.get("direction")),
        metadata: decode_metadata(object.get("metadata"))?,
    })
}

fn decode_metadata(value: Option<&Value>) -> Result<Metadata, String> {
    match value {
        None | Some(Value::Null) => Ok(Metadata::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err("metadata is not an object".to_string()),
    }
}

fn coerce_f64(value: Option<&Value>) -> Result<f64, String> {
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| format!("{} is not a float", n)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{}' is not a finite number", s)),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(other) => Err(format!("{} is not a number", other)),
    }
}

fn coerce_frame(value: Option<&Value>) -> Result<u32, String> {
    let frame = match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i,
            None => n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64).ok_or_else(|| format!("frame {} out of range", n))?,
        },
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| format!("frame '{}' is not an integer", s))?,
        Some(Value::Bool(b)) => i64::from(*b),
        Some(other) => return Err(format!("frame {} is not an integer", other)),
    };
    u32::try_from(frame).map_err(|_| format!("frame {} is out of range", frame))
}

fn coerce_direction(value: Option<&Value>) -> Direction {
    match value {
        Some(Value::Number(n)) if n.as_f64().is_some_and(|d| d < 0.0) => Direction::Reverse,
        Some(Value::String(s)) if matches!(s.trim(), "-1" | "reverse" | "backward") => Direction::Reverse,
        _ => Direction::Forward,
    }
}

// ==========================================
// LEGACY GRAMMAR
// ==========================================

fn parse_legacy(text: &str) -> Result<PathDocument, PathError> {
    let mut keyframes = Vec::new();

    for record in text.split('|').map(str::trim).filter(|r| !r.is_empty()) {
        let (frame_token, points_token) = record.split_once(':').ok_or_else(|| PathError::Parse {
            reason: format!("record '{}' is not of the form frame:points", record),
        })?;

        let frame = frame_token.trim().parse::<u32>().map_err(|_| PathError::Parse {
            reason: format!("'{}' is not a valid frame number", frame_token.trim()),
        })?;

        let points = parse_legacy_points(points_token, frame)?;
        keyframes.push(Keyframe::new(frame, points));
    }

    Ok(PathDocument::new(LEGACY_VERSION, keyframes, Metadata::new()))
}

fn parse_legacy_points(text: &str, frame: u32) -> Result<Vec<Point>, PathError> {
    text.split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|record| -> Result<Point, PathError> {
            let mut coords = record.split(',').map(str::trim);
            let (Some(x), Some(y)) = (coords.next(), coords.next()) else {
                return Err(PathError::Parse {
                    reason: format!("point '{}' in keyframe {} needs x,y", record, frame),
                });
            };
            let number = |token: &str| {
                token.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| PathError::Parse {
                    reason: format!("coordinate '{}' in keyframe {} is not a finite number", token, frame),
                })
            };
            Ok(Point::new(number(x)?, number(y)?))
        })
        .collect()
}
