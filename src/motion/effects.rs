//! Per-keyframe visual effects and their interpolation.
//!
//! Text form: `frame:scale_x,scale_y,rotation,flip_x,flip_y,opacity` records
//! joined by `|`, flips written as `0`/`1`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::motion::resolver::Bracket;

/// Visual state applied to the foreground for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectParams {
    pub scale_x: f64,
    pub scale_y: f64,
    /// Clockwise, in degrees
    pub rotation: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub opacity: f64,
}

impl EffectParams {
    /// Unscaled, unrotated, unflipped, fully opaque
    pub const fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            opacity: 1.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Interpolate towards `next`.
    ///
    /// Scales and opacity are linear, rotation takes the shorter way around and
    /// flips switch to `next` once `t` reaches 0.5.
    pub fn blend(&self, next: &EffectParams, t: f64) -> EffectParams {
        let lerp = |a: f64, b: f64| a * (1.0 - t) + b * t;
        let late = t >= 0.5;

        EffectParams {
            scale_x: lerp(self.scale_x, next.scale_x),
            scale_y: lerp(self.scale_y, next.scale_y),
            rotation: shortest_rotation(self.rotation, next.rotation, t),
            flip_x: if late { next.flip_x } else { self.flip_x },
            flip_y: if late { next.flip_y } else { self.flip_y },
            opacity: lerp(self.opacity, next.opacity),
        }
    }

    /// One `frame:...` record of the text form
    pub fn to_record(&self, keyframe: u32) -> String {
        format!(
            "{}:{},{},{},{},{},{}",
            keyframe,
            self.scale_x,
            self.scale_y,
            self.rotation,
            u8::from(self.flip_x),
            u8::from(self.flip_y),
            self.opacity
        )
    }

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        if fields.len() < 6 {
            return Err(format!("expected 6 values, found {}", fields.len()));
        }

        let float = |i: usize| {
            fields[i]
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", fields[i].trim()))
        };
        let flag = |i: usize| {
            fields[i]
                .trim()
                .parse::<i64>()
                .map(|v| v != 0)
                .map_err(|_| format!("'{}' is not a 0/1 flag", fields[i].trim()))
        };

        Ok(Self {
            scale_x: float(0)?,
            scale_y: float(1)?,
            rotation: float(2)?,
            flip_x: flag(3)?,
            flip_y: flag(4)?,
            opacity: float(5)?,
        })
    }
}

impl Default for EffectParams {
    fn default() -> Self {
        Self::identity()
    }
}

/// Rotate from `from` towards `to` by fraction `t`, never more than 180° overall
pub fn shortest_rotation(from: f64, to: f64, t: f64) -> f64 {
    let mut delta = to - from;
    if delta.abs() > 180.0 {
        delta = (delta + 180.0).rem_euclid(360.0) - 180.0;
    }
    from + delta * t
}

/// Effect parameters keyed by keyframe number
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectsTrack {
    entries: BTreeMap<u32, EffectParams>,
}

impl EffectsTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text form.
    ///
    /// Records that cannot be read are skipped with a warning; a later record
    /// for the same frame replaces an earlier one.
    pub fn parse(text: &str) -> Self {
        let mut track = Self::new();

        for record in text.split('|').map(str::trim).filter(|r| !r.is_empty()) {
            match parse_record(record) {
                Ok((frame, params)) => {
                    track.insert(frame, params);
                }
                Err(reason) => warn!("Skipping effects record '{}': {}", record, reason),
            }
        }

        debug!("Parsed effects track with {} keyframes", track.len());
        track
    }

    pub fn insert(&mut self, frame: u32, params: EffectParams) -> Option<EffectParams> {
        self.entries.insert(frame, params)
    }

    pub fn get(&self, frame: u32) -> Option<&EffectParams> {
        self.entries.get(&frame)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &EffectParams)> {
        self.entries.iter().map(|(frame, params)| (*frame, params))
    }

    /// Text form, keys ascending
    pub fn to_text(&self) -> String {
        self.iter()
            .map(|(frame, params)| params.to_record(frame))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Exact lookup, identity when the frame has no authored effect
    fn at_or_identity(&self, frame: u32) -> EffectParams {
        self.get(frame).copied().unwrap_or_else(EffectParams::identity)
    }
}

impl FromIterator<(u32, EffectParams)> for EffectsTrack {
    fn from_iter<I: IntoIterator<Item = (u32, EffectParams)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

fn parse_record(record: &str) -> Result<(u32, EffectParams), String> {
    let (frame, values) = record.split_once(':').ok_or("missing ':' separator")?;
    let frame = frame
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("'{}' is not a keyframe number", frame.trim()))?;
    let fields: Vec<&str> = values.split(',').collect();
    Ok((frame, EffectParams::from_fields(&fields)?))
}

/// Join several effects strings into one track text, skipping blank inputs
pub fn merge_effect_records<S: AsRef<str>>(records: &[S]) -> String {
    records
        .iter()
        .map(|r| r.as_ref().trim())
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join("|")
}

/// Effects resolver, kept in step with the path keyframes
pub struct EffectsResolver<'a> {
    track: &'a EffectsTrack,
}

impl<'a> EffectsResolver<'a> {
    pub fn new(track: &'a EffectsTrack) -> Self {
        Self { track }
    }

    /// Effect state for `current`.
    ///
    /// With a bracket, each side is looked up exactly at the bracket's frames
    /// (identity when absent, never the nearest authored effect). Without one,
    /// the track is interpolated over its own keys.
    pub fn resolve(&self, bracket: Option<&Bracket>, current: u32) -> EffectParams {
        if self.track.is_empty() {
            return EffectParams::identity();
        }

        match bracket {
            Some(bracket) => self.resolve_bracketed(bracket, current),
            None => self.resolve_standalone(current),
        }
    }

    fn resolve_bracketed(&self, bracket: &Bracket, current: u32) -> EffectParams {
        let prev = self.track.at_or_identity(bracket.prev_frame);
        let next = self.track.at_or_identity(bracket.next_frame);

        if current == bracket.prev_frame {
            return prev;
        }
        if current == bracket.next_frame {
            return next;
        }

        prev.blend(&next, bracket.t)
    }

    fn resolve_standalone(&self, current: u32) -> EffectParams {
        let keys: Vec<u32> = self.track.entries.keys().copied().collect();
        if let [only] = keys.as_slice() {
            return self.track.at_or_identity(*only);
        }

        let at_or_before = keys.partition_point(|&k| k <= current);
        let (prev, next) = match at_or_before {
            0 => (keys[0], keys[1]),
            n if n < keys.len() => (keys[n - 1], keys[n]),
            n => (keys[n - 2], keys[n - 1]),
        };

        let (prev_params, next_params) = (self.track.at_or_identity(prev), self.track.at_or_identity(next));
        if current == prev {
            return prev_params;
        }
        if current == next {
            return next_params;
        }

        let t = ((f64::from(current) - f64::from(prev)) / (f64::from(next) - f64::from(prev))).clamp(0.0, 1.0);
        prev_params.blend(&next_params, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_KEYS: &str = "0:1,1,0,0,0,1|10:2,2,90,0,0,0.5";

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_track() {
        let track = EffectsTrack::parse(TWO_KEYS);
        assert_eq!(track.len(), 2);

        let ten = track.get(10).unwrap();
        assert_eq!(ten.scale_x, 2.0);
        assert_eq!(ten.rotation, 90.0);
        assert_eq!(ten.opacity, 0.5);
        assert!(!ten.flip_x);
    }

    #[test]
    fn test_parse_skips_bad_records() {
        let track = EffectsTrack::parse("0:1,1,0,1,0,1|x:1,1,0,0,0,1|5:1,1|7:1,1,0,0,0,oops||9:2,2,0,0,1,1");
        let frames: Vec<u32> = track.iter().map(|(f, _)| f).collect();

        assert_eq!(frames, vec![0, 9]);
        assert!(track.get(0).unwrap().flip_x);
        assert!(track.get(9).unwrap().flip_y);
    }

    #[test]
    fn test_bracketed_midpoint() {
        let track = EffectsTrack::parse(TWO_KEYS);
        let resolver = EffectsResolver::new(&track);
        let bracket = Bracket { prev_frame: 0, next_frame: 10, t: 0.5 };

        let fx = resolver.resolve(Some(&bracket), 5);
        assert!(close(fx.scale_x, 1.5));
        assert!(close(fx.scale_y, 1.5));
        assert!(close(fx.rotation, 45.0));
        assert!(close(fx.opacity, 0.75));
        assert!(!fx.flip_x && !fx.flip_y);
    }

    #[test]
    fn test_exact_keyframes_are_unmodified() {
        let track = EffectsTrack::parse(TWO_KEYS);
        let resolver = EffectsResolver::new(&track);
        let bracket = Bracket { prev_frame: 0, next_frame: 10, t: 1.0 };

        assert_eq!(resolver.resolve(Some(&bracket), 10), *track.get(10).unwrap());
        let start = Bracket { t: 0.0, ..bracket };
        assert_eq!(resolver.resolve(Some(&start), 0), *track.get(0).unwrap());
    }

    #[test]
    fn test_unauthored_bracket_frames_are_identity() {
        // Only frame 10 is authored; a bracket 20 -> 30 must not borrow it
        let track = EffectsTrack::parse("10:3,3,45,1,1,0.2");
        let resolver = EffectsResolver::new(&track);
        let bracket = Bracket { prev_frame: 20, next_frame: 30, t: 0.4 };

        assert!(resolver.resolve(Some(&bracket), 24).is_identity());
        assert!(resolver.resolve(Some(&bracket), 20).is_identity());
    }

    #[test]
    fn test_blend_towards_identity() {
        let track = EffectsTrack::parse("0:3,1,0,1,0,0");
        let resolver = EffectsResolver::new(&track);

        let early = resolver.resolve(Some(&Bracket { prev_frame: 0, next_frame: 10, t: 0.2 }), 2);
        assert!(close(early.scale_x, 2.6));
        assert!(early.flip_x);

        let late = resolver.resolve(Some(&Bracket { prev_frame: 0, next_frame: 10, t: 0.5 }), 5);
        assert!(!late.flip_x);
        assert!(close(late.opacity, 0.5));
    }

    #[test]
    fn test_rotation_takes_short_way() {
        assert!(close(shortest_rotation(350.0, 10.0, 0.5), 360.0));
        assert!(close(shortest_rotation(10.0, 350.0, 0.5), 0.0));
        assert!(close(shortest_rotation(-170.0, 170.0, 0.25), -175.0));
        assert!(close(shortest_rotation(0.0, 180.0, 0.5), 90.0));

        for (from, to) in [(0.0, 359.0), (-360.0, 360.0), (90.0, -270.0), (-300.0, 300.0), (45.0, 10.0)] {
            for step in 0..=10 {
                let t = f64::from(step) / 10.0;
                let turned = shortest_rotation(from, to, t) - from;
                assert!(turned.abs() <= 180.0, "{} -> {} at {} turned {}", from, to, t, turned);
            }
        }
    }

    #[test]
    fn test_standalone_interpolation() {
        let track = EffectsTrack::parse(TWO_KEYS);
        let resolver = EffectsResolver::new(&track);

        assert!(close(resolver.resolve(None, 5).scale_x, 1.5));
        assert_eq!(resolver.resolve(None, 0), *track.get(0).unwrap());
        // Past the last key the final effect holds
        assert!(close(resolver.resolve(None, 40).scale_x, 2.0));

        let single = EffectsTrack::parse("4:2,2,0,0,0,1");
        assert_eq!(EffectsResolver::new(&single).resolve(None, 99), *single.get(4).unwrap());
    }

    #[test]
    fn test_empty_track_is_identity() {
        let track = EffectsTrack::new();
        let bracket = Bracket { prev_frame: 0, next_frame: 10, t: 0.3 };
        assert!(EffectsResolver::new(&track).resolve(Some(&bracket), 3).is_identity());
        assert!(EffectsResolver::new(&track).resolve(None, 3).is_identity());
    }

    #[test]
    fn test_records_round_trip_through_text() {
        let fx = EffectParams { scale_x: 1.5, scale_y: 0.5, rotation: -30.0, flip_x: true, flip_y: false, opacity: 0.25 };
        assert_eq!(fx.to_record(12), "12:1.5,0.5,-30,1,0,0.25");

        let merged = merge_effect_records(&[fx.to_record(12), String::new(), "  0:1,1,0,0,0,1 ".to_string()]);
        assert_eq!(merged, "12:1.5,0.5,-30,1,0,0.25|0:1,1,0,0,0,1");

        let track = EffectsTrack::parse(&merged);
        assert_eq!(track.get(12), Some(&fx));
        assert_eq!(track.to_text(), "0:1,1,0,0,0,1|12:1.5,0.5,-30,1,0,0.25");
    }
}
