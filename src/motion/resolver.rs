use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::path::{
    arc_length::{locate, locate_across},
    smooth::{smooth_path, DEFAULT_SAMPLES_PER_SEGMENT},
    types::{Keyframe, PathDocument, Point},
};

/// How positions are interpolated between two keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    /// Catmull-Rom smoothed paths, traversed by arc length
    #[default]
    Spline,
    /// Raw authored paths, traversed by arc length
    Polyline,
    /// Raw paths; distinct-path brackets blend only the first points.
    /// Kept for content authored against older releases.
    Legacy,
}

impl InterpolationMode {
    /// Mode selected by the `smooth_path` / `legacy_interpolation` switches.
    ///
    /// Legacy mode never smooths, so it wins over `smooth_path`.
    pub fn from_flags(smooth_path: bool, legacy: bool) -> Self {
        match (smooth_path, legacy) {
            (_, true) => InterpolationMode::Legacy,
            (true, false) => InterpolationMode::Spline,
            (false, false) => InterpolationMode::Polyline,
        }
    }

    pub fn smooths(self) -> bool {
        self == InterpolationMode::Spline
    }
}

/// The keyframes surrounding a frame and the local progress between them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub prev_frame: u32,
    pub next_frame: u32,
    pub t: f64,
}

/// Result of resolving one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Resolved {
    pub position: Option<Point>,
    /// Absent when no keyframe carries points (zero keyframes, or a single degenerate one)
    pub bracket: Option<Bracket>,
}

impl Resolved {
    fn empty() -> Self {
        Self::default()
    }
}

/// Keyframe position resolver.
///
/// Built once per run from an immutable document; [`resolve`](Self::resolve)
/// takes `&self` so frames can be resolved from many threads at once.
pub struct PositionResolver<'a> {
    keyframes: &'a [Keyframe],
    mode: InterpolationMode,
    /// Per keyframe: smoothed points in spline mode, the raw points otherwise
    paths: Vec<Vec<Point>>,
    span: Option<(u32, u32)>,
}

impl<'a> PositionResolver<'a> {
    pub fn new(document: &'a PathDocument, mode: InterpolationMode) -> Self {
        Self::with_samples(document, mode, DEFAULT_SAMPLES_PER_SEGMENT)
    }

    pub fn with_samples(document: &'a PathDocument, mode: InterpolationMode, samples_per_segment: usize) -> Self {
        let keyframes = document.keyframes.as_slice();
        let paths = keyframes
            .iter()
            .map(|kf| {
                if mode.smooths() {
                    smooth_path(&kf.points, samples_per_segment)
                } else {
                    kf.points.clone()
                }
            })
            .collect();

        let span = keyframes
            .iter()
            .map(|kf| kf.frame)
            .min()
            .zip(keyframes.iter().map(|kf| kf.frame).max());

        debug!("Position resolver: {} keyframes, mode {:?}, span {:?}", keyframes.len(), mode, span);

        Self { keyframes, mode, paths, span }
    }

    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    /// Resolve the foreground position for `current` and the bracket that produced it
    pub fn resolve(&self, current: u32) -> Resolved {
        match self.keyframes {
            [] => Resolved::empty(),
            [only] => match only.first_point() {
                Some(point) => Resolved {
                    position: Some(point),
                    bracket: Some(Bracket { prev_frame: only.frame, next_frame: only.frame, t: 0.0 }),
                },
                None => Resolved::empty(),
            },
            _ => self.resolve_bracketed(current),
        }
    }

    /// Indices of the bracketing keyframes.
    ///
    /// `prev` is the last keyframe at or before `current`; past the final
    /// keyframe both sides are the final keyframe so the end position holds.
    fn select(&self, current: u32) -> (usize, usize) {
        let at_or_before = self.keyframes.partition_point(|kf| kf.frame <= current);
        match at_or_before {
            0 => (0, 1),
            n if n < self.keyframes.len() => (n - 1, n),
            n => (n - 1, n - 1),
        }
    }

    fn resolve_bracketed(&self, current: u32) -> Resolved {
        let (p, n) = self.select(current);
        let (prev, next) = (&self.keyframes[p], &self.keyframes[n]);

        let t = if prev.frame == next.frame {
            0.0
        } else {
            let span = f64::from(next.frame) - f64::from(prev.frame);
            ((f64::from(current) - f64::from(prev.frame)) / span).clamp(0.0, 1.0)
        };

        let bracket = Bracket { prev_frame: prev.frame, next_frame: next.frame, t };
        let position = self.position_between(p, n, t);

        Resolved { position, bracket: Some(bracket) }
    }

    fn position_between(&self, p: usize, n: usize, t: f64) -> Option<Point> {
        let (prev, next) = (&self.keyframes[p], &self.keyframes[n]);

        match (prev.points.is_empty(), next.points.is_empty()) {
            (true, true) => return None,
            (true, false) => return next.first_point(),
            (false, true) => return self.paths[p].last().copied(),
            (false, false) => {}
        }

        if same_path(prev, next) {
            let progress = self.global_progress(prev.frame, next.frame, t);
            return locate(&self.paths[p], progress);
        }

        match self.mode {
            InterpolationMode::Spline | InterpolationMode::Polyline => {
                locate_across(&self.paths[p], &self.paths[n], t)
            }
            InterpolationMode::Legacy => {
                let (from, to) = (prev.first_point()?, next.first_point()?);
                Some(from.lerp(&to, t))
            }
        }
    }

    /// Progress along a path shared by several keyframes, measured across the
    /// whole keyframe span rather than the local bracket
    fn global_progress(&self, prev_frame: u32, next_frame: u32, t: f64) -> f64 {
        match self.span {
            Some((first, last)) if last > first => {
                let prev = f64::from(prev_frame);
                let at = prev + (f64::from(next_frame) - prev) * t;
                ((at - f64::from(first)) / (f64::from(last) - f64::from(first))).clamp(0.0, 1.0)
            }
            _ => t,
        }
    }
}

/// Two keyframes re-declaring one route: equal point counts and matching
/// endpoints within epsilon
pub fn same_path(a: &Keyframe, b: &Keyframe) -> bool {
    if a.points.is_empty() || a.points.len() != b.points.len() {
        return false;
    }
    match (a.first_point(), b.first_point(), a.last_point(), b.last_point()) {
        (Some(a0), Some(b0), Some(a1), Some(b1)) => a0.approx_eq(&b0) && a1.approx_eq(&b1),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::codec::parse;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn assert_close(actual: Option<Point>, expected: Point) {
        let actual = actual.expect("expected a position");
        assert!(
            (actual.x - expected.x).abs() < 1e-9 && (actual.y - expected.y).abs() < 1e-9,
            "{:?} != {:?}",
            actual,
            expected
        );
    }

    fn reference_doc() -> PathDocument {
        parse("0:0,0|10:0,0;10,0;10,10").unwrap()
    }

    #[test]
    fn test_no_keyframes_no_position() {
        let doc = PathDocument::empty();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Spline);
        assert_eq!(resolver.resolve(3), Resolved::default());
    }

    #[test]
    fn test_single_keyframe_is_static() {
        let doc = parse("7:3,4;50,50").unwrap();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Spline);

        for frame in [0, 7, 8, 500] {
            let resolved = resolver.resolve(frame);
            assert_eq!(resolved.position, Some(pt(3.0, 4.0)));
            assert_eq!(resolved.bracket, Some(Bracket { prev_frame: 7, next_frame: 7, t: 0.0 }));
        }
    }

    #[test]
    fn test_single_degenerate_keyframe() {
        let doc = parse(r#"{"keyframes":[{"frame":2,"points":[]}]}"#).unwrap();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Polyline);
        assert_eq!(resolver.resolve(2), Resolved::default());
    }

    #[test]
    fn test_reference_document_unsmoothed() {
        let doc = reference_doc();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Polyline);

        assert_eq!(resolver.resolve(0).position, Some(pt(0.0, 0.0)));
        // Concatenated path is (0,0)->(10,0)->(10,10); half its length is the corner
        assert_close(resolver.resolve(5).position, pt(10.0, 0.0));
        assert_eq!(resolver.resolve(5).bracket, Some(Bracket { prev_frame: 0, next_frame: 10, t: 0.5 }));

        for frame in [10, 11, 25, 1000] {
            assert_eq!(resolver.resolve(frame).position, Some(pt(10.0, 10.0)), "frame {}", frame);
        }
    }

    #[test]
    fn test_holds_terminal_point_instead_of_looping() {
        let doc = parse("0:0,0;100,0|20:100,0;100,100").unwrap();
        for mode in [InterpolationMode::Spline, InterpolationMode::Polyline, InterpolationMode::Legacy] {
            let resolver = PositionResolver::new(&doc, mode);
            let end = resolver.resolve(20).position;
            assert_eq!(end, Some(pt(100.0, 100.0)), "{:?}", mode);
            assert_eq!(resolver.resolve(59).position, end);
        }
    }

    #[test]
    fn test_before_first_keyframe_clamps_to_start() {
        let doc = parse("10:5,5|20:15,5").unwrap();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Polyline);

        let resolved = resolver.resolve(3);
        assert_eq!(resolved.position, Some(pt(5.0, 5.0)));
        assert_eq!(resolved.bracket, Some(Bracket { prev_frame: 10, next_frame: 20, t: 0.0 }));
    }

    #[test]
    fn test_same_path_uses_global_progress() {
        // One route re-declared at three keyframes
        let route = "0,0;50,0;100,0";
        let doc = parse(&format!("0:{r}|25:{r}|50:{r}", r = route)).unwrap();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Polyline);

        assert_close(resolver.resolve(25).position, pt(50.0, 0.0));
        assert_close(resolver.resolve(30).position, pt(60.0, 0.0));
        assert_eq!(resolver.resolve(50).position, Some(pt(100.0, 0.0)));
    }

    #[test]
    fn test_legacy_mode_still_follows_shared_route() {
        // First points coincide, so a first-point blend would never move
        let route = "0,0;100,0;100,100";
        let doc = parse(&format!("0:{r}|50:{r}|100:{r}", r = route)).unwrap();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Legacy);

        assert_close(resolver.resolve(25).position, pt(50.0, 0.0));
        assert_close(resolver.resolve(50).position, pt(100.0, 0.0));
        assert_close(resolver.resolve(75).position, pt(100.0, 50.0));
        assert_eq!(resolver.resolve(100).position, Some(pt(100.0, 100.0)));
        assert_eq!(resolver.resolve(75).bracket, Some(Bracket { prev_frame: 50, next_frame: 100, t: 0.5 }));
    }

    #[test]
    fn test_duplicate_frames_use_last_as_prev() {
        let doc = parse("0:0,0|5:10,0|5:20,0|10:30,0").unwrap();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Polyline);

        let before = resolver.resolve(3);
        assert_close(before.position, pt(6.0, 0.0));
        assert_eq!(before.bracket.map(|b| (b.prev_frame, b.next_frame)), Some((0, 5)));

        // At and after the shared frame the later declaration leads
        assert_close(resolver.resolve(5).position, pt(20.0, 0.0));
        let after = resolver.resolve(7);
        assert_close(after.position, pt(24.0, 0.0));
        assert_eq!(after.bracket.map(|b| (b.prev_frame, b.next_frame)), Some((5, 10)));
    }

    #[test]
    fn test_same_path_detection() {
        let a = Keyframe::new(0, vec![pt(0.0, 0.0), pt(5.0, 9.0), pt(10.0, 10.0)]);
        let b = Keyframe::new(9, vec![pt(0.005, 0.0), pt(-3.0, 2.0), pt(10.0, 10.009)]);
        let c = Keyframe::new(9, vec![pt(0.0, 0.0), pt(10.0, 10.0)]);
        let d = Keyframe::new(9, vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(10.0, 10.5)]);

        assert!(same_path(&a, &b));
        assert!(!same_path(&a, &c));
        assert!(!same_path(&a, &d));
        assert!(!same_path(&Keyframe::new(0, vec![]), &Keyframe::new(1, vec![])));
    }

    #[test]
    fn test_degenerate_side_falls_back() {
        let doc = parse(r#"{"keyframes":[{"frame":0,"points":[]},{"frame":10,"points":[{"x":4,"y":4},{"x":8,"y":8}]},{"frame":20,"points":[]}]}"#).unwrap();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Spline);

        assert_eq!(resolver.resolve(5).position, Some(pt(4.0, 4.0)));
        assert_eq!(resolver.resolve(15).position, Some(pt(8.0, 8.0)));
    }

    #[test]
    fn test_legacy_blends_first_points_only() {
        let doc = reference_doc();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Legacy);
        assert_eq!(resolver.resolve(5).position, Some(pt(0.0, 0.0)));

        let doc = parse("0:0,0;0,50|10:20,0;20,50;20,80").unwrap();
        let resolver = PositionResolver::new(&doc, InterpolationMode::Legacy);
        assert_close(resolver.resolve(5).position, pt(10.0, 0.0));
    }

    #[test]
    fn test_spline_stays_near_authored_route() {
        let doc = parse("0:0,0;50,0;50,50;100,50|30:100,50;150,50").unwrap();
        let resolver = PositionResolver::with_samples(&doc, InterpolationMode::Spline, 8);

        assert_eq!(resolver.resolve(0).position, Some(pt(0.0, 0.0)));
        for frame in 0..=30 {
            let p = resolver.resolve(frame).position.unwrap();
            assert!(p.x > -10.0 && p.x < 160.0 && p.y > -10.0 && p.y < 60.0, "frame {} at {:?}", frame, p);
        }
    }

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(InterpolationMode::from_flags(true, false), InterpolationMode::Spline);
        assert_eq!(InterpolationMode::from_flags(false, false), InterpolationMode::Polyline);
        assert_eq!(InterpolationMode::from_flags(true, true), InterpolationMode::Legacy);
    }
}
