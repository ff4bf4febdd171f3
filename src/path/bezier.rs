//! Sampling of pen-tool anchor paths into plain polylines.

use serde::{Deserialize, Serialize};

use crate::path::types::Point;

/// Chords used to estimate a cubic segment's length
const LENGTH_ESTIMATE_CHORDS: usize = 20;

/// A pen-tool anchor with optional incoming and outgoing handles
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Anchor {
    pub point: Point,
    pub handle_in: Option<Point>,
    pub handle_out: Option<Point>,
}

impl Anchor {
    /// An anchor without handles (straight segments on both sides)
    pub fn corner(point: Point) -> Self {
        Self { point, handle_in: None, handle_out: None }
    }
}

/// Sampling density for curved segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleOptions {
    /// Fallback sample count when a curve's length estimate is zero
    pub samples_per_segment: usize,
    pub min_samples: usize,
    pub max_samples: usize,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            samples_per_segment: 30,
            min_samples: 2,
            max_samples: 100,
        }
    }
}

/// Evaluate a cubic Bézier at `t`
pub fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

fn estimate_length(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    let mut length = 0.0;
    let mut previous = p0;
    for i in 1..=LENGTH_ESTIMATE_CHORDS {
        let current = cubic_point(p0, p1, p2, p3, i as f64 / LENGTH_ESTIMATE_CHORDS as f64);
        length += previous.distance(&current);
        previous = current;
    }
    length
}

/// Flatten an anchor path.
///
/// A segment is curved only when its start has an outgoing handle and its end
/// an incoming one; roughly one sample is taken per 10px of estimated length.
pub fn sample_anchors(anchors: &[Anchor], options: &SampleOptions) -> Vec<Point> {
    match anchors {
        [] => return Vec::new(),
        [only] => return vec![only.point],
        _ => {}
    }

    let mut sampled: Vec<Point> = Vec::new();

    for pair in anchors.windows(2) {
        let (start, end) = (pair[0], pair[1]);

        match (start.handle_out, end.handle_in) {
            (Some(c1), Some(c2)) => {
                let estimate = estimate_length(start.point, c1, c2, end.point);
                let by_length = (estimate / 10.0).ceil() as usize;
                let wanted = if by_length == 0 { options.samples_per_segment } else { by_length };
                let lo = options.min_samples.max(1);
                let steps = wanted.clamp(lo, options.max_samples.max(lo));

                for j in 0..=steps {
                    let point = cubic_point(start.point, c1, c2, end.point, j as f64 / steps as f64);
                    if j == 0 && sampled.last().is_some_and(|last| last.approx_eq(&point)) {
                        continue;
                    }
                    sampled.push(point);
                }
            }
            _ => {
                if sampled.is_empty() {
                    sampled.push(start.point);
                }
                sampled.push(end.point);
            }
        }
    }

    sampled
}

/// Sample several anchor paths and chain them, merging coincident junctions
pub fn sample_paths(paths: &[Vec<Anchor>], options: &SampleOptions) -> Vec<Point> {
    let mut joined: Vec<Point> = Vec::new();
    for anchors in paths {
        let sampled = sample_anchors(anchors, options);
        let skip = match (joined.last(), sampled.first()) {
            (Some(tail), Some(head)) if tail.approx_eq(head) => 1,
            _ => 0,
        };
        joined.extend(sampled.into_iter().skip(skip));
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_segments_keep_anchors() {
        let anchors = [
            Anchor::corner(Point::new(0.0, 0.0)),
            Anchor::corner(Point::new(10.0, 0.0)),
            Anchor::corner(Point::new(10.0, 10.0)),
        ];
        let points = sample_anchors(&anchors, &SampleOptions::default());
        assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]);
    }

    #[test]
    fn test_curved_segment_sampled_by_length() {
        let anchors = [
            Anchor { point: Point::new(0.0, 0.0), handle_in: None, handle_out: Some(Point::new(0.0, 50.0)) },
            Anchor { point: Point::new(100.0, 0.0), handle_in: Some(Point::new(100.0, 50.0)), handle_out: None },
        ];
        let points = sample_anchors(&anchors, &SampleOptions::default());

        assert!(points.len() > 10);
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert_eq!(*points.last().unwrap(), Point::new(100.0, 0.0));
        assert!(points.iter().any(|p| p.y > 30.0));
    }

    #[test]
    fn test_single_and_empty_paths() {
        assert!(sample_anchors(&[], &SampleOptions::default()).is_empty());
        let single = [Anchor::corner(Point::new(3.0, 4.0))];
        assert_eq!(sample_anchors(&single, &SampleOptions::default()), vec![Point::new(3.0, 4.0)]);
    }

    #[test]
    fn test_sample_paths_merges_junction() {
        let a = vec![Anchor::corner(Point::new(0.0, 0.0)), Anchor::corner(Point::new(5.0, 0.0))];
        let b = vec![Anchor::corner(Point::new(5.0, 0.0)), Anchor::corner(Point::new(5.0, 5.0))];
        let joined = sample_paths(&[a, b], &SampleOptions::default());
        assert_eq!(joined.len(), 3);
    }
}
