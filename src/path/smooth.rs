use crate::path::types::Point;

/// Interpolated points inserted per original segment when none is configured
pub const DEFAULT_SAMPLES_PER_SEGMENT: usize = 10;

/// Evaluate the uniform Catmull-Rom basis for the segment `p1 -> p2`
pub fn catmull_rom(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let t2 = t * t;
    let t3 = t2 * t;

    let axis = |a: f64, b: f64, c: f64, d: f64| {
        0.5 * ((2.0 * b)
            + (-a + c) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };

    Point::new(axis(p0.x, p1.x, p2.x, p3.x), axis(p0.y, p1.y, p2.y, p3.y))
}

/// Densify a polyline with a Catmull-Rom spline.
///
/// Each original segment contributes `samples_per_segment` points at
/// `t = j / samples_per_segment`, and the final original point is appended
/// once, so the curve still starts and ends on the authored points. Inputs
/// with fewer than three points have no curvature and are returned as-is.
/// End segments reuse the boundary point as the missing control point.
pub fn smooth_path(points: &[Point], samples_per_segment: usize) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let samples = samples_per_segment.max(1);
    let last = points.len() - 1;
    let mut smoothed = Vec::with_capacity(last * samples + 1);

    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];

        for j in 0..samples {
            let t = j as f64 / samples as f64;
            smoothed.push(catmull_rom(p0, p1, p2, p3, t));
        }
    }

    smoothed.push(points[last]);
    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_short_inputs_unchanged() {
        assert!(smooth_path(&[], 10).is_empty());

        let one = [Point::new(1.0, 2.0)];
        assert_eq!(smooth_path(&one, 10), one.to_vec());

        let two = [Point::new(0.0, 0.0), Point::new(5.0, 5.0)];
        assert_eq!(smooth_path(&two, 10), two.to_vec());
    }

    #[test]
    fn test_passes_through_original_points() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let smoothed = smooth_path(&points, 10);

        assert_eq!(smoothed.len(), 3 * 10 + 1);
        for (i, original) in points.iter().enumerate().take(3) {
            assert!(approx(smoothed[i * 10], *original));
        }
        assert_eq!(*smoothed.last().unwrap(), points[3]);
    }

    #[test]
    fn test_interior_curves_away_from_chord() {
        let points = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let smoothed = smooth_path(&points, 4);

        // Halfway along the first segment the curve bulges below the x axis
        let mid = smoothed[2];
        assert!(mid.x > 4.0 && mid.x < 6.0);
        assert!(mid.y < 0.0);
    }

    #[test]
    fn test_collinear_points_stay_on_line() {
        let points = [Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)];
        for p in smooth_path(&points, 7) {
            assert!((p.x - p.y).abs() < 1e-9);
        }
    }
}
