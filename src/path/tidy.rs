use tracing::debug;

use crate::path::types::{Keyframe, PathDocument, Point};

/// Points closer than this to the previously kept point are dropped
pub const MIN_POINT_SPACING: f64 = 0.5;

/// Clean up hand-drawn path data for a canvas.
///
/// Every point is clamped into `[0, width-1] x [0, height-1]`, brush jitter
/// closer than [`MIN_POINT_SPACING`] is removed and keyframes without points
/// are dropped.
pub fn tidy(document: &PathDocument, canvas_width: u32, canvas_height: u32) -> PathDocument {
    let max_x = f64::from(canvas_width.saturating_sub(1));
    let max_y = f64::from(canvas_height.saturating_sub(1));
    let clamp = |p: &Point| Point::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y));

    let keyframes: Vec<Keyframe> = document
        .keyframes
        .iter()
        .filter(|kf| !kf.points.is_empty())
        .map(|kf| {
            let mut kept: Vec<Point> = Vec::with_capacity(kf.points.len());
            for point in kf.points.iter().map(clamp) {
                if kept.last().is_some_and(|last| last.distance(&point) < MIN_POINT_SPACING) {
                    continue;
                }
                kept.push(point);
            }

            if kept.len() != kf.points.len() {
                debug!("Keyframe {}: tidied {} points down to {}", kf.frame, kf.points.len(), kept.len());
            }

            Keyframe { points: kept, ..kf.clone() }
        })
        .collect();

    PathDocument::new(document.version.clone(), keyframes, document.metadata.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::types::{Direction, Metadata};

    #[test]
    fn test_clamps_and_drops_jitter() {
        let mut kf = Keyframe::new(
            4,
            vec![
                Point::new(-5.0, 3.0),
                Point::new(0.2, 3.1),
                Point::new(20.0, 700.0),
            ],
        );
        kf.direction = Direction::Reverse;
        let doc = PathDocument::new("1.0", vec![kf, Keyframe::new(9, vec![])], Metadata::new());

        let tidied = tidy(&doc, 100, 512);

        assert_eq!(tidied.keyframes.len(), 1);
        let kf = &tidied.keyframes[0];
        assert_eq!(kf.points, vec![Point::new(0.0, 3.0), Point::new(20.0, 511.0)]);
        assert_eq!(kf.direction, Direction::Reverse);
    }

    #[test]
    fn test_stacked_points_keep_first() {
        let doc = PathDocument::new(
            "0.0",
            vec![Keyframe::new(0, vec![Point::new(1.0, 1.0), Point::new(1.1, 1.1)])],
            Metadata::new(),
        );
        let tidied = tidy(&doc, 64, 64);
        assert_eq!(tidied.keyframes[0].points, vec![Point::new(1.0, 1.0)]);
        assert_eq!(tidied.version, "0.0");
    }
}
