use image::{Rgb, RgbImage};

use crate::path::{smooth_path, PathDocument, Point};

/// Line colours, cycled per keyframe
const PALETTE: [[u8; 3]; 6] = [
    [255, 80, 80],
    [80, 200, 255],
    [120, 255, 120],
    [255, 210, 60],
    [220, 120, 255],
    [255, 255, 255],
];

/// Half-width of the square marking each keyframe's first point
const MARKER_RADIUS: i64 = 2;

/// Draw every keyframe's path on a black canvas.
///
/// With `smooth` the paths are drawn as the spline the resolver follows
/// instead of the authored polyline. Points off the canvas are clipped.
pub fn render_preview(
    document: &PathDocument,
    width: u32,
    height: u32,
    smooth: bool,
    samples_per_segment: usize,
) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);

    for (i, keyframe) in document.keyframes.iter().enumerate() {
        let color = Rgb(PALETTE[i % PALETTE.len()]);
        let points = if smooth {
            smooth_path(&keyframe.points, samples_per_segment)
        } else {
            keyframe.points.clone()
        };

        for pair in points.windows(2) {
            draw_line(&mut canvas, pair[0], pair[1], color);
        }
        if let Some(start) = points.first() {
            draw_marker(&mut canvas, *start, color);
        }
    }

    canvas
}

fn put(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(canvas.width()) && y < i64::from(canvas.height()) {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

/// DDA line, one pixel per step along the major axis
fn draw_line(canvas: &mut RgbImage, from: Point, to: Point, color: Rgb<u8>) {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;

    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let p = from.lerp(&to, t);
        put(canvas, p.x.round() as i64, p.y.round() as i64, color);
    }
}

fn draw_marker(canvas: &mut RgbImage, at: Point, color: Rgb<u8>) {
    let (cx, cy) = (at.x.round() as i64, at.y.round() as i64);
    for y in cy - MARKER_RADIUS..=cy + MARKER_RADIUS {
        for x in cx - MARKER_RADIUS..=cx + MARKER_RADIUS {
            put(canvas, x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::codec::parse;

    #[test]
    fn test_draws_paths_and_markers() {
        let doc = parse("0:2,10;30,10|5:20,0;20,30").unwrap();
        let image = render_preview(&doc, 32, 32, false, 10);

        assert_eq!(image.get_pixel(15, 10).0, PALETTE[0]);
        assert_eq!(image.get_pixel(20, 25).0, PALETTE[1]);
        // Marker around the first keyframe's start
        assert_eq!(image.get_pixel(0, 12).0, PALETTE[0]);
        assert_eq!(image.get_pixel(5, 5).0, [0, 0, 0]);
    }

    #[test]
    fn test_clips_off_canvas_points() {
        let doc = parse("0:-50,-50;100,100").unwrap();
        let image = render_preview(&doc, 8, 8, true, 4);
        assert_eq!(image.get_pixel(4, 4).0, PALETTE[0]);
    }
}
