use image::{GrayImage, Luma, RgbaImage};

use crate::{compositor::types::Frame, error::Result, path::Point};

/// Places a transformed foreground onto an output canvas
pub trait Compositor: Send + Sync {
    /// Returns the unique name of this compositor
    fn name(&self) -> &str;

    /// Draw `sprite` onto `canvas` with its top-left corner at `origin` and
    /// record the sprite's coverage in `mask`.
    ///
    /// `origin` may be negative or past the canvas edge; only the overlapping
    /// part is drawn. `mask` has the canvas dimensions.
    fn composite(&self, canvas: &mut Frame, mask: &mut GrayImage, sprite: &RgbaImage, origin: (i64, i64)) -> Result<()>;

    /// Top-left corner for a sprite drawn at `position`.
    ///
    /// With `center_anchor` the sprite's centre sits on the position.
    /// Coordinates are truncated towards zero.
    fn origin_for(&self, position: Point, sprite: &RgbaImage, center_anchor: bool) -> (i64, i64) {
        if center_anchor {
            (
                (position.x - f64::from(sprite.width()) / 2.0) as i64,
                (position.y - f64::from(sprite.height()) / 2.0) as i64,
            )
        } else {
            (position.x as i64, position.y as i64)
        }
    }
}

/// Source-over blending with the sprite's own alpha.
///
/// The mask receives the sprite's alpha verbatim wherever the sprite lands,
/// so it describes the foreground alone, not the finished frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlphaOverCompositor;

impl AlphaOverCompositor {
    pub fn new() -> Self {
        Self
    }
}

impl Compositor for AlphaOverCompositor {
    fn name(&self) -> &str {
        "alpha_over"
    }

    fn composite(&self, canvas: &mut Frame, mask: &mut GrayImage, sprite: &RgbaImage, origin: (i64, i64)) -> Result<()> {
        let (ox, oy) = origin;
        let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));

        // Visible window in sprite coordinates
        let x_start = (-ox).max(0);
        let y_start = (-oy).max(0);
        let x_end = (cw - ox).min(i64::from(sprite.width()));
        let y_end = (ch - oy).min(i64::from(sprite.height()));

        for sy in y_start..y_end {
            for sx in x_start..x_end {
                let [r, g, b, a] = sprite.get_pixel(sx as u32, sy as u32).0;
                let (x, y) = ((sx + ox) as u32, (sy + oy) as u32);
                canvas.blend_pixel(x, y, [r, g, b], a);
                mask.put_pixel(x, y, Luma([a]));
            }
        }

        Ok(())
    }
}
