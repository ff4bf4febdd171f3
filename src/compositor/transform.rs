//! Raster operations applied to foregrounds before they are composited.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::motion::EffectParams;

/// Rotations at or below this many degrees are skipped
const ROTATION_THRESHOLD: f64 = 0.01;

/// Largest side a scaled foreground may reach
const MAX_SCALED_EDGE: f64 = 16384.0;

/// How a batch of foregrounds is brought to a common size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    /// Largest width and largest height across the batch
    #[default]
    Largest,
    /// Size of the first image
    First,
    /// A square of the configured custom size
    Custom,
    /// Leave every image as it is
    Original,
}

impl std::str::FromStr for SizeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "largest" | "max" => Ok(SizeMode::Largest),
            "first" => Ok(SizeMode::First),
            "custom" => Ok(SizeMode::Custom),
            "original" => Ok(SizeMode::Original),
            other => Err(format!("unknown size mode '{}'", other)),
        }
    }
}

/// Resize by independent factors. A factor pair that collapses either side
/// to zero pixels, or grows either side past `MAX_SCALED_EDGE`, leaves the
/// image unchanged.
pub fn scale(image: &RgbaImage, scale_x: f64, scale_y: f64) -> RgbaImage {
    if scale_x == 1.0 && scale_y == 1.0 {
        return image.clone();
    }

    let width = (f64::from(image.width()) * scale_x).trunc();
    let height = (f64::from(image.height()) * scale_y).trunc();
    if !(width.is_finite() && height.is_finite()) || width > MAX_SCALED_EDGE || height > MAX_SCALED_EDGE {
        warn!(
            "Ignoring scale {}x{}: {}x{} foreground would exceed {} pixels per side",
            scale_x,
            scale_y,
            image.width(),
            image.height(),
            MAX_SCALED_EDGE
        );
        return image.clone();
    }
    if width < 1.0 || height < 1.0 {
        return image.clone();
    }

    imageops::resize(image, width as u32, height as u32, FilterType::Lanczos3)
}

/// Rotate clockwise by `degrees`, growing the canvas to hold the whole
/// result; uncovered corners are transparent
pub fn rotate(image: &RgbaImage, degrees: f64) -> RgbaImage {
    if degrees.abs() <= ROTATION_THRESHOLD {
        return image.clone();
    }

    let (sin, cos) = degrees.to_radians().sin_cos();
    let (w, h) = (f64::from(image.width()), f64::from(image.height()));
    let out_w = ((w * cos.abs() + h * sin.abs()) - 1e-6).ceil().max(1.0) as u32;
    let out_h = ((w * sin.abs() + h * cos.abs()) - 1e-6).ceil().max(1.0) as u32;

    let (src_cx, src_cy) = (w / 2.0, h / 2.0);
    let (dst_cx, dst_cy) = (f64::from(out_w) / 2.0, f64::from(out_h) / 2.0);

    RgbaImage::from_fn(out_w, out_h, |x, y| {
        let dx = f64::from(x) + 0.5 - dst_cx;
        let dy = f64::from(y) + 0.5 - dst_cy;
        let sx = dx * cos + dy * sin + src_cx;
        let sy = -dx * sin + dy * cos + src_cy;
        sample_bilinear(image, sx, sy)
    })
}

/// Bilinear sample at continuous coordinates (pixel centres at `i + 0.5`),
/// premultiplied so transparent neighbours do not darken edges
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let fx = x - 0.5;
    let fy = y - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let (tx, ty) = (fx - x0, fy - y0);

    let texel = |ix: f64, iy: f64| -> [f64; 4] {
        if ix < 0.0 || iy < 0.0 || ix >= f64::from(image.width()) || iy >= f64::from(image.height()) {
            return [0.0; 4];
        }
        let p = image.get_pixel(ix as u32, iy as u32).0;
        let a = f64::from(p[3]);
        [f64::from(p[0]) * a, f64::from(p[1]) * a, f64::from(p[2]) * a, a]
    };

    let taps = [
        (texel(x0, y0), (1.0 - tx) * (1.0 - ty)),
        (texel(x0 + 1.0, y0), tx * (1.0 - ty)),
        (texel(x0, y0 + 1.0), (1.0 - tx) * ty),
        (texel(x0 + 1.0, y0 + 1.0), tx * ty),
    ];

    let mut acc = [0.0f64; 4];
    for (value, weight) in taps {
        for (sum, v) in acc.iter_mut().zip(value) {
            *sum += v * weight;
        }
    }

    let alpha = acc[3];
    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |premultiplied: f64| (premultiplied / alpha).round().clamp(0.0, 255.0) as u8;
    Rgba([channel(acc[0]), channel(acc[1]), channel(acc[2]), alpha.round().clamp(0.0, 255.0) as u8])
}

/// Multiply alpha by `opacity` (clamped to `[0, 1]`)
pub fn apply_opacity(image: &mut RgbaImage, opacity: f64) {
    if opacity >= 1.0 {
        return;
    }
    let opacity = opacity.max(0.0);
    for pixel in image.pixels_mut() {
        pixel.0[3] = (f64::from(pixel.0[3]) * opacity) as u8;
    }
}

/// Scale, rotate, flip and fade a foreground, in that order
pub fn apply_effects(image: &RgbaImage, effects: &EffectParams) -> RgbaImage {
    let mut result = scale(image, effects.scale_x, effects.scale_y);
    result = rotate(&result, effects.rotation);

    if effects.flip_x {
        imageops::flip_horizontal_in_place(&mut result);
    }
    if effects.flip_y {
        imageops::flip_vertical_in_place(&mut result);
    }

    apply_opacity(&mut result, effects.opacity);
    result
}

/// Multiply a mask into the image's alpha channel; white keeps, black hides.
/// A mask of a different size is first resized to the image.
pub fn apply_mask(image: &mut RgbaImage, mask: &GrayImage) {
    let resized;
    let mask = if mask.dimensions() == image.dimensions() {
        mask
    } else {
        debug!(
            "Resizing mask {}x{} to foreground {}x{}",
            mask.width(),
            mask.height(),
            image.width(),
            image.height()
        );
        resized = imageops::resize(mask, image.width(), image.height(), FilterType::Lanczos3);
        &resized
    };

    for (pixel, coverage) in image.pixels_mut().zip(mask.pixels()) {
        let combined = u32::from(pixel.0[3]) * u32::from(coverage.0[0]) / 255;
        pixel.0[3] = combined as u8;
    }
}

/// Target size for a batch under `mode`, `None` when images keep their size
fn target_size(images: &[RgbaImage], mode: SizeMode, custom_size: u32) -> Option<(u32, u32)> {
    match mode {
        SizeMode::Original => None,
        SizeMode::Custom => Some((custom_size, custom_size)),
        SizeMode::First => images.first().map(RgbaImage::dimensions),
        SizeMode::Largest => {
            let width = images.iter().map(RgbaImage::width).max()?;
            let height = images.iter().map(RgbaImage::height).max()?;
            Some((width, height))
        }
    }
}

fn letterbox_size(from: (u32, u32), to: (u32, u32)) -> (u32, u32, u32, u32) {
    let factor = (f64::from(to.0) / f64::from(from.0)).min(f64::from(to.1) / f64::from(from.1));
    let width = ((f64::from(from.0) * factor) as u32).clamp(1, to.0.max(1));
    let height = ((f64::from(from.1) * factor) as u32).clamp(1, to.1.max(1));
    (width, height, (to.0 - width) / 2, (to.1 - height) / 2)
}

/// Fit inside `width x height` keeping aspect ratio, centred on a transparent canvas
pub fn resize_with_padding(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let (fit_w, fit_h, x, y) = letterbox_size(image.dimensions(), (width, height));
    let resized = imageops::resize(image, fit_w, fit_h, FilterType::Lanczos3);

    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    imageops::replace(&mut canvas, &resized, i64::from(x), i64::from(y));
    canvas
}

/// Mask counterpart of [`resize_with_padding`], letterboxed in black
pub fn resize_mask_with_padding(mask: &GrayImage, width: u32, height: u32) -> GrayImage {
    if mask.dimensions() == (width, height) || mask.width() == 0 || mask.height() == 0 {
        return mask.clone();
    }

    let (fit_w, fit_h, x, y) = letterbox_size(mask.dimensions(), (width, height));
    let resized = imageops::resize(mask, fit_w, fit_h, FilterType::Lanczos3);

    let mut canvas = GrayImage::from_pixel(width, height, Luma([0]));
    imageops::replace(&mut canvas, &resized, i64::from(x), i64::from(y));
    canvas
}

/// Bring a batch of foregrounds to one size and bake their masks into alpha.
///
/// Masks pair with images by position; when there are fewer masks than
/// images the last mask is reused, and extra masks are ignored.
pub fn prepare_batch(
    images: Vec<RgbaImage>,
    masks: &[GrayImage],
    mode: SizeMode,
    custom_size: u32,
) -> Vec<RgbaImage> {
    let target = target_size(&images, mode, custom_size);
    if let Some((width, height)) = target {
        debug!("Normalizing {} foregrounds to {}x{} ({:?})", images.len(), width, height, mode);
    }

    images
        .into_iter()
        .enumerate()
        .map(|(i, image)| {
            let mut image = match target {
                Some((width, height)) => resize_with_padding(&image, width, height),
                None => image,
            };

            if let Some(mask) = masks.get(i).or_else(|| masks.last()) {
                match target {
                    Some((width, height)) => apply_mask(&mut image, &resize_mask_with_padding(mask, width, height)),
                    None => apply_mask(&mut image, mask),
                }
            }
            image
        })
        .collect()
}
