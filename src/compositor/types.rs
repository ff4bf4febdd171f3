use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage, RgbaImage};
use tracing::debug;

use crate::error::{RasterError, Result};

/// One RGB output canvas
///
/// A thin wrapper around an RGB buffer with the pixel helpers the
/// compositors need.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// A black canvas
    pub fn new_black(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self { buffer: ImageBuffer::from_pixel(width, height, Rgb(color)) }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Blend `color` over the pixel at `x, y` with coverage `alpha` (0-255)
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: [u8; 3], alpha: u8) {
        if alpha == 0 {
            return;
        }
        let a = u32::from(alpha);
        let pixel = self.buffer.get_pixel_mut(x, y);
        for (dst, src) in pixel.0.iter_mut().zip(color) {
            let mixed = u32::from(src) * a + u32::from(*dst) * (255 - a);
            *dst = ((mixed + 127) / 255) as u8;
        }
    }

    pub fn into_image(self) -> RgbImage {
        self.buffer
    }
}

/// A composited frame and the foreground coverage mask that goes with it
#[derive(Clone, Debug)]
pub struct RenderedFrame {
    pub index: u32,
    pub image: RgbImage,
    pub mask: GrayImage,
}

impl RenderedFrame {
    /// The untouched background with an empty mask
    pub fn background_only(index: u32, background: &RgbImage) -> Self {
        Self {
            index,
            image: background.clone(),
            mask: GrayImage::from_pixel(background.width(), background.height(), Luma([0])),
        }
    }

    pub fn frame_file_name(index: u32) -> String {
        format!("frame_{:06}.png", index)
    }

    pub fn mask_file_name(index: u32) -> String {
        format!("mask_{:06}.png", index)
    }

    /// Write `frame_NNNNNN.png` and `mask_NNNNNN.png` into `dir`
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        let frame_path = dir.join(Self::frame_file_name(self.index));
        let mask_path = dir.join(Self::mask_file_name(self.index));

        debug!("Saving frame to: {}", frame_path.display());

        self.image.save(&frame_path).map_err(|e| RasterError::SaveFailed {
            path: frame_path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.mask.save(&mask_path).map_err(|e| RasterError::SaveFailed {
            path: mask_path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

/// Load a background or any opaque raster
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    Ok(open(path.as_ref())?.to_rgb8())
}

/// Load a foreground, keeping its alpha channel
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    Ok(open(path.as_ref())?.to_rgba8())
}

/// Load a mask as 8-bit luminance (white keeps, black hides)
pub fn load_mask<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    Ok(open(path.as_ref())?.to_luma8())
}

fn open(path: &Path) -> Result<image::DynamicImage> {
    let image = image::open(path).map_err(|_| RasterError::LoadFailed { path: path.display().to_string() })?;
    debug!("Loaded {} ({}x{})", path.display(), image.width(), image.height());
    Ok(image)
}
