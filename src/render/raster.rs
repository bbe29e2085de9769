use image::{DynamicImage, GrayImage, Luma};

/// Foreground pixel of a two-colour layer.
pub const INK: Luma<u8> = Luma([0]);
/// Background pixel of a two-colour layer.
pub const PAPER: Luma<u8> = Luma([255]);

const THRESHOLD: u8 = 128;

/// Black base layer plus coloured overlay layer, same dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPair {
    pub base: GrayImage,
    pub overlay: GrayImage,
}

impl RasterPair {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            base: blank(width, height),
            overlay: blank(width, height),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.base.dimensions()
    }
}

pub fn blank(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, PAPER)
}

/// Reduces any decoded image to pure INK/PAPER pixels.
pub fn binarize(img: &DynamicImage) -> GrayImage {
    let mut gray = img.to_luma8();
    for pixel in gray.pixels_mut() {
        *pixel = if pixel.0[0] < THRESHOLD { INK } else { PAPER };
    }
    gray
}

#[cfg(test)]
pub fn ink_count(img: &GrayImage) -> usize {
    img.pixels().filter(|p| **p == INK).count()
}
