//! Emblem compositing
//!
//! Sprites arrive as decoded RGBA bitmaps. The background is recolored into a
//! two-color fill, the foreground into a soft-edged two-color mark, and the
//! mark is blended over the fill to give a fully opaque emblem.

pub mod composite;
pub mod mask;
pub mod palette;
pub mod recolor;

pub use composite::composite;
pub use mask::{DualToneMask, ToneMask};
pub use palette::{Color, PALETTE};
pub use recolor::{process_background, process_foreground};

use crate::png::FormatError;
use crate::{Error, Result};

/// A decoded image: `width * height` RGBA pixels, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Wrap an RGBA buffer, checking it holds exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> std::result::Result<Self, FormatError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(FormatError::BufferSize { expected, actual: pixels.len() });
        }
        Ok(Self { width, height, pixels })
    }

    /// A bitmap filled with one RGBA value
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA of the pixel at (x, y), if inside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Same-sized bitmap built by mapping every pixel.
    pub(crate) fn map_pixels<F>(&self, mut f: F) -> Bitmap
    where
        F: FnMut([u8; 4]) -> [u8; 4],
    {
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(4) {
            pixels.extend_from_slice(&f([px[0], px[1], px[2], px[3]]));
        }
        Bitmap { width: self.width, height: self.height, pixels }
    }
}

/// Colors chosen for one emblem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmblemColors {
    pub primary: Color,
    pub secondary: Color,
    pub foreground_primary: Color,
    pub foreground_secondary: Color,
    /// Alternate foreground variant (secondary color only)
    pub toggle: bool,
}

/// Run the full pipeline: recolor both layers, then blend the mark over the fill.
pub fn compose_emblem(foreground: &Bitmap, background: &Bitmap, colors: &EmblemColors) -> Result<Bitmap> {
    if foreground.width() != background.width() || foreground.height() != background.height() {
        return Err(Error::RenderError(format!(
            "layer size mismatch: foreground {}x{}, background {}x{}",
            foreground.width(),
            foreground.height(),
            background.width(),
            background.height()
        )));
    }

    let bg = process_background(background, colors.primary, colors.secondary);
    let fg = process_foreground(
        foreground,
        colors.foreground_primary,
        colors.foreground_secondary,
        colors.toggle,
    );
    composite(&bg, &fg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_checks_length() {
        assert!(Bitmap::new(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            Bitmap::new(2, 2, vec![0; 12]),
            Err(FormatError::BufferSize { expected: 16, actual: 12 })
        );
    }

    #[test]
    fn pixel_lookup() {
        let mut pixels = vec![0u8; 2 * 2 * 4];
        pixels[12..16].copy_from_slice(&[1, 2, 3, 4]);
        let b = Bitmap::new(2, 2, pixels).unwrap();
        assert_eq!(b.pixel(1, 1), Some([1, 2, 3, 4]));
        assert_eq!(b.pixel(2, 0), None);
    }

    #[test]
    fn white_mark_over_red_fill() {
        let red = palette::by_name("Red").unwrap();
        let blue = palette::by_name("Blue").unwrap();
        let white = palette::by_name("White").unwrap();
        let black = palette::by_name("Black").unwrap();

        let fg = Bitmap::filled(2, 2, [255, 255, 255, 255]);
        let bg = Bitmap::filled(2, 2, [255, 0, 0, 255]);
        let colors = EmblemColors {
            primary: red,
            secondary: blue,
            foreground_primary: white,
            foreground_secondary: black,
            toggle: false,
        };

        // fg: yellow 1 + blue 1 -> 50/50 white/black = 127.5 -> 128, alpha 255
        // bg: min(255, 0) = 0 -> all secondary, hidden under the opaque mark
        let out = compose_emblem(&fg, &bg, &colors).unwrap();
        assert_eq!(out, Bitmap::filled(2, 2, [128, 128, 128, 255]));
        assert_eq!(out, compose_emblem(&fg, &bg, &colors).unwrap());
    }

    #[test]
    fn mismatched_layers_are_rejected() {
        let colors = EmblemColors {
            primary: PALETTE[0],
            secondary: PALETTE[1],
            foreground_primary: PALETTE[2],
            foreground_secondary: PALETTE[3],
            toggle: false,
        };
        let err = compose_emblem(&Bitmap::filled(2, 2, [0; 4]), &Bitmap::filled(3, 2, [0; 4]), &colors);
        assert!(matches!(err, Err(Error::RenderError(_))));
    }
}
