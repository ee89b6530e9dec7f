//! "Over" blend of the recolored foreground onto the recolored background

use super::Bitmap;
use crate::{Error, Result};

/// Blend `foreground` over `background`.
///
/// Fully transparent foreground pixels copy the background pixel verbatim,
/// alpha included. Every other pixel comes out opaque.
pub fn composite(background: &Bitmap, foreground: &Bitmap) -> Result<Bitmap> {
    if background.width() != foreground.width() || background.height() != foreground.height() {
        return Err(Error::RenderError("composite layers differ in size".into()));
    }

    let mut pixels = Vec::with_capacity(background.pixels().len());
    for (bg, fg) in background
        .pixels()
        .chunks_exact(4)
        .zip(foreground.pixels().chunks_exact(4))
    {
        if fg[3] == 0 {
            pixels.extend_from_slice(bg);
            continue;
        }
        let alpha = fg[3] as f64 / 255.0;
        for i in 0..3 {
            let v = fg[i] as f64 * alpha + bg[i] as f64 * (1.0 - alpha);
            pixels.push(v.round() as u8);
        }
        pixels.push(255);
    }

    Bitmap::new(background.width(), background.height(), pixels).map_err(Error::from)
}
