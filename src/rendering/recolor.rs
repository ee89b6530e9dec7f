//! Background and foreground recolor passes

use super::mask::{DualToneMask, ToneMask};
use super::palette::Color;
use super::Bitmap;

/// Foreground pixels darker than this (mean of RGB) are background noise
const NOISE_BRIGHTNESS: f64 = 20.0;
/// Minimum combined tone signal for a visible foreground pixel
const MIN_SIGNAL: f64 = 0.05;
/// Denominator floor for the tone ratios
const RATIO_EPSILON: f64 = 0.001;
/// In the alternate variant, pixels this primary-dominated are dropped
const TOGGLE_PRIMARY_CUTOFF: f64 = 0.9;
/// Edge band of the soft alpha ramp
const EDGE_LOW: f64 = 0.1;
const EDGE_HIGH: f64 = 0.5;

/// Cubic smoothstep of `x` between `e0` and `e1`
pub fn smoothstep(e0: f64, e1: f64, x: f64) -> f64 {
    let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn blend(primary: Color, secondary: Color, pw: f64, sw: f64) -> [u8; 3] {
    let p = primary.channels();
    let s = secondary.channels();
    let mix = |i: usize| (p[i] as f64 * pw + s[i] as f64 * sw).clamp(0.0, 255.0).round() as u8;
    [mix(0), mix(1), mix(2)]
}

/// Recolor a background sprite with the default [`DualToneMask`].
pub fn process_background(src: &Bitmap, primary: Color, secondary: Color) -> Bitmap {
    process_background_with(&DualToneMask, src, primary, secondary)
}

/// Transparent pixels become solid `primary`; the rest blend primary and
/// secondary by the mask weight. Output is always opaque.
pub fn process_background_with<M: ToneMask>(mask: &M, src: &Bitmap, primary: Color, secondary: Color) -> Bitmap {
    src.map_pixels(|px| {
        if px[3] == 0 {
            return [primary.r, primary.g, primary.b, 255];
        }
        let pw = mask.background_weight(px);
        let [r, g, b] = blend(primary, secondary, pw, 1.0 - pw);
        [r, g, b, 255]
    })
}

/// Recolor a foreground sprite with the default [`DualToneMask`].
pub fn process_foreground(src: &Bitmap, primary: Color, secondary: Color, toggle: bool) -> Bitmap {
    process_foreground_with(&DualToneMask, src, primary, secondary, toggle)
}

/// Turn a foreground sprite into a soft-edged two-color mark.
///
/// With `toggle` set, primary-dominated pixels are dropped and everything
/// else is drawn in `secondary` only.
pub fn process_foreground_with<M: ToneMask>(
    mask: &M,
    src: &Bitmap,
    primary: Color,
    secondary: Color,
    toggle: bool,
) -> Bitmap {
    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    src.map_pixels(|px| {
        if px[3] == 0 {
            return CLEAR;
        }
        let brightness = (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0;
        if brightness < NOISE_BRIGHTNESS {
            return CLEAR;
        }

        let split = mask.foreground_split(px);
        let total = split.total();
        if total < MIN_SIGNAL {
            return CLEAR;
        }

        let mut primary_ratio = split.primary / total.max(RATIO_EPSILON);
        let mut secondary_ratio = split.secondary / total.max(RATIO_EPSILON);

        if toggle {
            if primary_ratio > TOGGLE_PRIMARY_CUTOFF {
                return CLEAR;
            }
            primary_ratio = 0.0;
            secondary_ratio = 1.0;
        }

        let alpha = (255.0 * smoothstep(EDGE_LOW, EDGE_HIGH, total)).round() as u8;
        let [r, g, b] = blend(primary, secondary, primary_ratio, secondary_ratio);
        [r, g, b, alpha]
    })
}
