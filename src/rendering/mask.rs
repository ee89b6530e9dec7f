//! How sprite channels encode the primary/secondary split
//!
//! Emblem sprites are authored as two-tone masks: the "yellow" part (the
//! smaller of red and green) marks primary-colored areas and blue marks
//! secondary-colored areas. The recolor passes only ask a [`ToneMask`] for
//! strengths, so the convention can be swapped or tested on its own.

/// Primary/secondary strengths read from one sprite pixel, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSplit {
    pub primary: f64,
    pub secondary: f64,
}

impl ToneSplit {
    pub fn total(&self) -> f64 {
        self.primary + self.secondary
    }
}

pub trait ToneMask {
    /// Weight of the primary color for a background pixel
    fn background_weight(&self, px: [u8; 4]) -> f64;

    /// Primary/secondary signal strengths for a foreground pixel
    fn foreground_split(&self, px: [u8; 4]) -> ToneSplit;
}

/// Yellow (min of red, green) is primary, blue is secondary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DualToneMask;

impl DualToneMask {
    fn yellow(px: [u8; 4]) -> f64 {
        px[0].min(px[1]) as f64 / 255.0
    }
}

impl ToneMask for DualToneMask {
    fn background_weight(&self, px: [u8; 4]) -> f64 {
        Self::yellow(px)
    }

    fn foreground_split(&self, px: [u8; 4]) -> ToneSplit {
        ToneSplit {
            primary: Self::yellow(px),
            secondary: px[2] as f64 / 255.0,
        }
    }
}
