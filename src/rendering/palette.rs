//! The shared 18-entry emblem palette

/// An opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Palette names, index-aligned with [`PALETTE`]
pub const PALETTE_NAMES: [&str; 18] = [
    "White", "Steel", "Red", "Orange", "Gold", "Olive", "Green", "Sage", "Cyan",
    "Teal", "Cobalt", "Blue", "Violet", "Purple", "Pink", "Crimson", "Brown", "Black",
];

pub const PALETTE: [Color; 18] = [
    Color::rgb(255, 255, 255),
    Color::rgb(110, 110, 110),
    Color::rgb(255, 0, 0),
    Color::rgb(255, 128, 0),
    Color::rgb(255, 204, 0),
    Color::rgb(128, 128, 0),
    Color::rgb(0, 160, 0),
    Color::rgb(140, 190, 140),
    Color::rgb(0, 220, 220),
    Color::rgb(0, 128, 128),
    Color::rgb(0, 71, 171),
    Color::rgb(0, 0, 255),
    Color::rgb(138, 43, 226),
    Color::rgb(128, 0, 128),
    Color::rgb(255, 105, 180),
    Color::rgb(160, 16, 40),
    Color::rgb(120, 72, 32),
    Color::rgb(0, 0, 0),
];

/// Palette entry by index
pub fn color(index: usize) -> Option<Color> {
    PALETTE.get(index).copied()
}

/// Palette entry by (case-insensitive) name
pub fn by_name(name: &str) -> Option<Color> {
    PALETTE_NAMES
        .iter()
        .position(|n| n.eq_ignore_ascii_case(name))
        .map(|i| PALETTE[i])
}
