//! Linear RGB color value.

use serde::{Deserialize, Serialize};

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
}

impl Color {
    /// Pure white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    /// Pure black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    /// The color assigned to color fields that declare no default.
    pub const DEFAULT: Self = Self::WHITE;

    /// Create a color from its three channels.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a packed `0xRRGGBB` integer.
    #[must_use]
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Parse a `#rrggbb` (or `rrggbb`) string.
    #[must_use]
    pub fn from_hex_str(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_hex)
    }

    /// Pack the color into a `0xRRGGBB` integer.
    #[must_use]
    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let c = Color::from_hex(0xff0000);
        assert_eq!(c, Color::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_hex_str_with_and_without_hash() {
        assert_eq!(Color::from_hex_str("#00ff00"), Some(Color::new(0.0, 1.0, 0.0)));
        assert_eq!(Color::from_hex_str("0000ff"), Some(Color::new(0.0, 0.0, 1.0)));
        assert_eq!(Color::from_hex_str("#fff"), None);
        assert_eq!(Color::from_hex_str("zzzzzz"), None);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(Color::WHITE.to_hex(), 0xffffff);
        assert_eq!(Color::from_hex(0x336699).to_hex(), 0x336699);
    }

    #[test]
    fn test_default_is_white() {
        assert_eq!(Color::default(), Color::WHITE);
    }
}
