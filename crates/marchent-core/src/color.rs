//! Trail colours.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB colour written into the grid. `Color::EMPTY` is the unoccupied sentinel,
/// so no live marcher may carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const EMPTY: Color = Color([0, 0, 0]);

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Scalar intensity stored on all three channels
    pub fn gray(value: u8) -> Self {
        Self([value; 3])
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn channels(&self) -> [u8; 3] {
        self.0
    }

    /// Maps the sentinel to the dimmest visible colour
    pub fn or_visible(self) -> Self {
        if self.is_empty() {
            Self::gray(1)
        } else {
            self
        }
    }

    /// Hue in degrees `[0, 360)`, saturation and value in `[0, 1]`
    pub fn to_hsv(&self) -> (f32, f32, f32) {
        let [r, g, b] = self.0.map(|c| c as f32 / 255.0);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let saturation = if max == 0.0 { 0.0 } else { delta / max };

        (hue, saturation, max)
    }

    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let hue = hue.rem_euclid(360.0);
        let saturation = saturation.clamp(0.0, 1.0);
        let value = value.clamp(0.0, 1.0);

        let chroma = value * saturation;
        let x = chroma * (1.0 - ((hue / 60.0).rem_euclid(2.0) - 1.0).abs());
        let m = value - chroma;

        let (r, g, b) = match (hue / 60.0) as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let to_byte = |c: f32| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self([to_byte(r), to_byte(g), to_byte(b)])
    }
}

impl From<[u8; 3]> for Color {
    fn from(channels: [u8; 3]) -> Self {
        Self(channels)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}
