//! Marker colors and the landmark locator.
//!
//! Maps are annotated by painting pixels in exact marker colors. START
//! and END pixels bound a segment to re-route, PATH pixels are the only
//! traversable cells, and a SEAM pixel picks where a closed loop begins.
//! Every other color is an obstacle.

use std::fmt;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::types::GridCell;

/// Semantic role of a map pixel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Start of a segment to re-route.
    Start,
    /// End of a segment to re-route.
    End,
    /// Traversable cell.
    Path,
    /// Where the closed loop should begin after rotation.
    Seam,
}

impl Marker {
    /// Built-in color of this marker.
    #[must_use]
    pub const fn default_color(self) -> Rgb<u8> {
        match self {
            Self::Start => Rgb([0x11, 0xff, 0x00]),
            Self::End => Rgb([0x0a, 0x00, 0xff]),
            Self::Path => Rgb([0x84, 0x36, 0x7b]),
            Self::Seam => Rgb([0xf6, 0xff, 0x00]),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::End => "END",
            Self::Path => "PATH",
            Self::Seam => "SEAM",
        };
        f.write_str(name)
    }
}

/// Exact color assigned to each [`Marker`].
///
/// Serialized as `#rrggbb` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerPalette {
    /// START marker color.
    #[serde(with = "hex_serde")]
    pub start: Rgb<u8>,
    /// END marker color.
    #[serde(with = "hex_serde")]
    pub end: Rgb<u8>,
    /// Traversable cell color.
    #[serde(with = "hex_serde")]
    pub path: Rgb<u8>,
    /// SEAM marker color.
    #[serde(with = "hex_serde")]
    pub seam: Rgb<u8>,
}

impl MarkerPalette {
    /// Color bound to `marker`.
    #[must_use]
    pub const fn color(&self, marker: Marker) -> Rgb<u8> {
        match marker {
            Marker::Start => self.start,
            Marker::End => self.end,
            Marker::Path => self.path,
            Marker::Seam => self.seam,
        }
    }
}

impl Default for MarkerPalette {
    fn default() -> Self {
        Self {
            start: Marker::Start.default_color(),
            end: Marker::End.default_color(),
            path: Marker::Path.default_color(),
            seam: Marker::Seam.default_color(),
        }
    }
}

/// Error returned by [`parse_hex_color`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color '{0}': expected six hex digits like #84367b")]
pub struct ColorParseError(pub String);

/// Parse a `#rrggbb` string. The leading `#` is optional and letters are
/// case-insensitive.
///
/// # Errors
///
/// Returns [`ColorParseError`] unless the input is exactly six hex digits
/// after the optional `#`.
pub fn parse_hex_color(s: &str) -> Result<Rgb<u8>, ColorParseError> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorParseError(s.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| ColorParseError(s.to_string()))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Format a color as lowercase `#rrggbb`.
#[must_use]
pub fn to_hex_color(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Every pixel of `image` whose color equals `color`.
///
/// Scans each pixel exactly once in row-major order (top-to-bottom,
/// left-to-right), so the first element is the first match in scan order.
#[must_use]
pub fn find_markers(image: &RgbImage, color: Rgb<u8>) -> Vec<GridCell> {
    image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| **pixel == color)
        .map(|(x, y, _)| GridCell::new(i64::from(x), i64::from(y)))
        .collect()
}

/// First pixel of `image` matching `color` in scan order.
#[must_use]
pub fn find_first_marker(image: &RgbImage, color: Rgb<u8>) -> Option<GridCell> {
    image
        .enumerate_pixels()
        .find(|(_, _, pixel)| **pixel == color)
        .map(|(x, y, _)| GridCell::new(i64::from(x), i64::from(y)))
}

/// Color at `cell`, or `None` when the cell lies outside the raster.
#[must_use]
pub fn color_at(image: &RgbImage, cell: GridCell) -> Option<Rgb<u8>> {
    let x = u32::try_from(cell.x).ok()?;
    let y = u32::try_from(cell.y).ok()?;
    image.get_pixel_checked(x, y).copied()
}

mod hex_serde {
    use image::Rgb;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Rgb<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex_color(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgb<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_hex_color(&s).map_err(serde::de::Error::custom)
    }
}
