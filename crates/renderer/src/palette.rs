//! Named colour palettes for satellite imagery.
//!
//! The palettes reproduce matplotlib's perceptually uniform maps: eleven
//! evenly spaced stops are expanded into a 256-entry lookup table, and a
//! normalized value `v` in `[0, 1]` picks entry `floor(v * 256)` clamped to 255.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gradient::{interpolate_color, Color};

/// Number of entries in a palette lookup table.
pub const LUT_SIZE: usize = 256;

/// Supported palettes. Anything else falls back to [`Palette::Inferno`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    #[default]
    Inferno,
    Viridis,
    Plasma,
    Gray,
}

const INFERNO: &[&str] = &[
    "#000004", "#160b39", "#420a68", "#6a176e", "#932667", "#bc3754", "#dd513a", "#f37819",
    "#fca50a", "#f6d746", "#fcffa4",
];

const VIRIDIS: &[&str] = &[
    "#440154", "#482475", "#414487", "#355f8d", "#2a788e", "#21918c", "#22a884", "#44bf70",
    "#7ad151", "#bddf26", "#fde725",
];

const PLASMA: &[&str] = &[
    "#0d0887", "#41049d", "#6a00a8", "#8f0da4", "#b12a90", "#cc4778", "#e16462", "#f2844b",
    "#fca636", "#fcce25", "#f0f921",
];

const GRAY: &[&str] = &["#000000", "#ffffff"];

impl Palette {
    pub const ALL: [Palette; 4] = [Palette::Inferno, Palette::Viridis, Palette::Plasma, Palette::Gray];

    /// Case-insensitive lookup with silent fallback to inferno.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Palette::Inferno => "inferno",
            Palette::Viridis => "viridis",
            Palette::Plasma => "plasma",
            Palette::Gray => "gray",
        }
    }

    /// Evenly spaced colour stops from low to high.
    pub fn stops(&self) -> &'static [&'static str] {
        match self {
            Palette::Inferno => INFERNO,
            Palette::Viridis => VIRIDIS,
            Palette::Plasma => PLASMA,
            Palette::Gray => GRAY,
        }
    }

    /// Expand the stops into a 256-entry lookup table.
    pub fn lut(&self) -> PaletteLut {
        let stops: Vec<Color> = self
            .stops()
            .iter()
            .filter_map(|hex| hex_to_rgb(hex))
            .map(|(r, g, b)| Color::new(r, g, b, 255))
            .collect();

        let segments = stops.len().saturating_sub(1).max(1);
        let colors = (0..LUT_SIZE)
            .map(|i| {
                let pos = i as f32 / (LUT_SIZE - 1) as f32 * segments as f32;
                let lo = (pos.floor() as usize).min(stops.len().saturating_sub(1));
                let hi = (lo + 1).min(stops.len().saturating_sub(1));
                match (stops.get(lo), stops.get(hi)) {
                    (Some(&a), Some(&b)) => interpolate_color(a, b, pos - lo as f32),
                    _ => Color::new(0, 0, 0, 255),
                }
            })
            .collect();

        PaletteLut { colors }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Precomputed colours of a palette.
#[derive(Debug, Clone)]
pub struct PaletteLut {
    colors: Vec<Color>,
}

impl PaletteLut {
    /// Palette index for a value already normalized to `[0, 1]`.
    #[inline]
    pub fn index_for(&self, normalized: f32) -> u8 {
        let n = self.colors.len();
        if n == 0 || !normalized.is_finite() {
            return 0;
        }
        let idx = (normalized.clamp(0.0, 1.0) * n as f32) as usize;
        idx.min(n - 1) as u8
    }

    #[inline]
    pub fn color(&self, index: u8) -> Color {
        self.colors
            .get(index as usize)
            .copied()
            .unwrap_or_else(Color::transparent)
    }

    pub fn color_for(&self, normalized: f32) -> Color {
        self.color(self.index_for(normalized))
    }

    /// Entries as RGBA tuples, the shape the indexed PNG encoder takes.
    pub fn rgba_entries(&self) -> Vec<(u8, u8, u8, u8)> {
        self.colors.iter().map(|c| (c.r, c.g, c.b, c.a)).collect()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}
