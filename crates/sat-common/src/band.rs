//! ABI spectral bands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bands at or above this number carry brightness temperature.
pub const THERMAL_BAND_THRESHOLD: u8 = 7;

/// What kind of physical quantity a band measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandCategory {
    /// Reflectance factor, nominally 0..1.
    Reflective,
    /// Brightness temperature in Kelvin.
    Thermal,
}

/// A GOES ABI band number (1-16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Band(u8);

impl Band {
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn category(&self) -> BandCategory {
        if self.0 >= THERMAL_BAND_THRESHOLD {
            BandCategory::Thermal
        } else {
            BandCategory::Reflective
        }
    }

    pub fn is_thermal(&self) -> bool {
        self.category() == BandCategory::Thermal
    }

    /// Channel tag as it appears in ABI object keys, e.g. `C13`.
    pub fn channel_tag(&self) -> String {
        format!("C{:02}", self.0)
    }
}

impl Default for Band {
    fn default() -> Self {
        Self(13)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Band {
    fn from(n: u8) -> Self {
        Self(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_category_boundary() {
        assert_eq!(Band::new(6).category(), BandCategory::Reflective);
        assert_eq!(Band::new(7).category(), BandCategory::Thermal);
        assert_eq!(Band::new(13).category(), BandCategory::Thermal);
        assert_eq!(Band::new(2).category(), BandCategory::Reflective);
    }

    #[test]
    fn test_channel_tag_is_zero_padded() {
        assert_eq!(Band::new(2).channel_tag(), "C02");
        assert_eq!(Band::new(13).channel_tag(), "C13");
    }
}
