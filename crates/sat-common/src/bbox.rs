//! Geographic region of interest.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A lon/lat window in degrees, used to crop satellite scenes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoWindow {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoWindow {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Mendoza province and the surrounding Andes.
    pub fn mendoza() -> Self {
        Self::new(-70.5, -37.5, -66.5, -32.0)
    }

    /// Parse "min_lon,min_lat,max_lon,max_lat".
    pub fn parse(s: &str) -> Result<Self, WindowParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(WindowParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(parts.iter()) {
            *slot = part
                .parse()
                .map_err(|_| WindowParseError::InvalidNumber(part.to_string()))?;
        }

        let window = Self::new(values[0], values[1], values[2], values[3]);
        if window.min_lon >= window.max_lon || window.min_lat >= window.max_lat {
            return Err(WindowParseError::Inverted(s.to_string()));
        }
        Ok(window)
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Corners as (lon, lat): lower-left, lower-right, upper-left, upper-right.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_lon, self.min_lat),
            (self.max_lon, self.min_lat),
            (self.min_lon, self.max_lat),
            (self.max_lon, self.max_lat),
        ]
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

impl Default for GeoWindow {
    fn default() -> Self {
        Self::mendoza()
    }
}

impl FromStr for GeoWindow {
    type Err = WindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum WindowParseError {
    #[error("Invalid window format, expected 'min_lon,min_lat,max_lon,max_lat': {0}")]
    InvalidFormat(String),

    #[error("Invalid number in window: {0}")]
    InvalidNumber(String),

    #[error("Window minimum is not below maximum: {0}")]
    Inverted(String),
}
