//! Decoded ABI scene.

use chrono::{DateTime, Utc};

use crate::projection::GoesProjection;

/// Linear packing of a coordinate variable: `value = index * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisEncoding {
    pub scale_factor: f64,
    pub add_offset: f64,
}

impl AxisEncoding {
    pub fn new(scale_factor: f64, add_offset: f64) -> Self {
        Self {
            scale_factor,
            add_offset,
        }
    }

    /// Scan angle (radians) at grid index `i`.
    pub fn value_at(&self, i: usize) -> f64 {
        i as f64 * self.scale_factor + self.add_offset
    }

    /// Fractional grid index of a scan angle.
    pub fn index_of(&self, value: f64) -> f64 {
        (value - self.add_offset) / self.scale_factor
    }
}

/// One ABI CMI field with its geolocation.
///
/// `data` is row-major, `height` rows of `width` values, with fill values
/// already replaced by `NaN` and scale/offset applied (reflectance factor for
/// bands 1-6, brightness temperature in Kelvin for bands 7-16).
#[derive(Debug, Clone)]
pub struct GoesScene {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub projection: GoesProjection,
    pub x: AxisEncoding,
    pub y: AxisEncoding,
    /// Band number when the file records it.
    pub band_id: Option<u8>,
    /// Mid-scan time when the file records it.
    pub time: Option<DateTime<Utc>>,
}

impl GoesScene {
    pub fn value(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Number of values that are not fill.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }
}
