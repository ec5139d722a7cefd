//! Physical unit conversion and display ranges per band category.

use projection::ProjectedCrop;
use sat_common::{Band, BandCategory};
use serde::{Deserialize, Serialize};

/// Kelvin to Celsius offset.
pub const KELVIN_OFFSET: f32 = 273.15;

/// Display range for brightness temperature bands (°C).
pub const THERMAL_RANGE: ValueRange = ValueRange { min: -80.0, max: 40.0 };

/// Display range for reflectance bands (reflectance factor).
pub const REFLECTIVE_RANGE: ValueRange = ValueRange { min: 0.0, max: 1.0 };

/// Unit transformation applied to raw values before colour mapping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum UnitTransform {
    /// No transformation
    #[default]
    None,
    /// Subtract a value (e.g., K→C: subtract 273.15)
    Subtract(f32),
}

impl UnitTransform {
    /// Apply the transformation to a value
    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        match self {
            Self::None => value,
            Self::Subtract(offset) => value - offset,
        }
    }

    pub fn for_category(category: BandCategory) -> Self {
        match category {
            BandCategory::Thermal => Self::Subtract(KELVIN_OFFSET),
            BandCategory::Reflective => Self::None,
        }
    }
}

/// Closed value interval used for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn for_category(category: BandCategory) -> Self {
        match category {
            BandCategory::Thermal => THERMAL_RANGE,
            BandCategory::Reflective => REFLECTIVE_RANGE,
        }
    }

    /// Position of `value` inside the range, clamped to `[0, 1]`.
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        let span = if span.abs() < f32::EPSILON { 1.0 } else { span };
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Value at fraction `t` of the range.
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }
}

/// A cropped field in display units.
#[derive(Debug, Clone)]
pub struct MappedField {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub range: ValueRange,
    pub category: BandCategory,
}

/// Convert a crop to display units for `band`.
///
/// Thermal bands go from Kelvin to Celsius; reflective bands are unchanged.
/// Any value that is not finite after conversion becomes exactly `0.0`.
pub fn map_units(crop: &ProjectedCrop, band: Band) -> MappedField {
    let category = band.category();
    let transform = UnitTransform::for_category(category);

    let data = crop
        .data
        .iter()
        .map(|&v| {
            let converted = transform.apply(v);
            if converted.is_finite() {
                converted
            } else {
                0.0
            }
        })
        .collect();

    MappedField {
        data,
        width: crop.width,
        height: crop.height,
        range: ValueRange::for_category(category),
        category,
    }
}
