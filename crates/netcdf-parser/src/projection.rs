//! GOES ABI projection metadata.
//!
//! The values come from the `goes_imager_projection` variable of an ABI L2
//! file. The coordinate math lives in the `projection` crate; this type only
//! carries what the file says.

/// GOES ABI projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GoesProjection {
    /// Satellite height above the ellipsoid (meters)
    pub perspective_point_height: f64,
    /// Semi-major axis of Earth ellipsoid (meters)
    pub semi_major_axis: f64,
    /// Semi-minor axis of Earth ellipsoid (meters)
    pub semi_minor_axis: f64,
    /// Longitude of satellite nadir point (degrees)
    pub longitude_origin: f64,
    /// Sweep angle axis ("x" for GOES-R)
    pub sweep_angle_axis: String,
}

impl Default for GoesProjection {
    fn default() -> Self {
        // GOES-East (GOES-19 took over the 75.2°W slot from GOES-16)
        Self {
            perspective_point_height: 35786023.0,
            semi_major_axis: 6378137.0,
            semi_minor_axis: 6356752.31414,
            longitude_origin: -75.2,
            sweep_angle_axis: "x".to_string(),
        }
    }
}
