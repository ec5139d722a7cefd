//! Native NetCDF parsing using the netcdf library.
//!
//! Enabled with the `native-netcdf` feature. Faster than the ncdump
//! subprocess but links libnetcdf and HDF5 into the process.

use std::path::Path;
use std::sync::Once;
use tracing::{debug, instrument};

use crate::error::{NetCdfError, NetCdfResult};
use crate::projection::GoesProjection;
use crate::scene::{AxisEncoding, GoesScene};
use crate::SceneDecoder;

/// Silence HDF5's automatic error printing to stderr.
///
/// HDF5 prints diagnostics even for errors the Rust side handles, such as a
/// lookup of an optional attribute. Safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 with null handlers is the documented way to
        // turn automatic error printing off.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Decoder backed by libnetcdf.
#[derive(Debug, Clone, Default)]
pub struct NativeDecoder;

impl NativeDecoder {
    pub fn new() -> Self {
        silence_hdf5_errors();
        Self
    }
}

impl SceneDecoder for NativeDecoder {
    #[instrument(skip(self))]
    fn decode(&self, path: &Path) -> NetCdfResult<GoesScene> {
        let nc_file = netcdf::open(path)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

        let width = nc_file
            .dimension("x")
            .ok_or_else(|| NetCdfError::MissingData("x dimension".to_string()))?
            .len();
        let height = nc_file
            .dimension("y")
            .ok_or_else(|| NetCdfError::MissingData("y dimension".to_string()))?
            .len();

        let cmi_var = nc_file
            .variable("CMI")
            .ok_or_else(|| NetCdfError::MissingData("CMI variable".to_string()))?;

        // Packed values, read without the library's own unpacking
        let raw_data: Vec<i16> = cmi_var
            .get_values(..)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read CMI: {}", e)))?;

        let scale_factor = get_f64_attr(&cmi_var, "scale_factor").unwrap_or(1.0);
        let add_offset = get_f64_attr(&cmi_var, "add_offset").unwrap_or(0.0);
        let fill_value = get_i16_attr(&cmi_var, "_FillValue").unwrap_or(-1);
        let unsigned = get_string_attr(&cmi_var, "_Unsigned")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let data: Vec<f32> = raw_data
            .iter()
            .map(|&val| {
                if val == fill_value {
                    f32::NAN
                } else {
                    let raw = if unsigned { val as u16 as f64 } else { val as f64 };
                    (raw * scale_factor + add_offset) as f32
                }
            })
            .collect();

        let x_var = nc_file
            .variable("x")
            .ok_or_else(|| NetCdfError::MissingData("x variable".to_string()))?;
        let x = AxisEncoding::new(
            get_f64_attr(&x_var, "scale_factor").unwrap_or(1.4e-05),
            get_f64_attr(&x_var, "add_offset").unwrap_or(-0.101353),
        );

        let y_var = nc_file
            .variable("y")
            .ok_or_else(|| NetCdfError::MissingData("y variable".to_string()))?;
        let y = AxisEncoding::new(
            get_f64_attr(&y_var, "scale_factor").unwrap_or(-1.4e-05),
            get_f64_attr(&y_var, "add_offset").unwrap_or(0.128233),
        );

        let proj_var = nc_file
            .variable("goes_imager_projection")
            .ok_or_else(|| NetCdfError::MissingData("goes_imager_projection variable".to_string()))?;
        let defaults = GoesProjection::default();
        let projection = GoesProjection {
            perspective_point_height: get_f64_attr(&proj_var, "perspective_point_height")
                .unwrap_or(defaults.perspective_point_height),
            semi_major_axis: get_f64_attr(&proj_var, "semi_major_axis").unwrap_or(defaults.semi_major_axis),
            semi_minor_axis: get_f64_attr(&proj_var, "semi_minor_axis").unwrap_or(defaults.semi_minor_axis),
            longitude_origin: get_f64_attr(&proj_var, "longitude_of_projection_origin")
                .unwrap_or(defaults.longitude_origin),
            sweep_angle_axis: get_string_attr(&proj_var, "sweep_angle_axis").unwrap_or(defaults.sweep_angle_axis),
        };

        let band_id = nc_file
            .variable("band_id")
            .and_then(|v| v.get_values::<u8, _>(..).ok())
            .and_then(|v| v.first().copied());

        debug!(width, height, ?band_id, "Decoded scene via libnetcdf");

        Ok(GoesScene {
            data,
            width,
            height,
            projection,
            x,
            y,
            band_id,
            time: None,
        })
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_i16_attr(var: &netcdf::Variable, name: &str) -> Option<i16> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    i16::try_from(attr_value).ok()
}

fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
