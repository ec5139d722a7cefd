//! Cutting a geographic window out of a fixed-grid scene.

use netcdf_parser::{AxisEncoding, GoesScene};
use sat_common::{GeoWindow, SatError, SatResult};
use tracing::debug;

use crate::geostationary::Geostationary;

/// Sub-array of a scene covering a [`GeoWindow`].
///
/// Rows run north to south and columns west to east, regardless of how the
/// source file orders them.
#[derive(Debug, Clone)]
pub struct ProjectedCrop {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub perspective_point_height: f64,
    pub longitude_origin: f64,
    /// Selected extent on the projection plane in meters:
    /// (x_min, y_min, x_max, y_max).
    pub extent: (f64, f64, f64, f64),
}

impl ProjectedCrop {
    pub fn value(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }
}

/// Select the part of `scene` that covers `window`.
///
/// Every visible window corner is projected to scan angles and scaled by the
/// perspective height; the crop is the range of grid cells whose plane
/// coordinates fall inside the bounding box of those points. Corners hidden
/// behind the limb are skipped. No visible corner, or a selection without
/// rows or columns, is an "empty crop" error. A crop whose values are all
/// `NaN` is returned as is.
pub fn crop(scene: &GoesScene, window: &GeoWindow) -> SatResult<ProjectedCrop> {
    if scene.width == 0 || scene.height == 0 || scene.data.len() != scene.width * scene.height {
        return Err(SatError::Processing(format!(
            "scene has {} values for a {}x{} grid",
            scene.data.len(),
            scene.width,
            scene.height
        )));
    }

    let proj = Geostationary::from_scene(scene);
    let h = proj.perspective_point_height;

    let points: Vec<(f64, f64)> = window
        .corners()
        .iter()
        .filter_map(|&(lon, lat)| proj.geo_to_scan(lon, lat))
        .map(|(x, y)| proj.scan_to_plane(x, y))
        .collect();

    if points.is_empty() {
        return Err(SatError::Processing(
            "empty crop: window is not visible from the satellite".to_string(),
        ));
    }

    let x_min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let x_max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let y_min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let cols = index_span(&scene.x, x_min / h, x_max / h, scene.width);
    let rows = index_span(&scene.y, y_min / h, y_max / h, scene.height);

    let ((c0, c1), (r0, r1)) = match (cols, rows) {
        (Some(c), Some(r)) => (c, r),
        _ => return Err(SatError::Processing("empty crop: window is outside the scene".to_string())),
    };

    let width = c1 - c0 + 1;
    let height = r1 - r0 + 1;

    // North up: row order follows decreasing y, column order increasing x
    let row_order: Vec<usize> = if scene.y.scale_factor < 0.0 {
        (r0..=r1).collect()
    } else {
        (r0..=r1).rev().collect()
    };
    let col_order: Vec<usize> = if scene.x.scale_factor > 0.0 {
        (c0..=c1).collect()
    } else {
        (c0..=c1).rev().collect()
    };

    let mut data = Vec::with_capacity(width * height);
    for &row in &row_order {
        let base = row * scene.width;
        data.extend(col_order.iter().map(|&col| scene.data[base + col]));
    }

    debug!(
        cols = ?(c0, c1),
        rows = ?(r0, r1),
        width,
        height,
        "Cropped scene to window"
    );

    Ok(ProjectedCrop {
        data,
        width,
        height,
        perspective_point_height: h,
        longitude_origin: scene.projection.longitude_origin,
        extent: (x_min, y_min, x_max, y_max),
    })
}

/// Inclusive index range of grid cells whose coordinate lies in `[lo, hi]`.
fn index_span(axis: &AxisEncoding, lo: f64, hi: f64, len: usize) -> Option<(usize, usize)> {
    if axis.scale_factor == 0.0 {
        return None;
    }
    let a = axis.index_of(lo);
    let b = axis.index_of(hi);
    let first = a.min(b).ceil().max(0.0);
    let last = a.max(b).floor().min(len as f64 - 1.0);
    if !first.is_finite() || !last.is_finite() || first > last {
        return None;
    }
    Some((first as usize, last as usize))
}
