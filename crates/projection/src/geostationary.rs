//! Geostationary satellite projection.
//!
//! This projection is used for GOES-R series satellite imagery.
//! The satellite views Earth from a fixed position above the equator,
//! and coordinates are expressed as scan angles in radians from nadir.
//!
//! Reference: GOES-R Product Definition and Users' Guide (PUG) Volume 4,
//! Section 4.2.8 (sweep angle axis "x").

use netcdf_parser::GoesScene;

/// Geostationary projection parameters.
///
/// These parameters define the projection from geographic (lat/lon) to
/// satellite scan angle (x, y) coordinates and vice versa.
#[derive(Debug, Clone)]
pub struct Geostationary {
    /// Satellite distance from Earth center (meters)
    /// This is perspective_point_height + semi_major_axis
    pub h: f64,
    /// Perspective point height above Earth surface (meters)
    pub perspective_point_height: f64,
    /// Semi-major axis of Earth ellipsoid (meters)
    pub req: f64,
    /// Semi-minor axis of Earth ellipsoid (meters)
    pub rpol: f64,
    /// Longitude of satellite nadir point (radians)
    pub lambda_0: f64,
    /// X coordinate of first grid point (radians)
    pub x_origin: f64,
    /// Y coordinate of first grid point (radians)
    pub y_origin: f64,
    /// Grid spacing in X direction (radians)
    pub dx: f64,
    /// Grid spacing in Y direction (radians, negative when rows run north to south)
    pub dy: f64,
    /// Number of grid points in X direction
    pub nx: usize,
    /// Number of grid points in Y direction
    pub ny: usize,
}

impl Geostationary {
    /// Create a new Geostationary projection from GOES NetCDF parameters.
    ///
    /// # Arguments
    /// * `perspective_point_height` - Satellite altitude above Earth surface (meters)
    /// * `semi_major_axis` - Earth equatorial radius (meters)
    /// * `semi_minor_axis` - Earth polar radius (meters)
    /// * `longitude_origin_deg` - Satellite longitude (degrees, negative for west)
    /// * `x_origin` - X coordinate of first column (radians)
    /// * `y_origin` - Y coordinate of first row (radians)
    /// * `dx` - X grid spacing (radians)
    /// * `dy` - Y grid spacing (radians, typically negative for north-to-south)
    /// * `nx` - Number of X grid points
    /// * `ny` - Number of Y grid points
    #[allow(clippy::too_many_arguments)]
    pub fn from_goes(
        perspective_point_height: f64,
        semi_major_axis: f64,
        semi_minor_axis: f64,
        longitude_origin_deg: f64,
        x_origin: f64,
        y_origin: f64,
        dx: f64,
        dy: f64,
        nx: usize,
        ny: usize,
    ) -> Self {
        Self {
            h: perspective_point_height + semi_major_axis,
            perspective_point_height,
            req: semi_major_axis,
            rpol: semi_minor_axis,
            lambda_0: longitude_origin_deg.to_radians(),
            x_origin,
            y_origin,
            dx,
            dy,
            nx,
            ny,
        }
    }

    /// Projection of a decoded scene, using the file's own grid encoding.
    pub fn from_scene(scene: &GoesScene) -> Self {
        let p = &scene.projection;
        Self::from_goes(
            p.perspective_point_height,
            p.semi_major_axis,
            p.semi_minor_axis,
            p.longitude_origin,
            scene.x.add_offset,
            scene.y.add_offset,
            scene.x.scale_factor,
            scene.y.scale_factor,
            scene.width,
            scene.height,
        )
    }

    /// GOES-East (75.2°W) full disk at 2 km, the grid of the IR bands.
    pub fn goes_east_full_disk() -> Self {
        Self::from_goes(
            35786023.0,    // perspective_point_height
            6378137.0,     // semi_major_axis (GRS80)
            6356752.31414, // semi_minor_axis
            -75.2,         // longitude_origin
            -0.151844,     // x_origin (west edge, radians)
            0.151844,      // y_origin (north edge, radians)
            0.000056,      // dx (radians per pixel)
            -0.000056,     // dy (radians per pixel, negative = south)
            5424,          // nx
            5424,          // ny
        )
    }

    /// Convert scan angles (x, y) to grid indices (i, j).
    #[inline]
    pub fn scan_to_grid(&self, x: f64, y: f64) -> (f64, f64) {
        let i = (x - self.x_origin) / self.dx;
        let j = (y - self.y_origin) / self.dy;
        (i, j)
    }

    /// Scan angles scaled to meters on the projection plane, the unit
    /// PROJ's `geos` projection works in.
    #[inline]
    pub fn scan_to_plane(&self, x_rad: f64, y_rad: f64) -> (f64, f64) {
        (
            x_rad * self.perspective_point_height,
            y_rad * self.perspective_point_height,
        )
    }

    /// Convert scan angles (radians) to geographic coordinates (lon/lat degrees).
    ///
    /// Returns None if the scan angle points to space (off Earth).
    pub fn scan_to_geo(&self, x_rad: f64, y_rad: f64) -> Option<(f64, f64)> {
        let sin_x = x_rad.sin();
        let cos_x = x_rad.cos();
        let sin_y = y_rad.sin();
        let cos_y = y_rad.cos();

        // Quadratic coefficients for finding distance to Earth surface
        let a = sin_x.powi(2)
            + cos_x.powi(2) * (cos_y.powi(2) + (self.req / self.rpol).powi(2) * sin_y.powi(2));
        let b = -2.0 * self.h * cos_x * cos_y;
        let c = self.h.powi(2) - self.req.powi(2);

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None; // Scan angle points to space
        }

        let rs = (-b - discriminant.sqrt()) / (2.0 * a);

        // 3D coordinates (satellite-centered, Earth-fixed)
        let sx = rs * cos_x * cos_y;
        let sy = -rs * sin_x;
        let sz = rs * cos_x * sin_y;

        // Convert to geodetic coordinates
        let lat = ((self.req / self.rpol).powi(2) * sz / (self.h - sx).hypot(sy)).atan();
        let lon = self.lambda_0 - sy.atan2(self.h - sx);

        Some((lon.to_degrees(), lat.to_degrees()))
    }

    /// Convert geographic coordinates (lon/lat degrees) to scan angles (radians).
    ///
    /// Returns None if the point is not visible from the satellite.
    pub fn geo_to_scan(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let lat_rad = lat_deg.to_radians();
        let lon_rad = lon_deg.to_radians();

        // Beyond the limb: more than acos(Re / H) of arc from nadir
        let dlon = lon_rad - self.lambda_0;
        let cos_c = lat_rad.cos() * dlon.cos();
        let horizon_angle = (self.req / self.h).acos();
        if cos_c.acos() > horizon_angle {
            return None;
        }

        // Geocentric latitude (accounting for Earth's oblateness)
        let phi_c = ((self.rpol / self.req).powi(2) * lat_rad.tan()).atan();

        // Eccentricity squared
        let e2 = 1.0 - (self.rpol / self.req).powi(2);

        // Radius from Earth center to surface point
        let rc = self.rpol / (1.0 - e2 * phi_c.cos().powi(2)).sqrt();

        // 3D coordinates (satellite-centered, Earth-fixed)
        let sx = self.h - rc * phi_c.cos() * dlon.cos();
        let sy = -rc * phi_c.cos() * dlon.sin();
        let sz = rc * phi_c.sin();

        // PUG visibility test: the surface point faces the satellite
        if self.h * (self.h - sx) < sy.powi(2) + (self.req / self.rpol).powi(2) * sz.powi(2) {
            return None;
        }

        let range = (sx.powi(2) + sy.powi(2) + sz.powi(2)).sqrt();
        let x_rad = (-sy / range).asin();
        let y_rad = (sz / sx).atan();

        Some((x_rad, y_rad))
    }

    /// Convert geographic coordinates (lon/lat degrees) to grid indices (i, j).
    ///
    /// Returns None if the point is not visible from the satellite.
    pub fn geo_to_grid(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let (x, y) = self.geo_to_scan(lon_deg, lat_deg)?;
        Some(self.scan_to_grid(x, y))
    }

    /// Check if a geographic point is within the grid and visible.
    pub fn contains(&self, lon_deg: f64, lat_deg: f64) -> bool {
        if let Some((i, j)) = self.geo_to_grid(lon_deg, lat_deg) {
            i >= 0.0 && i < self.nx as f64 && j >= 0.0 && j < self.ny as f64
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mendoza_inside_full_disk() {
        let proj = Geostationary::goes_east_full_disk();

        let (lon, lat) = (-68.84, -32.89); // Mendoza city

        let (i, j) = proj
            .geo_to_grid(lon, lat)
            .expect("Mendoza should be visible from GOES-East");

        assert!((0.0..5424.0).contains(&i), "i should be in grid, got {}", i);
        assert!((0.0..5424.0).contains(&j), "j should be in grid, got {}", j);
        // South of the equator and east of nadir
        assert!(j > 2712.0, "row should be in the southern half, got {}", j);
        assert!(i > 2712.0, "column should be east of nadir column, got {}", i);
    }

    #[test]
    fn test_roundtrip_off_equator() {
        let proj = Geostationary::goes_east_full_disk();

        for &(lon, lat) in &[(-70.5, -37.5), (-66.5, -32.0), (-45.0, 20.0), (-100.0, 40.0)] {
            let (x, y) = proj.geo_to_scan(lon, lat).expect("visible");
            let (lon2, lat2) = proj.scan_to_geo(x, y).expect("on disk");
            assert!(
                (lon - lon2).abs() < 1e-6,
                "Longitude roundtrip failed: {} vs {}",
                lon,
                lon2
            );
            assert!(
                (lat - lat2).abs() < 1e-6,
                "Latitude roundtrip failed: {} vs {}",
                lat,
                lat2
            );
        }
    }

    #[test]
    fn test_nadir() {
        let proj = Geostationary::goes_east_full_disk();

        let (lon, lat) = proj.scan_to_geo(0.0, 0.0).expect("nadir is on Earth");
        assert!((lon - (-75.2)).abs() < 1e-9, "Nadir longitude should be -75.2, got {}", lon);
        assert!(lat.abs() < 1e-9, "Nadir latitude should be 0, got {}", lat);

        let (x, y) = proj.geo_to_scan(-75.2, 0.0).expect("nadir is visible");
        assert!(x.abs() < 1e-12 && y.abs() < 1e-12);
    }

    #[test]
    fn test_far_side_not_visible() {
        let proj = Geostationary::goes_east_full_disk();
        assert!(proj.geo_to_scan(100.0, 0.0).is_none());
        assert!(proj.geo_to_scan(-75.2, 89.0).is_none());
        assert!(!proj.contains(139.7, 35.7));
    }

    #[test]
    fn test_scan_into_space() {
        let proj = Geostationary::goes_east_full_disk();
        // 0.2 rad is well past the ~0.151 rad Earth disk edge
        assert!(proj.scan_to_geo(0.2, 0.0).is_none());
    }

    #[test]
    fn test_plane_coordinates() {
        let proj = Geostationary::goes_east_full_disk();
        let (xm, ym) = proj.scan_to_plane(0.01, -0.02);
        assert!((xm - 357860.23).abs() < 1e-6);
        assert!((ym + 715720.46).abs() < 1e-6);
    }
}
