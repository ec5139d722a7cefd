//! NetCDF parser for satellite data (GOES-R ABI).
//!
//! Reads ABI L2 Cloud and Moisture Imagery (`CMI`) files into a
//! [`GoesScene`]: scaled values with fill replaced by `NaN`, the fixed-grid
//! coordinate encoding and the `goes_imager_projection` parameters.
//!
//! # Implementation Notes
//!
//! The default [`NcdumpDecoder`] shells out to the `ncdump` command-line tool,
//! so the service needs no native NetCDF/HDF5 libraries. With the
//! `native-netcdf` feature, [`NativeDecoder`] reads the file through libnetcdf.
//!
//! # GOES-R ABI Data Structure
//!
//! GOES-R ABI files use the geostationary projection with coordinates in radians.
//! The main data variable is `CMI` which contains either reflectance factors
//! (bands 1-6) or brightness temperatures (bands 7-16).

pub mod error;
pub mod ncdump;
pub mod projection;
pub mod scene;

#[cfg(feature = "native-netcdf")]
pub mod native;

use std::path::Path;

pub use error::{NetCdfError, NetCdfResult};
pub use ncdump::NcdumpDecoder;
pub use projection::GoesProjection;
pub use scene::{AxisEncoding, GoesScene};

#[cfg(feature = "native-netcdf")]
pub use native::NativeDecoder;

/// Turns a downloaded scene file into a [`GoesScene`].
///
/// Decoding is blocking; async callers run it under `spawn_blocking`.
pub trait SceneDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> NetCdfResult<GoesScene>;
}

/// The decoder selected at build time.
pub fn default_decoder() -> Box<dyn SceneDecoder> {
    #[cfg(feature = "native-netcdf")]
    {
        Box::new(NativeDecoder::new())
    }
    #[cfg(not(feature = "native-netcdf"))]
    {
        Box::new(NcdumpDecoder::new())
    }
}
