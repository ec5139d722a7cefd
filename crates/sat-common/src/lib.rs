//! Common types and utilities shared by the satellite pipeline crates and the
//! Nimbus API service.

pub mod band;
pub mod bbox;
pub mod error;
pub mod time;

pub use band::{Band, BandCategory, THERMAL_BAND_THRESHOLD};
pub use bbox::GeoWindow;
pub use error::{SatError, SatResult};
pub use time::{Clock, ManualClock, SystemClock, TimeBucket};
