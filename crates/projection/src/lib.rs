//! Coordinate transformations for geostationary imagery.
//!
//! Implements the GOES fixed-grid projection from scratch and uses it to cut
//! a geographic window out of a full-disk scene.

pub mod crop;
pub mod geostationary;

pub use crop::{crop, ProjectedCrop};
pub use geostationary::Geostationary;
