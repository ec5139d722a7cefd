//! Decode, crop, map and render one downloaded scene.
//!
//! Everything here is CPU bound and blocking; callers run it under
//! `spawn_blocking`.

use std::path::Path;

use netcdf_parser::SceneDecoder;
use renderer::{map_units, render_pair, RenderSpec, RenderedPair};
use sat_common::{GeoWindow, SatResult};
use tracing::debug;

pub fn render_scene(
    decoder: &dyn SceneDecoder,
    path: &Path,
    window: &GeoWindow,
    spec: &RenderSpec,
) -> SatResult<RenderedPair> {
    let scene = decoder.decode(path)?;
    debug!(
        width = scene.width,
        height = scene.height,
        valid = scene.valid_count(),
        "Decoded scene"
    );

    let cropped = projection::crop(&scene, window)?;
    debug!(width = cropped.width, height = cropped.height, "Cropped to window");

    let field = map_units(&cropped, spec.band);
    Ok(render_pair(&field, spec)?)
}
