//! Image rendering for satellite imagery.
//!
//! - Unit mapping per band category ([`units`])
//! - Named palettes expanded to lookup tables ([`palette`])
//! - Bilinear resampling and palette colouring ([`gradient`])
//! - Colour bar legends with segment-glyph labels ([`legend`], [`glyphs`])
//! - PNG encoding ([`png`])

pub mod error;
pub mod glyphs;
pub mod gradient;
pub mod legend;
pub mod palette;
pub mod png;
pub mod units;

use sat_common::Band;

pub use error::{RenderError, RenderResult};
pub use legend::LegendLayout;
pub use palette::{Palette, PaletteLut};
pub use units::{map_units, MappedField, ValueRange};

/// Default edge length of the square data image.
pub const DEFAULT_IMAGE_SIZE: usize = 512;

/// Everything needed to render one band in one palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSpec {
    pub band: Band,
    pub palette: Palette,
    pub range: ValueRange,
    pub size: usize,
}

impl RenderSpec {
    /// Unknown palette names render as inferno.
    pub fn new(band: Band, palette_name: &str, size: usize) -> Self {
        Self {
            band,
            palette: Palette::from_name(palette_name),
            range: ValueRange::for_category(band.category()),
            size,
        }
    }
}

/// Encoded data image and legend for one field.
#[derive(Debug, Clone)]
pub struct RenderedPair {
    pub image_png: Vec<u8>,
    pub legend_png: Vec<u8>,
}

/// Render the data image and its legend with the same palette and range.
pub fn render_pair(field: &MappedField, spec: &RenderSpec) -> RenderResult<RenderedPair> {
    let lut = spec.palette.lut();
    let image_png = gradient::render_field(field, &lut, spec.size)?;
    let layout = LegendLayout::for_width(spec.size as u32);
    let legend_png = legend::render_legend(&lut, field.range, field.category, &layout)?;
    Ok(RenderedPair {
        image_png,
        legend_png,
    })
}
