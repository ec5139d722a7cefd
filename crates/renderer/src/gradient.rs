//! Gradient rendering of a mapped field into a palette image.

use rayon::prelude::*;

use crate::error::{RenderError, RenderResult};
use crate::palette::PaletteLut;
use crate::png::create_png_indexed;
use crate::units::{MappedField, ValueRange};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)) as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)) as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)) as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)) as u8,
    )
}

/// Resample grid data to a different resolution using bilinear interpolation.
///
/// # Arguments
/// - `data`: Input grid data (row-major order)
/// - `src_width`: Source grid width
/// - `src_height`: Source grid height
/// - `dst_width`: Destination grid width
/// - `dst_height`: Destination grid height
///
/// # Returns
/// Resampled grid data at the requested resolution. Corner samples of the
/// output coincide with corner samples of the input.
pub fn resample_grid(
    data: &[f32],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
) -> Vec<f32> {
    if src_width == dst_width && src_height == dst_height {
        // No resampling needed
        return data.to_vec();
    }
    if src_width == 0 || src_height == 0 {
        return vec![0.0; dst_width * dst_height];
    }

    let ratio = |src: usize, dst: usize| {
        if dst <= 1 {
            0.0
        } else {
            (src - 1) as f32 / (dst - 1) as f32
        }
    };
    let x_ratio = ratio(src_width, dst_width);
    let y_ratio = ratio(src_height, dst_height);

    let mut output = vec![0.0f32; dst_width * dst_height];

    output
        .par_chunks_mut(dst_width.max(1))
        .enumerate()
        .for_each(|(y, row)| {
            let src_y = y as f32 * y_ratio;
            let y1 = (src_y.floor() as usize).min(src_height - 1);
            let y2 = (y1 + 1).min(src_height - 1);
            let dy = src_y - y1 as f32;

            for (x, out) in row.iter_mut().enumerate() {
                let src_x = x as f32 * x_ratio;
                let x1 = (src_x.floor() as usize).min(src_width - 1);
                let x2 = (x1 + 1).min(src_width - 1);
                let dx = src_x - x1 as f32;

                // Get the four surrounding values
                let v11 = data.get(y1 * src_width + x1).copied().unwrap_or(0.0);
                let v21 = data.get(y1 * src_width + x2).copied().unwrap_or(0.0);
                let v12 = data.get(y2 * src_width + x1).copied().unwrap_or(0.0);
                let v22 = data.get(y2 * src_width + x2).copied().unwrap_or(0.0);

                // Interpolate
                let v1 = v11 * (1.0 - dx) + v21 * dx;
                let v2 = v12 * (1.0 - dx) + v22 * dx;
                *out = v1 * (1.0 - dy) + v2 * dy;
            }
        });

    output
}

/// Map each value to a palette index after normalizing against `range`.
pub fn palette_indices(data: &[f32], range: ValueRange, lut: &PaletteLut) -> Vec<u8> {
    data.par_iter()
        .map(|&v| lut.index_for(range.normalize(v)))
        .collect()
}

/// Render a mapped field as a square `size`×`size` PNG.
///
/// No axes, borders or padding: every pixel is data.
pub fn render_field(field: &MappedField, lut: &PaletteLut, size: usize) -> RenderResult<Vec<u8>> {
    if size == 0 || field.width == 0 || field.height == 0 {
        return Err(RenderError::InvalidDimensions {
            width: field.width,
            height: field.height,
        });
    }

    let resampled = resample_grid(&field.data, field.width, field.height, size, size);
    let indices = palette_indices(&resampled, field.range, lut);
    create_png_indexed(size, size, &lut.rgba_entries(), &indices)
}
