//! Horizontal colour bar legend.

use sat_common::BandCategory;
use tiny_skia::{Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::error::{RenderError, RenderResult};
use crate::glyphs::draw_text;
use crate::palette::PaletteLut;
use crate::png::create_png_auto;
use crate::units::ValueRange;

/// Fractions of the range that get a tick and a label.
pub const TICK_FRACTIONS: [f32; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

const INK: [u8; 4] = [33, 33, 33, 255];

/// Legend geometry in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendLayout {
    pub width: u32,
    pub height: u32,
    pub margin_x: f32,
    pub bar_top: f32,
    pub bar_height: f32,
    pub tick_length: f32,
    pub font_size: f32,
}

impl Default for LegendLayout {
    fn default() -> Self {
        Self {
            width: 512,
            height: 64,
            margin_x: 28.0,
            bar_top: 6.0,
            bar_height: 22.0,
            tick_length: 5.0,
            font_size: 11.0,
        }
    }
}

impl LegendLayout {
    /// Default proportions scaled to a given width.
    pub fn for_width(width: u32) -> Self {
        let base = Self::default();
        let k = width as f32 / base.width as f32;
        Self {
            width,
            height: ((base.height as f32 * k).round() as u32).max(32),
            margin_x: base.margin_x * k,
            bar_top: base.bar_top * k,
            bar_height: base.bar_height * k,
            tick_length: base.tick_length * k,
            font_size: (base.font_size * k).max(8.0),
        }
    }

    fn bar_span(&self) -> (f32, f32) {
        let x0 = self.margin_x;
        let x1 = self.width as f32 - self.margin_x;
        (x0, x1)
    }
}

/// Label text for each tick: `-80°C` style for thermal bands, `0.25` style
/// for reflective ones.
pub fn tick_labels(range: ValueRange, category: BandCategory) -> Vec<String> {
    TICK_FRACTIONS
        .iter()
        .map(|&f| {
            let value = range.lerp(f);
            match category {
                BandCategory::Thermal => format!("{:.0}°C", value),
                BandCategory::Reflective => format!("{:.2}", value),
            }
        })
        .collect()
}

/// Render the legend as straight RGBA pixels on a transparent background.
pub fn render_legend_rgba(
    lut: &PaletteLut,
    range: ValueRange,
    category: BandCategory,
    layout: &LegendLayout,
) -> RenderResult<Vec<u8>> {
    let mut pixmap = Pixmap::new(layout.width, layout.height).ok_or(RenderError::InvalidDimensions {
        width: layout.width as usize,
        height: layout.height as usize,
    })?;

    let (x0, x1) = layout.bar_span();
    let bar_width = (x1 - x0).max(1.0);
    let bar_bottom = layout.bar_top + layout.bar_height;

    // Colour bar, one column at a time
    let columns = bar_width.round() as u32;
    let mut paint = Paint::default();
    paint.anti_alias = false;
    for col in 0..columns {
        let t = if columns > 1 { col as f32 / (columns - 1) as f32 } else { 0.0 };
        let c = lut.color_for(t);
        paint.set_color_rgba8(c.r, c.g, c.b, 255);
        if let Some(rect) = Rect::from_xywh(x0 + col as f32, layout.bar_top, 1.0, layout.bar_height) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    let mut ink = Paint::default();
    ink.set_color_rgba8(INK[0], INK[1], INK[2], INK[3]);
    ink.anti_alias = true;
    let mut stroke = Stroke::default();
    stroke.width = 1.0;

    // Outline
    if let Some(rect) = Rect::from_xywh(x0, layout.bar_top, bar_width, layout.bar_height) {
        let path = PathBuilder::from_rect(rect);
        pixmap.stroke_path(&path, &ink, &stroke, Transform::identity(), None);
    }

    // Ticks and labels
    let label_y = bar_bottom + layout.tick_length + 2.0 + layout.font_size / 2.0;
    for (&f, label) in TICK_FRACTIONS.iter().zip(tick_labels(range, category)) {
        let x = x0 + f * bar_width;
        let mut pb = PathBuilder::new();
        pb.move_to(x, bar_bottom);
        pb.line_to(x, bar_bottom + layout.tick_length);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &ink, &stroke, Transform::identity(), None);
        }
        draw_text(&mut pixmap, x, label_y, &label, layout.font_size, INK);
    }

    let mut rgba = Vec::with_capacity(pixmap.pixels().len() * 4);
    for p in pixmap.pixels() {
        let c = p.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(rgba)
}

/// Render the legend and encode it as PNG.
pub fn render_legend(
    lut: &PaletteLut,
    range: ValueRange,
    category: BandCategory,
    layout: &LegendLayout,
) -> RenderResult<Vec<u8>> {
    let rgba = render_legend_rgba(lut, range, category, layout)?;
    create_png_auto(&rgba, layout.width as usize, layout.height as usize)
}
