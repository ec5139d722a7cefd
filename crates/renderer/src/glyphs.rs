//! Stroked segment glyphs for legend labels.
//!
//! No font files are shipped, so labels are drawn as 7-segment style strokes.
//! Supported: digits, `-`, `.`, `°` and `C`; other characters advance the pen
//! without drawing.

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

type Segment = ((f32, f32), (f32, f32));

/// Horizontal advance of a character as a fraction of the font size.
fn advance(ch: char, font_size: f32) -> f32 {
    match ch {
        '.' | '°' | ' ' => font_size * 0.35,
        _ => font_size * 0.7,
    }
}

/// Width of `text` when drawn at `font_size`.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(|c| advance(c, font_size)).sum()
}

/// Whether `ch` has a glyph.
pub fn is_supported(ch: char) -> bool {
    ch == '°' || !segments(ch, 1.0, 1.0).is_empty()
}

/// Segment outline of a character centred on the origin.
fn segments(ch: char, half_w: f32, half_h: f32) -> Vec<Segment> {
    match ch {
        '0' => vec![
            ((-half_w, -half_h), (half_w, -half_h)), // top
            ((half_w, -half_h), (half_w, half_h)),   // right
            ((half_w, half_h), (-half_w, half_h)),   // bottom
            ((-half_w, half_h), (-half_w, -half_h)), // left
        ],
        '1' => vec![((0.0, -half_h), (0.0, half_h))],
        '2' => vec![
            ((-half_w, -half_h), (half_w, -half_h)),
            ((half_w, -half_h), (half_w, 0.0)),
            ((half_w, 0.0), (-half_w, 0.0)),
            ((-half_w, 0.0), (-half_w, half_h)),
            ((-half_w, half_h), (half_w, half_h)),
        ],
        '3' => vec![
            ((-half_w, -half_h), (half_w, -half_h)),
            ((half_w, -half_h), (half_w, half_h)),
            ((half_w, half_h), (-half_w, half_h)),
            ((-half_w, 0.0), (half_w, 0.0)),
        ],
        '4' => vec![
            ((-half_w, -half_h), (-half_w, 0.0)),
            ((-half_w, 0.0), (half_w, 0.0)),
            ((half_w, -half_h), (half_w, half_h)),
        ],
        '5' => vec![
            ((half_w, -half_h), (-half_w, -half_h)),
            ((-half_w, -half_h), (-half_w, 0.0)),
            ((-half_w, 0.0), (half_w, 0.0)),
            ((half_w, 0.0), (half_w, half_h)),
            ((half_w, half_h), (-half_w, half_h)),
        ],
        '6' => vec![
            ((half_w, -half_h), (-half_w, -half_h)),
            ((-half_w, -half_h), (-half_w, half_h)),
            ((-half_w, half_h), (half_w, half_h)),
            ((half_w, half_h), (half_w, 0.0)),
            ((half_w, 0.0), (-half_w, 0.0)),
        ],
        '7' => vec![
            ((-half_w, -half_h), (half_w, -half_h)),
            ((half_w, -half_h), (0.0, half_h)),
        ],
        '8' => vec![
            ((-half_w, -half_h), (half_w, -half_h)),
            ((half_w, -half_h), (half_w, half_h)),
            ((half_w, half_h), (-half_w, half_h)),
            ((-half_w, half_h), (-half_w, -half_h)),
            ((-half_w, 0.0), (half_w, 0.0)),
        ],
        '9' => vec![
            ((-half_w, 0.0), (half_w, 0.0)),
            ((half_w, 0.0), (half_w, -half_h)),
            ((half_w, -half_h), (-half_w, -half_h)),
            ((-half_w, -half_h), (-half_w, 0.0)),
            ((half_w, 0.0), (half_w, half_h)),
        ],
        '-' => vec![((-half_w, 0.0), (half_w, 0.0))],
        '.' => vec![((0.0, half_h * 0.8), (0.0, half_h * 0.9))],
        'C' => vec![
            ((half_w, -half_h), (-half_w, -half_h)),
            ((-half_w, -half_h), (-half_w, half_h)),
            ((-half_w, half_h), (half_w, half_h)),
        ],
        _ => vec![],
    }
}

/// Draw `text` centred horizontally on `cx` with its vertical middle at `cy`.
pub fn draw_text(pixmap: &mut Pixmap, cx: f32, cy: f32, text: &str, font_size: f32, color: [u8; 4]) {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;

    let mut stroke = Stroke::default();
    stroke.width = (font_size * 0.12).max(1.0);
    stroke.line_cap = LineCap::Round;
    stroke.line_join = LineJoin::Round;

    let char_width = font_size * 0.45;
    let half_w = char_width / 2.0;
    let half_h = font_size / 2.0;

    let mut pen_x = cx - text_width(text, font_size) / 2.0;
    for ch in text.chars() {
        let step = advance(ch, font_size);
        let x = pen_x + step / 2.0;

        if ch == '°' {
            let r = font_size * 0.1;
            if let Some(path) = PathBuilder::from_circle(x, cy - half_h + r, r) {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        } else {
            for ((x1, y1), (x2, y2)) in segments(ch, half_w, half_h) {
                let mut pb = PathBuilder::new();
                pb.move_to(x + x1, cy + y1);
                pb.line_to(x + x2, cy + y2);
                if let Some(path) = pb.finish() {
                    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
                }
            }
        }

        pen_x += step;
    }
}
