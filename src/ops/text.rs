use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cache for rasterized glyph pixel data. Key: (GlyphId, font_size_bits).
/// Value: (pixels as (x, y, coverage), bounds_min_x at origin, bounds_min_y at origin).
pub type GlyphPixelCache = HashMap<(GlyphId, u32), (Vec<(u32, u32, f32)>, f32, f32)>;

/// Text alignment inside the text box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Lay out a single line of text at baseline `y = 0`.
/// Returns `(glyphs, total_width)`; glyph x positions already include the
/// alignment offset relative to the anchor.
pub fn layout_line(
    font: &FontArc,
    text: &str,
    font_size: f32,
    alignment: TextAlignment,
) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(font_size);

    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }

    let offset = match alignment {
        TextAlignment::Left => 0.0,
        TextAlignment::Center => -cursor_x * 0.5,
        TextAlignment::Right => -cursor_x,
    };
    for glyph in &mut glyphs {
        glyph.1 += offset;
    }
    (glyphs, cursor_x)
}

/// Cumulative advance widths for cursor placement: entry `i` is the x
/// offset after the first `i` characters.
pub fn line_advances(font: &FontArc, text: &str, font_size: f32) -> Vec<f32> {
    let scaled = font.as_scaled(font_size);
    let mut advances = Vec::with_capacity(text.chars().count() + 1);
    advances.push(0.0f32);
    let mut cursor_x = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let gid = font.glyph_id(ch);
        if let Some(p) = prev {
            cursor_x += scaled.kern(p, gid);
        }
        cursor_x += scaled.h_advance(gid);
        advances.push(cursor_x);
        prev = Some(gid);
    }
    advances
}

/// Line spacing for `font_size`.
pub fn line_height(font: &FontArc, font_size: f32) -> f32 {
    font.as_scaled(font_size).height()
}

/// Styling for `rasterize_text`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub alignment: TextAlignment,
    pub bold: bool,
    pub italic: bool,
}

/// Rasterize `lines` into a coverage mask the size of the canvas.
///
/// `anchor_x` is the alignment anchor (left edge, centre or right edge) and
/// `top_y` the top of the first line; each following line sits one line
/// height lower. Bold doubles each covered pixel one to the right, italic
/// shears by 0.2 around the baseline.
pub fn rasterize_text(
    font: &FontArc,
    lines: &[String],
    style: TextStyle,
    anchor_x: f32,
    top_y: f32,
    canvas_w: u32,
    canvas_h: u32,
    glyph_cache: &mut GlyphPixelCache,
) -> GrayImage {
    let mut mask = GrayImage::new(canvas_w, canvas_h);
    let font_size = style.font_size;
    if font_size <= 0.0 {
        return mask;
    }
    let scaled = font.as_scaled(font_size);
    let ascent = scaled.ascent();
    let height = scaled.height();
    let font_size_key = font_size.to_bits();

    for (line_idx, line) in lines.iter().enumerate() {
        let baseline_y = top_y + ascent + line_idx as f32 * height;
        let (glyphs, _) = layout_line(font, line, font_size, style.alignment);

        for (glyph_id, gx) in glyphs {
            let cache_key = (glyph_id, font_size_key);
            // Glyphs are cached at the origin and shifted into place
            let (pixels, base_bx, base_by) = glyph_cache.entry(cache_key).or_insert_with(|| {
                let base_glyph = glyph_id.with_scale_and_position(font_size, point(0.0, 0.0));
                let mut px_list = Vec::new();
                let (bx, by) = if let Some(outlined) = font.outline_glyph(base_glyph) {
                    let b = outlined.px_bounds();
                    outlined.draw(|px, py, cov| px_list.push((px, py, cov)));
                    (b.min.x, b.min.y)
                } else {
                    (0.0, 0.0)
                };
                (px_list, bx, by)
            });

            let draw_x = (anchor_x + gx).round();
            let draw_y = baseline_y.round();
            for &(px, py, cov) in pixels.iter() {
                let mut cx = px as f32 + draw_x + *base_bx;
                let cy = py as f32 + draw_y + *base_by;
                if style.italic {
                    cx += (draw_y - cy) * 0.2;
                }
                let ix = cx.round() as i64;
                let iy = cy.round() as i64;
                let v = (cov.clamp(0.0, 1.0) * 255.0).round() as u8;
                put_max(&mut mask, ix, iy, v);
                if style.bold {
                    put_max(&mut mask, ix + 1, iy, v);
                }
            }
        }
    }
    mask
}

fn put_max(mask: &mut GrayImage, x: i64, y: i64, v: u8) {
    if x < 0 || y < 0 || x >= mask.width() as i64 || y >= mask.height() as i64 {
        return;
    }
    let p = mask.get_pixel_mut(x as u32, y as u32);
    if v > p.0[0] {
        *p = Luma([v]);
    }
}

/// Load a font by family name and style from the system.
/// Returns `None` if the font cannot be found or parsed.
pub fn load_system_font(family: &str, bold: bool, italic: bool) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::{Properties, Style, Weight};
    use font_kit::source::SystemSource;

    let mut props = Properties::new();
    props.weight = if bold { Weight::BOLD } else { Weight::NORMAL };
    if italic {
        props.style = Style::Italic;
    }

    let source = SystemSource::new();
    let handle = source
        .select_best_match(
            &[FamilyName::Title(family.to_string()), FamilyName::SansSerif],
            &props,
        )
        .ok()?;

    let font_data = handle.load().ok()?;
    let bytes = font_data.copy_font_data()?;
    FontArc::try_from_vec((*bytes).clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only font-independent behaviour is tested here: CI machines may not
    // have any system fonts installed.

    #[test]
    fn alignment_defaults_to_left() {
        assert_eq!(TextAlignment::default(), TextAlignment::Left);
    }

    #[test]
    fn alignment_round_trips_through_json() {
        let json = serde_json::to_string(&TextAlignment::Center).unwrap();
        assert_eq!(json, "\"Center\"");
        let back: TextAlignment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TextAlignment::Center);
    }

    #[test]
    fn rasterize_with_a_system_font_stays_inside_the_canvas() {
        let Some(font) = load_system_font("Arial", false, false) else { return };
        let mut cache = GlyphPixelCache::new();
        let style = TextStyle { font_size: 26.0, alignment: TextAlignment::Left, bold: true, italic: true };
        let mask = rasterize_text(&font, &["Hi".to_string()], style, 10.0, 10.0, 60, 50, &mut cache);
        assert_eq!(mask.dimensions(), (60, 50));
        assert!(mask.pixels().any(|p| p[0] > 0));
        assert!(!cache.is_empty());
    }
}
