// ============================================================================
// RASTER PRIMITIVES - coverage masks, stamped strokes, source-over compositing
// ============================================================================
//
// Every drawing operation first marks covered pixels in a `GrayImage` mask the
// size of the target surface, then composites the mask once. Coverage is hard
// (0 or 255) and pixel (x, y) is sampled at exactly (x, y).

use image::{GrayImage, Luma, Rgba, RgbaImage};
use rayon::prelude::*;

use crate::geometry::Vec2;

pub const COVERED: u8 = 255;

/// Segments shorter than this stamp once at their start.
pub const MIN_SEGMENT: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineCap {
    Round,
    Square,
    Butt,
}

pub fn new_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

/// Inclusive pixel range whose sample points fall in `[lo, hi]`, clipped.
fn pixel_span(lo: f32, hi: f32, limit: u32) -> Option<(u32, u32)> {
    if limit == 0 || !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let a = lo.ceil().max(0.0);
    let b = hi.floor().min(limit as f32 - 1.0);
    if a > b {
        return None;
    }
    Some((a as u32, b as u32))
}

/// Same as `pixel_span` for the half-open range `[lo, hi)`.
fn half_open_span(lo: f32, hi: f32, limit: u32) -> Option<(u32, u32)> {
    pixel_span(lo, hi.ceil() - 1.0, limit)
}

// ============================================================================
// STAMPS
// ============================================================================

pub fn stamp_disc(mask: &mut GrayImage, center: Vec2, radius: f32) {
    if radius <= 0.0 {
        return;
    }
    let (w, h) = mask.dimensions();
    let Some((x0, x1)) = pixel_span(center.x - radius, center.x + radius, w) else { return };
    let Some((y0, y1)) = pixel_span(center.y - radius, center.y + radius, h) else { return };
    let r2 = radius * radius;
    for y in y0..=y1 {
        let dy = y as f32 - center.y;
        for x in x0..=x1 {
            let dx = x as f32 - center.x;
            if dx * dx + dy * dy <= r2 {
                mask.put_pixel(x, y, Luma([COVERED]));
            }
        }
    }
}

/// Like `stamp_disc` but counts overlapping stamps instead of saturating.
pub fn stamp_disc_counting(counts: &mut GrayImage, center: Vec2, radius: f32) {
    if radius <= 0.0 {
        return;
    }
    let (w, h) = counts.dimensions();
    let Some((x0, x1)) = pixel_span(center.x - radius, center.x + radius, w) else { return };
    let Some((y0, y1)) = pixel_span(center.y - radius, center.y + radius, h) else { return };
    let r2 = radius * radius;
    for y in y0..=y1 {
        let dy = y as f32 - center.y;
        for x in x0..=x1 {
            let dx = x as f32 - center.x;
            if dx * dx + dy * dy <= r2 {
                let c = counts.get_pixel_mut(x, y);
                c.0[0] = c.0[0].saturating_add(1);
            }
        }
    }
}

/// Axis-aligned square of side `side` centred on `center` (edges inclusive).
pub fn stamp_square(mask: &mut GrayImage, center: Vec2, side: f32) {
    if side <= 0.0 {
        return;
    }
    let half = side / 2.0;
    let (w, h) = mask.dimensions();
    let Some((x0, x1)) = pixel_span(center.x - half, center.x + half, w) else { return };
    let Some((y0, y1)) = pixel_span(center.y - half, center.y + half, h) else { return };
    for y in y0..=y1 {
        for x in x0..=x1 {
            mask.put_pixel(x, y, Luma([COVERED]));
        }
    }
}

/// Fill `[x, x+w) × [y, y+h)`. Negative sizes extend up/left from the origin.
pub fn fill_rect(mask: &mut GrayImage, x: f32, y: f32, w: f32, h: f32) {
    let (x, w) = if w < 0.0 { (x + w, -w) } else { (x, w) };
    let (y, h) = if h < 0.0 { (y + h, -h) } else { (y, h) };
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    let (mw, mh) = mask.dimensions();
    let Some((x0, x1)) = half_open_span(x, x + w, mw) else { return };
    let Some((y0, y1)) = half_open_span(y, y + h, mh) else { return };
    for py in y0..=y1 {
        for px in x0..=x1 {
            mask.put_pixel(px, py, Luma([COVERED]));
        }
    }
}

// ============================================================================
// STROKES
// ============================================================================

/// Visit stamp positions one pixel apart from `a` to `b`, both ends included.
pub fn walk_segment(a: Vec2, b: Vec2, mut visit: impl FnMut(Vec2)) {
    let dist = a.distance(b);
    if dist < MIN_SEGMENT {
        visit(a);
        return;
    }
    let steps = dist.ceil() as usize;
    for i in 0..=steps {
        visit(a.lerp(b, i as f32 / steps as f32));
    }
}

/// True when every point of `points` sits on the first one.
pub fn is_degenerate(points: &[Vec2]) -> bool {
    match points.first() {
        None => true,
        Some(&first) => points.iter().all(|p| p.distance(first) < MIN_SEGMENT),
    }
}

/// Stroke a polyline of width `width`.
///
/// Round and square caps are unions of stamps along each segment (which also
/// gives round/square joins). Butt strokes are bands per segment.
pub fn stroke_path(mask: &mut GrayImage, points: &[Vec2], width: f32, cap: LineCap) {
    if points.is_empty() || width <= 0.0 {
        return;
    }
    if points.len() == 1 {
        match cap {
            LineCap::Round => stamp_disc(mask, points[0], width / 2.0),
            LineCap::Square => stamp_square(mask, points[0], width),
            LineCap::Butt => {}
        }
        return;
    }
    for pair in points.windows(2) {
        match cap {
            LineCap::Round => walk_segment(pair[0], pair[1], |p| stamp_disc(mask, p, width / 2.0)),
            LineCap::Square => walk_segment(pair[0], pair[1], |p| stamp_square(mask, p, width)),
            LineCap::Butt => band_segment(mask, pair[0], pair[1], width),
        }
    }
}

/// Pixels whose projection falls on segment `a→b` and lie within `width/2`
/// of it. Zero-length segments cover nothing.
pub fn band_segment(mask: &mut GrayImage, a: Vec2, b: Vec2, width: f32) {
    let d = b - a;
    let len2 = d.x * d.x + d.y * d.y;
    if len2 < MIN_SEGMENT * MIN_SEGMENT || width <= 0.0 {
        return;
    }
    let half = width / 2.0;
    let (w, h) = mask.dimensions();
    let Some((x0, x1)) = pixel_span(a.x.min(b.x) - half, a.x.max(b.x) + half, w) else { return };
    let Some((y0, y1)) = pixel_span(a.y.min(b.y) - half, a.y.max(b.y) + half, h) else { return };
    let len = len2.sqrt();
    for y in y0..=y1 {
        for x in x0..=x1 {
            let px = x as f32 - a.x;
            let py = y as f32 - a.y;
            let t = (px * d.x + py * d.y) / len2;
            if !(0.0..=1.0).contains(&t) {
                continue;
            }
            let perp = (px * d.y - py * d.x).abs() / len;
            if perp <= half {
                mask.put_pixel(x, y, Luma([COVERED]));
            }
        }
    }
}

/// One-pixel dashed polyline: `dash` pixels on, `dash` pixels off, measured
/// along the path.
pub fn stroke_dashed(mask: &mut GrayImage, points: &[Vec2], dash: f32) {
    if points.len() < 2 || dash <= 0.0 {
        return;
    }
    let mut travelled = 0.0f32;
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = a.distance(b);
        if len < MIN_SEGMENT {
            continue;
        }
        let steps = len.ceil() as usize;
        for i in 0..steps {
            let t = i as f32 / steps as f32;
            let along = travelled + len * t;
            if ((along / dash).floor() as i64) % 2 == 0 {
                stamp_square(mask, a.lerp(b, t), 1.0);
            }
        }
        travelled += len;
    }
}

/// Even-odd scanline fill of a closed polygon.
pub fn fill_polygon(mask: &mut GrayImage, vertices: &[Vec2]) {
    if vertices.len() < 3 {
        return;
    }
    let (w, h) = mask.dimensions();
    let min_y = vertices.iter().map(|v| v.y).fold(f32::INFINITY, f32::min);
    let max_y = vertices.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max);
    let Some((y0, y1)) = pixel_span(min_y, max_y, h) else { return };

    let mut crossings: Vec<f32> = Vec::with_capacity(vertices.len());
    for py in y0..=y1 {
        let sy = py as f32;
        crossings.clear();
        for i in 0..vertices.len() {
            let a = vertices[i];
            let b = vertices[(i + 1) % vertices.len()];
            if (a.y <= sy && sy < b.y) || (b.y <= sy && sy < a.y) {
                crossings.push(a.x + (sy - a.y) / (b.y - a.y) * (b.x - a.x));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        for span in crossings.chunks_exact(2) {
            if let Some((x0, x1)) = half_open_span(span[0], span[1], w) {
                for px in x0..=x1 {
                    mask.put_pixel(px, py, Luma([COVERED]));
                }
            }
        }
    }
}

// ============================================================================
// COMPOSITING
// ============================================================================

/// Source-over of `color` (RGB only) at `alpha` onto `base`.
pub fn blend_over(base: Rgba<u8>, color: Rgba<u8>, alpha: f32) -> Rgba<u8> {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return base;
    }
    // Fast path: fully opaque paint simply overwrites
    if alpha >= 1.0 {
        return Rgba([color[0], color[1], color[2], 255]);
    }

    let base_a = base[3] as f32 / 255.0;
    let out_a = alpha + base_a * (1.0 - alpha);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |top: u8, bottom: u8| -> u8 {
        let v = (top as f32 * alpha + bottom as f32 * base_a * (1.0 - alpha)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(color[0], base[0]),
        mix(color[1], base[1]),
        mix(color[2], base[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Source-over of a straight-alpha pixel (its own alpha scaled by `opacity`).
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    if top[3] == 0 {
        return base;
    }
    blend_over(base, top, top[3] as f32 / 255.0 * opacity)
}

fn composite_rows(
    target: &mut RgbaImage,
    coverage: &GrayImage,
    color: Rgba<u8>,
    alpha_for: impl Fn(u8) -> f32 + Sync,
) {
    if target.dimensions() != coverage.dimensions() {
        crate::log_warn!(
            "composite skipped: mask {:?} does not match surface {:?}",
            coverage.dimensions(),
            target.dimensions()
        );
        return;
    }
    let width = target.width() as usize;
    if width == 0 {
        return;
    }
    let cov = coverage.as_raw();
    let buf: &mut [u8] = &mut **target;
    buf.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(row, row_buf)| {
            let cov_row = &cov[row * width..(row + 1) * width];
            for (px, &c) in row_buf.chunks_exact_mut(4).zip(cov_row) {
                if c == 0 {
                    continue;
                }
                let base = Rgba([px[0], px[1], px[2], px[3]]);
                let out = blend_over(base, color, alpha_for(c));
                px.copy_from_slice(&out.0);
            }
        });
}

/// Composite a coverage mask. Partial coverage (e.g. a blurred mask) scales
/// the alpha linearly.
pub fn composite_mask(target: &mut RgbaImage, mask: &GrayImage, color: Rgba<u8>, alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    composite_rows(target, mask, color, |c| alpha * c as f32 / 255.0);
}

/// Composite a stamp-count buffer where each stamp contributes `alpha`:
/// a pixel hit `n` times ends up at `1 - (1 - alpha)^n`.
pub fn composite_counts(target: &mut RgbaImage, counts: &GrayImage, color: Rgba<u8>, alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    let keep = 1.0 - alpha.clamp(0.0, 1.0);
    composite_rows(target, counts, color, |n| 1.0 - keep.powi(n as i32));
}

pub fn covered_count(mask: &GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&c| c != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_radius_one_covers_a_plus() {
        let mut m = new_mask(5, 5);
        stamp_disc(&mut m, Vec2::new(2.0, 2.0), 1.0);
        assert_eq!(covered_count(&m), 5);
        assert_eq!(m.get_pixel(2, 1)[0], COVERED);
        assert_eq!(m.get_pixel(1, 1)[0], 0);
    }

    #[test]
    fn square_contains_disc_of_same_width() {
        let (mut disc, mut square) = (new_mask(20, 20), new_mask(20, 20));
        for w in [1.0, 2.0, 3.0, 5.0, 8.0] {
            let c = Vec2::new(9.3, 10.7);
            stamp_disc(&mut disc, c, w / 2.0);
            stamp_square(&mut square, c, w);
            for (d, s) in disc.pixels().zip(square.pixels()) {
                assert!(d[0] == 0 || s[0] == COVERED);
            }
        }
    }

    #[test]
    fn rect_fill_is_half_open() {
        let mut m = new_mask(10, 10);
        fill_rect(&mut m, 2.0, 3.0, 4.0, 2.0);
        assert_eq!(covered_count(&m), 8);
        assert_eq!(m.get_pixel(5, 4)[0], COVERED);
        assert_eq!(m.get_pixel(6, 4)[0], 0);
        assert_eq!(m.get_pixel(5, 5)[0], 0);
    }

    #[test]
    fn negative_rect_extends_up_left() {
        let mut a = new_mask(10, 10);
        let mut b = new_mask(10, 10);
        fill_rect(&mut a, 6.0, 6.0, -4.0, -3.0);
        fill_rect(&mut b, 2.0, 3.0, 4.0, 3.0);
        assert_eq!(a, b);
    }

    #[test]
    fn walk_stamps_every_pixel_step() {
        let mut seen = Vec::new();
        walk_segment(Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), |p| seen.push(p.x.round()));
        assert_eq!(seen, vec![0.0, 1.0, 2.0, 3.0]);

        seen.clear();
        walk_segment(Vec2::new(4.0, 4.0), Vec2::new(4.05, 4.0), |p| seen.push(p.x));
        assert_eq!(seen, vec![4.0]);
    }

    #[test]
    fn butt_band_stops_at_segment_ends() {
        let mut m = new_mask(20, 10);
        band_segment(&mut m, Vec2::new(5.0, 5.0), Vec2::new(10.0, 5.0), 2.0);
        assert_eq!(m.get_pixel(4, 5)[0], 0);
        assert_eq!(m.get_pixel(5, 5)[0], COVERED);
        assert_eq!(m.get_pixel(10, 4)[0], COVERED);
        assert_eq!(m.get_pixel(11, 5)[0], 0);
        assert_eq!(covered_count(&m), 18);
    }

    #[test]
    fn dashes_alternate_every_three_pixels() {
        let mut m = new_mask(20, 3);
        stroke_dashed(&mut m, &[Vec2::new(0.0, 1.0), Vec2::new(12.0, 1.0)], 3.0);
        let row: Vec<u8> = (0..12).map(|x| m.get_pixel(x, 1)[0]).collect();
        assert_eq!(row, vec![255, 255, 255, 0, 0, 0, 255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn polygon_fill_matches_axis_aligned_rect() {
        let mut a = new_mask(12, 12);
        let mut b = new_mask(12, 12);
        let quad = [
            Vec2::new(2.0, 2.0),
            Vec2::new(8.0, 2.0),
            Vec2::new(8.0, 7.0),
            Vec2::new(2.0, 7.0),
        ];
        fill_polygon(&mut a, &quad);
        fill_rect(&mut b, 2.0, 2.0, 6.0, 5.0);
        assert_eq!(a, b);
    }

    #[test]
    fn opaque_paint_overwrites_and_translucent_mixes() {
        let white = Rgba([255, 255, 255, 255]);
        let red = Rgba([255, 0, 0, 255]);
        assert_eq!(blend_over(white, red, 1.0), red);
        assert_eq!(blend_over(white, red, 0.0), white);
        assert_eq!(blend_over(white, red, 0.5), Rgba([255, 128, 128, 255]));
        // Onto transparent the colour survives unmixed
        assert_eq!(blend_over(Rgba([0, 0, 0, 0]), red, 0.5), Rgba([255, 0, 0, 128]));
    }

    #[test]
    fn composite_touches_only_covered_pixels() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let mut m = new_mask(4, 4);
        m.put_pixel(1, 2, Luma([COVERED]));
        composite_mask(&mut img, &m, Rgba([0, 0, 0, 255]), 1.0);
        assert_eq!(*img.get_pixel(1, 2), Rgba([0, 0, 0, 255]));
        assert_eq!(img.pixels().filter(|p| p[0] == 0).count(), 1);
    }

    #[test]
    fn counted_stamps_accumulate_alpha() {
        let mut img = RgbaImage::from_pixel(3, 1, Rgba([255, 255, 255, 255]));
        let mut counts = new_mask(3, 1);
        counts.put_pixel(0, 0, Luma([1]));
        counts.put_pixel(1, 0, Luma([100]));
        composite_counts(&mut img, &counts, Rgba([0, 0, 0, 255]), 0.0059);
        let once = img.get_pixel(0, 0)[0];
        let many = img.get_pixel(1, 0)[0];
        assert_eq!(once, 253);
        assert!(many < once && many > 100);
        assert_eq!(img.get_pixel(2, 0)[0], 255);
    }
}
