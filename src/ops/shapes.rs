// ============================================================================
// SHAPE RASTERIZATION - rectangle / ellipse / polygon coverage
// ============================================================================
//
// Shapes write into a coverage mask (see `ops::raster`); the tool decides the
// colour and target surface.

use image::{GrayImage, Luma};
use rayon::prelude::*;

use crate::geometry::Vec2;
use crate::ops::raster::{self, COVERED, LineCap};

/// Which parts of a closed shape get painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShapeBehavior {
    /// Border in the secondary colour, interior untouched.
    #[default]
    OutlineOnly,
    /// Interior in the primary colour, no border.
    FilledNoOutline,
    /// Interior in primary, border in secondary.
    FilledWithOutline,
}

impl ShapeBehavior {
    pub fn has_outline(self) -> bool {
        !matches!(self, ShapeBehavior::FilledNoOutline)
    }

    pub fn has_fill(self) -> bool {
        !matches!(self, ShapeBehavior::OutlineOnly)
    }
}

// ============================================================================
// RECTANGLE
// ============================================================================

/// Miter-joined outline of the rectangle `(x, y, w, h)`: everything within
/// `line_width/2` of the edge on either side, corners square.
pub fn stroke_rect(mask: &mut GrayImage, x: f32, y: f32, w: f32, h: f32, line_width: f32) {
    let (x, w) = if w < 0.0 { (x + w, -w) } else { (x, w) };
    let (y, h) = if h < 0.0 { (y + h, -h) } else { (y, h) };
    if line_width <= 0.0 || (w <= 0.0 && h <= 0.0) {
        return;
    }
    let half = line_width / 2.0;
    let (ox0, ox1) = (x - half, x + w + half);
    let (oy0, oy1) = (y - half, y + h + half);
    let (ix0, ix1) = (x + half, x + w - half);
    let (iy0, iy1) = (y + half, y + h - half);

    for_each_row(mask, |py, row| {
        let sy = py as f32;
        if sy < oy0 || sy > oy1 {
            return;
        }
        let inner_row = sy > iy0 && sy < iy1;
        for (px, cell) in row.iter_mut().enumerate() {
            let sx = px as f32;
            if sx < ox0 || sx > ox1 {
                continue;
            }
            if inner_row && sx > ix0 && sx < ix1 {
                continue;
            }
            *cell = COVERED;
        }
    });
}

/// Interior fill used beneath an outline: the rectangle shrunk by the full
/// stroke width so the fill never reaches under the border band.
pub fn inner_rect(x: f32, y: f32, w: f32, h: f32, line_width: f32) -> Option<(f32, f32, f32, f32)> {
    let (x, w) = if w < 0.0 { (x + w, -w) } else { (x, w) };
    let (y, h) = if h < 0.0 { (y + h, -h) } else { (y, h) };
    let half = line_width / 2.0;
    let (iw, ih) = (w - line_width, h - line_width);
    if iw <= 0.0 || ih <= 0.0 {
        return None;
    }
    Some((x + half, y + half, iw, ih))
}

// ============================================================================
// ELLIPSE
// ============================================================================

/// Approximate signed distance to an axis-aligned ellipse centred at the origin.
fn sdf_ellipse(px: f32, py: f32, rx: f32, ry: f32) -> f32 {
    // Normalise to circle space
    let nx = px / rx;
    let ny = py / ry;
    let len = (nx * nx + ny * ny).sqrt();
    if len < 1e-8 {
        return -rx.min(ry);
    }
    // Scale the circle distance back by the local stretch
    let scale = (rx * rx * ny * ny + ry * ry * nx * nx).sqrt() / (rx * ry * len);
    (len - 1.0) / scale
}

fn degenerate_radii(rx: f32, ry: f32) -> bool {
    !(rx > 1e-3 && ry > 1e-3) || !rx.is_finite() || !ry.is_finite()
}

/// True when `p` lies inside (or on) the ellipse.
pub fn ellipse_contains(center: Vec2, rx: f32, ry: f32, p: Vec2) -> bool {
    if degenerate_radii(rx, ry) {
        return false;
    }
    let nx = (p.x - center.x) / rx;
    let ny = (p.y - center.y) / ry;
    nx * nx + ny * ny <= 1.0
}

pub fn fill_ellipse(mask: &mut GrayImage, center: Vec2, rx: f32, ry: f32) {
    if degenerate_radii(rx, ry) {
        return;
    }
    for_each_row(mask, |py, row| {
        let sy = py as f32;
        if (sy - center.y).abs() > ry {
            return;
        }
        for (px, cell) in row.iter_mut().enumerate() {
            if ellipse_contains(center, rx, ry, Vec2::new(px as f32, sy)) {
                *cell = COVERED;
            }
        }
    });
}

/// Band of `line_width` centred on the ellipse boundary.
pub fn stroke_ellipse(mask: &mut GrayImage, center: Vec2, rx: f32, ry: f32, line_width: f32) {
    if degenerate_radii(rx, ry) || line_width <= 0.0 {
        return;
    }
    let half = line_width / 2.0;
    for_each_row(mask, |py, row| {
        let dy = py as f32 - center.y;
        if dy.abs() > ry + half {
            return;
        }
        for (px, cell) in row.iter_mut().enumerate() {
            let dx = px as f32 - center.x;
            if sdf_ellipse(dx, dy, rx, ry).abs() <= half {
                *cell = COVERED;
            }
        }
    });
}

/// Closed outline of an ellipse sampled roughly one pixel apart, for dashed
/// marquee drawing.
pub fn ellipse_points(center: Vec2, rx: f32, ry: f32) -> Vec<Vec2> {
    if degenerate_radii(rx, ry) {
        return Vec::new();
    }
    // Ramanujan's perimeter approximation
    let perimeter = std::f32::consts::PI
        * (3.0 * (rx + ry) - ((3.0 * rx + ry) * (rx + 3.0 * ry)).sqrt());
    let n = (perimeter.ceil() as usize).max(16);
    (0..=n)
        .map(|i| {
            let theta = std::f32::consts::TAU * i as f32 / n as f32;
            Vec2::new(center.x + rx * theta.cos(), center.y + ry * theta.sin())
        })
        .collect()
}

// ============================================================================
// POLYGON
// ============================================================================

pub fn fill_polygon(mask: &mut GrayImage, vertices: &[Vec2]) {
    raster::fill_polygon(mask, vertices);
}

pub fn stroke_polygon(mask: &mut GrayImage, vertices: &[Vec2], line_width: f32) {
    if vertices.len() < 2 {
        return;
    }
    raster::stroke_path(mask, vertices, line_width, LineCap::Round);
}

/// Rectangle corner points as a closed polyline.
pub fn rect_points(x: f32, y: f32, w: f32, h: f32) -> [Vec2; 5] {
    [
        Vec2::new(x, y),
        Vec2::new(x + w, y),
        Vec2::new(x + w, y + h),
        Vec2::new(x, y + h),
        Vec2::new(x, y),
    ]
}

fn for_each_row(mask: &mut GrayImage, f: impl Fn(u32, &mut [u8]) + Sync) {
    let width = mask.width() as usize;
    if width == 0 {
        return;
    }
    let buf: &mut [u8] = &mut **mask;
    buf.par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, row_buf)| f(row as u32, row_buf));
}

/// Count of covered mask pixels inside `[x0, x1) × [y0, y1)`.
pub fn covered_in(mask: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) -> usize {
    let mut n = 0;
    for y in y0..y1.min(mask.height()) {
        for x in x0..x1.min(mask.width()) {
            if *mask.get_pixel(x, y) == Luma([COVERED]) {
                n += 1;
            }
        }
    }
    n
}
