// ============================================================================
// TRANSFORM OPERATIONS - affine blits and canvas resize
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::geometry::{Vec2, deg_to_rad};
use crate::ops::raster::blend_pixel;
use crate::ops::shapes::ellipse_contains;

/// Row-major 3x3 affine matrix acting on column vectors `(x, y, 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub m: [[f32; 3]; 3],
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine { m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] };

    pub fn translate(t: Vec2) -> Self {
        Affine { m: [[1.0, 0.0, t.x], [0.0, 1.0, t.y], [0.0, 0.0, 1.0]] }
    }

    /// Rotation by `deg` degrees. Positive angles turn clockwise on screen
    /// (y points down), matching a 2D canvas `rotate()`.
    pub fn rotate_deg(deg: f32) -> Self {
        let (s, c) = deg_to_rad(deg).sin_cos();
        Affine { m: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]] }
    }

    /// translate(pivot) · rotate(deg) · translate(-pivot)
    pub fn rotate_about(pivot: Vec2, deg: f32) -> Self {
        if deg == 0.0 {
            return Self::IDENTITY;
        }
        Self::translate(pivot).then(&Self::rotate_deg(deg)).then(&Self::translate(-pivot))
    }

    /// `self · rhs`: `rhs` applies first.
    pub fn then(&self, rhs: &Affine) -> Affine {
        let mut out = [[0.0f32; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.m[r][k] * rhs.m[k][c]).sum();
            }
        }
        Affine { m: out }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        let m = &self.m;
        Vec2::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2],
        )
    }

    /// Inverse matrix; a singular matrix inverts to the identity.
    pub fn inverse(&self) -> Affine {
        let m = self.m;
        let (a, b, c) = (m[0][0], m[0][1], m[0][2]);
        let (d, e, f) = (m[1][0], m[1][1], m[1][2]);
        let (g, h, i) = (m[2][0], m[2][1], m[2][2]);

        let det = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
        if det.abs() < 1e-12 {
            return Self::IDENTITY;
        }
        let inv = 1.0 / det;
        Affine {
            m: [
                [(e * i - f * h) * inv, (c * h - b * i) * inv, (b * f - c * e) * inv],
                [(f * g - d * i) * inv, (a * i - c * g) * inv, (c * d - a * f) * inv],
                [(d * h - e * g) * inv, (b * g - a * h) * inv, (a * e - b * d) * inv],
            ],
        }
    }

    fn is_translation_only(&self) -> bool {
        let m = &self.m;
        m[0][0] == 1.0 && m[0][1] == 0.0 && m[1][0] == 0.0 && m[1][1] == 1.0
    }
}

/// Nudge applied before flooring inverse-mapped coordinates so rotations by
/// multiples of 90° don't lose a pixel to float error.
const SAMPLE_SNAP: f32 = 1e-3;

/// Where a source rectangle lands before `transform` is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Source rectangle in `src` pixels: top-left and size.
    pub src_origin: Vec2,
    pub src_size: Vec2,
    /// Destination top-left and size in untransformed canvas space.
    pub dest_origin: Vec2,
    pub dest_size: Vec2,
}

/// Clip region in untransformed destination space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Clip {
    None,
    /// Ellipse inscribed in the destination rectangle.
    InscribedEllipse,
}

/// Draw `src`'s rectangle onto `dst` through `transform` with nearest
/// sampling and source-over compositing.
///
/// Each destination pixel is mapped back through the inverse transform; a
/// pixel is drawn only when it lands inside the destination rectangle (and the
/// clip). Source pixels outside `src` are skipped.
pub fn draw_image(dst: &mut RgbaImage, src: &RgbaImage, placement: Placement, transform: Affine, clip: Clip) {
    let Placement { src_origin, src_size, dest_origin, dest_size } = placement;
    if dest_size.x <= 0.0 || dest_size.y <= 0.0 || src_size.x <= 0.0 || src_size.y <= 0.0 {
        return;
    }
    let (dw, dh) = dst.dimensions();
    if dw == 0 || dh == 0 {
        return;
    }
    let scale = Vec2::new(src_size.x / dest_size.x, src_size.y / dest_size.y);

    // Bounding box of the transformed destination rectangle
    let corners = [
        dest_origin,
        dest_origin + Vec2::new(dest_size.x, 0.0),
        dest_origin + Vec2::new(0.0, dest_size.y),
        dest_origin + dest_size,
    ]
    .map(|p| transform.apply(p));
    let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0);
    let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil().min(dw as f32 - 1.0);
    let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0);
    let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil().min(dh as f32 - 1.0);
    if !(min_x <= max_x && min_y <= max_y) {
        return;
    }
    let (x0, x1, y0, y1) = (min_x as u32, max_x as u32, min_y as u32, max_y as u32);

    let inv = transform.inverse();
    let exact = transform.is_translation_only();
    let clip_center = dest_origin + dest_size * 0.5;
    let (src_w, src_h) = (src.width() as i64, src.height() as i64);
    let row_bytes = dw as usize * 4;

    let buf: &mut [u8] = &mut **dst;
    buf.par_chunks_mut(row_bytes)
        .enumerate()
        .skip(y0 as usize)
        .take((y1 - y0 + 1) as usize)
        .for_each(|(row, row_buf)| {
            for x in x0..=x1 {
                let canvas = Vec2::new(x as f32, row as f32);
                let local = if exact {
                    Vec2::new(canvas.x - transform.m[0][2], canvas.y - transform.m[1][2])
                } else {
                    inv.apply(canvas)
                };
                let rel = local - dest_origin + Vec2::new(SAMPLE_SNAP, SAMPLE_SNAP);
                if rel.x < 0.0 || rel.y < 0.0 || rel.x >= dest_size.x || rel.y >= dest_size.y {
                    continue;
                }
                if clip == Clip::InscribedEllipse
                    && !ellipse_contains(clip_center, dest_size.x / 2.0, dest_size.y / 2.0, local)
                {
                    continue;
                }
                let sx = (src_origin.x + rel.x * scale.x).floor() as i64;
                let sy = (src_origin.y + rel.y * scale.y).floor() as i64;
                if sx < 0 || sy < 0 || sx >= src_w || sy >= src_h {
                    continue;
                }
                let top = *src.get_pixel(sx as u32, sy as u32);
                let i = x as usize * 4;
                let base = Rgba([row_buf[i], row_buf[i + 1], row_buf[i + 2], row_buf[i + 3]]);
                row_buf[i..i + 4].copy_from_slice(&blend_pixel(base, top, 1.0).0);
            }
        });
}

/// Resize a buffer to `new_w`×`new_h`, keeping the old content anchored at
/// the top-left and filling new area with `fill`.
pub fn resize_canvas(img: &RgbaImage, new_w: u32, new_h: u32, fill: Rgba<u8>) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(new_w, new_h, fill);
    let copy_w = img.width().min(new_w);
    let copy_h = img.height().min(new_h);
    for y in 0..copy_h {
        for x in 0..copy_w {
            out.put_pixel(x, y, *img.get_pixel(x, y));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    fn checker(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 7, 255]))
    }

    #[test]
    fn rotate_about_keeps_the_pivot_fixed() {
        let pivot = Vec2::new(12.0, -4.0);
        let t = Affine::rotate_about(pivot, 37.0);
        assert!(close(t.apply(pivot), pivot));
        assert!(close(t.inverse().apply(t.apply(Vec2::new(3.0, 9.0))), Vec2::new(3.0, 9.0)));
    }

    #[test]
    fn quarter_turn_is_clockwise_on_screen() {
        let t = Affine::rotate_about(Vec2::ZERO, 90.0);
        assert!(close(t.apply(Vec2::new(1.0, 0.0)), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn unrotated_copy_is_exact() {
        let src = checker(10, 10);
        let mut dst = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
        let placement = Placement {
            src_origin: Vec2::new(2.0, 3.0),
            src_size: Vec2::new(4.0, 5.0),
            dest_origin: Vec2::new(11.0, 1.0),
            dest_size: Vec2::new(4.0, 5.0),
        };
        draw_image(&mut dst, &src, placement, Affine::IDENTITY, Clip::None);
        for y in 0..5 {
            for x in 0..4 {
                assert_eq!(dst.get_pixel(11 + x, 1 + y), src.get_pixel(2 + x, 3 + y));
            }
        }
        assert_eq!(*dst.get_pixel(10, 1), Rgba([255, 255, 255, 255]));
        assert_eq!(*dst.get_pixel(15, 1), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn translation_only_transform_shifts_the_copy() {
        let src = checker(6, 6);
        let mut a = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0]));
        let mut b = a.clone();
        let placement = Placement {
            src_origin: Vec2::ZERO,
            src_size: Vec2::new(6.0, 6.0),
            dest_origin: Vec2::ZERO,
            dest_size: Vec2::new(6.0, 6.0),
        };
        draw_image(&mut a, &src, placement, Affine::translate(Vec2::new(5.0, 7.0)), Clip::None);
        draw_image(
            &mut b,
            &src,
            Placement { dest_origin: Vec2::new(5.0, 7.0), ..placement },
            Affine::IDENTITY,
            Clip::None,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn ellipse_clip_drops_corners() {
        let src = RgbaImage::from_pixel(10, 10, Rgba([9, 9, 9, 255]));
        let mut dst = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let placement = Placement {
            src_origin: Vec2::ZERO,
            src_size: Vec2::new(10.0, 10.0),
            dest_origin: Vec2::ZERO,
            dest_size: Vec2::new(10.0, 10.0),
        };
        draw_image(&mut dst, &src, placement, Affine::IDENTITY, Clip::InscribedEllipse);
        assert_eq!(dst.get_pixel(0, 0)[0], 255);
        assert_eq!(dst.get_pixel(5, 5)[0], 9);
        assert_eq!(dst.get_pixel(5, 0)[0], 9);
    }

    #[test]
    fn half_turn_mirrors_the_block() {
        let src = checker(4, 4);
        let mut dst = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let placement = Placement {
            src_origin: Vec2::ZERO,
            src_size: Vec2::new(4.0, 4.0),
            dest_origin: Vec2::ZERO,
            dest_size: Vec2::new(4.0, 4.0),
        };
        // Pivot between pixels so integer samples map onto integer samples
        let t = Affine::rotate_about(Vec2::new(1.5, 1.5), 180.0);
        draw_image(&mut dst, &src, placement, t, Clip::None);
        assert_eq!(dst.get_pixel(0, 0), src.get_pixel(3, 3));
        assert_eq!(dst.get_pixel(3, 1), src.get_pixel(0, 2));
    }

    #[test]
    fn resize_keeps_top_left_and_fills_the_rest() {
        let img = checker(4, 3);
        let grown = resize_canvas(&img, 6, 5, Rgba([255, 255, 255, 255]));
        assert_eq!(grown.dimensions(), (6, 5));
        assert_eq!(grown.get_pixel(3, 2), img.get_pixel(3, 2));
        assert_eq!(*grown.get_pixel(5, 4), Rgba([255, 255, 255, 255]));
        let shrunk = resize_canvas(&img, 2, 2, Rgba([255, 255, 255, 255]));
        assert_eq!(shrunk.get_pixel(1, 1), img.get_pixel(1, 1));
    }
}
