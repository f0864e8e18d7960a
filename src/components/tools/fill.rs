// ============================================================================
// PAINT BUCKET - contiguous flood fill (left) and global replace (right)
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::canvas::SurfaceId;
use crate::color::ToleranceMargins;
use crate::components::tools::{ToolContext, ToolHandler};
use crate::input::{MouseButton, PointerEvent};

/// Colour reported for reads outside the canvas. No margin accepts it.
pub const OUT_OF_BOUNDS: [i16; 4] = [-1, -1, -1, -1];

#[derive(Clone, Copy, Debug, Default)]
pub struct FillToolState;

fn read(pixels: &RgbaImage, x: i64, y: i64) -> [i16; 4] {
    if x < 0 || y < 0 || x >= pixels.width() as i64 || y >= pixels.height() as i64 {
        return OUT_OF_BOUNDS;
    }
    pixels.get_pixel(x as u32, y as u32).0.map(i16::from)
}

/// 4-connected fill from `(x, y)`. A pixel is painted when it is not
/// already `fill` and `margins` tolerate it. Returns the painted count.
pub fn flood_fill(pixels: &mut RgbaImage, x: i64, y: i64, margins: &ToleranceMargins, fill: Rgba<u8>) -> usize {
    let fill_key = fill.0.map(i16::from);
    let mut painted = 0;
    let mut stack = vec![(x, y)];
    while let Some((px, py)) = stack.pop() {
        let current = read(pixels, px, py);
        if current == fill_key || !margins.tolerates(current) {
            continue;
        }
        pixels.put_pixel(px as u32, py as u32, fill);
        painted += 1;
        // popped in reverse: up, down, left, right
        stack.push((px, py - 1));
        stack.push((px, py + 1));
        stack.push((px - 1, py));
        stack.push((px + 1, py));
    }
    painted
}

/// Replace every tolerated pixel of the buffer with `fill`.
pub fn replace_matching(pixels: &mut RgbaImage, margins: &ToleranceMargins, fill: Rgba<u8>) -> usize {
    let buf: &mut [u8] = &mut **pixels;
    buf.par_chunks_mut(4)
        .map(|px| {
            let current = [px[0], px[1], px[2], px[3]].map(i16::from);
            if margins.tolerates(current) {
                px.copy_from_slice(&fill.0);
                1
            } else {
                0
            }
        })
        .sum()
}

impl ToolHandler for FillToolState {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        let (x, y) = (ev.pos.x.floor() as i64, ev.pos.y.floor() as i64);
        let mut pixels = ctx.canvas.committed.image().clone();
        let target = read(&pixels, x, y);
        if target == OUT_OF_BOUNDS {
            return;
        }
        let seed = Rgba(target.map(|c| c as u8));
        let margins = ToleranceMargins::around(seed, ctx.params.tolerance);
        let fill = ctx.primary();

        let painted = match ev.button {
            MouseButton::Left => flood_fill(&mut pixels, x, y, &margins, fill),
            MouseButton::Right => replace_matching(&mut pixels, &margins, fill),
            MouseButton::Middle => return,
        };
        crate::log_info!(
            "fill: {:?} at ({}, {}) tolerance {} painted {} pixels",
            ev.button,
            x,
            y,
            ctx.params.tolerance,
            painted
        );
        ctx.canvas.surface_mut(SurfaceId::Committed).replace(pixels);
    }
}
