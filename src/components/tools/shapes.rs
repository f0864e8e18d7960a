// ============================================================================
// SHAPE TOOLS - rectangle, ellipse, polygon (anchor + drag)
// ============================================================================

use crate::canvas::SurfaceId;
use crate::components::tools::{ToolContext, ToolHandler};
use crate::geometry::{Vec2, dominant_delta, polygon_vertices};
use crate::input::{Modifiers, MouseButton, PointerEvent};
use crate::ops::raster::{MIN_SEGMENT, fill_rect};
use crate::ops::shapes::{fill_ellipse, fill_polygon, inner_rect, stroke_ellipse, stroke_polygon, stroke_rect};

/// Anchor of an in-progress shape drag. `None` until a left pointer-down.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShapeDrag {
    pub anchor: Option<Vec2>,
}

type ShapeRender = fn(&mut ToolContext, SurfaceId, Vec2, Vec2, Modifiers);

impl ShapeDrag {
    fn begin(&mut self, ev: &PointerEvent) {
        self.anchor = (ev.button == MouseButton::Left).then_some(ev.pos);
    }

    fn preview(&self, ctx: &mut ToolContext, ev: &PointerEvent, render: ShapeRender) {
        let Some(anchor) = self.anchor else { return };
        ctx.clear_preview();
        render(ctx, SurfaceId::Preview, anchor, ev.pos, ev.modifiers);
    }

    fn commit(&mut self, ctx: &mut ToolContext, ev: &PointerEvent, render: ShapeRender) {
        let Some(anchor) = self.anchor.take() else { return };
        ctx.clear_preview();
        render(ctx, SurfaceId::Committed, anchor, ev.pos, ev.modifiers);
    }
}

fn is_zero_size(anchor: Vec2, pos: Vec2) -> bool {
    (pos.x - anchor.x).abs() < MIN_SEGMENT && (pos.y - anchor.y).abs() < MIN_SEGMENT
}

/// Composite the fill in primary, then the outline in secondary on top.
fn paint_shape(ctx: &mut ToolContext, target: SurfaceId, fill: Option<image::GrayImage>, outline: Option<image::GrayImage>) {
    if let Some(mask) = fill {
        let (color, alpha) = (ctx.primary(), ctx.params.primary_alpha);
        ctx.paint(target, &mask, color, alpha);
    }
    if let Some(mask) = outline {
        let (color, alpha) = (ctx.secondary(), ctx.params.secondary_alpha);
        ctx.paint(target, &mask, color, alpha);
    }
}

// ============================================================================
// RECTANGLE
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct RectangleToolState {
    pub drag: ShapeDrag,
}

impl RectangleToolState {
    /// Shift makes a square with the drag's signs.
    pub fn extent(anchor: Vec2, pos: Vec2, square: bool) -> (f32, f32) {
        let (dx, dy) = (pos.x - anchor.x, pos.y - anchor.y);
        if square {
            let w = dx.abs() * dx.signum();
            (w, w.abs() * dy.signum())
        } else {
            (dx, dy)
        }
    }

    pub fn render(ctx: &mut ToolContext, target: SurfaceId, anchor: Vec2, pos: Vec2, modifiers: Modifiers) {
        if is_zero_size(anchor, pos) {
            return;
        }
        let (w, h) = Self::extent(anchor, pos, modifiers.shift);
        let lw = ctx.params.line_width;
        let behavior = ctx.params.shape_behavior;

        let fill = behavior.has_fill().then(|| {
            let mut mask = ctx.mask();
            if behavior.has_outline() {
                if let Some((ix, iy, iw, ih)) = inner_rect(anchor.x, anchor.y, w, h, lw) {
                    fill_rect(&mut mask, ix, iy, iw, ih);
                }
            } else {
                fill_rect(&mut mask, anchor.x, anchor.y, w, h);
            }
            mask
        });
        let outline = behavior.has_outline().then(|| {
            let mut mask = ctx.mask();
            stroke_rect(&mut mask, anchor.x, anchor.y, w, h, lw);
            mask
        });
        paint_shape(ctx, target, fill, outline);
    }
}

impl ToolHandler for RectangleToolState {
    fn on_pointer_down(&mut self, _ctx: &mut ToolContext, ev: &PointerEvent) {
        self.drag.begin(ev);
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        self.drag.preview(ctx, ev, Self::render);
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        self.drag.commit(ctx, ev, Self::render);
    }
}

// ============================================================================
// ELLIPSE
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct EllipseToolState {
    pub drag: ShapeDrag,
}

impl EllipseToolState {
    /// Radii for a drag from the centre, pulled in by one line width on the
    /// side the pointer is on.
    pub fn radii(anchor: Vec2, pos: Vec2, line_width: f32, circle: bool) -> (f32, f32) {
        let pull = |a: f32, p: f32| if a < p { line_width } else { -line_width };
        let rx = ((pos.x - anchor.x) - pull(anchor.x, pos.x)).abs();
        let ry = ((pos.y - anchor.y) - pull(anchor.y, pos.y)).abs();
        if circle { (rx, rx) } else { (rx, ry) }
    }

    pub fn render(ctx: &mut ToolContext, target: SurfaceId, anchor: Vec2, pos: Vec2, modifiers: Modifiers) {
        if is_zero_size(anchor, pos) {
            return;
        }
        let lw = ctx.params.line_width;
        let behavior = ctx.params.shape_behavior;
        let (rx, ry) = Self::radii(anchor, pos, lw, modifiers.shift);

        if behavior.has_outline() {
            let mut mask = ctx.mask();
            stroke_ellipse(&mut mask, anchor, rx, ry, lw);
            paint_shape(ctx, target, None, Some(mask));
        }
        if behavior.has_fill() {
            let mut mask = ctx.mask();
            fill_ellipse(&mut mask, anchor, rx, ry);
            paint_shape(ctx, target, Some(mask), None);
        }
    }
}

impl ToolHandler for EllipseToolState {
    fn on_pointer_down(&mut self, _ctx: &mut ToolContext, ev: &PointerEvent) {
        self.drag.begin(ev);
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        self.drag.preview(ctx, ev, Self::render);
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        self.drag.commit(ctx, ev, Self::render);
    }
}

// ============================================================================
// POLYGON
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct PolygonToolState {
    pub drag: ShapeDrag,
}

impl PolygonToolState {
    pub fn render(ctx: &mut ToolContext, target: SurfaceId, anchor: Vec2, pos: Vec2, _modifiers: Modifiers) {
        let size = dominant_delta(anchor, pos);
        if size.abs() < MIN_SEGMENT {
            return;
        }
        let vertices = polygon_vertices(anchor, size, ctx.params.polygon_sides);
        let behavior = ctx.params.shape_behavior;

        let fill = behavior.has_fill().then(|| {
            let mut mask = ctx.mask();
            fill_polygon(&mut mask, &vertices);
            mask
        });
        let outline = behavior.has_outline().then(|| {
            let mut mask = ctx.mask();
            stroke_polygon(&mut mask, &vertices, ctx.params.line_width);
            mask
        });
        paint_shape(ctx, target, fill, outline);
    }
}

impl ToolHandler for PolygonToolState {
    fn on_pointer_down(&mut self, _ctx: &mut ToolContext, ev: &PointerEvent) {
        self.drag.begin(ev);
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        self.drag.preview(ctx, ev, Self::render);
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        self.drag.commit(ctx, ev, Self::render);
    }
}
