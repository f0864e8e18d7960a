// ============================================================================
// FREEHAND TOOLS - pencil, brush, eraser, feather
// ============================================================================

use image::imageops;

use crate::canvas::SurfaceId;
use crate::color::{BLACK, WHITE};
use crate::components::properties::BrushTexture;
use crate::components::tools::{ToolContext, ToolHandler};
use crate::events::EditorEvent;
use crate::geometry::{Vec2, deg_to_rad, rotate_by_wheel};
use crate::input::{MouseButton, PointerEvent, WheelEvent};
use crate::ops::raster::{
    LineCap, composite_counts, fill_rect, is_degenerate, stamp_disc_counting, stamp_square, stroke_path,
    walk_segment,
};
use crate::ops::shapes::stroke_rect;

/// Gaussian sigma of the texture-1 halo (a 5 px shadow blur).
const BRUSH_HALO_SIGMA: f32 = 2.5;
/// Per-stamp opacity of texture 4.
const BRUSH_TEXTURE4_ALPHA: f32 = 0.0059;
const BRUSH_TEXTURE2_OFFSET: f32 = 5.0;
const BRUSH_TEXTURE3_OFFSET: f32 = 0.5;
const BRUSH_TEXTURE5_OFFSET: f32 = 2.0;
const FEATHER_WIDTH: f32 = 2.0;

/// Points of an in-progress stroke.
#[derive(Clone, Debug, Default)]
pub struct StrokePath {
    pub points: Vec<Vec2>,
    pub mouse_down: bool,
}

impl StrokePath {
    /// Start a new stroke on left-button down. Returns false for other buttons.
    pub fn begin(&mut self, ev: &PointerEvent) -> bool {
        self.mouse_down = ev.button == MouseButton::Left;
        if self.mouse_down {
            self.points.clear();
            self.points.push(ev.pos);
        }
        self.mouse_down
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.mouse_down = false;
    }
}

/// Shared freehand lifecycle: record, preview on move, commit on up.
fn freehand_move(path: &mut StrokePath, ctx: &mut ToolContext, ev: &PointerEvent, render: impl Fn(&mut ToolContext, SurfaceId, &[Vec2])) {
    if !path.mouse_down {
        return;
    }
    path.points.push(ev.pos);
    ctx.clear_preview();
    render(ctx, SurfaceId::Preview, &path.points);
}

fn freehand_up(path: &mut StrokePath, ctx: &mut ToolContext, ev: &PointerEvent, render: impl Fn(&mut ToolContext, SurfaceId, &[Vec2])) {
    if path.mouse_down {
        path.points.push(ev.pos);
        render(ctx, SurfaceId::Committed, &path.points);
        ctx.clear_preview();
    }
    path.clear();
}

// ============================================================================
// PENCIL
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct PencilToolState {
    pub path: StrokePath,
}

impl PencilToolState {
    /// Round-capped stroke in the primary colour. A path that never leaves
    /// its first point draws nothing.
    pub fn render(ctx: &mut ToolContext, target: SurfaceId, points: &[Vec2]) {
        if is_degenerate(points) {
            return;
        }
        let mut mask = ctx.mask();
        stroke_path(&mut mask, points, ctx.params.line_width, LineCap::Round);
        let (color, alpha) = (ctx.primary(), ctx.params.primary_alpha);
        ctx.paint(target, &mask, color, alpha);
    }
}

impl ToolHandler for PencilToolState {
    fn on_pointer_down(&mut self, _ctx: &mut ToolContext, ev: &PointerEvent) {
        self.path.begin(ev);
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        freehand_move(&mut self.path, ctx, ev, Self::render);
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        freehand_up(&mut self.path, ctx, ev, Self::render);
    }
}

// ============================================================================
// BRUSH
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct BrushToolState {
    pub path: StrokePath,
}

fn offset_path(points: &[Vec2], by: Vec2) -> Vec<Vec2> {
    points.iter().map(|&p| p + by).collect()
}

impl BrushToolState {
    pub fn render(ctx: &mut ToolContext, target: SurfaceId, points: &[Vec2]) {
        if points.is_empty() {
            return;
        }
        let width = ctx.params.line_width;
        let (color, alpha) = (ctx.primary(), ctx.params.primary_alpha);
        let mut mask = ctx.mask();

        match ctx.params.brush_texture {
            BrushTexture::Texture1 => {
                stroke_path(&mut mask, points, width, LineCap::Round);
                let halo = imageops::blur(&mask, BRUSH_HALO_SIGMA);
                ctx.paint(target, &halo, color, alpha);
            }
            BrushTexture::Texture2 => {
                stroke_path(&mut mask, points, width, LineCap::Butt);
                let back = Vec2::new(BRUSH_TEXTURE2_OFFSET, BRUSH_TEXTURE2_OFFSET);
                for &p in points {
                    stamp_square(&mut mask, p, width);
                    stamp_square(&mut mask, p - back, width);
                }
            }
            BrushTexture::Texture3 => {
                let d = Vec2::new(BRUSH_TEXTURE3_OFFSET, BRUSH_TEXTURE3_OFFSET);
                for shift in [-d, Vec2::ZERO, d] {
                    stroke_path(&mut mask, &offset_path(points, shift), width, LineCap::Square);
                }
            }
            BrushTexture::Texture4 => {
                let mut counts = ctx.mask();
                for pair in points.windows(2) {
                    walk_segment(pair[0], pair[1], |p| stamp_disc_counting(&mut counts, p, width / 2.0));
                }
                if points.len() == 1 {
                    stamp_disc_counting(&mut counts, points[0], width / 2.0);
                }
                composite_counts(ctx.canvas.surface_mut(target).image_mut(), &counts, color, BRUSH_TEXTURE4_ALPHA);
                return;
            }
            BrushTexture::Texture5 => {
                let back = Vec2::new(BRUSH_TEXTURE5_OFFSET, BRUSH_TEXTURE5_OFFSET);
                stroke_path(&mut mask, &offset_path(points, -back), width, LineCap::Square);
            }
        }
        ctx.paint(target, &mask, color, alpha);
    }
}

impl ToolHandler for BrushToolState {
    fn on_pointer_down(&mut self, _ctx: &mut ToolContext, ev: &PointerEvent) {
        self.path.begin(ev);
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        freehand_move(&mut self.path, ctx, ev, Self::render);
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        freehand_up(&mut self.path, ctx, ev, Self::render);
    }
}

// ============================================================================
// ERASER
// ============================================================================

/// Paints opaque white squares straight onto the drawing while the button is
/// held. Stamp positions match the pencil's so erasing a pencil stroke with
/// the same path and width restores the background exactly.
#[derive(Clone, Debug, Default)]
pub struct EraserToolState {
    pub last: Option<Vec2>,
    pub mouse_down: bool,
}

impl EraserToolState {
    fn erase_segment(ctx: &mut ToolContext, from: Vec2, to: Vec2) {
        let width = ctx.params.line_width;
        let mut mask = ctx.mask();
        walk_segment(from, to, |p| stamp_square(&mut mask, p, width));
        ctx.paint(SurfaceId::Committed, &mask, WHITE, 1.0);
    }

    /// White square with a 1 px black outline under the pointer.
    fn draw_cursor(ctx: &mut ToolContext, at: Vec2) {
        let width = ctx.params.line_width;
        let (x, y) = (at.x - width / 2.0, at.y - width / 2.0);
        let mut fill = ctx.mask();
        fill_rect(&mut fill, x, y, width, width);
        ctx.paint(SurfaceId::Preview, &fill, WHITE, 1.0);
        let mut outline = ctx.mask();
        stroke_rect(&mut outline, x, y, width, width, 1.0);
        ctx.paint(SurfaceId::Preview, &outline, BLACK, 1.0);
    }
}

impl ToolHandler for EraserToolState {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        self.mouse_down = ev.button == MouseButton::Left;
        if !self.mouse_down {
            return;
        }
        ctx.clear_preview();
        Self::draw_cursor(ctx, ev.pos);
        Self::erase_segment(ctx, ev.pos, ev.pos);
        self.last = Some(ev.pos);
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        ctx.clear_preview();
        Self::draw_cursor(ctx, ev.pos);
        if !self.mouse_down {
            return;
        }
        if let Some(last) = self.last {
            Self::erase_segment(ctx, last, ev.pos);
        }
        self.last = Some(ev.pos);
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        if self.mouse_down
            && let Some(last) = self.last
        {
            Self::erase_segment(ctx, last, ev.pos);
        }
        self.mouse_down = false;
        self.last = None;
    }
}

// ============================================================================
// FEATHER
// ============================================================================

/// Calligraphy pen: `feather_line_height` parallel 2 px strokes, each point
/// offset along the feather angle it was drawn with.
#[derive(Clone, Debug, Default)]
pub struct FeatherToolState {
    pub path: StrokePath,
    /// Feather angle (degrees) recorded with each point.
    pub angles: Vec<f32>,
}

impl FeatherToolState {
    pub fn render(&self, ctx: &mut ToolContext, target: SurfaceId) {
        let points = &self.path.points;
        if points.len() < 2 {
            return;
        }
        let mut mask = ctx.mask();
        for i in 0..ctx.params.feather_line_height.max(1) {
            let copy: Vec<Vec2> = points
                .iter()
                .zip(&self.angles)
                .map(|(&p, &deg)| {
                    let rad = deg_to_rad(deg);
                    p + Vec2::new(rad.cos(), -rad.sin()) * i as f32
                })
                .collect();
            stroke_path(&mut mask, &copy, FEATHER_WIDTH, LineCap::Butt);
        }
        let (color, alpha) = (ctx.primary(), ctx.params.primary_alpha);
        ctx.paint(target, &mask, color, alpha);
    }

    fn push(&mut self, ctx: &ToolContext, p: Vec2) {
        self.path.points.push(p);
        self.angles.push(ctx.params.feather_angle);
    }
}

impl ToolHandler for FeatherToolState {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        if self.path.begin(ev) {
            self.angles.clear();
            self.angles.push(ctx.params.feather_angle);
        }
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        if !self.path.mouse_down {
            return;
        }
        self.push(ctx, ev.pos);
        ctx.clear_preview();
        self.render(ctx, SurfaceId::Preview);
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        if self.path.mouse_down {
            self.push(ctx, ev.pos);
            self.render(ctx, SurfaceId::Committed);
            ctx.clear_preview();
        }
        self.path.clear();
        self.angles.clear();
    }

    fn on_wheel(&mut self, ctx: &mut ToolContext, ev: &WheelEvent) {
        let angle = rotate_by_wheel(ctx.params.feather_angle, ev.delta_y, ev.modifiers.alt);
        ctx.params.feather_angle = angle;
        ctx.events.push(EditorEvent::FeatherAngleChanged(angle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tools::harness::Harness;
    use crate::ops::raster::new_mask;

    #[test]
    fn pencil_click_without_moving_draws_nothing() {
        let mut h = Harness::new();
        let mut pencil = PencilToolState::default();
        h.drag(&mut pencil, &[(10.0, 10.0), (10.0, 10.0)]);
        assert_eq!(h.non_white(), 0);
    }

    #[test]
    fn pencil_preview_then_commit() {
        let mut h = Harness::new();
        h.params.line_width = 3.0;
        let mut pencil = PencilToolState::default();
        pencil.on_pointer_down(&mut h.ctx(), &PointerEvent::left(5.0, 5.0));
        pencil.on_pointer_move(&mut h.ctx(), &PointerEvent::left(20.0, 5.0));
        assert_eq!(h.non_white(), 0);
        assert_eq!(*h.canvas.preview.image().get_pixel(12, 5), BLACK);

        pencil.on_pointer_up(&mut h.ctx(), &PointerEvent::left(20.0, 5.0));
        assert_eq!(*h.canvas.committed.image().get_pixel(12, 5), BLACK);
        assert!(h.canvas.preview.image().pixels().all(|p| p[3] == 0));
        assert!(pencil.path.points.is_empty());
    }

    #[test]
    fn right_button_does_not_draw() {
        let mut h = Harness::new();
        let mut pencil = PencilToolState::default();
        pencil.on_pointer_down(&mut h.ctx(), &PointerEvent::right(5.0, 5.0));
        pencil.on_pointer_move(&mut h.ctx(), &PointerEvent::right(20.0, 5.0));
        pencil.on_pointer_up(&mut h.ctx(), &PointerEvent::right(20.0, 9.0));
        assert_eq!(h.non_white(), 0);
    }

    #[test]
    fn erasing_the_same_path_restores_white() {
        let path = [(4.0, 4.0), (12.5, 9.0), (30.0, 31.0), (33.0, 10.0)];
        for width in [1.0, 2.0, 5.0, 7.0] {
            let mut h = Harness::new();
            h.params.line_width = width;
            let mut pencil = PencilToolState::default();
            h.drag(&mut pencil, &path);
            assert!(h.non_white() > 0);

            let mut eraser = EraserToolState::default();
            h.drag(&mut eraser, &path);
            assert_eq!(h.non_white(), 0, "width {width}");
        }
    }

    #[test]
    fn eraser_draws_its_cursor_on_the_preview() {
        let mut h = Harness::new();
        h.params.line_width = 5.0;
        let mut eraser = EraserToolState::default();
        eraser.on_pointer_move(&mut h.ctx(), &PointerEvent::left(20.0, 20.0));
        assert_eq!(*h.canvas.preview.image().get_pixel(20, 20), WHITE);
        assert_eq!(*h.canvas.preview.image().get_pixel(18, 20), BLACK);
    }

    #[test]
    fn every_brush_texture_paints_something() {
        for texture in [
            BrushTexture::Texture1,
            BrushTexture::Texture2,
            BrushTexture::Texture3,
            BrushTexture::Texture4,
            BrushTexture::Texture5,
        ] {
            let mut h = Harness::new();
            h.params.line_width = 4.0;
            h.params.brush_texture = texture;
            let mut brush = BrushToolState::default();
            h.drag(&mut brush, &[(10.0, 10.0), (20.0, 12.0), (30.0, 25.0)]);
            assert!(h.non_white() > 0, "{texture:?}");
        }
    }

    #[test]
    fn texture_four_is_faint() {
        let mut h = Harness::new();
        h.params.line_width = 4.0;
        h.params.brush_texture = BrushTexture::Texture4;
        let mut brush = BrushToolState::default();
        h.drag(&mut brush, &[(10.0, 10.0), (11.0, 10.0)]);
        let p = h.canvas.committed.image().get_pixel(10, 10);
        assert!(p[0] > 200 && p[0] < 255);
    }

    #[test]
    fn feather_copies_follow_the_angle() {
        let mut h = Harness::new();
        h.params.feather_line_height = 6;
        h.params.feather_angle = 90.0;
        let mut feather = FeatherToolState::default();
        h.drag(&mut feather, &[(5.0, 30.0), (20.0, 30.0), (35.0, 30.0)]);
        // 90° points up: copy i sits i px above the original row
        assert_eq!(*h.canvas.committed.image().get_pixel(20, 25), BLACK);
        assert_eq!(*h.canvas.committed.image().get_pixel(20, 20), WHITE);
    }

    #[test]
    fn feather_wheel_wraps_and_reports() {
        let mut h = Harness::new();
        h.params.feather_angle = 175.0;
        let mut feather = FeatherToolState::default();
        feather.on_wheel(&mut h.ctx(), &WheelEvent::up(0.0, 0.0));
        assert_eq!(h.params.feather_angle, -170.0);
        assert_eq!(h.events.drain(), vec![EditorEvent::FeatherAngleChanged(-170.0)]);
    }

    #[test]
    fn strokes_off_canvas_are_clipped() {
        let mut h = Harness::new();
        h.params.line_width = 10.0;
        let mut pencil = PencilToolState::default();
        h.drag(&mut pencil, &[(-50.0, -50.0), (-10.0, 500.0), (90.0, 20.0)]);
        assert_eq!(h.canvas.dimensions(), (40, 40));
    }

    #[test]
    fn empty_mask_is_harmless() {
        let mut img = image::RgbaImage::from_pixel(2, 2, WHITE);
        composite_counts(&mut img, &new_mask(2, 2), BLACK, 0.5);
        assert!(img.pixels().all(|p| *p == WHITE));
    }
}
