// ============================================================================
// SELECTION - marquee, drag, rotate, magnetism and clipboard
// ============================================================================
//
// A finalized selection is a rectangle `(origin, size)` inside
// `selection_data`, a snapshot of the whole committed surface taken when the
// selection was made. Every drag/rotate redraw samples that snapshot, never
// the live surface, so the footprint can be painted white underneath.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::canvas::SurfaceId;
use crate::color::{BLACK, SELECTION_BLUE, WHITE};
use crate::components::tools::{ToolContext, ToolHandler};
use crate::events::EditorEvent;
use crate::geometry::{Vec2, magnet_top_corner, rotate_by_wheel, snap_to_grid};
use crate::input::{Key, KeyEvent, MouseButton, PointerEvent, WheelEvent};
use crate::ops::raster::{fill_rect, stamp_disc, stroke_dashed};
use crate::ops::shapes::{ellipse_points, fill_ellipse, rect_points, stroke_rect};
use crate::ops::transform::{Affine, Clip, Placement, draw_image};

const MARQUEE_DASH: f32 = 3.0;
const BOX_LINE_WIDTH: f32 = 2.0;
const HANDLE_RADIUS: f32 = 3.0;
const ARROW_STEP: f32 = 3.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionShape {
    #[default]
    Rectangle,
    Ellipse,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gesture {
    #[default]
    Idle,
    Forming,
    Dragging,
}

/// Copied pixels: the snapshot plus the region that was selected in it.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipboardData {
    pub pixels: RgbaImage,
    pub origin: Vec2,
    pub size: Vec2,
}

#[derive(Clone, Debug, Default)]
pub struct SelectionToolState {
    pub shape: SelectionShape,
    pub origin: Vec2,
    pub size: Vec2,
    /// Degrees in (-180, 180].
    pub angle: f32,
    pub selection_data: Option<RgbaImage>,
    clipboard: Option<ClipboardData>,
    /// Pointer position the current drag is measured from.
    drag_anchor: Vec2,
    marquee_start: Option<Vec2>,
    gesture: Gesture,
}

impl SelectionToolState {
    pub fn new(shape: SelectionShape) -> Self {
        Self { shape, ..Default::default() }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn has_selection(&self) -> bool {
        self.selection_data.is_some()
    }

    pub fn clipboard(&self) -> Option<&ClipboardData> {
        self.clipboard.as_ref()
    }

    pub fn middle(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.origin.x
            && p.y >= self.origin.y
            && p.x < self.origin.x + self.size.x
            && p.y < self.origin.y + self.size.y
    }

    fn clip(&self) -> Clip {
        match self.shape {
            SelectionShape::Rectangle => Clip::None,
            SelectionShape::Ellipse => Clip::InscribedEllipse,
        }
    }

    fn set_angle(&mut self, ctx: &mut ToolContext, angle: f32) {
        if self.angle == angle && ctx.params.selection_angle == angle {
            return;
        }
        self.angle = angle;
        ctx.params.selection_angle = angle;
        ctx.events.push(EditorEvent::SelectionAngleChanged(angle));
    }

    fn snapshot(&mut self, ctx: &ToolContext) {
        self.selection_data = Some(ctx.canvas.committed.image().clone());
    }

    /// Top-left where the selection lands for pointer position `at`.
    pub fn placement_for(&self, ctx: &ToolContext, at: Vec2) -> Vec2 {
        let top_left = self.origin + at - self.drag_anchor;
        if !ctx.params.magnetism {
            return top_left;
        }
        let grid = ctx.params.grid_size;
        let corner = magnet_top_corner(ctx.params.magnet_anchor, snap_to_grid(top_left, grid), self.size.x, self.size.y);
        corner + Vec2::new(grid, grid)
    }

    /// Draw the selected pixels for pointer position `at`, rotated about the
    /// moved middle. Returns the placed top-left.
    pub fn draw_selection(&self, ctx: &mut ToolContext, target: SurfaceId, at: Vec2) -> Option<Vec2> {
        let data = self.selection_data.as_ref()?;
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return None;
        }
        let top_left = self.placement_for(ctx, at);
        let pivot = self.middle() + at - self.drag_anchor;
        let placement = Placement { src_origin: self.origin, src_size: self.size, dest_origin: top_left, dest_size: self.size };
        let transform = Affine::rotate_about(pivot, self.angle);
        draw_image(ctx.canvas.surface_mut(target).image_mut(), data, placement, transform, self.clip());
        Some(top_left)
    }

    /// Paint the original selection area white.
    fn clear_footprint(&self, ctx: &mut ToolContext, target: SurfaceId) {
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return;
        }
        let mut mask = ctx.mask();
        match self.shape {
            SelectionShape::Rectangle => fill_rect(&mut mask, self.origin.x, self.origin.y, self.size.x, self.size.y),
            SelectionShape::Ellipse => fill_ellipse(&mut mask, self.middle(), self.size.x / 2.0, self.size.y / 2.0),
        }
        ctx.paint(target, &mask, WHITE, 1.0);
    }

    /// Blue outline with eight black handles, on the preview.
    fn draw_box(&self, ctx: &mut ToolContext, top_left: Vec2) {
        let (w, h) = (self.size.x, self.size.y);
        let mut outline = ctx.mask();
        stroke_rect(&mut outline, top_left.x, top_left.y, w, h, BOX_LINE_WIDTH);
        ctx.paint(SurfaceId::Preview, &outline, SELECTION_BLUE, 1.0);

        let mut handles = ctx.mask();
        for fx in [0.0, 0.5, 1.0] {
            for fy in [0.0, 0.5, 1.0] {
                if fx == 0.5 && fy == 0.5 {
                    continue;
                }
                stamp_disc(&mut handles, top_left + Vec2::new(w * fx, h * fy), HANDLE_RADIUS);
            }
        }
        ctx.paint(SurfaceId::Preview, &handles, BLACK, 1.0);
    }

    /// Dashed outline of the marquee from `start` spanning `(w, h)`.
    fn draw_marquee(&self, ctx: &mut ToolContext, start: Vec2, w: f32, h: f32) {
        let points = match self.shape {
            SelectionShape::Rectangle => rect_points(start.x, start.y, w, h).to_vec(),
            SelectionShape::Ellipse => ellipse_points(start + Vec2::new(w / 2.0, h / 2.0), (w / 2.0).abs(), (h / 2.0).abs()),
        };
        let mut mask = ctx.mask();
        stroke_dashed(&mut mask, &points, MARQUEE_DASH);
        ctx.paint(SurfaceId::Preview, &mask, BLACK, 1.0);
    }

    /// Draw the selection on the drawing at `at`, then make the placed pixels
    /// the new selection. The rotation is baked in, so the angle resets.
    fn drop_at(&mut self, ctx: &mut ToolContext, at: Vec2) {
        self.clear_footprint(ctx, SurfaceId::Committed);
        let Some(top_left) = self.draw_selection(ctx, SurfaceId::Committed, at) else { return };
        self.origin = top_left;
        self.drag_anchor = at;
        self.snapshot(ctx);
        self.set_angle(ctx, 0.0);
        ctx.clear_preview();
        self.draw_box(ctx, top_left);
    }

    // ------------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------------

    pub fn copy(&mut self) {
        if let Some(pixels) = &self.selection_data {
            self.clipboard = Some(ClipboardData { pixels: pixels.clone(), origin: self.origin, size: self.size });
        }
    }

    pub fn cut(&mut self, ctx: &mut ToolContext) {
        self.copy();
        self.delete(ctx);
    }

    /// White out the selection and drop it.
    pub fn delete(&mut self, ctx: &mut ToolContext) {
        if !self.has_selection() {
            return;
        }
        self.clear_footprint(ctx, SurfaceId::Committed);
        ctx.clear_preview();
        self.selection_data = None;
        self.gesture = Gesture::Idle;
    }

    /// Place the clipboard at the canvas origin as the new selection.
    pub fn paste(&mut self, ctx: &mut ToolContext) {
        let Some(clip) = self.clipboard.as_ref() else { return };
        self.selection_data = Some(clip.pixels.clone());
        self.origin = clip.origin;
        self.size = clip.size;
        self.drag_anchor = self.middle();
        ctx.clear_preview();
        let at = self.size * 0.5;
        let Some(top_left) = self.draw_selection(ctx, SurfaceId::Committed, at) else { return };
        self.origin = top_left;
        self.drag_anchor = at;
        self.snapshot(ctx);
        self.draw_box(ctx, top_left);
        self.gesture = Gesture::Idle;
    }

    /// Delete, Ctrl+C, Ctrl+X, Ctrl+V. Other keys are ignored.
    pub fn on_clipboard_key(&mut self, ctx: &mut ToolContext, ev: &KeyEvent) {
        if ev.key == Key::Delete {
            self.delete(ctx);
        } else if ev.is_ctrl_char('c') {
            self.copy();
        } else if ev.is_ctrl_char('x') {
            self.cut(ctx);
        } else if ev.is_ctrl_char('v') {
            self.paste(ctx);
        }
    }
}

impl ToolHandler for SelectionToolState {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        if ev.button != MouseButton::Left {
            return;
        }
        ctx.clear_preview();
        if self.has_selection() && self.contains(ev.pos) {
            self.drag_anchor = ev.pos;
            self.gesture = Gesture::Dragging;
        } else {
            self.set_angle(ctx, 0.0);
            self.marquee_start = Some(ev.pos);
            self.gesture = Gesture::Forming;
        }
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        match self.gesture {
            Gesture::Dragging => {
                ctx.clear_preview();
                self.clear_footprint(ctx, SurfaceId::Committed);
                self.draw_selection(ctx, SurfaceId::Preview, ev.pos);
            }
            Gesture::Forming => {
                let Some(start) = self.marquee_start else { return };
                let (mut w, h) = (ev.pos.x - start.x, ev.pos.y - start.y);
                if ev.modifiers.shift {
                    w = h;
                }
                ctx.clear_preview();
                self.draw_marquee(ctx, start, w, h);
            }
            Gesture::Idle => {}
        }
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        match self.gesture {
            Gesture::Dragging => {
                ctx.clear_preview();
                self.drop_at(ctx, ev.pos);
            }
            Gesture::Forming => {
                let Some(start) = self.marquee_start.take() else { return };
                let delta = ev.pos - start;
                self.origin = start.min(ev.pos);
                self.size = delta.abs();
                self.drag_anchor = ev.pos;
                ctx.clear_preview();
                if self.size.x < 1.0 || self.size.y < 1.0 {
                    self.selection_data = None;
                } else {
                    self.draw_marquee(ctx, start, delta.x, delta.y);
                    self.draw_box(ctx, self.origin);
                    self.snapshot(ctx);
                    crate::log_info!(
                        "selection: {:?} {}x{} at ({}, {})",
                        self.shape,
                        self.size.x,
                        self.size.y,
                        self.origin.x,
                        self.origin.y
                    );
                }
            }
            Gesture::Idle => {}
        }
        self.gesture = Gesture::Idle;
    }

    fn on_wheel(&mut self, ctx: &mut ToolContext, ev: &WheelEvent) {
        let angle = rotate_by_wheel(self.angle, ev.delta_y, ev.modifiers.alt);
        self.set_angle(ctx, angle);
        self.drag_anchor = self.middle();
        ctx.clear_preview();
        if self.has_selection() {
            self.clear_footprint(ctx, SurfaceId::Preview);
            self.draw_selection(ctx, SurfaceId::Preview, self.middle());
        }
    }

    fn on_key_down(&mut self, ctx: &mut ToolContext, ev: &KeyEvent) {
        self.drag_anchor = self.middle();
        let step = match ev.key {
            Key::Escape => {
                ctx.clear_preview();
                self.gesture = Gesture::Idle;
                self.marquee_start = None;
                return;
            }
            Key::Char(c) if c.eq_ignore_ascii_case(&'m') && !ev.modifiers.ctrl => {
                ctx.params.magnetism = !ctx.params.magnetism;
                crate::log_info!("selection: magnetism {}", if ctx.params.magnetism { "on" } else { "off" });
                ctx.events.push(EditorEvent::MagnetismToggled(ctx.params.magnetism));
                return;
            }
            Key::ArrowLeft => Vec2::new(-ARROW_STEP, 0.0),
            Key::ArrowRight => Vec2::new(ARROW_STEP, 0.0),
            Key::ArrowUp => Vec2::new(0.0, -ARROW_STEP),
            Key::ArrowDown => Vec2::new(0.0, ARROW_STEP),
            _ => return,
        };
        if self.has_selection() {
            let at = self.middle() + step;
            self.drop_at(ctx, at);
        }
    }
}
