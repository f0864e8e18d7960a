// ============================================================================
// STAMP - caller-provided image, scaled and rotated about the cursor
// ============================================================================

use image::RgbaImage;

use crate::canvas::SurfaceId;
use crate::components::tools::{ToolContext, ToolHandler};
use crate::events::EditorEvent;
use crate::geometry::{Vec2, rotate_by_wheel};
use crate::input::{MouseButton, PointerEvent, WheelEvent};
use crate::ops::transform::{Affine, Clip, Placement, draw_image};

/// `stamp_scale` is in tenths of the image size.
const SCALE_DIVISOR: f32 = 10.0;

#[derive(Clone, Debug, Default)]
pub struct StampToolState {
    pub image: Option<RgbaImage>,
    pub cursor: Option<Vec2>,
}

impl StampToolState {
    /// Stamp size on the canvas for the current scale.
    pub fn stamp_size(&self, scale: f32) -> Option<Vec2> {
        let img = self.image.as_ref()?;
        let size = Vec2::new(img.width() as f32, img.height() as f32) * (scale / SCALE_DIVISOR);
        (size.x > 0.0 && size.y > 0.0).then_some(size)
    }

    fn draw_at(&self, ctx: &mut ToolContext, target: SurfaceId, at: Vec2) {
        let Some(img) = self.image.as_ref() else { return };
        let Some(size) = self.stamp_size(ctx.params.stamp_scale) else { return };
        let placement = Placement {
            src_origin: Vec2::ZERO,
            src_size: Vec2::new(img.width() as f32, img.height() as f32),
            dest_origin: at - size * 0.5,
            dest_size: size,
        };
        let transform = Affine::rotate_about(at, ctx.params.stamp_angle);
        draw_image(ctx.canvas.surface_mut(target).image_mut(), img, placement, transform, Clip::None);
    }

    fn redraw_preview(&self, ctx: &mut ToolContext) {
        ctx.clear_preview();
        if let Some(at) = self.cursor {
            self.draw_at(ctx, SurfaceId::Preview, at);
        }
    }
}

impl ToolHandler for StampToolState {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        if ev.button != MouseButton::Left {
            return;
        }
        if self.image.is_none() {
            crate::log_warn!("stamp: no image loaded");
            return;
        }
        self.draw_at(ctx, SurfaceId::Committed, ev.pos);
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        self.cursor = Some(ev.pos);
        self.redraw_preview(ctx);
    }

    fn on_wheel(&mut self, ctx: &mut ToolContext, ev: &WheelEvent) {
        self.cursor = Some(ev.pos);
        let angle = rotate_by_wheel(ctx.params.stamp_angle, ev.delta_y, ev.modifiers.alt);
        ctx.params.stamp_angle = angle;
        ctx.events.push(EditorEvent::StampAngleChanged(angle));
        self.redraw_preview(ctx);
    }
}
