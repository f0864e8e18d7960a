// ============================================================================
// EYEDROPPER - pick the primary (left) or secondary (right) colour
// ============================================================================

use image::Rgba;

use crate::color::{opaque, rgba_to_hex};
use crate::components::tools::{ToolContext, ToolHandler};
use crate::events::EditorEvent;
use crate::input::{MouseButton, PointerEvent};

#[derive(Clone, Copy, Debug, Default)]
pub struct EyedropperToolState {
    /// Colour under the pointer, for a host-side loupe.
    pub hovered: Option<Rgba<u8>>,
}

fn sample(ctx: &ToolContext, ev: &PointerEvent) -> Option<Rgba<u8>> {
    let (x, y) = (ev.pos.x.floor() as i32, ev.pos.y.floor() as i32);
    ctx.canvas.committed.get_pixel(x, y).map(opaque)
}

impl ToolHandler for EyedropperToolState {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        let Some(color) = sample(ctx, ev) else { return };
        let hex = rgba_to_hex(color);
        let (result, event) = match ev.button {
            MouseButton::Left => (ctx.params.set_primary_color(&hex), EditorEvent::PrimaryColorChanged(hex)),
            MouseButton::Right => (ctx.params.set_secondary_color(&hex), EditorEvent::SecondaryColorChanged(hex)),
            MouseButton::Middle => return,
        };
        if let Err(e) = result {
            crate::log_err!("eyedropper: {e}");
            return;
        }
        ctx.events.push(event);
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        self.hovered = sample(ctx, ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tools::harness::Harness;

    #[test]
    fn left_picks_primary_right_picks_secondary() {
        let mut h = Harness::new();
        h.canvas.committed.put_pixel(5, 5, Rgba([12, 34, 56, 255]));
        h.canvas.committed.put_pixel(6, 5, Rgba([200, 100, 0, 255]));
        let mut tool = EyedropperToolState::default();
        tool.on_pointer_down(&mut h.ctx(), &PointerEvent::left(5.4, 5.6));
        tool.on_pointer_down(&mut h.ctx(), &PointerEvent::right(6.0, 5.0));
        assert_eq!(h.params.primary_color, "#0c2238ff");
        assert_eq!(h.params.secondary_color, "#c86400ff");
        assert_eq!(
            h.events.drain(),
            vec![
                EditorEvent::PrimaryColorChanged("#0c2238ff".into()),
                EditorEvent::SecondaryColorChanged("#c86400ff".into())
            ]
        );
    }

    #[test]
    fn picked_colours_are_opaque() {
        let mut h = Harness::new();
        h.params.set_primary_alpha(0.5).unwrap();
        h.canvas.committed.put_pixel(1, 1, Rgba([10, 20, 30, 40]));
        EyedropperToolState::default().on_pointer_down(&mut h.ctx(), &PointerEvent::left(1.0, 1.0));
        assert_eq!(h.params.primary_color, "#0a141eff");
        assert_eq!(h.params.primary_alpha, 1.0);
    }

    #[test]
    fn outside_the_canvas_nothing_changes() {
        let mut h = Harness::new();
        let mut tool = EyedropperToolState::default();
        tool.on_pointer_down(&mut h.ctx(), &PointerEvent::left(-1.0, 3.0));
        tool.on_pointer_move(&mut h.ctx(), &PointerEvent::left(400.0, 3.0));
        assert_eq!(h.params.primary_color, "#000000ff");
        assert!(h.events.is_empty());
        assert_eq!(tool.hovered, None);
    }

    #[test]
    fn hover_tracks_the_pixel_under_the_pointer() {
        let mut h = Harness::new();
        let mut tool = EyedropperToolState::default();
        tool.on_pointer_move(&mut h.ctx(), &PointerEvent::left(3.0, 3.0));
        assert_eq!(tool.hovered, Some(Rgba([255, 255, 255, 255])));
    }
}
