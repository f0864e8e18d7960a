// ============================================================================
// LINE TOOL - multi-segment polyline finished by double-click
// ============================================================================

use crate::canvas::SurfaceId;
use crate::components::tools::{ToolContext, ToolHandler};
use crate::geometry::{Vec2, snap_segment};
use crate::input::{Key, KeyEvent, MouseButton, PointerEvent};
use crate::ops::raster::{band_segment, stamp_disc};

/// A double-click this close to the previous vertex merges into it.
const MERGE_DISTANCE: f32 = 20.0;

#[derive(Clone, Debug, Default)]
pub struct LineToolState {
    pub path: Vec<Vec2>,
    /// Last pointer position, the free end of the live segment.
    pub cursor: Option<Vec2>,
    /// Shift is held: the live segment snaps to 45° steps.
    pub align: bool,
    pub aligned_point: Option<Vec2>,
}

impl LineToolState {
    pub fn is_drawing(&self) -> bool {
        !self.path.is_empty()
    }

    /// Segments with junction discs, plus an optional live segment from the
    /// last vertex. A finished path skips the junctions on its final vertex.
    fn render(&self, ctx: &mut ToolContext, target: SurfaceId, live_to: Option<Vec2>, finished: bool) {
        let width = ctx.params.line_width;
        let radius = ctx.params.point_radius;
        let mut mask = ctx.mask();

        for pair in self.path.windows(2) {
            band_segment(&mut mask, pair[0], pair[1], width);
        }
        let junctions = if finished { self.path.len().saturating_sub(2) } else { self.path.len() };
        for &p in self.path.iter().take(junctions).skip(1) {
            stamp_disc(&mut mask, p, radius);
        }
        if let (Some(&last), Some(end)) = (self.path.last(), live_to) {
            band_segment(&mut mask, last, end, width);
        }

        let (color, alpha) = (ctx.primary(), ctx.params.primary_alpha);
        ctx.paint(target, &mask, color, alpha);
    }

    fn live_end(&self) -> Option<Vec2> {
        if self.align { self.aligned_point.or(self.cursor) } else { self.cursor }
    }

    fn redraw_preview(&self, ctx: &mut ToolContext) {
        ctx.clear_preview();
        self.render(ctx, SurfaceId::Preview, self.live_end(), false);
    }

    fn update_alignment(&mut self) {
        self.aligned_point = match (self.path.last(), self.cursor) {
            (Some(&last), Some(cursor)) => Some(snap_segment(last, cursor)),
            _ => None,
        };
    }

    fn abort(&mut self, ctx: &mut ToolContext) {
        ctx.clear_preview();
        self.path.clear();
        self.align = false;
        self.aligned_point = None;
    }
}

impl ToolHandler for LineToolState {
    fn on_pointer_down(&mut self, _ctx: &mut ToolContext, ev: &PointerEvent) {
        if ev.button != MouseButton::Left || self.align {
            return;
        }
        self.path.push(ev.pos);
        self.cursor = Some(ev.pos);
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        self.cursor = Some(ev.pos);
        if !self.is_drawing() {
            return;
        }
        if self.align {
            self.update_alignment();
        }
        self.redraw_preview(ctx);
    }

    /// The two clicks of a double-click each pushed the same vertex; drop one,
    /// merge with the previous vertex if close, then draw for good.
    fn on_double_click(&mut self, ctx: &mut ToolContext, _ev: &PointerEvent) {
        let Some(last) = self.path.pop() else { return };
        let n = self.path.len();
        if n >= 2 && last.distance(self.path[n - 2]) <= MERGE_DISTANCE {
            self.path[n - 2] = last;
        } else {
            self.path.push(last);
        }
        if self.align
            && let Some(p) = self.aligned_point
        {
            self.path.push(p);
        }
        ctx.clear_preview();
        self.render(ctx, SurfaceId::Committed, None, true);
        crate::log_info!("line: committed {} vertices", self.path.len());
        self.abort(ctx);
    }

    fn on_key_down(&mut self, ctx: &mut ToolContext, ev: &KeyEvent) {
        match ev.key {
            Key::Escape => self.abort(ctx),
            Key::Backspace => {
                if self.path.len() > 1 {
                    self.path.pop();
                    self.update_alignment();
                    self.redraw_preview(ctx);
                }
            }
            _ if ev.modifiers.shift || ev.key == Key::Shift => {
                if !self.is_drawing() {
                    return;
                }
                self.align = true;
                self.update_alignment();
                self.redraw_preview(ctx);
            }
            _ => {}
        }
    }

    fn on_key_up(&mut self, ctx: &mut ToolContext, ev: &KeyEvent) {
        if ev.key != Key::Shift && ev.modifiers.shift {
            return;
        }
        self.align = false;
        if self.is_drawing() {
            self.redraw_preview(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE};
    use crate::components::tools::harness::Harness;
    use crate::input::Modifiers;

    fn click(h: &mut Harness, line: &mut LineToolState, x: f32, y: f32) {
        line.on_pointer_down(&mut h.ctx(), &PointerEvent::left(x, y));
        line.on_pointer_up(&mut h.ctx(), &PointerEvent::left(x, y));
    }

    fn double_click(h: &mut Harness, line: &mut LineToolState, x: f32, y: f32) {
        click(h, line, x, y);
        click(h, line, x, y);
        line.on_double_click(&mut h.ctx(), &PointerEvent::left(x, y));
    }

    fn shift() -> KeyEvent {
        KeyEvent::new(Key::Shift, Modifiers::SHIFT)
    }

    #[test]
    fn clicks_then_double_click_commit_the_polyline() {
        let mut h = Harness::new();
        let mut line = LineToolState::default();
        click(&mut h, &mut line, 5.0, 5.0);
        line.on_pointer_move(&mut h.ctx(), &PointerEvent::left(35.0, 5.0));
        assert_eq!(h.preview(20, 5), BLACK);
        assert_eq!(h.non_white(), 0);

        click(&mut h, &mut line, 35.0, 5.0);
        double_click(&mut h, &mut line, 35.0, 35.0);

        assert_eq!(h.committed(20, 5), BLACK);
        assert_eq!(h.committed(35, 20), BLACK);
        assert_eq!(h.committed(20, 20), WHITE);
        assert!(h.preview_is_clear());
        assert!(!line.is_drawing());
    }

    #[test]
    fn junctions_are_discs_of_point_radius() {
        let mut h = Harness::new();
        h.params.point_radius = 3.0;
        let mut line = LineToolState::default();
        click(&mut h, &mut line, 5.0, 20.0);
        click(&mut h, &mut line, 20.0, 20.0);
        line.on_pointer_move(&mut h.ctx(), &PointerEvent::left(35.0, 20.0));
        assert_eq!(h.preview(20, 23), BLACK);
        assert_eq!(h.preview(10, 23)[3], 0);
    }

    #[test]
    fn escape_aborts_without_drawing() {
        let mut h = Harness::new();
        let mut line = LineToolState::default();
        click(&mut h, &mut line, 5.0, 5.0);
        line.on_pointer_move(&mut h.ctx(), &PointerEvent::left(30.0, 30.0));
        line.on_key_down(&mut h.ctx(), &KeyEvent::plain(Key::Escape));
        assert!(!line.is_drawing());
        assert!(h.preview_is_clear());

        line.on_pointer_move(&mut h.ctx(), &PointerEvent::left(10.0, 30.0));
        line.on_double_click(&mut h.ctx(), &PointerEvent::left(10.0, 30.0));
        assert_eq!(h.non_white(), 0);
    }

    #[test]
    fn backspace_keeps_the_first_vertex() {
        let mut h = Harness::new();
        let mut line = LineToolState::default();
        click(&mut h, &mut line, 5.0, 5.0);
        click(&mut h, &mut line, 15.0, 5.0);
        let backspace = KeyEvent::plain(Key::Backspace);
        line.on_key_down(&mut h.ctx(), &backspace);
        line.on_key_down(&mut h.ctx(), &backspace);
        assert_eq!(line.path, vec![Vec2::new(5.0, 5.0)]);
    }

    #[test]
    fn shift_snaps_the_live_segment_and_release_restores_it() {
        let mut h = Harness::new();
        let mut line = LineToolState::default();
        click(&mut h, &mut line, 10.0, 10.0);
        line.on_pointer_move(&mut h.ctx(), &PointerEvent::left(40.0, 13.0));
        assert_eq!(h.preview(30, 12), BLACK);

        line.on_key_down(&mut h.ctx(), &shift());
        assert_eq!(line.aligned_point, Some(Vec2::new(40.0, 10.0)));
        assert_eq!(h.preview(30, 10), BLACK);
        assert_eq!(h.preview(30, 12)[3], 0);

        // clicks while aligned do not add vertices
        click(&mut h, &mut line, 40.0, 13.0);
        assert_eq!(line.path.len(), 1);

        line.on_key_up(&mut h.ctx(), &KeyEvent::plain(Key::Shift));
        assert!(!line.align);
        assert_eq!(h.preview(30, 12), BLACK);
    }

    #[test]
    fn double_click_while_aligned_appends_the_aligned_point() {
        let mut h = Harness::new();
        let mut line = LineToolState::default();
        click(&mut h, &mut line, 10.0, 10.0);
        click(&mut h, &mut line, 10.0, 30.0);
        line.on_pointer_move(&mut h.ctx(), &PointerEvent::left(35.0, 31.0));
        line.on_key_down(&mut h.ctx(), &shift());
        line.on_double_click(&mut h.ctx(), &PointerEvent::left(35.0, 31.0));
        assert_eq!(h.committed(25, 30), BLACK);
        assert_eq!(h.committed(25, 31), WHITE);
    }

    #[test]
    fn close_double_click_merges_into_the_previous_vertex() {
        let mut h = Harness::new();
        let mut line = LineToolState::default();
        click(&mut h, &mut line, 5.0, 5.0);
        click(&mut h, &mut line, 5.0, 30.0);
        click(&mut h, &mut line, 15.0, 30.0);
        click(&mut h, &mut line, 15.0, 30.0);
        line.on_pointer_move(&mut h.ctx(), &PointerEvent::left(15.0, 30.0));
        // path: (5,5) (5,30) (15,30) (15,30); the middle vertex snaps to the end
        line.on_double_click(&mut h.ctx(), &PointerEvent::left(15.0, 30.0));
        assert_eq!(h.committed(5, 29), WHITE);
        assert_eq!(h.committed(10, 17), BLACK);
    }

    #[test]
    fn double_click_with_no_path_is_harmless() {
        let mut h = Harness::new();
        let mut line = LineToolState::default();
        line.on_double_click(&mut h.ctx(), &PointerEvent::left(10.0, 10.0));
        line.on_key_up(&mut h.ctx(), &KeyEvent::plain(Key::Shift));
        assert_eq!(h.non_white(), 0);
    }
}
