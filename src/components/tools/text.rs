// ============================================================================
// TEXT TOOL - click to open a text box, type, click outside to commit
// ============================================================================

use ab_glyph::FontArc;
use image::Rgba;

use crate::canvas::SurfaceId;
use crate::color::BLACK;
use crate::components::properties::ToolParameters;
use crate::components::tools::{ToolContext, ToolHandler};
use crate::geometry::Vec2;
use crate::input::{Key, KeyEvent, MouseButton, PointerEvent};
use crate::ops::raster::fill_rect;
use crate::ops::shapes::stroke_rect;
use crate::ops::text::{
    GlyphPixelCache, TextAlignment, TextStyle, line_advances, line_height, load_system_font, rasterize_text,
};

pub const BOX_WIDTH: f32 = 350.0;
pub const BOX_MIN_HEIGHT: f32 = 100.0;
pub const BOX_PADDING: f32 = 5.0;
const BORDER_COLOR: Rgba<u8> = Rgba([0xcc, 0xcc, 0xcc, 255]);
/// Line spacing used when no font could be loaded.
const FALLBACK_LINE_FACTOR: f32 = 1.2;

// ============================================================================
// TEXT BUFFER - lines plus a caret, all positions in chars
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
    line: usize,
    column: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self { lines: vec![String::new()], line: 0, column: 0 }
    }
}

fn byte_index(s: &str, column: usize) -> usize {
    s.char_indices().nth(column).map_or(s.len(), |(i, _)| i)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl TextBuffer {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `(line, column)` of the caret.
    pub fn caret(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(String::is_empty)
    }

    fn current(&mut self) -> &mut String {
        &mut self.lines[self.line]
    }

    pub fn insert(&mut self, c: char) {
        let col = self.column;
        let line = self.current();
        let at = byte_index(line, col);
        line.insert(at, c);
        self.column += 1;
    }

    /// Split the current line at the caret.
    pub fn newline(&mut self) {
        let col = self.column;
        let line = self.current();
        let rest = line.split_off(byte_index(line, col));
        self.lines.insert(self.line + 1, rest);
        self.line += 1;
        self.column = 0;
    }

    /// Delete before the caret, joining with the previous line at column 0.
    pub fn backspace(&mut self) {
        if self.column > 0 {
            let col = self.column;
            let line = self.current();
            line.remove(byte_index(line, col - 1));
            self.column -= 1;
        } else if self.line > 0 {
            let tail = self.lines.remove(self.line);
            self.line -= 1;
            self.column = char_len(&self.lines[self.line]);
            self.lines[self.line].push_str(&tail);
        }
    }

    /// Delete after the caret, joining the next line at the end.
    pub fn delete(&mut self) {
        let col = self.column;
        let len = char_len(&self.lines[self.line]);
        if col < len {
            let line = self.current();
            line.remove(byte_index(line, col));
        } else if self.line + 1 < self.lines.len() {
            let next = self.lines.remove(self.line + 1);
            self.lines[self.line].push_str(&next);
        }
    }

    pub fn left(&mut self) {
        if self.column > 0 {
            self.column -= 1;
        } else if self.line > 0 {
            self.line -= 1;
            self.column = char_len(&self.lines[self.line]);
        }
    }

    pub fn right(&mut self) {
        if self.column < char_len(&self.lines[self.line]) {
            self.column += 1;
        } else if self.line + 1 < self.lines.len() {
            self.line += 1;
            self.column = 0;
        }
    }

    pub fn up(&mut self) {
        if self.line > 0 {
            self.line -= 1;
            self.column = self.column.min(char_len(&self.lines[self.line]));
        }
    }

    pub fn down(&mut self) {
        if self.line + 1 < self.lines.len() {
            self.line += 1;
            self.column = self.column.min(char_len(&self.lines[self.line]));
        }
    }
}

// ============================================================================
// TOOL
// ============================================================================

#[derive(Clone, Debug)]
struct OpenBox {
    origin: Vec2,
    buffer: TextBuffer,
}

type FontKey = (String, bool, bool);

#[derive(Default)]
pub struct TextToolState {
    open: Option<OpenBox>,
    font: Option<(FontKey, Option<FontArc>)>,
    glyph_cache: GlyphPixelCache,
}

impl TextToolState {
    pub fn is_editing(&self) -> bool {
        self.open.is_some()
    }

    pub fn buffer(&self) -> Option<&TextBuffer> {
        self.open.as_ref().map(|b| &b.buffer)
    }

    pub fn box_origin(&self) -> Option<Vec2> {
        self.open.as_ref().map(|b| b.origin)
    }

    /// The font for the current family/style, loaded once per combination.
    fn font(&mut self, params: &ToolParameters) -> Option<FontArc> {
        let key = (params.font_family.clone(), params.bold, params.italic);
        let stale = self.font.as_ref().is_none_or(|(k, _)| *k != key);
        if stale {
            let loaded = load_system_font(&key.0, key.1, key.2);
            if loaded.is_none() {
                crate::log_warn!("text: no usable system font for \"{}\"", key.0);
            }
            self.glyph_cache.clear();
            self.font = Some((key, loaded));
        }
        self.font.as_ref().and_then(|(_, f)| f.clone())
    }

    fn line_spacing(font: Option<&FontArc>, size: f32) -> f32 {
        match font {
            Some(f) => line_height(f, size),
            None => size * FALLBACK_LINE_FACTOR,
        }
    }

    fn box_height(lines: usize, spacing: f32) -> f32 {
        (lines as f32 * spacing + 2.0 * BOX_PADDING).max(BOX_MIN_HEIGHT)
    }

    fn contains(origin: Vec2, height: f32, p: Vec2) -> bool {
        p.x >= origin.x && p.x <= origin.x + BOX_WIDTH && p.y >= origin.y && p.y <= origin.y + height
    }

    /// Alignment anchor inside the box.
    fn anchor_x(origin: Vec2, alignment: TextAlignment) -> f32 {
        match alignment {
            TextAlignment::Left => origin.x + BOX_PADDING,
            TextAlignment::Center => origin.x + BOX_WIDTH / 2.0,
            TextAlignment::Right => origin.x + BOX_WIDTH - BOX_PADDING,
        }
    }

    fn draw_text(&mut self, ctx: &mut ToolContext, target: SurfaceId, origin: Vec2, lines: &[String]) {
        let Some(font) = self.font(ctx.params) else { return };
        let style = TextStyle {
            font_size: ctx.params.font_size,
            alignment: ctx.params.alignment,
            bold: ctx.params.bold,
            italic: ctx.params.italic,
        };
        let mask = rasterize_text(
            &font,
            lines,
            style,
            Self::anchor_x(origin, style.alignment),
            origin.y + BOX_PADDING,
            ctx.canvas.width(),
            ctx.canvas.height(),
            &mut self.glyph_cache,
        );
        let (color, alpha) = (ctx.primary(), ctx.params.primary_alpha);
        ctx.paint(target, &mask, color, alpha);
    }

    /// Box, live text and caret on the preview.
    fn redraw_preview(&mut self, ctx: &mut ToolContext) {
        ctx.clear_preview();
        let Some(open) = self.open.clone() else { return };
        let font = self.font(ctx.params);
        let size = ctx.params.font_size;
        let spacing = Self::line_spacing(font.as_ref(), size);
        let height = Self::box_height(open.buffer.lines().len(), spacing);

        let mut border = ctx.mask();
        stroke_rect(&mut border, open.origin.x, open.origin.y, BOX_WIDTH, height, 1.0);
        ctx.paint(SurfaceId::Preview, &border, BORDER_COLOR, 1.0);

        self.draw_text(ctx, SurfaceId::Preview, open.origin, open.buffer.lines());

        let (line, column) = open.buffer.caret();
        let text = &open.buffer.lines()[line];
        let (offset, width) = match &font {
            Some(f) => {
                let adv = line_advances(f, text, size);
                (adv.get(column).copied().unwrap_or(0.0), adv.last().copied().unwrap_or(0.0))
            }
            None => (0.0, 0.0),
        };
        let start = match ctx.params.alignment {
            TextAlignment::Left => 0.0,
            TextAlignment::Center => -width / 2.0,
            TextAlignment::Right => -width,
        };
        let caret_x = (Self::anchor_x(open.origin, ctx.params.alignment) + start + offset).round();
        let caret_y = open.origin.y + BOX_PADDING + line as f32 * spacing;
        let mut caret = ctx.mask();
        fill_rect(&mut caret, caret_x, caret_y, 1.0, spacing);
        ctx.paint(SurfaceId::Preview, &caret, BLACK, 1.0);
    }

    /// Rasterize the box contents onto the drawing and close it.
    pub fn commit(&mut self, ctx: &mut ToolContext) {
        let Some(open) = self.open.take() else { return };
        ctx.clear_preview();
        if open.buffer.is_empty() {
            return;
        }
        self.draw_text(ctx, SurfaceId::Committed, open.origin, open.buffer.lines());
        crate::log_info!("text: committed {} line(s)", open.buffer.lines().len());
    }

    /// Close the box without drawing.
    pub fn cancel(&mut self, ctx: &mut ToolContext) {
        self.open = None;
        ctx.clear_preview();
    }
}

impl ToolHandler for TextToolState {
    fn on_pointer_up(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        if ev.button != MouseButton::Left {
            return;
        }
        let Some((origin, lines)) = self.open.as_ref().map(|o| (o.origin, o.buffer.lines().len())) else {
            self.open = Some(OpenBox { origin: ev.pos, buffer: TextBuffer::default() });
            self.redraw_preview(ctx);
            return;
        };
        let font = self.font(ctx.params);
        let spacing = Self::line_spacing(font.as_ref(), ctx.params.font_size);
        if !Self::contains(origin, Self::box_height(lines, spacing), ev.pos) {
            self.commit(ctx);
        }
    }

    fn on_key_down(&mut self, ctx: &mut ToolContext, ev: &KeyEvent) {
        let Some(open) = self.open.as_mut() else { return };
        let buffer = &mut open.buffer;
        match ev.key {
            Key::Escape => {
                self.cancel(ctx);
                return;
            }
            Key::Enter => buffer.newline(),
            Key::Backspace => buffer.backspace(),
            Key::Delete => buffer.delete(),
            Key::ArrowLeft => buffer.left(),
            Key::ArrowRight => buffer.right(),
            Key::ArrowUp => buffer.up(),
            Key::ArrowDown => buffer.down(),
            Key::Char(c) if !ev.modifiers.ctrl && !c.is_control() => buffer.insert(c),
            _ => return,
        }
        self.redraw_preview(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tools::harness::Harness;
    use crate::input::Modifiers;

    fn typed(text: &str) -> TextBuffer {
        let mut b = TextBuffer::default();
        for c in text.chars() {
            if c == '\n' {
                b.newline();
            } else {
                b.insert(c);
            }
        }
        b
    }

    #[test]
    fn typing_and_newlines_build_lines() {
        let b = typed("ab\ncd");
        assert_eq!(b.lines(), ["ab", "cd"]);
        assert_eq!(b.caret(), (1, 2));
    }

    #[test]
    fn newline_splits_at_the_caret() {
        let mut b = typed("hello");
        b.left();
        b.left();
        b.newline();
        assert_eq!(b.lines(), ["hel", "lo"]);
        assert_eq!(b.caret(), (1, 0));
    }

    #[test]
    fn backspace_at_line_start_joins_lines() {
        let mut b = typed("ab\ncd");
        b.left();
        b.left();
        b.backspace();
        assert_eq!(b.lines(), ["abcd"]);
        assert_eq!(b.caret(), (0, 2));
        b.backspace();
        assert_eq!(b.lines(), ["acd"]);
    }

    #[test]
    fn delete_at_line_end_pulls_the_next_line_up() {
        let mut b = typed("ab\ncd");
        b.up();
        b.delete();
        assert_eq!(b.lines(), ["abcd"]);
        b.delete();
        assert_eq!(b.lines(), ["abd"]);
    }

    #[test]
    fn arrows_wrap_between_lines_and_clamp() {
        let mut b = typed("abc\nd");
        b.right();
        assert_eq!(b.caret(), (1, 1));
        b.up();
        assert_eq!(b.caret(), (0, 1));
        b.left();
        b.left();
        assert_eq!(b.caret(), (0, 0));
        b.down();
        b.right();
        b.right();
        assert_eq!(b.caret(), (1, 1));
    }

    #[test]
    fn multibyte_characters_are_single_positions() {
        let mut b = typed("héé");
        b.left();
        b.backspace();
        assert_eq!(b.lines(), ["hé"]);
        assert_eq!(b.caret(), (0, 1));
    }

    #[test]
    fn click_opens_a_box_on_the_preview() {
        let mut h = Harness::sized(400, 200);
        let mut tool = TextToolState::default();
        tool.on_pointer_up(&mut h.ctx(), &PointerEvent::left(10.0, 20.0));
        assert!(tool.is_editing());
        assert_eq!(tool.box_origin(), Some(Vec2::new(10.0, 20.0)));
        assert_eq!(h.preview(100, 20), BORDER_COLOR);
        assert_eq!(h.non_white(), 0);
    }

    #[test]
    fn escape_discards_the_box() {
        let mut h = Harness::sized(400, 200);
        let mut tool = TextToolState::default();
        tool.on_pointer_up(&mut h.ctx(), &PointerEvent::left(10.0, 20.0));
        tool.on_key_down(&mut h.ctx(), &KeyEvent::plain(Key::Char('x')));
        tool.on_key_down(&mut h.ctx(), &KeyEvent::plain(Key::Escape));
        assert!(!tool.is_editing());
        assert!(h.preview_is_clear());
        assert_eq!(h.non_white(), 0);
    }

    #[test]
    fn clicks_inside_keep_editing_and_ctrl_keys_are_not_typed() {
        let mut h = Harness::sized(400, 200);
        let mut tool = TextToolState::default();
        tool.on_pointer_up(&mut h.ctx(), &PointerEvent::left(10.0, 20.0));
        tool.on_key_down(&mut h.ctx(), &KeyEvent::plain(Key::Char('a')));
        tool.on_key_down(&mut h.ctx(), &KeyEvent::new(Key::Char('b'), Modifiers::CTRL));
        tool.on_pointer_up(&mut h.ctx(), &PointerEvent::left(50.0, 50.0));
        assert!(tool.is_editing());
        assert_eq!(tool.buffer().map(|b| b.lines().to_vec()), Some(vec!["a".to_string()]));
    }

    #[test]
    fn clicking_outside_commits() {
        let mut h = Harness::sized(400, 200);
        let mut tool = TextToolState::default();
        tool.on_pointer_up(&mut h.ctx(), &PointerEvent::left(10.0, 20.0));
        for c in "Hi".chars() {
            tool.on_key_down(&mut h.ctx(), &KeyEvent::plain(Key::Char(c)));
        }
        tool.on_pointer_up(&mut h.ctx(), &PointerEvent::left(390.0, 190.0));
        assert!(!tool.is_editing());
        assert!(h.preview_is_clear());
        // Glyph pixels depend on the fonts installed on the machine
        if load_system_font(&h.params.font_family, false, false).is_some() {
            assert!(h.non_white() > 0);
        }
    }

    #[test]
    fn an_empty_box_commits_nothing() {
        let mut h = Harness::sized(400, 200);
        let mut tool = TextToolState::default();
        tool.on_pointer_up(&mut h.ctx(), &PointerEvent::left(10.0, 20.0));
        tool.on_pointer_up(&mut h.ctx(), &PointerEvent::left(390.0, 190.0));
        assert!(!tool.is_editing());
        assert_eq!(h.non_white(), 0);
    }
}
