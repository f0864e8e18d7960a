// ============================================================================
// TOOL MANAGER - active tool, shared parameters, event dispatch
// ============================================================================

pub mod eyedropper;
pub mod fill;
pub mod freehand;
pub mod line;
pub mod selection;
pub mod shapes;
pub mod spray;
pub mod stamp;
pub mod text;

use image::{GrayImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::canvas::{CanvasState, SurfaceId};
use crate::color::{BLACK, hex_to_rgba};
use crate::components::properties::ToolParameters;
use crate::events::{EditorEvent, EventQueue};
use crate::input::{InputEvent, Key, KeyEvent, PointerEvent, WheelEvent};
use crate::ops::raster::{composite_mask, new_mask};

use eyedropper::EyedropperToolState;
use fill::FillToolState;
use freehand::{BrushToolState, EraserToolState, FeatherToolState, PencilToolState};
use line::LineToolState;
use selection::{SelectionShape, SelectionToolState};
use shapes::{EllipseToolState, PolygonToolState, RectangleToolState};
use spray::SprayToolState;
use stamp::StampToolState;
use text::TextToolState;

/// Width the eraser switches to the first time it is picked.
pub const ERASER_FIRST_USE_WIDTH: f32 = 5.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Pencil,
    Brush,
    Eraser,
    Spray,
    Feather,
    Line,
    Rectangle,
    Ellipse,
    Polygon,
    Stamp,
    PaintBucket,
    SelectionRectangle,
    SelectionEllipse,
    Clipboard,
    Text,
    Eyedropper,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pencil,
            Tool::Brush,
            Tool::Eraser,
            Tool::Spray,
            Tool::Feather,
            Tool::Line,
            Tool::Rectangle,
            Tool::Ellipse,
            Tool::Polygon,
            Tool::Stamp,
            Tool::PaintBucket,
            Tool::SelectionRectangle,
            Tool::SelectionEllipse,
            Tool::Clipboard,
            Tool::Text,
            Tool::Eyedropper,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Brush => "Brush",
            Tool::Eraser => "Eraser",
            Tool::Spray => "Spray",
            Tool::Feather => "Feather",
            Tool::Line => "Line",
            Tool::Rectangle => "Rectangle",
            Tool::Ellipse => "Ellipse",
            Tool::Polygon => "Polygon",
            Tool::Stamp => "Stamp",
            Tool::PaintBucket => "Paint Bucket",
            Tool::SelectionRectangle => "Rectangle Selection",
            Tool::SelectionEllipse => "Ellipse Selection",
            Tool::Clipboard => "Clipboard",
            Tool::Text => "Text",
            Tool::Eyedropper => "Eyedropper",
        }
    }
}

// ============================================================================
// TOOL CONTEXT - what a handler may touch
// ============================================================================

pub struct ToolContext<'a> {
    pub canvas: &'a mut CanvasState,
    pub params: &'a mut ToolParameters,
    pub events: &'a mut EventQueue,
}

impl ToolContext<'_> {
    /// Blank coverage mask the size of the canvas.
    pub fn mask(&self) -> GrayImage {
        new_mask(self.canvas.width(), self.canvas.height())
    }

    /// Composite `mask` in `color` at `alpha` onto `target`.
    pub fn paint(&mut self, target: SurfaceId, mask: &GrayImage, color: Rgba<u8>, alpha: f32) {
        composite_mask(self.canvas.surface_mut(target).image_mut(), mask, color, alpha);
    }

    pub fn primary(&self) -> Rgba<u8> {
        paint_color(&self.params.primary_color)
    }

    pub fn secondary(&self) -> Rgba<u8> {
        paint_color(&self.params.secondary_color)
    }

    pub fn clear_preview(&mut self) {
        self.canvas.clear_preview();
    }
}

/// Parameters are validated on the way in; a bad colour that slipped past
/// (direct field writes) paints black rather than aborting the gesture.
fn paint_color(hex: &str) -> Rgba<u8> {
    match hex_to_rgba(hex) {
        Ok(c) => c,
        Err(e) => {
            crate::log_warn!("tools: {e}, painting black");
            BLACK
        }
    }
}

/// Per-tool input handlers. Every method defaults to a no-op so a tool
/// implements only the events it reacts to.
pub trait ToolHandler {
    fn on_pointer_down(&mut self, _ctx: &mut ToolContext, _ev: &PointerEvent) {}
    fn on_pointer_move(&mut self, _ctx: &mut ToolContext, _ev: &PointerEvent) {}
    fn on_pointer_up(&mut self, _ctx: &mut ToolContext, _ev: &PointerEvent) {}
    fn on_double_click(&mut self, _ctx: &mut ToolContext, _ev: &PointerEvent) {}
    fn on_wheel(&mut self, _ctx: &mut ToolContext, _ev: &WheelEvent) {}
    fn on_key_down(&mut self, _ctx: &mut ToolContext, _ev: &KeyEvent) {}
    fn on_key_up(&mut self, _ctx: &mut ToolContext, _ev: &KeyEvent) {}
}

// ============================================================================
// TOOL STATES - one per tool, created once
// ============================================================================

#[derive(Default)]
pub struct ToolStates {
    pub pencil: PencilToolState,
    pub brush: BrushToolState,
    pub eraser: EraserToolState,
    pub spray: SprayToolState,
    pub feather: FeatherToolState,
    pub line: LineToolState,
    pub rectangle: RectangleToolState,
    pub ellipse: EllipseToolState,
    pub polygon: PolygonToolState,
    pub stamp: StampToolState,
    pub paint_bucket: FillToolState,
    pub selection_rectangle: SelectionToolState,
    pub selection_ellipse: SelectionToolState,
    pub text: TextToolState,
    pub eyedropper: EyedropperToolState,
}

impl ToolStates {
    pub fn new() -> Self {
        Self {
            selection_rectangle: SelectionToolState::new(SelectionShape::Rectangle),
            selection_ellipse: SelectionToolState::new(SelectionShape::Ellipse),
            ..Default::default()
        }
    }

    pub fn selection(&self, shape: SelectionShape) -> &SelectionToolState {
        match shape {
            SelectionShape::Rectangle => &self.selection_rectangle,
            SelectionShape::Ellipse => &self.selection_ellipse,
        }
    }

    pub fn selection_mut(&mut self, shape: SelectionShape) -> &mut SelectionToolState {
        match shape {
            SelectionShape::Rectangle => &mut self.selection_rectangle,
            SelectionShape::Ellipse => &mut self.selection_ellipse,
        }
    }

    /// Handler for pointer/wheel/key events of `tool`. The clipboard tool has
    /// none of its own; its keys are routed by the manager.
    fn handler_mut(&mut self, tool: Tool) -> Option<&mut dyn ToolHandler> {
        let handler: &mut dyn ToolHandler = match tool {
            Tool::Pencil => &mut self.pencil,
            Tool::Brush => &mut self.brush,
            Tool::Eraser => &mut self.eraser,
            Tool::Spray => &mut self.spray,
            Tool::Feather => &mut self.feather,
            Tool::Line => &mut self.line,
            Tool::Rectangle => &mut self.rectangle,
            Tool::Ellipse => &mut self.ellipse,
            Tool::Polygon => &mut self.polygon,
            Tool::Stamp => &mut self.stamp,
            Tool::PaintBucket => &mut self.paint_bucket,
            Tool::SelectionRectangle => &mut self.selection_rectangle,
            Tool::SelectionEllipse => &mut self.selection_ellipse,
            Tool::Text => &mut self.text,
            Tool::Eyedropper => &mut self.eyedropper,
            Tool::Clipboard => return None,
        };
        Some(handler)
    }
}

// ============================================================================
// TOOL MANAGER
// ============================================================================

pub struct ToolManager {
    active: Tool,
    pub params: ToolParameters,
    pub states: ToolStates,
    eraser_first_time: bool,
    /// Selection variant the clipboard tool acts on.
    last_selection: SelectionShape,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(ToolParameters::default())
    }
}

impl ToolManager {
    pub fn new(params: ToolParameters) -> Self {
        Self {
            active: Tool::Pencil,
            params,
            states: ToolStates::new(),
            eraser_first_time: true,
            last_selection: SelectionShape::Rectangle,
        }
    }

    pub fn active_tool(&self) -> Tool {
        self.active
    }

    pub fn last_selection(&self) -> SelectionShape {
        self.last_selection
    }

    /// Make `tool` active. Other tools keep their state; an in-flight spray
    /// emission stops.
    pub fn select_tool(&mut self, tool: Tool, events: &mut EventQueue) {
        if tool == Tool::Eraser && self.eraser_first_time {
            self.eraser_first_time = false;
            self.params.line_width = ERASER_FIRST_USE_WIDTH;
        }
        match tool {
            Tool::SelectionRectangle => self.last_selection = SelectionShape::Rectangle,
            Tool::SelectionEllipse => self.last_selection = SelectionShape::Ellipse,
            _ => {}
        }
        if self.active == Tool::Spray && tool != Tool::Spray {
            self.states.spray.cancel();
        }
        self.active = tool;
        crate::log_info!("tool changed: {}", tool.label());
        events.push(EditorEvent::ToolChanged(tool));
    }

    pub fn set_stamp_image(&mut self, image: RgbaImage) {
        self.states.stamp.image = Some(image);
    }

    /// Route one input event to the active tool.
    pub fn dispatch(&mut self, canvas: &mut CanvasState, events: &mut EventQueue, input: &InputEvent) {
        let active = self.active;
        let mut ctx = ToolContext { canvas, params: &mut self.params, events };

        // Clipboard shortcuts go to the selection owning the clipboard
        let clipboard_owner = match active {
            Tool::SelectionRectangle => Some(SelectionShape::Rectangle),
            Tool::SelectionEllipse => Some(SelectionShape::Ellipse),
            Tool::Clipboard => Some(self.last_selection),
            _ => None,
        };
        if let (Some(shape), InputEvent::KeyDown(key)) = (clipboard_owner, input) {
            let selection = self.states.selection_mut(shape);
            if active == Tool::Clipboard || is_clipboard_key(key) {
                selection.on_clipboard_key(&mut ctx, key);
                return;
            }
        }

        let Some(handler) = self.states.handler_mut(active) else { return };
        match input {
            InputEvent::PointerDown(ev) => handler.on_pointer_down(&mut ctx, ev),
            InputEvent::PointerMove(ev) => handler.on_pointer_move(&mut ctx, ev),
            InputEvent::PointerUp(ev) => handler.on_pointer_up(&mut ctx, ev),
            InputEvent::DoubleClick(ev) => handler.on_double_click(&mut ctx, ev),
            InputEvent::Wheel(ev) => handler.on_wheel(&mut ctx, ev),
            InputEvent::KeyDown(ev) => handler.on_key_down(&mut ctx, ev),
            InputEvent::KeyUp(ev) => handler.on_key_up(&mut ctx, ev),
        }
    }

    /// Advance host-driven timers (the spray emitter) by `elapsed_ms`.
    pub fn tick(&mut self, canvas: &mut CanvasState, events: &mut EventQueue, elapsed_ms: f32) {
        let mut ctx = ToolContext { canvas, params: &mut self.params, events };
        self.states.spray.tick(&mut ctx, elapsed_ms);
    }
}

/// Delete, Ctrl+C, Ctrl+X and Ctrl+V.
pub fn is_clipboard_key(ev: &KeyEvent) -> bool {
    ev.key == Key::Delete || ev.is_ctrl_char('c') || ev.is_ctrl_char('x') || ev.is_ctrl_char('v')
}

/// Canvas, parameters and event queue for driving a single tool in tests.
#[cfg(test)]
pub(crate) mod harness {
    use super::*;
    use crate::color::WHITE;

    pub struct Harness {
        pub canvas: CanvasState,
        pub params: ToolParameters,
        pub events: EventQueue,
    }

    impl Harness {
        pub fn new() -> Self {
            Self::sized(40, 40)
        }

        pub fn sized(width: u32, height: u32) -> Self {
            Self { canvas: CanvasState::new(width, height), params: ToolParameters::default(), events: EventQueue::new() }
        }

        pub fn ctx(&mut self) -> ToolContext<'_> {
            ToolContext { canvas: &mut self.canvas, params: &mut self.params, events: &mut self.events }
        }

        /// Down on the first point, move through the middle, up on the last.
        pub fn drag(&mut self, tool: &mut dyn ToolHandler, points: &[(f32, f32)]) {
            let (first, rest) = points.split_first().unwrap();
            tool.on_pointer_down(&mut self.ctx(), &PointerEvent::left(first.0, first.1));
            let (last, middle) = rest.split_last().unwrap();
            for p in middle {
                tool.on_pointer_move(&mut self.ctx(), &PointerEvent::left(p.0, p.1));
            }
            tool.on_pointer_up(&mut self.ctx(), &PointerEvent::left(last.0, last.1));
        }

        pub fn committed(&self, x: u32, y: u32) -> Rgba<u8> {
            *self.canvas.committed.image().get_pixel(x, y)
        }

        pub fn preview(&self, x: u32, y: u32) -> Rgba<u8> {
            *self.canvas.preview.image().get_pixel(x, y)
        }

        pub fn non_white(&self) -> usize {
            self.canvas.committed.image().pixels().filter(|p| **p != WHITE).count()
        }

        pub fn preview_is_clear(&self) -> bool {
            self.canvas.preview.image().pixels().all(|p| p[3] == 0)
        }
    }
}
