use image::RgbaImage;
use uuid::Uuid;

use crate::canvas::CanvasState;
use crate::components::history::HistoryManager;
use crate::components::properties::ToolParameters;
use crate::components::tools::{Tool, ToolManager};
use crate::error::Result;
use crate::events::{EditorEvent, EventQueue};
use crate::input::{InputEvent, KeyEvent};
use crate::io::{ExportFormat, SnapshotStore, export_data_url};

/// Default canvas size for a new drawing.
pub const DEFAULT_WIDTH: u32 = 1000;
pub const DEFAULT_HEIGHT: u32 = 800;

/// Single open drawing: surfaces, history, tools and the outgoing event
/// queue. Hosts feed it `InputEvent`s and drain `EditorEvent`s.
pub struct Project {
    pub id: Uuid,
    /// Display name ("Untitled-X" until the host renames it)
    pub name: String,
    pub is_dirty: bool,
    pub canvas: CanvasState,
    pub history: HistoryManager,
    pub tools: ToolManager,
    pub events: EventQueue,
    store: Option<Box<dyn SnapshotStore>>,
}

impl Project {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_params(width, height, ToolParameters::default())
    }

    pub fn new_untitled(untitled_counter: usize, width: u32, height: u32) -> Self {
        let mut project = Self::new(width, height);
        project.name = format!("Untitled-{}", untitled_counter);
        project
    }

    pub fn with_params(width: u32, height: u32, params: ToolParameters) -> Self {
        let canvas = CanvasState::new(width, height);
        let mut history = HistoryManager::default();
        history.record_baseline(&canvas);
        Self {
            id: Uuid::new_v4(),
            name: "Untitled".to_string(),
            is_dirty: false,
            canvas,
            history,
            tools: ToolManager::new(params),
            events: EventQueue::new(),
            store: None,
        }
    }

    /// Attach an autosave store. Every finished gesture is saved to it.
    pub fn with_store(mut self, store: Box<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn set_store(&mut self, store: Option<Box<dyn SnapshotStore>>) {
        self.store = store;
    }

    pub fn store(&self) -> Option<&dyn SnapshotStore> {
        self.store.as_deref()
    }

    pub fn params(&self) -> &ToolParameters {
        &self.tools.params
    }

    pub fn params_mut(&mut self) -> &mut ToolParameters {
        &mut self.tools.params
    }

    pub fn active_tool(&self) -> Tool {
        self.tools.active_tool()
    }

    pub fn select_tool(&mut self, tool: Tool) {
        self.tools.select_tool(tool, &mut self.events);
    }

    pub fn set_stamp_image(&mut self, image: RgbaImage) {
        self.tools.set_stamp_image(image);
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain()
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty { format!("{}*", self.name) } else { self.name.clone() }
    }

    // ========================================================================
    // INPUT
    // ========================================================================

    /// Route one input event: undo/redo shortcuts first, then the active
    /// tool, then the history hook and autosave for finished gestures.
    pub fn handle_input(&mut self, input: &InputEvent) {
        if let InputEvent::KeyDown(key) = input
            && self.handle_history_key(key)
        {
            return;
        }

        let tool = self.tools.active_tool();
        let generation = self.canvas.generation;
        self.tools.dispatch(&mut self.canvas, &mut self.events, input);
        let changed = self.canvas.generation != generation;

        match input {
            InputEvent::PointerUp(_) => {
                self.history.notify_tool_commit(tool != Tool::Line, &self.canvas);
                self.after_gesture(changed);
            }
            InputEvent::DoubleClick(_) => {
                self.history.notify_tool_commit(tool == Tool::Line, &self.canvas);
                self.after_gesture(changed);
            }
            InputEvent::Wheel(_) => self.autosave_logged(),
            // Keyboard edits (paste, delete, nudges) are discrete edits too
            InputEvent::KeyDown(_) if changed => {
                self.history.commit(&self.canvas);
                self.after_gesture(true);
            }
            _ => {}
        }
    }

    fn after_gesture(&mut self, changed: bool) {
        if changed {
            self.mark_dirty();
        }
        self.autosave_logged();
    }

    /// Ctrl+Z undoes, Ctrl+Shift+Z redoes.
    fn handle_history_key(&mut self, key: &KeyEvent) -> bool {
        if !key.is_ctrl_char('z') {
            return false;
        }
        if key.modifiers.shift {
            self.redo();
        } else {
            self.undo();
        }
        true
    }

    /// Advance host-driven timers (spray emission).
    pub fn tick(&mut self, elapsed_ms: f32) {
        self.tools.tick(&mut self.canvas, &mut self.events, elapsed_ms);
    }

    // ========================================================================
    // HISTORY & CANVAS
    // ========================================================================

    pub fn undo(&mut self) -> bool {
        let Some((width, height)) = self.history.undo(&mut self.canvas) else { return false };
        crate::log_info!("undo: {} step(s) left", self.history.undo_count().saturating_sub(1));
        self.events.push(EditorEvent::CanvasResized { width, height });
        self.mark_dirty();
        self.autosave_logged();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some((width, height)) = self.history.redo(&mut self.canvas) else { return false };
        crate::log_info!("redo: {} step(s) left", self.history.redo_count());
        self.events.push(EditorEvent::CanvasResized { width, height });
        self.mark_dirty();
        self.autosave_logged();
        true
    }

    /// Resize the drawing keeping its top-left content, as an undoable step.
    pub fn resize_canvas(&mut self, width: u32, height: u32) {
        self.canvas.resize(width, height);
        let (width, height) = self.canvas.dimensions();
        self.history.commit(&self.canvas);
        crate::log_info!("canvas resized to {}x{}", width, height);
        self.events.push(EditorEvent::CanvasResized { width, height });
        self.mark_dirty();
        self.autosave_logged();
    }

    // ========================================================================
    // AUTOSAVE & EXPORT
    // ========================================================================

    pub fn export_data_url(&self, format: ExportFormat) -> Result<String> {
        export_data_url(self.canvas.committed.image(), format)
    }

    /// Save the drawing to the attached store. No store, no-op.
    pub fn autosave(&mut self) -> Result<()> {
        if self.store.is_none() {
            return Ok(());
        }
        let url = self.export_data_url(ExportFormat::Png)?;
        let (width, height) = self.canvas.dimensions();
        if let Some(store) = self.store.as_mut() {
            store.save_snapshot(&url, width, height)?;
        }
        Ok(())
    }

    fn autosave_logged(&mut self) {
        if let Err(e) = self.autosave() {
            crate::log_err!("autosave failed: {e}");
        }
    }

    /// Replace the drawing with the stored session, if any. History restarts
    /// with the restored image as its baseline.
    pub fn restore_from_store(&mut self) -> Result<bool> {
        let Some(store) = self.store.as_ref() else { return Ok(false) };
        let Some(snapshot) = store.load_snapshot()? else { return Ok(false) };
        let pixels = snapshot.decode()?;
        self.canvas.restore(&pixels);
        self.history.record_baseline(&self.canvas);
        let (width, height) = self.canvas.dimensions();
        crate::log_info!("autosave restored: {}x{}", width, height);
        self.events.push(EditorEvent::CanvasResized { width, height });
        self.mark_clean();
        Ok(true)
    }

    /// Forget the stored session.
    pub fn clear_autosave(&mut self) -> Result<()> {
        match self.store.as_mut() {
            Some(store) => store.delete_snapshot(),
            None => Ok(()),
        }
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}
