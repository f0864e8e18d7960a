use crate::components::tools::Tool;

/// Notifications for host-side collaborators (parameter panels, resize
/// handles, colour swatches). The engine only queues them; the host drains.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    ToolChanged(Tool),
    CanvasResized { width: u32, height: u32 },
    PrimaryColorChanged(String),
    SecondaryColorChanged(String),
    StampAngleChanged(f32),
    FeatherAngleChanged(f32),
    SelectionAngleChanged(f32),
    MagnetismToggled(bool),
}

#[derive(Default, Debug)]
pub struct EventQueue {
    pending: Vec<EditorEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EditorEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EditorEvent> {
        self.pending.iter()
    }
}
