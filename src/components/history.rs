use image::RgbaImage;
use std::collections::VecDeque;

use crate::canvas::CanvasState;

// ============================================================================
// SNAPSHOT - full committed surface plus its dimensions
// ============================================================================

/// One history entry: the committed surface at some point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub pixels: RgbaImage,
    pub width: u32,
    pub height: u32,
}

impl Snapshot {
    pub fn capture(canvas: &CanvasState) -> Self {
        let pixels = canvas.committed.image().clone();
        let (width, height) = pixels.dimensions();
        Self { pixels, width, height }
    }

    pub fn restore_into(&self, canvas: &mut CanvasState) {
        canvas.restore(&self.pixels);
    }

    pub fn memory_size(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

// ============================================================================
// HISTORY MANAGER - snapshot undo/redo with count and memory limits
// ============================================================================

/// Undo/redo history over full-surface snapshots.
///
/// The bottom of `undo_stack` is the baseline: undo never pops it, so once a
/// baseline is recorded the stack is never empty.
pub struct HistoryManager {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    max_history_size: usize,
    /// Optional memory cap in bytes.
    max_memory_bytes: Option<usize>,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(50)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: max_history_size.max(1),
            max_memory_bytes: Some(512 * 1024 * 1024),
            total_memory: 0,
        }
    }

    pub fn with_memory_limit(mut self, max_memory_bytes: Option<usize>) -> Self {
        self.max_memory_bytes = max_memory_bytes;
        self
    }

    /// Forget everything and record `canvas` as the new baseline.
    pub fn record_baseline(&mut self, canvas: &CanvasState) {
        self.clear();
        self.commit(canvas);
    }

    /// Push the current committed surface; any redo future is discarded.
    pub fn commit(&mut self, canvas: &CanvasState) {
        self.clear_redo();
        let snapshot = Snapshot::capture(canvas);
        self.total_memory += snapshot.memory_size();
        self.undo_stack.push_back(snapshot);
        self.prune();
    }

    /// Hook called by the project after each gesture. The redo future is
    /// always dropped; a snapshot is pushed only for discrete edits.
    pub fn notify_tool_commit(&mut self, is_discrete_edit: bool, canvas: &CanvasState) {
        if is_discrete_edit {
            self.commit(canvas);
        } else {
            self.clear_redo();
        }
    }

    /// Step back one snapshot. Returns the restored dimensions, or `None` at
    /// the baseline.
    pub fn undo(&mut self, canvas: &mut CanvasState) -> Option<(u32, u32)> {
        if self.undo_stack.len() <= 1 {
            return None;
        }
        let top = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(top);
        let current = self.undo_stack.back()?;
        current.restore_into(canvas);
        Some((current.width, current.height))
    }

    /// Re-apply the most recently undone snapshot.
    pub fn redo(&mut self, canvas: &mut CanvasState) -> Option<(u32, u32)> {
        let snapshot = self.redo_stack.pop_back()?;
        snapshot.restore_into(canvas);
        let dims = (snapshot.width, snapshot.height);
        self.undo_stack.push_back(snapshot);
        Some(dims)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the current memory usage of the history (O(1) via cached total)
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    fn clear_redo(&mut self) {
        for snapshot in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(snapshot.memory_size());
        }
    }

    /// Drop the oldest entries past the count or memory limit. The newest
    /// entry always survives, and whichever entry ends up at the bottom
    /// becomes the baseline.
    fn prune(&mut self) {
        let mut pruned = 0;
        while self.undo_stack.len() > self.max_history_size {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                pruned += 1;
            }
        }

        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.undo_stack.len() > 1 {
                if let Some(removed) = self.undo_stack.pop_front() {
                    self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                    pruned += 1;
                }
            }
        }
        if pruned > 0 {
            crate::log_info!(
                "history: pruned {} old snapshot(s), {} bytes held",
                pruned,
                self.total_memory
            );
        }
    }
}
