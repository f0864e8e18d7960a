//! PaintKit: a headless raster painting engine.
//!
//! A [`Project`] owns a committed surface plus a preview overlay, an undo
//! history and a set of tools. Hosts translate their windowing input into
//! [`InputEvent`]s, feed them to [`Project::handle_input`], and drain the
//! [`EditorEvent`]s that come back (tool/colour/angle changes and canvas
//! resizes) to keep their own UI in sync.
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub mod logger;

pub mod canvas;
pub mod cli;
pub mod color;
pub mod components;
pub mod error;
pub mod events;
pub mod geometry;
pub mod input;
pub mod io;
pub mod ops;
pub mod project;

pub use canvas::{CanvasState, PixelSurface, SurfaceId};
pub use components::history::HistoryManager;
pub use components::properties::ToolParameters;
pub use components::tools::{Tool, ToolManager};
pub use error::{EngineError, Result};
pub use events::{EditorEvent, EventQueue};
pub use input::{InputEvent, Key, KeyEvent, Modifiers, MouseButton, PointerEvent, WheelEvent};
pub use io::{ExportFormat, FileSnapshotStore, MemorySnapshotStore, SnapshotStore, StoredSnapshot};
pub use project::Project;
