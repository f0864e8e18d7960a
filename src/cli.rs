// ============================================================================
// PaintKit CLI - headless replay of recorded input against a fresh canvas
// ============================================================================
//
// Usage examples:
//   paintkit --replay strokes.json --output drawing.png
//   paintkit -W 640 -H 480 --params tools.json --replay session.json -o out.jpg --quality 85
//   paintkit --stamp logo.png --replay stamping.json -o out.png --verbose
//   paintkit --autosave session.bin --restore --replay more.json -o out.png
//
// Everything runs synchronously on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::components::properties::ToolParameters;
use crate::components::tools::Tool;
use crate::error::{EngineError, Result};
use crate::input::{InputEvent, KeyEvent, PointerEvent, WheelEvent};
use crate::io::{DEFAULT_JPEG_QUALITY, ExportFormat, FileSnapshotStore, export_file};
use crate::project::{DEFAULT_HEIGHT, DEFAULT_WIDTH, Project};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// PaintKit headless canvas engine.
///
/// Replays a JSON script of tool input against a blank canvas and writes the
/// result as PNG or JPEG.
#[derive(Parser, Debug)]
#[command(
    name = "paintkit",
    about = "PaintKit headless drawing replay",
    long_about = "Replay recorded pointer, wheel and key input through the PaintKit tool\n\
                  engine without a window, then export the drawing.\n\n\
                  Example:\n  \
                  paintkit --replay strokes.json --output drawing.png"
)]
pub struct CliArgs {
    /// Canvas width in pixels.
    #[arg(short = 'W', long, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// Canvas height in pixels.
    #[arg(short = 'H', long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// Tool parameter JSON file; missing fields keep their defaults.
    #[arg(short, long, value_name = "PARAMS.json")]
    pub params: Option<PathBuf>,

    /// Replay script: a JSON array of steps.
    #[arg(short, long, value_name = "SCRIPT.json")]
    pub replay: Option<PathBuf>,

    /// Image used by the stamp tool.
    #[arg(short, long, value_name = "IMAGE")]
    pub stamp: Option<PathBuf>,

    /// Output file; the format follows the extension (png, jpg/jpeg).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// JPEG quality (1-100).
    #[arg(short, long, default_value_t = DEFAULT_JPEG_QUALITY, value_name = "1-100")]
    pub quality: u8,

    /// Autosave file, written after every finished gesture.
    #[arg(long, value_name = "FILE")]
    pub autosave: Option<PathBuf>,

    /// Start from the drawing stored in --autosave instead of a blank canvas.
    #[arg(long, requires = "autosave")]
    pub restore: bool,

    /// Write the session log here instead of the per-user data directory.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Print each step, the events it produced, and timing.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Replay script
// ============================================================================

/// One step of a replay script.
///
/// ```json
/// [
///   { "op": "select_tool", "tool": "rectangle" },
///   { "op": "pointer_down", "pos": { "x": 10, "y": 10 } },
///   { "op": "pointer_move", "pos": { "x": 60, "y": 40 } },
///   { "op": "pointer_up", "pos": { "x": 60, "y": 40 } },
///   { "op": "undo" }
/// ]
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayStep {
    SelectTool { tool: Tool },
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    DoubleClick(PointerEvent),
    Wheel(WheelEvent),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    Undo,
    Redo,
    Resize { width: u32, height: u32 },
    Tick { ms: f32 },
}

impl ReplayStep {
    pub fn apply(&self, project: &mut Project) {
        match self {
            ReplayStep::SelectTool { tool } => project.select_tool(*tool),
            ReplayStep::PointerDown(ev) => project.handle_input(&InputEvent::PointerDown(*ev)),
            ReplayStep::PointerMove(ev) => project.handle_input(&InputEvent::PointerMove(*ev)),
            ReplayStep::PointerUp(ev) => project.handle_input(&InputEvent::PointerUp(*ev)),
            ReplayStep::DoubleClick(ev) => project.handle_input(&InputEvent::DoubleClick(*ev)),
            ReplayStep::Wheel(ev) => project.handle_input(&InputEvent::Wheel(*ev)),
            ReplayStep::KeyDown(ev) => project.handle_input(&InputEvent::KeyDown(ev.clone())),
            ReplayStep::KeyUp(ev) => project.handle_input(&InputEvent::KeyUp(ev.clone())),
            ReplayStep::Undo => {
                project.undo();
            }
            ReplayStep::Redo => {
                project.redo();
            }
            ReplayStep::Resize { width, height } => project.resize_canvas(*width, *height),
            ReplayStep::Tick { ms } => project.tick(*ms),
        }
    }
}

pub fn parse_script(text: &str) -> Result<Vec<ReplayStep>> {
    serde_json::from_str(text).map_err(|e| EngineError::Script(e.to_string()))
}

pub fn load_script(path: &Path) -> Result<Vec<ReplayStep>> {
    let text = std::fs::read_to_string(path)?;
    parse_script(&text).map_err(|e| EngineError::Script(format!("{}: {e}", path.display())))
}

// ============================================================================
// Public entry point
// ============================================================================

/// Start the session log, run the replay and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    match &args.log {
        Some(path) => crate::logger::init_at(path),
        None => crate::logger::init(),
    }
    let start = Instant::now();
    match replay(&args) {
        Ok(project) => {
            if args.verbose {
                let (w, h) = project.canvas.dimensions();
                println!(
                    "{}x{} canvas, {} undo step(s), {:.0}ms",
                    w,
                    h,
                    project.history.undo_count().saturating_sub(1),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            crate::log_err!("cli: {e}");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Build the project, replay the script and write the output. Returns the
/// final project for callers that want to inspect it.
pub fn replay(args: &CliArgs) -> Result<Project> {
    let params = match &args.params {
        Some(path) => ToolParameters::from_json_file(path)?,
        None => ToolParameters::default(),
    };
    let mut project = Project::with_params(args.width, args.height, params);

    if let Some(path) = &args.autosave {
        project.set_store(Some(Box::new(FileSnapshotStore::new(path))));
        if args.restore && !project.restore_from_store()? {
            eprintln!("warning: nothing to restore in '{}'", path.display());
        }
    }

    if let Some(path) = &args.stamp {
        project.set_stamp_image(image::open(path)?.to_rgba8());
    }

    if let Some(path) = &args.replay {
        let steps = load_script(path)?;
        crate::log_info!("cli: replaying {} step(s) from {}", steps.len(), path.display());
        for (idx, step) in steps.iter().enumerate() {
            step.apply(&mut project);
            let events = project.drain_events();
            if args.verbose {
                println!("[{}/{}] {:?}", idx + 1, steps.len(), step);
                for event in &events {
                    println!("  -> {:?}", event);
                }
            }
        }
    }

    if let Some(out) = &args.output {
        let format = ExportFormat::from_path(out, args.quality);
        export_file(project.canvas.committed.image(), out, format)?;
        if args.verbose {
            println!("  → {}", out.display());
        }
    }

    Ok(project)
}
