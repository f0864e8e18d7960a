//! End-to-end editing flows driven through `Project::handle_input`, the way a
//! host forwards its window events.

use image::Rgba;
use paintkit::{
    EditorEvent, FileSnapshotStore, InputEvent, KeyEvent, PointerEvent, Project, SnapshotStore, Tool,
};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn down(p: &mut Project, x: f32, y: f32) {
    p.handle_input(&InputEvent::PointerDown(PointerEvent::left(x, y)));
}

fn move_to(p: &mut Project, x: f32, y: f32) {
    p.handle_input(&InputEvent::PointerMove(PointerEvent::left(x, y)));
}

fn up(p: &mut Project, x: f32, y: f32) {
    p.handle_input(&InputEvent::PointerUp(PointerEvent::left(x, y)));
}

fn drag(p: &mut Project, from: (f32, f32), to: (f32, f32)) {
    down(p, from.0, from.1);
    move_to(p, to.0, to.1);
    up(p, to.0, to.1);
}

fn key(p: &mut Project, ev: KeyEvent) {
    p.handle_input(&InputEvent::KeyDown(ev));
}

fn pixel(p: &Project, x: u32, y: u32) -> Rgba<u8> {
    *p.canvas.committed.image().get_pixel(x, y)
}

fn non_white(p: &Project) -> usize {
    p.canvas.committed.image().pixels().filter(|px| **px != WHITE).count()
}

#[test]
fn eraser_wipes_a_pencil_stroke() {
    let mut p = Project::new(40, 20);
    drag(&mut p, (2.0, 10.0), (30.0, 10.0));
    assert!(non_white(&p) > 0);

    p.select_tool(Tool::Eraser);
    assert_eq!(p.params().line_width, 5.0);
    drag(&mut p, (2.0, 10.0), (30.0, 10.0));
    assert_eq!(non_white(&p), 0);
    assert_eq!(p.history.undo_count(), 3);

    assert!(p.undo());
    assert!(non_white(&p) > 0);
}

#[test]
fn undo_and_redo_cross_a_resize() {
    let mut p = Project::new(40, 40);
    drag(&mut p, (2.0, 5.0), (30.0, 5.0));
    let stroked = p.canvas.committed.clone();
    p.resize_canvas(60, 20);
    p.drain_events();

    assert!(p.undo());
    assert_eq!(p.canvas.dimensions(), (40, 40));
    assert_eq!(p.canvas.committed, stroked);
    assert_eq!(p.drain_events(), vec![EditorEvent::CanvasResized { width: 40, height: 40 }]);

    assert!(p.undo());
    assert_eq!(non_white(&p), 0);
    // the baseline stays put
    assert!(!p.undo());
    assert_eq!(p.history.undo_count(), 1);

    assert!(p.redo());
    assert!(p.redo());
    assert_eq!(p.canvas.dimensions(), (60, 20));
    assert!(!p.redo());
}

#[test]
fn a_new_gesture_drops_the_redo_future() {
    let mut p = Project::new(30, 30);
    drag(&mut p, (2.0, 5.0), (20.0, 5.0));
    key(&mut p, KeyEvent::ctrl('z'));
    assert!(p.history.can_redo());
    drag(&mut p, (2.0, 15.0), (20.0, 15.0));
    assert!(!p.history.can_redo());
}

#[test]
fn paint_bucket_fills_inside_a_rectangle_only() {
    let mut p = Project::new(40, 40);
    p.select_tool(Tool::Rectangle);
    drag(&mut p, (10.0, 10.0), (30.0, 30.0));

    p.select_tool(Tool::PaintBucket);
    p.params_mut().set_primary_color("#ff0000ff").unwrap();
    down(&mut p, 20.0, 20.0);
    up(&mut p, 20.0, 20.0);

    assert_eq!(pixel(&p, 20, 20), RED);
    assert_eq!(pixel(&p, 2, 2), WHITE);
    assert_ne!(pixel(&p, 10, 20), RED);
    assert_eq!(p.history.undo_count(), 3);
}

#[test]
fn pointer_up_without_a_press_draws_no_shape() {
    let mut p = Project::new(30, 30);
    for tool in [Tool::Rectangle, Tool::Ellipse, Tool::Polygon] {
        p.select_tool(tool);
        up(&mut p, 20.0, 20.0);
    }
    assert_eq!(non_white(&p), 0);
    assert!(!p.is_dirty);
}

#[test]
fn line_commits_only_on_double_click() {
    let mut p = Project::new(40, 20);
    p.select_tool(Tool::Line);
    for (x, y) in [(5.0, 5.0), (30.0, 5.0), (30.0, 5.0)] {
        down(&mut p, x, y);
        up(&mut p, x, y);
    }
    assert_eq!(non_white(&p), 0);
    assert_eq!(p.history.undo_count(), 1);

    p.handle_input(&InputEvent::DoubleClick(PointerEvent::left(30.0, 5.0)));
    assert!(non_white(&p) > 0);
    assert_ne!(pixel(&p, 15, 5), WHITE);
    assert_eq!(p.history.undo_count(), 2);
}

#[test]
fn copy_and_paste_lands_at_the_top_left_and_is_undoable() {
    let mut p = Project::new(60, 60);
    for y in 18..32 {
        for x in 18..32 {
            p.canvas.committed.put_pixel(x, y, RED);
        }
    }
    p.select_tool(Tool::SelectionRectangle);
    drag(&mut p, (20.0, 20.0), (30.0, 30.0));
    let before = p.history.undo_count();

    key(&mut p, KeyEvent::ctrl('c'));
    assert_eq!(pixel(&p, 5, 5), WHITE);
    key(&mut p, KeyEvent::ctrl('v'));
    assert_eq!(pixel(&p, 5, 5), RED);
    assert_eq!(p.history.undo_count(), before + 1);

    assert!(p.undo());
    assert_eq!(pixel(&p, 5, 5), WHITE);
}

#[test]
fn switching_away_from_spray_stops_emission() {
    let mut p = Project::new(40, 40);
    p.select_tool(Tool::Spray);
    down(&mut p, 20.0, 20.0);
    assert!(non_white(&p) > 0);
    p.tick(500.0);

    p.select_tool(Tool::Pencil);
    let settled = p.canvas.committed.clone();
    p.tick(5000.0);
    assert_eq!(p.canvas.committed, settled);
}

#[test]
fn autosave_file_restores_into_a_new_session() {
    let path = std::env::temp_dir().join(format!("paintkit-flows-{}.bin", std::process::id()));
    let mut p = Project::new(30, 30).with_store(Box::new(FileSnapshotStore::new(&path)));
    drag(&mut p, (2.0, 5.0), (25.0, 5.0));
    assert!(path.exists());

    let mut next = Project::new(8, 8).with_store(Box::new(FileSnapshotStore::new(&path)));
    assert!(next.restore_from_store().unwrap());
    assert_eq!(next.canvas.committed, p.canvas.committed);
    assert!(next.drain_events().contains(&EditorEvent::CanvasResized { width: 30, height: 30 }));
    assert!(!next.history.can_undo());

    next.clear_autosave().unwrap();
    assert!(!path.exists());
    assert!(FileSnapshotStore::new(&path).load_snapshot().unwrap().is_none());
}
