//! Host-agnostic input events. The host translates its windowing events into
//! these before handing them to `Project::handle_input`.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false };
    pub const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false };
    pub const CTRL: Modifiers = Modifiers { shift: false, ctrl: true, alt: false };
    pub const ALT: Modifiers = Modifiers { shift: false, ctrl: false, alt: true };
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pos: Vec2,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn left(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y), button: MouseButton::Left, modifiers: Modifiers::NONE }
    }

    pub fn right(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y), button: MouseButton::Right, modifiers: Modifiers::NONE }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub pos: Vec2,
    /// Negative scrolls up.
    pub delta_y: f32,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl WheelEvent {
    pub fn up(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y), delta_y: -1.0, modifiers: Modifiers::NONE }
    }

    pub fn down(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y), delta_y: 1.0, modifiers: Modifiers::NONE }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Escape,
    Backspace,
    Delete,
    Enter,
    Shift,
    Control,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self { key, modifiers: Modifiers::NONE }
    }

    pub fn ctrl(c: char) -> Self {
        Self { key: Key::Char(c), modifiers: Modifiers::CTRL }
    }

    /// True for `c` typed with Ctrl, case-insensitive.
    pub fn is_ctrl_char(&self, c: char) -> bool {
        self.modifiers.ctrl && matches!(self.key, Key::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}

/// Everything a tool can react to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    DoubleClick(PointerEvent),
    Wheel(WheelEvent),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
}
