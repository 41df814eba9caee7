//! Platform-neutral input events, in canvas pixel coordinates.
//!
//! The embedding UI converts its native pointer/keyboard events (and any
//! view scaling) into these before handing them to the editor.

use lc_core::Point;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn cmd(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32, modifiers: Modifiers },
    PointerMove { x: f32, y: f32, modifiers: Modifiers },
    PointerUp { x: f32, y: f32, modifiers: Modifiers },
    /// The pointer left the drawing surface. Ends a drag like `PointerUp`.
    PointerLeave,
    DoubleClick { x: f32, y: f32 },
    /// `key` is the `KeyboardEvent.key`-style name (`"Delete"`, `"ArrowUp"`, `"d"`).
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn pointer_down(x: f32, y: f32) -> Self {
        InputEvent::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(x: f32, y: f32) -> Self {
        InputEvent::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f32, y: f32) -> Self {
        InputEvent::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: impl Into<String>) -> Self {
        InputEvent::Key {
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }

    /// Pointer position, for events that carry one.
    pub fn point(&self) -> Option<Point> {
        match self {
            InputEvent::PointerDown { x, y, .. }
            | InputEvent::PointerMove { x, y, .. }
            | InputEvent::PointerUp { x, y, .. }
            | InputEvent::DoubleClick { x, y } => Some(Point::new(*x as f64, *y as f64)),
            InputEvent::PointerLeave | InputEvent::Key { .. } => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            InputEvent::PointerDown { modifiers, .. }
            | InputEvent::PointerMove { modifiers, .. }
            | InputEvent::PointerUp { modifiers, .. }
            | InputEvent::Key { modifiers, .. } => *modifiers,
            InputEvent::PointerLeave | InputEvent::DoubleClick { .. } => Modifiers::NONE,
        }
    }
}
