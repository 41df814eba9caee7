//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Every binding
//! acts on the selected layer; the editor ignores them when nothing is
//! selected or the selection is locked.
//!
//! | Key | Action |
//! |-----|--------|
//! | Delete / Backspace | remove layer |
//! | Arrows | nudge 1px (Shift: 10px) |
//! | Escape | deselect |
//! | ⌘D | duplicate |
//! | ⌘] / ⌘[ | bring forward / send backward |

use crate::config::EditorConfig;
use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    Delete,
    /// Move the layer by a canvas-space offset.
    Nudge { dx: f32, dy: f32 },
    Deselect,
    Duplicate,
    BringForward,
    SendBackward,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` serves the same role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortcutMap {
    nudge: f32,
    nudge_large: f32,
}

impl Default for ShortcutMap {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl ShortcutMap {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            nudge: config.nudge_step,
            nudge_large: config.nudge_step_large,
        }
    }

    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"d"`, `"ArrowUp"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(&self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        // ── Modifier combos first (most specific) ──
        if modifiers.cmd() {
            return match key {
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "]" => Some(ShortcutAction::BringForward),
                "[" => Some(ShortcutAction::SendBackward),
                _ => None,
            };
        }

        let step = if modifiers.shift {
            self.nudge_large
        } else {
            self.nudge
        };

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            "ArrowUp" => Some(ShortcutAction::Nudge { dx: 0.0, dy: -step }),
            "ArrowDown" => Some(ShortcutAction::Nudge { dx: 0.0, dy: step }),
            "ArrowLeft" => Some(ShortcutAction::Nudge { dx: -step, dy: 0.0 }),
            "ArrowRight" => Some(ShortcutAction::Nudge { dx: step, dy: 0.0 }),
            _ => None,
        }
    }
}
