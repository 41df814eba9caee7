//! Pointer interaction: select, move, resize and rotate layers.
//!
//! A tool translates input events into `LayerAction`s for the editor to
//! dispatch. It reads the current state but never mutates it.
//!
//! ## Drag modes
//!
//! | Pointer down on | Mode | Move updates |
//! |-----------------|------|--------------|
//! | rotate knob of the selection | `Rotate` | rotation (Shift: snap) |
//! | resize handle of the selection | `Resize` | width / height / center |
//! | any unlocked visible layer | `Move` | x / y |
//! | empty canvas | — | deselects |
//!
//! Pointer up or leaving the surface always returns to `Idle`.

use crate::config::EditorConfig;
use crate::input::InputEvent;
use lc_core::geometry::{delta_to_canvas, delta_to_local, normalize_degrees, snap_degrees};
use lc_core::{CanvasState, Layer, LayerAction, LayerId, LayerPatch, Point, Vec2};
use lc_render::{Handle, hit_test_handle, hit_test_layers};

/// Trait for tools that handle input and produce actions.
pub trait Tool {
    /// Handle an input event against the current state, returning zero or
    /// more actions to dispatch in order.
    fn handle(&mut self, event: &InputEvent, state: &CanvasState) -> Vec<LayerAction>;

    /// Cursor to show for the current interaction.
    fn cursor(&self) -> Cursor;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Grabbing,
    Crosshair,
    NwseResize,
    NeswResize,
    NsResize,
    EwResize,
}

impl Cursor {
    /// CSS `cursor` keyword.
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Grabbing => "grabbing",
            Cursor::Crosshair => "crosshair",
            Cursor::NwseResize => "nwse-resize",
            Cursor::NeswResize => "nesw-resize",
            Cursor::NsResize => "ns-resize",
            Cursor::EwResize => "ew-resize",
        }
    }

    fn for_handle(handle: Handle) -> Self {
        match handle {
            Handle::Rotate => Cursor::Crosshair,
            Handle::TopLeft | Handle::BottomRight => Cursor::NwseResize,
            Handle::TopRight | Handle::BottomLeft => Cursor::NeswResize,
            Handle::TopMiddle | Handle::BottomMiddle => Cursor::NsResize,
            Handle::LeftMiddle | Handle::RightMiddle => Cursor::EwResize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    #[default]
    Idle,
    Move,
    Resize(Handle),
    Rotate,
}

/// Layer geometry captured at pointer down. Every move is computed from
/// this snapshot, so rounding never accumulates over a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragStart {
    layer: LayerId,
    pointer: Point,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    rotation: f32,
}

impl DragStart {
    fn capture(layer: &Layer, pointer: Point) -> Self {
        Self {
            layer: layer.id,
            pointer,
            x: layer.x,
            y: layer.y,
            width: layer.width,
            height: layer.height,
            rotation: layer.rotation,
        }
    }

    fn center(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

// ─── Transform Tool ──────────────────────────────────────────────────────

pub struct TransformTool {
    mode: DragMode,
    start: Option<DragStart>,
    handle_size: f32,
    min_size: f32,
    snap_step: f32,
}

impl Default for TransformTool {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl TransformTool {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            mode: DragMode::Idle,
            start: None,
            handle_size: config.handle_size,
            min_size: config.min_layer_size,
            snap_step: config.rotation_snap_degrees,
        }
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == DragMode::Idle
    }

    /// Abandon any drag in progress.
    pub fn reset(&mut self) {
        self.mode = DragMode::Idle;
        self.start = None;
    }

    fn begin(&mut self, mode: DragMode, layer: &Layer, pointer: Point) {
        log::trace!("drag {:?} on {} at {:?}", mode, layer.id, pointer);
        self.mode = mode;
        self.start = Some(DragStart::capture(layer, pointer));
    }

    fn pointer_down(&mut self, point: Point, state: &CanvasState) -> Vec<LayerAction> {
        self.reset();

        if let Some(selected) = state.selected_layer()
            && !selected.locked
            && let Some(handle) = hit_test_handle(point, selected, self.handle_size)
        {
            let mode = match handle {
                Handle::Rotate => DragMode::Rotate,
                resize => DragMode::Resize(resize),
            };
            self.begin(mode, selected, point);
            return Vec::new();
        }

        match hit_test_layers(point, &state.layers) {
            Some(hit) => {
                self.begin(DragMode::Move, hit, point);
                vec![LayerAction::SelectLayer(Some(hit.id))]
            }
            None => vec![LayerAction::SelectLayer(None)],
        }
    }

    fn pointer_move(&mut self, point: Point, shift: bool, state: &CanvasState) -> Vec<LayerAction> {
        let Some(start) = self.start else {
            return Vec::new();
        };
        let Some(layer) = state.layer(start.layer) else {
            // Layer vanished mid-drag.
            self.reset();
            return Vec::new();
        };
        let delta = point - start.pointer;

        let patch = match self.mode {
            DragMode::Idle => return Vec::new(),
            DragMode::Move => LayerPatch::position(
                start.x + delta.x as f32,
                start.y + delta.y as f32,
            ),
            DragMode::Resize(handle) => self.resize(&start, layer, handle, delta),
            DragMode::Rotate => self.rotate(&start, point, shift),
        };
        vec![LayerAction::UpdateLayer {
            id: start.layer,
            patch,
        }]
    }

    /// Resize in the layer's own axes. The edge (or corner) opposite the
    /// dragged handle stays fixed, so the center shifts by half the growth.
    fn resize(&self, start: &DragStart, layer: &Layer, handle: Handle, delta: Vec2) -> LayerPatch {
        let local = delta_to_local(layer, delta);
        let (sx, sy) = handle.edge_signs();
        let min = self.min_size as f64;
        let (w0, h0) = (start.width as f64, start.height as f64);

        let width = if sx != 0.0 { (w0 + sx * local.x).max(min) } else { w0 };
        let height = if sy != 0.0 { (h0 + sy * local.y).max(min) } else { h0 };

        let shift = delta_to_canvas(
            layer,
            Vec2::new(sx * (width - w0) / 2.0, sy * (height - h0) / 2.0),
        );
        LayerPatch {
            x: Some(start.x + shift.x as f32),
            y: Some(start.y + shift.y as f32),
            width: Some(width as f32),
            height: Some(height as f32),
            ..LayerPatch::default()
        }
    }

    /// Rotate by the angle swept around the layer center since pointer down.
    fn rotate(&self, start: &DragStart, point: Point, shift: bool) -> LayerPatch {
        let center = start.center();
        let from = (start.pointer - center).atan2();
        let to = (point - center).atan2();
        let mut degrees = start.rotation + (to - from).to_degrees() as f32;
        if shift {
            degrees = snap_degrees(degrees, self.snap_step);
        }
        LayerPatch::rotation(normalize_degrees(degrees))
    }

    fn double_click(&mut self, point: Point, state: &CanvasState) -> Vec<LayerAction> {
        match hit_test_layers(point, &state.layers) {
            Some(hit) if hit.is_text() => vec![LayerAction::SelectLayer(Some(hit.id))],
            _ => Vec::new(),
        }
    }
}

impl Tool for TransformTool {
    fn handle(&mut self, event: &InputEvent, state: &CanvasState) -> Vec<LayerAction> {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                self.pointer_down(Point::new(*x as f64, *y as f64), state)
            }
            InputEvent::PointerMove { x, y, modifiers } => {
                self.pointer_move(Point::new(*x as f64, *y as f64), modifiers.shift, state)
            }
            InputEvent::PointerUp { .. } | InputEvent::PointerLeave => {
                self.reset();
                Vec::new()
            }
            InputEvent::DoubleClick { x, y } => {
                self.double_click(Point::new(*x as f64, *y as f64), state)
            }
            InputEvent::Key { .. } => Vec::new(),
        }
    }

    fn cursor(&self) -> Cursor {
        match self.mode {
            DragMode::Idle => Cursor::Default,
            DragMode::Move => Cursor::Grabbing,
            DragMode::Rotate => Cursor::Crosshair,
            DragMode::Resize(handle) => Cursor::for_handle(handle),
        }
    }
}
