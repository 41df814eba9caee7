//! The state store: a total, pure reducer over `CanvasState`.
//!
//! `reduce` consumes the previous state and returns the next one, so a
//! caller can never observe or mutate layers shared between the two. Every
//! action referring to a missing layer or an out-of-range index is a no-op.

use crate::id::LayerId;
use crate::model::{Color, Layer, LayerKind};
use crate::patch::LayerPatch;
use crate::state::CanvasState;

/// Both axes of a duplicated layer are offset by this many pixels.
pub const DUPLICATE_OFFSET: f32 = 20.0;
/// Suffix appended to a duplicated layer's name.
pub const DUPLICATE_NAME_SUFFIX: &str = " copy";

/// A mutation of the canvas state.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerAction {
    SetCanvasSize { width: u32, height: u32 },
    SetBackgroundColor(Color),
    /// Install or clear the background slot. Only image layers are accepted.
    SetBackgroundImage(Option<Layer>),
    /// Append to the top of the stack and select it.
    AddLayer(Layer),
    RemoveLayer(LayerId),
    UpdateLayer { id: LayerId, patch: LayerPatch },
    SelectLayer(Option<LayerId>),
    /// Remove the layer at `from` and reinsert it at `to`.
    ReorderLayers { from: usize, to: usize },
    /// Swap with the successor (towards the top).
    MoveLayerUp(LayerId),
    /// Swap with the predecessor (towards the bottom).
    MoveLayerDown(LayerId),
    DuplicateLayer(LayerId),
    ToggleVisibility(LayerId),
    ToggleLock(LayerId),
    /// Replace the whole state (snapshot restore).
    LoadState(Box<CanvasState>),
    Reset,
}

/// Apply `action` to `state`, returning the next state.
pub fn reduce(mut state: CanvasState, action: LayerAction) -> CanvasState {
    match action {
        LayerAction::SetCanvasSize { width, height } => {
            if width == 0 || height == 0 {
                log::debug!("ignoring empty canvas size {width}x{height}");
                return state;
            }
            state.width = width;
            state.height = height;
        }
        LayerAction::SetBackgroundColor(color) => {
            state.background_color = color;
        }
        LayerAction::SetBackgroundImage(layer) => match layer {
            Some(layer) if !layer.is_image() => {
                log::debug!("ignoring non-image background layer {}", layer.id);
            }
            layer => state.background_image = layer,
        },
        LayerAction::AddLayer(layer) => {
            if state.contains(layer.id) {
                log::debug!("ignoring add of duplicate layer id {}", layer.id);
                return state;
            }
            state.selected_layer_id = Some(layer.id);
            state.layers.push(layer);
        }
        LayerAction::RemoveLayer(id) => {
            state.layers.retain(|l| l.id != id);
            if state.selected_layer_id == Some(id) {
                state.selected_layer_id = None;
            }
        }
        LayerAction::UpdateLayer { id, patch } => {
            if let Some(layer) = state.layers.iter_mut().find(|l| l.id == id) {
                patch.apply_to(layer);
            }
        }
        LayerAction::SelectLayer(id) => match id {
            Some(id) if !state.contains(id) => {
                log::debug!("ignoring selection of unknown layer {id}");
            }
            id => state.selected_layer_id = id,
        },
        LayerAction::ReorderLayers { from, to } => {
            if from >= state.layers.len() {
                return state;
            }
            let layer = state.layers.remove(from);
            let to = to.min(state.layers.len());
            state.layers.insert(to, layer);
        }
        LayerAction::MoveLayerUp(id) => {
            if let Some(i) = state.index_of(id)
                && i + 1 < state.layers.len()
            {
                state.layers.swap(i, i + 1);
            }
        }
        LayerAction::MoveLayerDown(id) => {
            if let Some(i) = state.index_of(id)
                && i > 0
            {
                state.layers.swap(i, i - 1);
            }
        }
        LayerAction::DuplicateLayer(id) => {
            if let Some(original) = state.layer(id) {
                let mut copy = original.clone();
                copy.id = LayerId::generate();
                copy.name.push_str(DUPLICATE_NAME_SUFFIX);
                copy.x += DUPLICATE_OFFSET;
                copy.y += DUPLICATE_OFFSET;
                if let LayerKind::Text(text) = &mut copy.kind {
                    text.actual_font_size = None;
                }
                state.selected_layer_id = Some(copy.id);
                state.layers.push(copy);
            }
        }
        LayerAction::ToggleVisibility(id) => {
            if let Some(layer) = state.layers.iter_mut().find(|l| l.id == id) {
                layer.visible = !layer.visible;
            }
        }
        LayerAction::ToggleLock(id) => {
            if let Some(layer) = state.layers.iter_mut().find(|l| l.id == id) {
                layer.locked = !layer.locked;
            }
        }
        LayerAction::LoadState(next) => {
            let mut next = *next;
            next.normalize();
            return next;
        }
        LayerAction::Reset => return CanvasState::default(),
    }
    state
}
