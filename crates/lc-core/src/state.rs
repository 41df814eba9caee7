//! The canvas state: dimensions, background, layer stack, and selection.

use crate::id::LayerId;
use crate::model::{Color, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, Layer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One immutable-by-convention snapshot of the editor document.
///
/// `layers` is in z-order: the first element is painted first (bottom).
/// The background image is a separate slot, always painted beneath them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    pub width: u32,
    pub height: u32,
    pub background_color: Color,
    #[serde(default)]
    pub background_image: Option<Layer>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub selected_layer_id: Option<LayerId>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            background_color: Color::WHITE,
            background_image: None,
            layers: Vec::new(),
            selected_layer_id: None,
        }
    }
}

impl CanvasState {
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// The currently selected layer, if any.
    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected_layer_id.and_then(|id| self.layer(id))
    }

    /// Restore the store invariants on a state that did not come from the
    /// reducer: layer ids are unique (later repeats are dropped) and the
    /// selection points at a layer in the stack.
    pub(crate) fn normalize(&mut self) {
        let mut seen = HashSet::with_capacity(self.layers.len());
        self.layers.retain(|l| {
            let first = seen.insert(l.id);
            if !first {
                log::debug!("dropping repeated layer id {}", l.id);
            }
            first
        });

        if let Some(id) = self.selected_layer_id
            && !self.contains(id)
        {
            log::debug!("clearing dangling selection {id}");
            self.selected_layer_id = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::create_text_layer;
    use crate::patch::LayerPatch;

    #[test]
    fn default_state_is_empty() {
        let state = CanvasState::default();
        assert_eq!((state.width, state.height), (1024, 1024));
        assert_eq!(state.background_color, Color::WHITE);
        assert!(state.background_image.is_none());
        assert!(state.layers.is_empty());
        assert!(state.selected_layer().is_none());
    }

    #[test]
    fn selected_layer_lookup() {
        let layer = create_text_layer(&LayerPatch::default(), 100, 100);
        let id = layer.id;
        let state = CanvasState {
            layers: vec![layer],
            selected_layer_id: Some(id),
            ..CanvasState::default()
        };
        assert_eq!(state.selected_layer().map(|l| l.id), Some(id));
        assert_eq!(state.index_of(id), Some(0));
    }

    #[test]
    fn dangling_selection_is_dropped() {
        let mut state = CanvasState {
            selected_layer_id: Some(LayerId::intern("ghost")),
            ..CanvasState::default()
        };
        state.normalize();
        assert!(state.selected_layer_id.is_none());
    }

    #[test]
    fn repeated_ids_keep_first_occurrence() {
        let a = create_text_layer(&LayerPatch::content("first"), 100, 100);
        let mut repeat = a.clone();
        repeat.name = "second".into();
        let b = create_text_layer(&LayerPatch::default(), 100, 100);
        let mut state = CanvasState {
            layers: vec![a.clone(), repeat, b.clone()],
            selected_layer_id: Some(a.id),
            ..CanvasState::default()
        };
        state.normalize();
        assert_eq!(state.layers, vec![a.clone(), b]);
        assert_eq!(state.selected_layer_id, Some(a.id));
    }
}
