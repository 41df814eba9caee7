//! The editor session: one canvas state plus the controllers acting on it.
//!
//! All mutation goes through [`Editor::dispatch`], which runs the reducer
//! and tells the render scheduler what kind of change happened. Rendering
//! and raster work are delegated to an `lc_render::Renderer` passed in per
//! call, so a session never owns global resources.

use crate::config::EditorConfig;
use crate::input::{InputEvent, Modifiers};
use crate::scheduler::RenderScheduler;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{Cursor, Tool, TransformTool};
use lc_core::snapshot::{self, SnapshotError};
use lc_core::{
    CanvasState, Layer, LayerAction, LayerId, LayerKind, LayerPatch, create_background_layer,
    create_image_layer, create_text_layer, reduce,
};
use lc_render::crop::{self, CropError, CropRect};
use lc_render::{ExportFormat, Fetch, Pixmap, RasterError, RenderReport, Renderer};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("no layer with id {0}")]
    UnknownLayer(LayerId),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Crop(#[from] CropError),
}

pub struct Editor {
    state: CanvasState,
    config: EditorConfig,
    tool: TransformTool,
    shortcuts: ShortcutMap,
    scheduler: RenderScheduler,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_state(CanvasState::default(), config)
    }

    pub fn with_state(state: CanvasState, config: EditorConfig) -> Self {
        let mut scheduler = RenderScheduler::new(config.text_debounce());
        scheduler.render_now();
        Self {
            state,
            tool: TransformTool::new(&config),
            shortcuts: ShortcutMap::new(&config),
            scheduler,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.state.selected_layer()
    }

    pub fn cursor(&self) -> Cursor {
        self.tool.cursor()
    }

    /// The selection decoration is hidden while a drag is in progress.
    pub fn overlay_visible(&self) -> bool {
        self.tool.is_idle() && self.selected_layer().is_some_and(|l| !l.locked)
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    pub fn dispatch(&mut self, action: LayerAction) {
        self.dispatch_at(action, Instant::now());
    }

    /// Apply `action` and schedule a render: debounced for text content
    /// edits, immediate for everything else.
    pub fn dispatch_at(&mut self, action: LayerAction, now: Instant) {
        let text_edit = matches!(
            &action,
            LayerAction::UpdateLayer { patch, .. } if patch.is_content_only()
        );
        self.state = reduce(std::mem::take(&mut self.state), action);
        if text_edit {
            self.scheduler.schedule_text_render(now);
        } else {
            self.scheduler.render_now();
        }
    }

    pub fn update_layer(&mut self, id: LayerId, patch: LayerPatch) {
        self.dispatch(LayerAction::UpdateLayer { id, patch });
    }

    /// Add a text layer centered on the canvas, `overrides` applied last.
    pub fn add_text_layer(&mut self, overrides: &LayerPatch) -> LayerId {
        let layer = create_text_layer(overrides, self.state.width, self.state.height);
        let id = layer.id;
        self.dispatch(LayerAction::AddLayer(layer));
        id
    }

    pub fn add_image_layer(
        &mut self,
        src: impl Into<String>,
        original_width: f32,
        original_height: f32,
    ) -> LayerId {
        let layer = create_image_layer(
            src,
            original_width,
            original_height,
            self.state.width,
            self.state.height,
        );
        let id = layer.id;
        self.dispatch(LayerAction::AddLayer(layer));
        id
    }

    /// Resize the canvas to the image and install it as the locked
    /// full-canvas background.
    pub fn set_background_image(&mut self, src: impl Into<String>, width: u32, height: u32) {
        self.dispatch(LayerAction::SetCanvasSize { width, height });
        let background = create_background_layer(src, width, height);
        self.dispatch(LayerAction::SetBackgroundImage(Some(background)));
    }

    pub fn clear_background_image(&mut self) {
        self.dispatch(LayerAction::SetBackgroundImage(None));
    }

    pub fn load_snapshot(&mut self, json: &str) -> Result<(), SnapshotError> {
        let state = snapshot::from_json(json)?;
        self.tool.reset();
        self.dispatch(LayerAction::LoadState(Box::new(state)));
        Ok(())
    }

    pub fn save_snapshot(&self) -> Result<String, SnapshotError> {
        snapshot::to_json(&self.state)
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one input event through the interaction controller. Returns
    /// whether the canvas state changed.
    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) -> bool {
        let actions = match event {
            InputEvent::Key { key, modifiers } => self.key_actions(key, *modifiers),
            _ => {
                let was_idle = self.tool.is_idle();
                let actions = self.tool.handle(event, &self.state);
                if was_idle != self.tool.is_idle() {
                    // overlay visibility flips with the drag state
                    self.scheduler.render_now();
                }
                actions
            }
        };

        let changed = !actions.is_empty();
        for action in actions {
            self.dispatch_at(action, now);
        }
        changed
    }

    fn key_actions(&self, key: &str, modifiers: Modifiers) -> Vec<LayerAction> {
        let Some(layer) = self.selected_layer().filter(|l| !l.locked) else {
            return Vec::new();
        };
        let Some(shortcut) = self.shortcuts.resolve(key, modifiers) else {
            return Vec::new();
        };
        log::trace!("shortcut {shortcut:?} on {}", layer.id);

        let action = match shortcut {
            ShortcutAction::Delete => LayerAction::RemoveLayer(layer.id),
            ShortcutAction::Nudge { dx, dy } => LayerAction::UpdateLayer {
                id: layer.id,
                patch: LayerPatch::position(layer.x + dx, layer.y + dy),
            },
            ShortcutAction::Deselect => LayerAction::SelectLayer(None),
            ShortcutAction::Duplicate => LayerAction::DuplicateLayer(layer.id),
            ShortcutAction::BringForward => LayerAction::MoveLayerUp(layer.id),
            ShortcutAction::SendBackward => LayerAction::MoveLayerDown(layer.id),
        };
        vec![action]
    }

    // ─── Crop ────────────────────────────────────────────────────────────

    /// Crop an image layer to `rect` (in pixels of its uncropped source).
    /// The cropped raster is seeded into the renderer's cache so the next
    /// render does not decode it again.
    pub async fn apply_crop<F: Fetch>(
        &mut self,
        renderer: &Renderer<F>,
        id: LayerId,
        rect: CropRect,
    ) -> Result<(), EditError> {
        let layer = self.state.layer(id).ok_or(EditError::UnknownLayer(id))?;
        let LayerKind::Image(img) = &layer.kind else {
            return Err(CropError::NotImage(id.to_string()).into());
        };
        let source = renderer.cache.resolve(&img.src).await?;
        let (patch, cropped) = crop::apply_crop(layer, &source, rect)?;

        if let Some(Some(c)) = &patch.crop {
            renderer.cache.insert(c.src.clone(), Arc::new(cropped));
        }
        self.update_layer(id, patch);
        Ok(())
    }

    pub fn reset_crop(&mut self, id: LayerId) -> Result<(), EditError> {
        let layer = self.state.layer(id).ok_or(EditError::UnknownLayer(id))?;
        let patch = crop::reset_crop(layer).ok_or_else(|| CropError::NotImage(id.to_string()))?;
        self.update_layer(id, patch);
        Ok(())
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    pub fn set_quick_mode(&mut self, enabled: bool) {
        self.scheduler.set_quick_mode(enabled);
    }

    /// Whether a render is due at `now`. Consumes the request when it is.
    pub fn poll_render(&mut self, now: Instant) -> bool {
        self.scheduler.poll(now)
    }

    pub fn next_render_deadline(&self, now: Instant) -> Option<Instant> {
        self.scheduler.next_deadline(now)
    }

    /// Render the interactive preview, with the selection overlay when it
    /// is visible.
    pub async fn render<F: Fetch>(
        &mut self,
        renderer: &Renderer<F>,
        surface: &mut Pixmap,
    ) -> RenderReport {
        let report = renderer
            .render(surface, &self.state, self.overlay_visible())
            .await;
        self.record_render(&report);
        report
    }

    /// Copy the font sizes a render actually used onto the text layers.
    /// The field is derived and never persisted, so this bypasses the
    /// reducer and does not schedule another render.
    pub fn record_render(&mut self, report: &RenderReport) {
        for layer in &mut self.state.layers {
            if let LayerKind::Text(text) = &mut layer.kind {
                text.actual_font_size = report.font_size_of(layer.id);
            }
        }
    }

    /// Encode the canvas without the selection overlay. `None` on failure.
    pub async fn export<F: Fetch>(
        &self,
        renderer: &Renderer<F>,
        format: ExportFormat,
    ) -> Option<Vec<u8>> {
        renderer.export(&self.state, format).await
    }

    /// Automation entry point: add a text layer with `text` and render it
    /// without the debounce. Quick mode ends once that render is polled.
    /// Follow with [`Editor::export`].
    pub fn insert_text_layer_for_export(&mut self, text: &str) -> LayerId {
        self.scheduler.quick_mode_once();
        let id = self.add_text_layer(&LayerPatch::content(text));
        log::debug!("automation inserted text layer {id}");
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn editor() -> (Editor, Instant) {
        let mut e = Editor::default();
        let t0 = Instant::now();
        e.dispatch_at(
            LayerAction::SetCanvasSize {
                width: 400,
                height: 300,
            },
            t0,
        );
        assert!(e.poll_render(t0));
        (e, t0)
    }

    #[test]
    fn text_edit_is_debounced() {
        let (mut e, t0) = editor();
        let id = e.add_text_layer(&LayerPatch::content("a"));
        assert!(e.poll_render(t0));

        e.dispatch_at(
            LayerAction::UpdateLayer {
                id,
                patch: LayerPatch::content("ab"),
            },
            t0,
        );
        assert!(!e.poll_render(t0));
        assert_eq!(e.next_render_deadline(t0), Some(t0 + Duration::from_millis(500)));
        assert!(e.poll_render(t0 + Duration::from_millis(500)));
    }

    #[test]
    fn property_change_cancels_pending_text_render() {
        let (mut e, t0) = editor();
        let id = e.add_text_layer(&LayerPatch::content("a"));
        e.poll_render(t0);
        e.dispatch_at(
            LayerAction::UpdateLayer {
                id,
                patch: LayerPatch::content("ab"),
            },
            t0,
        );
        e.dispatch_at(
            LayerAction::UpdateLayer {
                id,
                patch: LayerPatch::rotation(10.0),
            },
            t0,
        );
        assert!(e.poll_render(t0));
        assert!(!e.poll_render(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn keys_need_an_unlocked_selection() {
        let (mut e, t0) = editor();
        assert!(!e.handle_input(&InputEvent::key("Delete"), t0));

        let id = e.add_text_layer(&LayerPatch::default());
        e.dispatch(LayerAction::ToggleLock(id));
        assert!(!e.handle_input(&InputEvent::key("Delete"), t0));
        assert!(e.state().contains(id));

        e.dispatch(LayerAction::ToggleLock(id));
        assert!(e.handle_input(&InputEvent::key("Delete"), t0));
        assert!(!e.state().contains(id));
    }

    #[test]
    fn overlay_hidden_while_dragging() {
        let (mut e, t0) = editor();
        e.add_image_layer("a.png", 100.0, 100.0);
        assert!(e.overlay_visible());
        e.handle_input(&InputEvent::pointer_down(200.0, 150.0), t0);
        assert!(!e.overlay_visible());
        e.handle_input(&InputEvent::pointer_up(200.0, 150.0), t0);
        assert!(e.overlay_visible());
        assert!(e.poll_render(t0));
    }

    #[test]
    fn background_image_resizes_canvas() {
        let (mut e, _) = editor();
        e.set_background_image("bg.png", 640, 480);
        let s = e.state();
        assert_eq!((s.width, s.height), (640, 480));
        let bg = s.background_image.as_ref().unwrap();
        assert!(bg.locked);
        assert_eq!((bg.width, bg.height), (640.0, 480.0));

        e.clear_background_image();
        assert!(e.state().background_image.is_none());
    }

    #[test]
    fn automation_insert_renders_immediately_once() {
        let (mut e, t0) = editor();
        let id = e.insert_text_layer_for_export("from clipboard");
        assert_eq!(e.selected_layer().map(|l| l.id), Some(id));
        assert!(e.poll_render(t0));
        // later typing is debounced again
        e.dispatch_at(
            LayerAction::UpdateLayer {
                id,
                patch: LayerPatch::content("edited"),
            },
            t0,
        );
        assert!(!e.poll_render(t0));
        assert!(e.poll_render(t0 + e.config().text_debounce()));
    }

    #[test]
    fn record_render_sets_actual_font_size() {
        let (mut e, _) = editor();
        let id = e.add_text_layer(&LayerPatch::content("x"));
        let report = RenderReport {
            font_sizes: vec![(id, 48.0)],
            ..RenderReport::default()
        };
        e.record_render(&report);
        let text = e.state().layer(id).unwrap().as_text().unwrap();
        assert_eq!(text.actual_font_size, Some(48.0));
    }

    #[test]
    fn snapshot_round_trip_through_editor() {
        let (mut e, _) = editor();
        let id = e.add_text_layer(&LayerPatch::content("saved"));
        let json = e.save_snapshot().unwrap();

        let mut other = Editor::default();
        other.load_snapshot(&json).unwrap();
        assert_eq!(other.state().layer(id).unwrap().name, e.state().layer(id).unwrap().name);
        assert!(other.load_snapshot("not json").is_err());
    }

    #[test]
    fn reset_crop_rejects_text_and_unknown_layers() {
        let (mut e, _) = editor();
        let id = e.add_text_layer(&LayerPatch::default());
        assert!(matches!(
            e.reset_crop(id),
            Err(EditError::Crop(CropError::NotImage(_)))
        ));
        e.dispatch(LayerAction::RemoveLayer(id));
        assert!(matches!(e.reset_crop(id), Err(EditError::UnknownLayer(_))));
    }
}
