pub mod cache;
pub mod crop;
pub mod export;
pub mod fonts;
pub mod hit;
pub mod paint;
pub mod raster;
pub mod text;

pub use cache::RasterCache;
pub use crop::{CropError, CropRect};
pub use export::{ExportError, ExportFormat};
pub use fonts::{FontBook, FontError};
pub use hit::{DEFAULT_HANDLE_SIZE, Handle, hit_test_handle, hit_test_layer, hit_test_layers};
pub use paint::{RasterLookup, RenderReport, paint_scene};
pub use raster::{Fetch, FsFetch, RasterError};
pub use tiny_skia::Pixmap;

use lc_core::{CanvasState, Layer, LayerKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Async front end of the paint pass: resolves every raster the state
/// references through the cache, then paints synchronously.
pub struct Renderer<F = FsFetch> {
    pub cache: RasterCache<F>,
    pub fonts: FontBook,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(cache::DEFAULT_CACHE_CAPACITY)
    }
}

impl Renderer {
    pub fn new(cache_capacity: usize) -> Self {
        Self::with_fetch(FsFetch, cache_capacity)
    }
}

impl<F: Fetch> Renderer<F> {
    pub fn with_fetch(fetch: F, cache_capacity: usize) -> Self {
        Self {
            cache: RasterCache::with_fetch(fetch, cache_capacity),
            fonts: FontBook::new(),
        }
    }

    /// Resolve the rasters of the background and every visible image layer.
    /// Failures are logged by the cache and simply left out of the map.
    pub async fn resolve_rasters(&self, state: &CanvasState) -> HashMap<String, Arc<Pixmap>> {
        let mut resolved = HashMap::new();
        let images = state
            .background_image
            .iter()
            .chain(&state.layers)
            .filter(|l| l.visible);

        for layer in images {
            // Stop at the first source that resolves: a crop falls back to
            // its uncropped source only when the crop itself fails.
            for src in sources(layer) {
                if resolved.contains_key(src) {
                    break;
                }
                if let Ok(pixmap) = self.cache.resolve(src).await {
                    resolved.insert(src.to_string(), pixmap);
                    break;
                }
            }
        }
        resolved
    }

    /// Render `state` onto `surface`.
    pub async fn render(
        &self,
        surface: &mut Pixmap,
        state: &CanvasState,
        include_overlay: bool,
    ) -> RenderReport {
        let rasters = self.resolve_rasters(state).await;
        paint_scene(surface, state, &rasters, &self.fonts, include_overlay)
    }

    /// Render to a fresh pixmap. `None` if the canvas cannot be allocated.
    pub async fn render_pixmap(
        &self,
        state: &CanvasState,
        include_overlay: bool,
    ) -> Option<(Pixmap, RenderReport)> {
        let mut surface = Pixmap::new(state.width, state.height)?;
        let report = self.render(&mut surface, state, include_overlay).await;
        Some((surface, report))
    }

    /// Render without the selection overlay and encode. `None` on failure.
    pub async fn export(&self, state: &CanvasState, format: ExportFormat) -> Option<Vec<u8>> {
        let Some((surface, _)) = self.render_pixmap(state, false).await else {
            log::error!("export failed: cannot allocate {}x{}", state.width, state.height);
            return None;
        };
        export::encode(&surface, format)
            .inspect_err(|e| log::error!("export failed: {e}"))
            .ok()
    }
}

/// Raster sources a layer may paint with, preferred first.
fn sources(layer: &Layer) -> Vec<&str> {
    match &layer.kind {
        LayerKind::Image(img) => match &img.crop {
            Some(crop) => vec![crop.src.as_str(), img.src.as_str()],
            None => vec![img.src.as_str()],
        },
        LayerKind::Text(_) => Vec::new(),
    }
}
