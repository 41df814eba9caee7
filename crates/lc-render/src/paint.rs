//! Canvas state → tiny-skia pixels.
//!
//! Paint order: background fill, background image, layers bottom to top,
//! then the optional selection overlay. Every layer is drawn through its own
//! local-frame transform, so rotation never leaks between siblings.
//!
//! This pass is synchronous and deterministic: rasters must already be
//! decoded and are looked up through [`RasterLookup`].

use crate::cache::RasterCache;
use crate::crop::{CropRect, crop_pixmap};
use crate::fonts::{self, FontBook};
use crate::hit::Handle;
use crate::raster::Fetch;
use crate::text::layout_text;
use lc_core::geometry::local_frame;
use lc_core::{Affine, CanvasState, Color, Layer, LayerId, LayerKind, TextContent};
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::{
    FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect as SkRect, Stroke,
    StrokeDash, Transform,
};

/// Selection decoration color (#0066ff).
pub const SELECTION_COLOR: Color = Color::rgba(0.0, 0.4, 1.0, 1.0);
pub const SELECTION_LINE_WIDTH: f32 = 2.0;
pub const SELECTION_DASH: [f32; 2] = [5.0, 5.0];
/// Drawn side of a resize handle square.
pub const HANDLE_DRAW_SIZE: f32 = 10.0;
pub const ROTATE_KNOB_RADIUS: f32 = 8.0;

/// Decoded rasters available to a paint pass.
pub trait RasterLookup {
    fn raster(&self, src: &str) -> Option<Arc<Pixmap>>;
}

impl RasterLookup for HashMap<String, Arc<Pixmap>> {
    fn raster(&self, src: &str) -> Option<Arc<Pixmap>> {
        self.get(src).cloned()
    }
}

impl<F: Fetch> RasterLookup for RasterCache<F> {
    fn raster(&self, src: &str) -> Option<Arc<Pixmap>> {
        self.get(src)
    }
}

/// What a paint pass did besides drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    /// Font size each painted text layer was rendered at.
    pub font_sizes: Vec<(LayerId, f32)>,
    /// Image layers skipped because their raster was unavailable.
    pub skipped: Vec<LayerId>,
    /// Font families that had no registered face.
    pub missing_fonts: Vec<String>,
}

impl RenderReport {
    pub fn font_size_of(&self, id: LayerId) -> Option<f32> {
        self.font_sizes.iter().find(|(l, _)| *l == id).map(|(_, s)| *s)
    }
}

/// Paint `state` onto `surface`, resizing it to the canvas first.
pub fn paint_scene(
    surface: &mut Pixmap,
    state: &CanvasState,
    rasters: &impl RasterLookup,
    fonts: &FontBook,
    include_overlay: bool,
) -> RenderReport {
    let mut report = RenderReport::default();

    if surface.width() != state.width || surface.height() != state.height {
        match Pixmap::new(state.width, state.height) {
            Some(resized) => *surface = resized,
            None => {
                log::warn!("cannot allocate a {}x{} surface", state.width, state.height);
                return report;
            }
        }
    }

    surface.fill(to_skia(state.background_color));

    if let Some(bg) = &state.background_image {
        paint_layer(surface, bg, rasters, fonts, &mut report);
    }

    for layer in &state.layers {
        paint_layer(surface, layer, rasters, fonts, &mut report);
    }

    if include_overlay
        && let Some(selected) = state.selected_layer()
        && !selected.locked
    {
        paint_selection(surface, selected);
    }

    report
}

fn paint_layer(
    surface: &mut Pixmap,
    layer: &Layer,
    rasters: &impl RasterLookup,
    fonts: &FontBook,
    report: &mut RenderReport,
) {
    if !layer.visible {
        return;
    }
    log::trace!(
        "PAINT {} at ({}, {}) {}×{} rot {}",
        layer.id,
        layer.x,
        layer.y,
        layer.width,
        layer.height,
        layer.rotation
    );

    let frame = local_frame(layer);
    match &layer.kind {
        LayerKind::Text(text) => {
            if let Some(size) = paint_text(surface, layer, text, fonts, frame, report) {
                report.font_sizes.push((layer.id, size));
            }
        }
        LayerKind::Image(img) => {
            let pixmap = match &img.crop {
                Some(crop) => rasters.raster(&crop.src).or_else(|| {
                    log::warn!("cropped raster for {} unavailable, cutting from source", layer.id);
                    let source = rasters.raster(&img.src)?;
                    let rect = CropRect {
                        x: crop.x,
                        y: crop.y,
                        width: crop.width,
                        height: crop.height,
                    };
                    crop_pixmap(&source, rect).ok().map(|(p, _)| Arc::new(p))
                }),
                None => rasters.raster(&img.src),
            };
            match pixmap {
                Some(pixmap) => paint_image(surface, layer, &pixmap, frame),
                None => {
                    log::warn!("skipping image layer {}: raster unavailable", layer.id);
                    report.skipped.push(layer.id);
                }
            }
        }
    }
}

fn paint_image(surface: &mut Pixmap, layer: &Layer, pixmap: &Pixmap, frame: Affine) {
    let (w, h) = (layer.width as f64, layer.height as f64);
    let sx = w / pixmap.width() as f64;
    let sy = h / pixmap.height() as f64;
    let transform = frame
        * Affine::translate((-w / 2.0, -h / 2.0))
        * Affine::scale_non_uniform(sx, sy);

    let paint = PixmapPaint {
        opacity: layer.opacity,
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    surface.draw_pixmap(0, 0, pixmap.as_ref(), &paint, to_transform(transform), None);
}

/// Returns the font size used, or `None` when nothing was laid out.
fn paint_text(
    surface: &mut Pixmap,
    layer: &Layer,
    text: &TextContent,
    fonts: &FontBook,
    frame: Affine,
    report: &mut RenderReport,
) -> Option<f32> {
    let layout = layout_text(layer, text, fonts)?;

    let Some(face) = fonts.face(&text.font_family, text.font_weight) else {
        if !report.missing_fonts.contains(&text.font_family) {
            log::warn!("no face registered for `{}`; text not painted", text.font_family);
            report.missing_fonts.push(text.font_family.clone());
        }
        return Some(layout.font_size);
    };

    let baseline_shift = fonts::middle_to_baseline(face, layout.font_size);
    let mut builder = PathBuilder::new();
    for line in layout.lines.iter().filter(|l| !l.text.is_empty()) {
        let run = fonts::layout_line(face, line.text, layout.font_size, text.letter_spacing);
        fonts::append_run_outline(
            &mut builder,
            face,
            &run,
            layout.font_size,
            line.x,
            line.y + baseline_shift,
        );
    }

    if let Some(path) = builder.finish() {
        let mut paint = Paint::default();
        let [r, g, b, a] = text.color.to_rgba8();
        let alpha = (a as f32 * layer.opacity.clamp(0.0, 1.0)).round() as u8;
        paint.set_color_rgba8(r, g, b, alpha);
        paint.anti_alias = true;
        surface.fill_path(&path, &paint, FillRule::Winding, to_transform(frame), None);
    }
    Some(layout.font_size)
}

/// Dashed box, eight resize handles, and the rotation knob, all in the
/// layer's local frame.
fn paint_selection(surface: &mut Pixmap, layer: &Layer) {
    let transform = to_transform(local_frame(layer));
    let hw = layer.width / 2.0;
    let hh = layer.height / 2.0;

    let mut blue = Paint::default();
    let [r, g, b, a] = SELECTION_COLOR.to_rgba8();
    blue.set_color_rgba8(r, g, b, a);
    blue.anti_alias = true;
    let mut white = Paint::default();
    white.set_color_rgba8(255, 255, 255, 255);

    let solid = Stroke {
        width: SELECTION_LINE_WIDTH,
        ..Stroke::default()
    };
    let dashed = Stroke {
        dash: StrokeDash::new(SELECTION_DASH.to_vec(), 0.0),
        ..solid.clone()
    };

    if let Some(outline) = SkRect::from_xywh(-hw, -hh, layer.width, layer.height)
        .map(PathBuilder::from_rect)
    {
        surface.stroke_path(&outline, &blue, &dashed, transform, None);
    }

    let half = HANDLE_DRAW_SIZE / 2.0;
    for handle in Handle::RESIZE {
        let c = handle.anchor(hw as f64, hh as f64);
        let Some(rect) = SkRect::from_xywh(
            c.x as f32 - half,
            c.y as f32 - half,
            HANDLE_DRAW_SIZE,
            HANDLE_DRAW_SIZE,
        ) else {
            continue;
        };
        surface.fill_rect(rect, &white, transform, None);
        surface.stroke_path(&PathBuilder::from_rect(rect), &blue, &solid, transform, None);
    }

    let knob = Handle::Rotate.anchor(hw as f64, hh as f64);
    let mut stem = PathBuilder::new();
    stem.move_to(0.0, -hh);
    stem.line_to(0.0, knob.y as f32);
    if let Some(stem) = stem.finish() {
        surface.stroke_path(&stem, &blue, &solid, transform, None);
    }
    if let Some(circle) = PathBuilder::from_circle(0.0, knob.y as f32, ROTATE_KNOB_RADIUS) {
        surface.fill_path(&circle, &white, FillRule::Winding, transform, None);
        surface.stroke_path(&circle, &blue, &solid, transform, None);
    }
}

/// kurbo affine → tiny-skia transform.
pub fn to_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

pub fn to_skia(color: Color) -> tiny_skia::Color {
    let [r, g, b, a] = color.to_rgba8();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}
