//! Integration tests: state → Renderer → pixels / encoded export.

use lc_core::*;
use lc_render::raster::{decode_pixmap, encode_data_url};
use lc_render::{ExportFormat, Renderer};
use pretty_assertions::assert_eq;

fn png(w: u32, h: u32, rgba: [u8; 4]) -> String {
    let mut pixmap = lc_render::Pixmap::new(w, h).unwrap();
    pixmap.fill(tiny_skia_color(rgba));
    let bytes = lc_render::export::encode(&pixmap, ExportFormat::Png).unwrap();
    encode_data_url("image/png", &bytes)
}

fn tiny_skia_color([r, g, b, a]: [u8; 4]) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

fn sized(width: u32, height: u32) -> CanvasState {
    reduce(
        CanvasState::default(),
        LayerAction::SetCanvasSize { width, height },
    )
}

fn pixel(p: &lc_render::Pixmap, x: u32, y: u32) -> [u8; 4] {
    let c = p.pixel(x, y).unwrap().demultiply();
    [c.red(), c.green(), c.blue(), c.alpha()]
}

#[tokio::test]
async fn background_image_paints_under_layers() {
    let state = sized(40, 30);
    let bg = create_background_layer(png(40, 30, [0, 0, 255, 255]), 40, 30);
    let state = reduce(state, LayerAction::SetBackgroundImage(Some(bg)));
    let square = create_image_layer(png(10, 10, [255, 0, 0, 255]), 10.0, 10.0, 40, 30);
    let state = reduce(state, LayerAction::AddLayer(square));

    let renderer = Renderer::default();
    let (surface, report) = renderer.render_pixmap(&state, false).await.unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(pixel(&surface, 2, 2), [0, 0, 255, 255]);
    assert_eq!(pixel(&surface, 20, 15), [255, 0, 0, 255]);
}

#[tokio::test]
async fn unresolvable_layer_is_skipped() {
    let state = sized(20, 20);
    let broken = create_image_layer("/no/such/file.png", 10.0, 10.0, 20, 20);
    let id = broken.id;
    let state = reduce(state, LayerAction::AddLayer(broken));

    let renderer = Renderer::default();
    let (surface, report) = renderer.render_pixmap(&state, false).await.unwrap();
    assert_eq!(report.skipped, vec![id]);
    assert_eq!(pixel(&surface, 10, 10), [255, 255, 255, 255]);
    assert!(renderer.cache.is_empty());
}

#[tokio::test]
async fn export_ignores_selection() {
    let state = sized(64, 64);
    let square = create_image_layer(png(20, 20, [0, 128, 0, 255]), 20.0, 20.0, 64, 64);
    let state = reduce(state, LayerAction::AddLayer(square));
    assert!(state.selected_layer_id.is_some());

    let deselected = reduce(state.clone(), LayerAction::SelectLayer(None));

    let renderer = Renderer::default();
    let with_selection = renderer.export(&state, ExportFormat::Png).await.unwrap();
    let without = renderer.export(&deselected, ExportFormat::Png).await.unwrap();
    assert_eq!(with_selection, without);

    let (preview, _) = renderer.render_pixmap(&state, true).await.unwrap();
    let exported = decode_pixmap(&with_selection).unwrap();
    assert_ne!(preview.data(), exported.data());
}

#[tokio::test]
async fn export_is_bit_stable() {
    let state = sized(50, 50);
    let square = create_image_layer(png(8, 8, [10, 20, 30, 255]), 8.0, 8.0, 50, 50);
    let id = square.id;
    let state = reduce(state, LayerAction::AddLayer(square));
    let state = reduce(
        state,
        LayerAction::UpdateLayer {
            id,
            patch: LayerPatch {
                rotation: Some(37.0),
                opacity: Some(0.6),
                width: Some(30.0),
                ..LayerPatch::default()
            },
        },
    );

    let first = Renderer::default().export(&state, ExportFormat::Png).await.unwrap();
    let second = Renderer::default().export(&state, ExportFormat::Png).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn jpeg_export() {
    let state = sized(16, 16);
    let jpeg = Renderer::default()
        .export(&state, ExportFormat::Jpeg { quality: 60 })
        .await
        .unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn auto_fit_size_is_reported() {
    let state = sized(1024, 1024);
    let layer = create_text_layer(
        &LayerPatch {
            content: Some("hello\nworld".into()),
            auto_fit: Some(true),
            max_line_width: Some(300.0),
            ..LayerPatch::default()
        },
        1024,
        1024,
    );
    let id = layer.id;
    let base = layer.as_text().unwrap().font_size;
    let state = reduce(state, LayerAction::AddLayer(layer));

    let (_, report) = Renderer::default().render_pixmap(&state, false).await.unwrap();
    let size = report.font_size_of(id).unwrap();
    assert!(size <= base);
    assert!(size >= lc_render::text::AUTO_FIT_MIN_SIZE);
}
