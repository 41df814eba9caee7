//! Image layer cropping.
//!
//! A crop cuts a rectangle out of the decoded source, stores the result as a
//! PNG data URL on the layer, and rescales the layer box so the displayed
//! scale of the remaining pixels is unchanged.

use crate::export::{ExportError, encode_png_data_url};
use lc_core::{Crop, ImageContent, Layer, LayerPatch};
use thiserror::Error;
use tiny_skia::{IntRect, Pixmap};

/// A crop rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Error)]
pub enum CropError {
    #[error("layer {0} is not an image layer")]
    NotImage(String),
    #[error("crop rectangle lies outside the source image")]
    OutOfBounds,
    #[error(transparent)]
    Encode(#[from] ExportError),
}

/// Clamp `rect` to a `width × height` source, rounding to whole pixels.
/// The result is at least 1×1.
pub fn clamp_rect(rect: CropRect, width: u32, height: u32) -> Option<IntRect> {
    if width == 0 || height == 0 {
        return None;
    }
    let x = rect.x.round().clamp(0.0, (width - 1) as f32) as u32;
    let y = rect.y.round().clamp(0.0, (height - 1) as f32) as u32;
    let w = (rect.width.round().max(1.0) as u32).min(width - x);
    let h = (rect.height.round().max(1.0) as u32).min(height - y);
    IntRect::from_xywh(x as i32, y as i32, w, h)
}

/// Copy the clamped `rect` out of `source`.
pub fn crop_pixmap(source: &Pixmap, rect: CropRect) -> Result<(Pixmap, IntRect), CropError> {
    let area = clamp_rect(rect, source.width(), source.height()).ok_or(CropError::OutOfBounds)?;
    let cropped = source.clone_rect(area).ok_or(CropError::OutOfBounds)?;
    Ok((cropped, area))
}

/// Crop an image layer. `source` is the layer's uncropped raster and `rect`
/// is in its pixels. Returns the patch to dispatch and the cropped raster
/// (so it can be seeded into a cache under the patch's crop source).
///
/// The box is rescaled so the kept pixels keep their on-screen scale.
/// `original_width`/`original_height` keep describing the source.
pub fn apply_crop(
    layer: &Layer,
    source: &Pixmap,
    rect: CropRect,
) -> Result<(LayerPatch, Pixmap), CropError> {
    let img = layer
        .as_image()
        .ok_or_else(|| CropError::NotImage(layer.id.to_string()))?;
    let (cropped, area) = crop_pixmap(source, rect)?;
    let src = encode_png_data_url(&cropped)?;

    let (shown_w, shown_h) = shown_size(img);
    let (cw, ch) = (area.width() as f32, area.height() as f32);
    let patch = LayerPatch {
        width: Some(layer.width * (cw / shown_w)),
        height: Some(layer.height * (ch / shown_h)),
        crop: Some(Some(Crop {
            x: area.x() as f32,
            y: area.y() as f32,
            width: cw,
            height: ch,
            src,
        })),
        ..LayerPatch::default()
    };
    log::debug!("cropped {} to {}x{} at ({}, {})", layer.id, cw, ch, area.x(), area.y());
    Ok((patch, cropped))
}

/// Undo a crop: drop the crop fields and grow the box back to the whole
/// source at the scale the layer is currently shown at.
pub fn reset_crop(layer: &Layer) -> Option<LayerPatch> {
    let img = layer.as_image()?;
    let (shown_w, shown_h) = shown_size(img);
    Some(LayerPatch {
        width: Some(layer.width * (img.original_width / shown_w)),
        height: Some(layer.height * (img.original_height / shown_h)),
        crop: Some(None),
        ..LayerPatch::default()
    })
}

/// Source pixels currently mapped onto the layer box.
fn shown_size(img: &ImageContent) -> (f32, f32) {
    match &img.crop {
        Some(crop) => (crop.width, crop.height),
        None => (img.original_width, img.original_height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{decode_data_url, decode_pixmap};
    use lc_core::{create_image_layer, create_text_layer};

    fn gradient(w: u32, h: u32) -> Pixmap {
        let mut p = Pixmap::new(w, h).unwrap();
        for (i, px) in p.data_mut().chunks_exact_mut(4).enumerate() {
            let (x, y) = (i as u32 % w, i as u32 / w);
            px.copy_from_slice(&[x as u8, y as u8, 0, 255]);
        }
        p
    }

    #[test]
    fn clamps_to_source() {
        let r = clamp_rect(
            CropRect {
                x: -5.0,
                y: 90.0,
                width: 500.0,
                height: 50.0,
            },
            100,
            100,
        )
        .unwrap();
        assert_eq!((r.x(), r.y(), r.width(), r.height()), (0, 90, 100, 10));
        let r = clamp_rect(
            CropRect {
                x: 10.0,
                y: 10.0,
                width: 0.0,
                height: -3.0,
            },
            100,
            100,
        )
        .unwrap();
        assert_eq!((r.width(), r.height()), (1, 1));
    }

    #[test]
    fn crop_copies_the_right_pixels() {
        let source = gradient(20, 10);
        let (cropped, _) = crop_pixmap(
            &source,
            CropRect {
                x: 5.0,
                y: 2.0,
                width: 4.0,
                height: 3.0,
            },
        )
        .unwrap();
        assert_eq!((cropped.width(), cropped.height()), (4, 3));
        let px = cropped.pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.green()), (5, 2));
    }

    #[test]
    fn apply_crop_scales_box_and_stores_raster() {
        let source = gradient(200, 100);
        let mut layer = create_image_layer("src.png", 200.0, 100.0, 1024, 1024);
        layer.width = 400.0;
        layer.height = 200.0;

        let rect = CropRect {
            x: 50.0,
            y: 25.0,
            width: 100.0,
            height: 50.0,
        };
        let (patch, cropped) = apply_crop(&layer, &source, rect).unwrap();
        assert_eq!(patch.width, Some(200.0));
        assert_eq!(patch.height, Some(100.0));
        assert_eq!(patch.original_width, None);
        let crop = patch.crop.clone().flatten().unwrap();
        assert_eq!((crop.x, crop.y, crop.width, crop.height), (50.0, 25.0, 100.0, 50.0));

        let decoded = decode_pixmap(&decode_data_url(&crop.src).unwrap()).unwrap();
        assert_eq!(decoded.data(), cropped.data());

        patch.apply_to(&mut layer);
        let img = layer.as_image().unwrap();
        assert_eq!(img.effective_src(), crop.src);
        assert_eq!(img.src, "src.png");
        assert_eq!((img.original_width, img.original_height), (200.0, 100.0));
    }

    #[test]
    fn reset_restores_scaled_box() {
        let source = gradient(40, 20);
        let mut layer = create_image_layer("src.png", 40.0, 20.0, 1024, 1024);
        layer.width = 400.0;
        layer.height = 200.0;
        let rect = CropRect {
            x: 20.0,
            y: 0.0,
            width: 20.0,
            height: 20.0,
        };
        let (patch, _) = apply_crop(&layer, &source, rect).unwrap();
        patch.apply_to(&mut layer);
        assert_eq!((layer.width, layer.height), (200.0, 200.0));

        reset_crop(&layer).unwrap().apply_to(&mut layer);
        assert!(layer.as_image().unwrap().crop.is_none());
        assert_eq!((layer.width, layer.height), (400.0, 200.0));
    }

    #[test]
    fn recrop_is_relative_to_current_crop_scale() {
        let source = gradient(100, 100);
        let mut layer = create_image_layer("src.png", 100.0, 100.0, 1024, 1024);
        let first = CropRect {
            x: 0.0,
            y: 0.0,
            width: 50.0,
            height: 50.0,
        };
        apply_crop(&layer, &source, first).unwrap().0.apply_to(&mut layer);
        layer.width = 200.0;
        layer.height = 200.0;

        // 4 screen px per source px now; a 25×10 crop shows at 100×40
        let second = CropRect {
            x: 10.0,
            y: 10.0,
            width: 25.0,
            height: 10.0,
        };
        apply_crop(&layer, &source, second).unwrap().0.apply_to(&mut layer);
        assert_eq!((layer.width, layer.height), (100.0, 40.0));

        reset_crop(&layer).unwrap().apply_to(&mut layer);
        assert_eq!((layer.width, layer.height), (400.0, 400.0));
    }

    #[test]
    fn text_layers_cannot_be_cropped() {
        let layer = create_text_layer(&LayerPatch::default(), 100, 100);
        let rect = CropRect {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        };
        let source = gradient(2, 2);
        assert!(matches!(apply_crop(&layer, &source, rect), Err(CropError::NotImage(_))));
        assert!(reset_crop(&layer).is_none());
    }
}
