//! Pixmap → encoded raster (PNG, JPEG).

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::Pixmap;

pub const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    /// Quality is clamped to 1..=100. Alpha is dropped.
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("nothing to export: surface is {width}x{height}")]
    EmptySurface { width: u32, height: u32 },
}

/// Straight (non-premultiplied) RGBA bytes of `pixmap`.
pub fn demultiplied_rgba(pixmap: &Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect()
}

pub fn encode(pixmap: &Pixmap, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    let (width, height) = (pixmap.width(), pixmap.height());
    if width == 0 || height == 0 {
        return Err(ExportError::EmptySurface { width, height });
    }

    let rgba = demultiplied_rgba(pixmap);
    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut out).write_image(&rgba, width, height, ExtendedColorType::Rgba8)?;
        }
        ExportFormat::Jpeg { quality } => {
            let rgb: Vec<u8> = rgba
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
                .write_image(&rgb, width, height, ExtendedColorType::Rgb8)?;
        }
    }
    log::debug!("encoded {width}x{height} as {} ({} bytes)", format.mime(), out.len());
    Ok(out)
}

/// Encode as PNG and wrap in a `data:` URL.
pub fn encode_png_data_url(pixmap: &Pixmap) -> Result<String, ExportError> {
    let png = encode(pixmap, ExportFormat::Png)?;
    Ok(crate::raster::encode_data_url(ExportFormat::Png.mime(), &png))
}
