//! Raster sources: locating bytes and decoding them into pixmaps.
//!
//! A source reference is either an inline `data:` URL (base64 payload) or an
//! opaque locator handed to a [`Fetch`] implementation. Both decode through
//! the same path into a premultiplied `tiny_skia::Pixmap`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::future::Future;
use thiserror::Error;
use tiny_skia::Pixmap;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to fetch `{locator}`: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed data URL")]
    DataUrl,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("cannot allocate a {width}x{height} pixmap")]
    Alloc { width: u32, height: u32 },
}

/// Resolves an opaque locator to encoded image bytes.
pub trait Fetch: Send + Sync {
    fn fetch(&self, locator: &str) -> impl Future<Output = Result<Vec<u8>, RasterError>> + Send;
}

/// Reads locators as local file paths. A leading `file://` is stripped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFetch;

impl Fetch for FsFetch {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, RasterError> {
        let path = locator.strip_prefix("file://").unwrap_or(locator);
        tokio::fs::read(path).await.map_err(|source| RasterError::Io {
            locator: locator.to_string(),
            source,
        })
    }
}

pub fn is_data_url(src: &str) -> bool {
    src.starts_with("data:")
}

/// Decode the payload of a `data:[<mime>];base64,<payload>` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, RasterError> {
    let rest = url.strip_prefix("data:").ok_or(RasterError::DataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(RasterError::DataUrl)?;
    if !meta.ends_with(";base64") {
        return Err(RasterError::DataUrl);
    }
    Ok(STANDARD.decode(payload.trim())?)
}

/// Encode bytes as a `data:` URL with the given MIME type.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Decode encoded image bytes (PNG, JPEG) into a premultiplied pixmap.
pub fn decode_pixmap(bytes: &[u8]) -> Result<Pixmap, RasterError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = image.dimensions();

    let mut rgba = image.into_raw();
    premultiply_in_place(&mut rgba);

    let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::Alloc { width, height })?;
    pixmap.data_mut().copy_from_slice(&rgba);
    Ok(pixmap)
}

fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}

/// Resolve a source reference to a pixmap: inline payloads are decoded
/// directly, everything else goes through `fetch`.
pub async fn load_pixmap(fetch: &impl Fetch, src: &str) -> Result<Pixmap, RasterError> {
    let bytes = if is_data_url(src) {
        decode_data_url(src)?
    } else {
        fetch.fetch(src).await?
    };
    decode_pixmap(&bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// A `w × h` PNG filled with one color.
    pub(crate) fn solid_png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    pub(crate) fn solid_png_data_url(w: u32, h: u32, rgba: [u8; 4]) -> String {
        encode_data_url("image/png", &solid_png(w, h, rgba))
    }

    #[test]
    fn data_url_roundtrip() {
        let url = encode_data_url("image/png", b"abc");
        assert_eq!(url, "data:image/png;base64,YWJj");
        assert_eq!(decode_data_url(&url).unwrap(), b"abc");
    }

    #[test]
    fn malformed_data_urls() {
        assert!(matches!(decode_data_url("data:image/png,abc"), Err(RasterError::DataUrl)));
        assert!(matches!(decode_data_url("data:nocomma"), Err(RasterError::DataUrl)));
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(RasterError::Base64(_))
        ));
    }

    #[test]
    fn decodes_png_premultiplied() {
        let png = solid_png(3, 2, [200, 100, 50, 128]);
        let pixmap = decode_pixmap(&png).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (3, 2));
        let px = pixmap.pixel(0, 0).unwrap();
        assert_eq!(px.alpha(), 128);
        assert_eq!(px.red(), 100);
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(matches!(decode_pixmap(b"not an image"), Err(RasterError::Decode(_))));
    }

    #[tokio::test]
    async fn fs_fetch_reports_missing_files() {
        let err = load_pixmap(&FsFetch, "file:///no/such/image.png").await;
        assert!(matches!(
            err,
            Err(RasterError::Io { locator, .. }) if locator.ends_with("image.png")
        ));
    }

    #[tokio::test]
    async fn inline_sources_skip_fetch() {
        let url = solid_png_data_url(4, 4, [0, 0, 255, 255]);
        let pixmap = load_pixmap(&FsFetch, &url).await.unwrap();
        assert_eq!(pixmap.width(), 4);
    }
}
