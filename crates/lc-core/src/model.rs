//! Core layer data model for annotated canvases.
//!
//! A canvas is a background fill, an optional background image, and an
//! ordered stack of layers. Every layer shares a base record (center
//! position, box size, rotation about the center, visibility, lock,
//! opacity) and carries a variant payload: text or image.
//!
//! Layers are created through the factory functions at the bottom of this
//! module and are only ever changed through the reducer in [`crate::reducer`].

use crate::id::LayerId;
use crate::patch::LayerPatch;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 | 4 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                let a = match bytes.get(3) {
                    Some(&c) => hex_val(c)?,
                    None => 0xF,
                };
                Some(Self::from_rgba8(r * 17, g * 17, b * 17, a * 17))
            }
            6 | 8 => {
                let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
                let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
                let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
                let a = if bytes.len() == 8 {
                    hex_val(bytes[6])? << 4 | hex_val(bytes[7])?
                } else {
                    255
                };
                Some(Self::from_rgba8(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Quantize to 8-bit channels.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color `{s}`")))
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    #[default]
    Bold,
}

/// Horizontal text alignment (default: Center).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Payload of a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// User text. Lines are split on `\n` only; the engine never re-wraps.
    pub content: String,
    pub font_family: String,
    /// Base font size in pixels (upper bound when auto-fit is on).
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub color: Color,
    pub text_align: TextAlign,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    /// Extra advance after each character, in pixels.
    pub letter_spacing: f32,
    pub auto_fit: bool,
    /// Maximum line width in pixels, only consulted when `auto_fit` is on.
    pub max_line_width: f32,
    /// Font size chosen by the last render. Never persisted.
    #[serde(skip)]
    pub actual_font_size: Option<f32>,
}

// ─── Image ───────────────────────────────────────────────────────────────

/// A crop applied to an image layer's source. `src` holds the already
/// cropped raster, which replaces the layer source when rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub src: String,
}

/// Payload of an image layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Source reference: a `data:` URL or an opaque locator.
    pub src: String,
    pub original_width: f32,
    pub original_height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Crop>,
}

impl ImageContent {
    /// The source that should actually be painted.
    pub fn effective_src(&self) -> &str {
        self.crop.as_ref().map_or(self.src.as_str(), |c| c.src.as_str())
    }
}

// ─── Layers ──────────────────────────────────────────────────────────────

/// The variant payload of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Text(TextContent),
    Image(ImageContent),
}

/// A positionable, rotatable element composited onto the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    /// Center x in canvas pixels.
    pub x: f32,
    /// Center y in canvas pixels.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise, about the center.
    pub rotation: f32,
    pub visible: bool,
    pub locked: bool,
    /// 0.0 ..= 1.0
    pub opacity: f32,
    pub kind: LayerKind,
}

impl Layer {
    pub fn as_text(&self) -> Option<&TextContent> {
        match &self.kind {
            LayerKind::Text(t) => Some(t),
            LayerKind::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageContent> {
        match &self.kind {
            LayerKind::Image(img) => Some(img),
            LayerKind::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, LayerKind::Text(_))
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, LayerKind::Image(_))
    }
}

// ─── Defaults & factories ────────────────────────────────────────────────

pub const DEFAULT_CANVAS_WIDTH: u32 = 1024;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1024;
pub const DEFAULT_TEXT_CONTENT: &str = "Text";
pub const DEFAULT_TEXT_WIDTH: f32 = 400.0;
pub const DEFAULT_TEXT_HEIGHT: f32 = 100.0;
pub const DEFAULT_FONT_FAMILY: &str = "Source Han Sans CN";
pub const DEFAULT_FONT_SIZE: f32 = 256.0;
pub const DEFAULT_TEXT_COLOR: Color = Color::rgba(26.0 / 255.0, 26.0 / 255.0, 26.0 / 255.0, 1.0);
pub const DEFAULT_LINE_HEIGHT: f32 = 1.2;
pub const DEFAULT_MAX_LINE_WIDTH: f32 = 1280.0;
/// New images never exceed this fraction of the smaller canvas side.
pub const IMAGE_FIT_RATIO: f32 = 0.8;
/// Fixed id of the background image slot.
pub const BACKGROUND_LAYER_ID: &str = "background";

/// Create a text layer centered on the canvas, with `overrides` applied last.
pub fn create_text_layer(overrides: &LayerPatch, canvas_width: u32, canvas_height: u32) -> Layer {
    let id = LayerId::generate();
    let mut layer = Layer {
        id,
        name: format!("Text {}", id.short(4)),
        x: canvas_width as f32 / 2.0,
        y: canvas_height as f32 / 2.0,
        width: DEFAULT_TEXT_WIDTH,
        height: DEFAULT_TEXT_HEIGHT,
        rotation: 0.0,
        visible: true,
        locked: false,
        opacity: 1.0,
        kind: LayerKind::Text(TextContent {
            content: DEFAULT_TEXT_CONTENT.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: FontWeight::Bold,
            color: DEFAULT_TEXT_COLOR,
            text_align: TextAlign::Center,
            line_height: DEFAULT_LINE_HEIGHT,
            letter_spacing: 0.0,
            auto_fit: true,
            max_line_width: DEFAULT_MAX_LINE_WIDTH,
            actual_font_size: None,
        }),
    };
    overrides.apply_to(&mut layer);
    layer
}

/// Create an image layer centered on the canvas, uniformly scaled so that
/// neither side exceeds 80% of the smaller canvas side. Never upscales.
pub fn create_image_layer(
    src: impl Into<String>,
    original_width: f32,
    original_height: f32,
    canvas_width: u32,
    canvas_height: u32,
) -> Layer {
    let id = LayerId::generate();
    let max_side = canvas_width.min(canvas_height) as f32 * IMAGE_FIT_RATIO;
    let scale = (max_side / original_width)
        .min(max_side / original_height)
        .min(1.0);

    Layer {
        id,
        name: format!("Image {}", id.short(4)),
        x: canvas_width as f32 / 2.0,
        y: canvas_height as f32 / 2.0,
        width: original_width * scale,
        height: original_height * scale,
        rotation: 0.0,
        visible: true,
        locked: false,
        opacity: 1.0,
        kind: LayerKind::Image(ImageContent {
            src: src.into(),
            original_width,
            original_height,
            crop: None,
        }),
    }
}

/// Create the locked, full-canvas background image layer for a canvas of
/// the given size.
pub fn create_background_layer(src: impl Into<String>, width: u32, height: u32) -> Layer {
    Layer {
        id: LayerId::intern(BACKGROUND_LAYER_ID),
        name: "Background".to_string(),
        x: width as f32 / 2.0,
        y: height as f32 / 2.0,
        width: width as f32,
        height: height as f32,
        rotation: 0.0,
        visible: true,
        locked: true,
        opacity: 1.0,
        kind: LayerKind::Image(ImageContent {
            src: src.into(),
            original_width: width as f32,
            original_height: height as f32,
            crop: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hex_roundtrip() {
        let c = Color::from_hex("#1a1a1a").unwrap();
        assert_eq!(c.to_hex(), "#1A1A1A");
        assert_eq!(Color::from_hex("fff").unwrap(), Color::WHITE);
        assert_eq!(Color::from_hex("#00000080").unwrap().to_rgba8(), [0, 0, 0, 128]);
        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn text_layer_defaults() {
        let layer = create_text_layer(&LayerPatch::default(), 1024, 768);
        assert_eq!((layer.x, layer.y), (512.0, 384.0));
        assert_eq!((layer.width, layer.height), (400.0, 100.0));
        assert!(layer.visible && !layer.locked);
        assert_eq!(layer.opacity, 1.0);
        assert!(layer.name.starts_with("Text "));
        assert!(layer.id.as_str().ends_with(&layer.name[5..]));

        let text = layer.as_text().unwrap();
        assert_eq!(text.content, DEFAULT_TEXT_CONTENT);
        assert_eq!(text.text_align, TextAlign::Center);
        assert_eq!(text.line_height, 1.2);
        assert_eq!(text.letter_spacing, 0.0);
        assert!(text.auto_fit);
        assert_eq!(text.max_line_width, DEFAULT_MAX_LINE_WIDTH);
    }

    #[test]
    fn text_layer_overrides_win() {
        let overrides = LayerPatch {
            content: Some("hello\nworld".into()),
            x: Some(10.0),
            max_line_width: Some(300.0),
            ..LayerPatch::default()
        };
        let layer = create_text_layer(&overrides, 1024, 1024);
        assert_eq!(layer.x, 10.0);
        assert_eq!(layer.y, 512.0);
        let text = layer.as_text().unwrap();
        assert_eq!(text.content, "hello\nworld");
        assert_eq!(text.max_line_width, 300.0);
    }

    #[test]
    fn image_layer_scales_down_to_fit() {
        // 80% of min(1000, 500) = 400
        let layer = create_image_layer("a.png", 2000.0, 1000.0, 1000, 500);
        assert_eq!((layer.width, layer.height), (400.0, 200.0));
        assert_eq!((layer.x, layer.y), (500.0, 250.0));
        assert!(layer.name.starts_with("Image "));
    }

    #[test]
    fn image_layer_never_upscales() {
        let layer = create_image_layer("a.png", 100.0, 50.0, 1024, 1024);
        assert_eq!((layer.width, layer.height), (100.0, 50.0));
        let img = layer.as_image().unwrap();
        assert_eq!((img.original_width, img.original_height), (100.0, 50.0));
        assert!(img.crop.is_none());
    }

    #[test]
    fn effective_src_prefers_crop() {
        let mut img = ImageContent {
            src: "full.png".into(),
            original_width: 10.0,
            original_height: 10.0,
            crop: None,
        };
        assert_eq!(img.effective_src(), "full.png");
        img.crop = Some(Crop {
            x: 0.0,
            y: 0.0,
            width: 5.0,
            height: 5.0,
            src: "cropped.png".into(),
        });
        assert_eq!(img.effective_src(), "cropped.png");
    }
}
