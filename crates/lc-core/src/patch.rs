//! Partial layer updates.
//!
//! A `LayerPatch` is a shallow set of optional field overrides. Base fields
//! apply to every layer; text and image fields only apply to the matching
//! variant and are silently ignored otherwise. Numeric inputs are clamped to
//! the editor's valid ranges, and non-finite values are dropped.

use crate::model::{Color, Crop, FontWeight, Layer, LayerKind, TextAlign};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const FONT_SIZE_RANGE: RangeInclusive<f32> = 12.0..=500.0;
pub const MAX_LINE_WIDTH_RANGE: RangeInclusive<f32> = 100.0..=3000.0;
pub const LINE_HEIGHT_RANGE: RangeInclusive<f32> = 0.8..=4.0;
pub const LETTER_SPACING_RANGE: RangeInclusive<f32> = -5.0..=20.0;
pub const OPACITY_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Smallest box side a patch may set.
pub const MIN_BOX_SIDE: f32 = 1.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,

    // Text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_fit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_line_width: Option<f32>,

    // Image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_height: Option<f32>,
    /// `Some(None)` clears the crop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<Option<Crop>>,
}

impl LayerPatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn rotation(degrees: f32) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    /// True when the patch only touches the text content. Such edits are
    /// rendered on the debounced path.
    pub fn is_content_only(&self) -> bool {
        self.content.is_some()
            && *self
                == Self {
                    content: self.content.clone(),
                    ..Self::default()
                }
    }

    /// Shallow-merge this patch into `layer`.
    pub fn apply_to(&self, layer: &mut Layer) {
        if let Some(name) = &self.name {
            layer.name.clone_from(name);
        }
        set_finite(&mut layer.x, self.x);
        set_finite(&mut layer.y, self.y);
        set_finite(&mut layer.width, self.width.map(|w| w.max(MIN_BOX_SIDE)));
        set_finite(&mut layer.height, self.height.map(|h| h.max(MIN_BOX_SIDE)));
        set_finite(&mut layer.rotation, self.rotation);
        if let Some(v) = self.visible {
            layer.visible = v;
        }
        if let Some(l) = self.locked {
            layer.locked = l;
        }
        set_clamped(&mut layer.opacity, self.opacity, OPACITY_RANGE);

        match &mut layer.kind {
            LayerKind::Text(text) => {
                if let Some(content) = &self.content {
                    text.content.clone_from(content);
                }
                if let Some(family) = &self.font_family {
                    text.font_family.clone_from(family);
                }
                set_clamped(&mut text.font_size, self.font_size, FONT_SIZE_RANGE);
                if let Some(w) = self.font_weight {
                    text.font_weight = w;
                }
                if let Some(c) = self.color {
                    text.color = c;
                }
                if let Some(a) = self.text_align {
                    text.text_align = a;
                }
                set_clamped(&mut text.line_height, self.line_height, LINE_HEIGHT_RANGE);
                set_clamped(
                    &mut text.letter_spacing,
                    self.letter_spacing,
                    LETTER_SPACING_RANGE,
                );
                if let Some(a) = self.auto_fit {
                    text.auto_fit = a;
                }
                set_clamped(
                    &mut text.max_line_width,
                    self.max_line_width,
                    MAX_LINE_WIDTH_RANGE,
                );
            }
            LayerKind::Image(img) => {
                if let Some(src) = &self.src {
                    img.src.clone_from(src);
                }
                set_finite(
                    &mut img.original_width,
                    self.original_width.map(|w| w.max(MIN_BOX_SIDE)),
                );
                set_finite(
                    &mut img.original_height,
                    self.original_height.map(|h| h.max(MIN_BOX_SIDE)),
                );
                if let Some(crop) = &self.crop {
                    img.crop.clone_from(crop);
                }
            }
        }
    }
}

fn set_finite(slot: &mut f32, value: Option<f32>) {
    if let Some(v) = value.filter(|v| v.is_finite()) {
        *slot = v;
    }
}

fn set_clamped(slot: &mut f32, value: Option<f32>, range: RangeInclusive<f32>) {
    set_finite(slot, value.map(|v| v.clamp(*range.start(), *range.end())));
}
