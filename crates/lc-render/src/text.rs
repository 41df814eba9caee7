//! Text layout and auto-fit font sizing.
//!
//! Content is split strictly on `\n`; a line is never re-wrapped. With
//! auto-fit on, the font size shrinks in fixed steps until every non-empty
//! line fits the max line width (less a margin), bounded below by a floor.
//! All coordinates are in the layer's local frame, origin at the center.

use crate::fonts::FontBook;
use lc_core::{FontWeight, Layer, TextAlign, TextContent};

/// Auto-fit decrements the trial size by this much per step.
pub const AUTO_FIT_STEP: f32 = 4.0;
/// Auto-fit never goes below this size.
pub const AUTO_FIT_MIN_SIZE: f32 = 24.0;
/// A line fits when its width is at most `max_line_width - AUTO_FIT_MARGIN`.
pub const AUTO_FIT_MARGIN: f32 = 20.0;
/// Left/right aligned text is inset this far from the placement box edge.
pub const ALIGN_INSET: f32 = 10.0;

/// Anything that can measure a line of text at a given size.
pub trait MeasureText {
    fn line_width(
        &self,
        line: &str,
        family: &str,
        weight: FontWeight,
        size: f32,
        letter_spacing: f32,
    ) -> f32;
}

impl MeasureText for FontBook {
    fn line_width(
        &self,
        line: &str,
        family: &str,
        weight: FontWeight,
        size: f32,
        letter_spacing: f32,
    ) -> f32 {
        self.measure(line, family, weight, size, letter_spacing)
    }
}

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidLine<'a> {
    pub text: &'a str,
    /// Left edge of the line.
    pub x: f32,
    /// Vertical middle of the line.
    pub y: f32,
    pub width: f32,
}

/// A laid-out text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout<'a> {
    pub font_size: f32,
    pub line_height_px: f32,
    pub total_height: f32,
    pub lines: Vec<LaidLine<'a>>,
}

pub fn split_lines(content: &str) -> Vec<&str> {
    content.split('\n').collect()
}

/// The font size a text payload renders at.
pub fn resolve_font_size(text: &TextContent, measure: &impl MeasureText) -> f32 {
    if !text.auto_fit || text.max_line_width <= 0.0 {
        return text.font_size;
    }
    fit_font_size(
        &split_lines(&text.content),
        text.max_line_width,
        text.font_size,
        |line, size| {
            measure.line_width(
                line,
                &text.font_family,
                text.font_weight,
                size,
                text.letter_spacing,
            )
        },
    )
}

/// Largest size in `AUTO_FIT_STEP` decrements from `base_size` at which every
/// non-empty line fits `max_width - AUTO_FIT_MARGIN`. Never above
/// `base_size` and never below `AUTO_FIT_MIN_SIZE`; the floor wins when
/// `base_size` is itself below it.
pub fn fit_font_size(
    lines: &[&str],
    max_width: f32,
    base_size: f32,
    mut width_at: impl FnMut(&str, f32) -> f32,
) -> f32 {
    if lines.iter().all(|l| l.is_empty()) {
        return base_size;
    }

    let limit = max_width - AUTO_FIT_MARGIN;
    let mut optimal = base_size;
    for line in lines.iter().filter(|l| !l.is_empty()) {
        let mut size = base_size;
        while width_at(line, size) > limit && size > AUTO_FIT_MIN_SIZE {
            size -= AUTO_FIT_STEP;
        }
        optimal = optimal.min(size);
    }

    optimal.min(base_size).max(AUTO_FIT_MIN_SIZE)
}

/// Width of the box left/right aligned text is placed against.
pub fn placement_width(layer: &Layer, text: &TextContent) -> f32 {
    if text.auto_fit {
        text.max_line_width
    } else {
        layer.width
    }
}

/// Lay out a text layer. `None` when the content is blank.
pub fn layout_text<'a>(
    layer: &Layer,
    text: &'a TextContent,
    measure: &impl MeasureText,
) -> Option<TextLayout<'a>> {
    if text.content.trim().is_empty() {
        return None;
    }

    let font_size = resolve_font_size(text, measure);
    let lines = split_lines(&text.content);
    let line_height_px = font_size * text.line_height;
    let total_height = lines.len() as f32 * line_height_px;
    let start_y = -total_height / 2.0 + line_height_px / 2.0;
    let half_box = placement_width(layer, text) / 2.0;

    let lines = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let width = measure.line_width(
                line,
                &text.font_family,
                text.font_weight,
                font_size,
                text.letter_spacing,
            );
            let x = match text.text_align {
                TextAlign::Center => -width / 2.0,
                TextAlign::Left => -half_box + ALIGN_INSET,
                TextAlign::Right => half_box - ALIGN_INSET - width,
            };
            LaidLine {
                text: line,
                x,
                y: start_y + i as f32 * line_height_px,
                width,
            }
        })
        .collect();

    Some(TextLayout {
        font_size,
        line_height_px,
        total_height,
        lines,
    })
}
