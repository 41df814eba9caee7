//! Font registry and glyph placement.
//!
//! Faces are registered by family name and weight. Lines are placed glyph by
//! glyph (advance + kerning + letter spacing), so the width used by auto-fit
//! is exactly the width that gets painted.

use ab_glyph::{Font, FontVec, GlyphId, OutlineCurve};
use lc_core::FontWeight;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tiny_skia::PathBuilder;

/// Advance of a narrow character when no face is registered, in ems.
pub const FALLBACK_NARROW_ADVANCE: f32 = 0.55;
/// Advance of a wide (CJK, emoji) character when no face is registered.
pub const FALLBACK_WIDE_ADVANCE: f32 = 1.0;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid font data for family `{0}`")]
    Invalid(String),
}

/// A glyph positioned on a line. `x` is relative to the line's left edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub id: GlyphId,
    pub x: f32,
}

/// The glyph run of one line at one size.
#[derive(Debug, Clone, Default)]
pub struct LineRun {
    pub glyphs: SmallVec<[PlacedGlyph; 32]>,
    pub width: f32,
}

/// Registered font faces, keyed by family and weight.
#[derive(Default)]
pub struct FontBook {
    faces: HashMap<(String, FontWeight), FontVec>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.faces.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face from raw TTF/OTF bytes.
    pub fn register(
        &mut self,
        family: impl Into<String>,
        weight: FontWeight,
        bytes: Vec<u8>,
    ) -> Result<(), FontError> {
        let family = family.into();
        let face = FontVec::try_from_vec(bytes).map_err(|_| FontError::Invalid(family.clone()))?;
        log::debug!("registered font `{family}` ({weight:?})");
        self.faces.insert((family, weight), face);
        Ok(())
    }

    /// Register a face from a file on disk.
    pub fn load_file(
        &mut self,
        family: impl Into<String>,
        weight: FontWeight,
        path: impl AsRef<Path>,
    ) -> Result<(), FontError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.register(family, weight, bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// The face for `family` at `weight`, falling back to any other weight
    /// registered for the same family.
    pub fn face(&self, family: &str, weight: FontWeight) -> Option<&FontVec> {
        let other = match weight {
            FontWeight::Bold => FontWeight::Normal,
            FontWeight::Normal => FontWeight::Bold,
        };
        self.faces
            .get(&(family.to_string(), weight))
            .or_else(|| self.faces.get(&(family.to_string(), other)))
    }

    /// Width of `line` at `size` px with `letter_spacing` px added after every
    /// character.
    pub fn measure(
        &self,
        line: &str,
        family: &str,
        weight: FontWeight,
        size: f32,
        letter_spacing: f32,
    ) -> f32 {
        match self.face(family, weight) {
            Some(face) => layout_line(face, line, size, letter_spacing).width,
            None => fallback_width(line, size, letter_spacing),
        }
    }
}

/// Pixels per font unit for an em size of `size` px.
pub fn px_per_unit(face: &FontVec, size: f32) -> f32 {
    size / face.units_per_em().unwrap_or(1000.0)
}

/// Place the glyphs of `line` left to right.
pub fn layout_line(face: &FontVec, line: &str, size: f32, letter_spacing: f32) -> LineRun {
    let scale = px_per_unit(face, size);
    let mut run = LineRun::default();
    let mut cursor = 0.0;
    let mut prev: Option<GlyphId> = None;

    for ch in line.chars() {
        let id = face.glyph_id(ch);
        if let Some(p) = prev {
            cursor += face.kern_unscaled(p, id) * scale;
        }
        run.glyphs.push(PlacedGlyph { id, x: cursor });
        cursor += face.h_advance_unscaled(id) * scale + letter_spacing;
        prev = Some(id);
    }

    run.width = cursor;
    run
}

/// Baseline offset below the vertical middle of the em box, in px.
pub fn middle_to_baseline(face: &FontVec, size: f32) -> f32 {
    let scale = px_per_unit(face, size);
    (face.ascent_unscaled() + face.descent_unscaled()) / 2.0 * scale
}

/// Deterministic width approximation used when a family is missing.
pub fn fallback_width(line: &str, size: f32, letter_spacing: f32) -> f32 {
    line.chars()
        .map(|c| {
            let em = if is_wide(c) {
                FALLBACK_WIDE_ADVANCE
            } else {
                FALLBACK_NARROW_ADVANCE
            };
            em * size + letter_spacing
        })
        .sum()
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1FAFF
        | 0x20000..=0x3FFFD)
}

/// Append the outlines of a glyph run to `builder`, with the run's left edge
/// at `x` and its baseline at `baseline`.
pub fn append_run_outline(
    builder: &mut PathBuilder,
    face: &FontVec,
    run: &LineRun,
    size: f32,
    x: f32,
    baseline: f32,
) {
    let scale = px_per_unit(face, size);
    for glyph in &run.glyphs {
        let Some(outline) = face.outline(glyph.id) else {
            continue;
        };
        let ox = x + glyph.x;
        // Font units have y pointing up; flip for canvas space.
        let tx = |p: ab_glyph::Point| (ox + p.x * scale, baseline - p.y * scale);

        let mut last: Option<ab_glyph::Point> = None;
        for curve in &outline.curves {
            let (start, end) = match curve {
                OutlineCurve::Line(a, b) => (*a, *b),
                OutlineCurve::Quad(a, _, b) => (*a, *b),
                OutlineCurve::Cubic(a, _, _, b) => (*a, *b),
            };
            if last != Some(start) {
                if last.is_some() {
                    builder.close();
                }
                let (sx, sy) = tx(start);
                builder.move_to(sx, sy);
            }
            match curve {
                OutlineCurve::Line(_, b) => {
                    let (bx, by) = tx(*b);
                    builder.line_to(bx, by);
                }
                OutlineCurve::Quad(_, c, b) => {
                    let (cx, cy) = tx(*c);
                    let (bx, by) = tx(*b);
                    builder.quad_to(cx, cy, bx, by);
                }
                OutlineCurve::Cubic(_, c1, c2, b) => {
                    let (c1x, c1y) = tx(*c1);
                    let (c2x, c2y) = tx(*c2);
                    let (bx, by) = tx(*b);
                    builder.cubic_to(c1x, c1y, c2x, c2y, bx, by);
                }
            }
            last = Some(end);
        }
        if last.is_some() {
            builder.close();
        }
    }
}
