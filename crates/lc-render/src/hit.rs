//! Hit testing: canvas point → layer / handle lookup.
//!
//! Every test maps the point into the layer's local frame first, so
//! rotation is handled once in [`lc_core::geometry::to_local`] and the
//! containment checks below are plain axis-aligned comparisons.

use lc_core::Layer;
use lc_core::geometry::to_local;
use lc_core::Point;

/// Default side of a handle's square hit zone, in canvas pixels.
pub const DEFAULT_HANDLE_SIZE: f32 = 12.0;
/// Distance from the top edge to the rotation handle's center.
pub const ROTATE_HANDLE_OFFSET: f64 = 30.0;
/// The rotation handle matches between these distances above the top edge.
pub const ROTATE_HIT_NEAR: f64 = 20.0;
pub const ROTATE_HIT_FAR: f64 = 40.0;

/// A manipulation handle on the selected layer's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Rotate,
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    TopMiddle,
    RightMiddle,
    BottomMiddle,
    LeftMiddle,
}

impl Handle {
    /// Resize handles in hit-test priority order: corners, then edges.
    pub const RESIZE: [Handle; 8] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::BottomLeft,
        Handle::TopMiddle,
        Handle::RightMiddle,
        Handle::BottomMiddle,
        Handle::LeftMiddle,
    ];

    /// Center of the handle in the layer's local frame, for a box with the
    /// given half extents.
    pub fn anchor(self, hw: f64, hh: f64) -> Point {
        let (x, y) = match self {
            Handle::Rotate => (0.0, -hh - ROTATE_HANDLE_OFFSET),
            Handle::TopLeft => (-hw, -hh),
            Handle::TopRight => (hw, -hh),
            Handle::BottomRight => (hw, hh),
            Handle::BottomLeft => (-hw, hh),
            Handle::TopMiddle => (0.0, -hh),
            Handle::RightMiddle => (hw, 0.0),
            Handle::BottomMiddle => (0.0, hh),
            Handle::LeftMiddle => (-hw, 0.0),
        };
        Point::new(x, y)
    }

    /// Which edges a resize through this handle moves, as signs along the
    /// local x and y axes: -1 for the left/top edge, +1 for right/bottom,
    /// 0 when that axis is unaffected.
    pub fn edge_signs(self) -> (f64, f64) {
        match self {
            Handle::Rotate => (0.0, 0.0),
            Handle::TopLeft => (-1.0, -1.0),
            Handle::TopRight => (1.0, -1.0),
            Handle::BottomRight => (1.0, 1.0),
            Handle::BottomLeft => (-1.0, 1.0),
            Handle::TopMiddle => (0.0, -1.0),
            Handle::RightMiddle => (1.0, 0.0),
            Handle::BottomMiddle => (0.0, 1.0),
            Handle::LeftMiddle => (-1.0, 0.0),
        }
    }
}

/// Whether `point` lies inside the layer's (rotated) box. Edges count as
/// inside.
pub fn hit_test_layer(point: Point, layer: &Layer) -> bool {
    let local = to_local(layer, point);
    let hw = layer.width as f64 / 2.0;
    let hh = layer.height as f64 / 2.0;
    local.x >= -hw && local.x <= hw && local.y >= -hh && local.y <= hh
}

/// Find the topmost visible, unlocked layer under `point`.
pub fn hit_test_layers(point: Point, layers: &[Layer]) -> Option<&Layer> {
    // Walk in reverse (last painted = topmost)
    layers
        .iter()
        .rev()
        .filter(|l| l.visible && !l.locked)
        .find(|l| hit_test_layer(point, l))
}

/// Find the handle of `layer` under `point`. The rotation handle wins over
/// corners, and corners win over edge midpoints.
pub fn hit_test_handle(point: Point, layer: &Layer, handle_size: f32) -> Option<Handle> {
    let local = to_local(layer, point);
    let hw = layer.width as f64 / 2.0;
    let hh = layer.height as f64 / 2.0;
    let hs = handle_size as f64 / 2.0;

    if local.x.abs() < hs && local.y < -hh - ROTATE_HIT_NEAR && local.y > -hh - ROTATE_HIT_FAR {
        return Some(Handle::Rotate);
    }

    Handle::RESIZE.into_iter().find(|h| {
        let a = h.anchor(hw, hh);
        (local.x - a.x).abs() < hs && (local.y - a.y).abs() < hs
    })
}
