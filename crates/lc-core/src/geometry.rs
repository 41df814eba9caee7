//! Layer-local coordinate frames.
//!
//! A layer's local frame has its origin at the layer center, x to the right
//! and y down, rotated by the layer's rotation. Rendering maps local → canvas
//! with [`local_frame`]; hit testing maps canvas → local with [`to_local`].

use crate::model::Layer;
use kurbo::{Affine, Point, Vec2};

/// Local → canvas transform: translate to the center, then rotate.
pub fn local_frame(layer: &Layer) -> Affine {
    Affine::translate((layer.x as f64, layer.y as f64))
        * Affine::rotate((layer.rotation as f64).to_radians())
}

/// Map a canvas point into the layer's local frame.
pub fn to_local(layer: &Layer, point: Point) -> Point {
    let d = point - Point::new(layer.x as f64, layer.y as f64);
    rotate_vec(d, -(layer.rotation as f64).to_radians()).to_point()
}

/// Rotate a canvas-space delta into the layer's local axes.
pub fn delta_to_local(layer: &Layer, delta: Vec2) -> Vec2 {
    rotate_vec(delta, -(layer.rotation as f64).to_radians())
}

/// Rotate a local-space delta back into canvas axes.
pub fn delta_to_canvas(layer: &Layer, delta: Vec2) -> Vec2 {
    rotate_vec(delta, (layer.rotation as f64).to_radians())
}

fn rotate_vec(v: Vec2, radians: f64) -> Vec2 {
    let (sin, cos) = radians.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Normalize an angle in degrees to (-180, 180].
pub fn normalize_degrees(degrees: f32) -> f32 {
    let r = degrees.rem_euclid(360.0);
    if r > 180.0 { r - 360.0 } else { r }
}

/// Round an angle to the nearest multiple of `step` degrees.
pub fn snap_degrees(degrees: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return degrees;
    }
    (degrees / step).round() * step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::create_text_layer;
    use crate::patch::LayerPatch;

    fn layer_at(x: f32, y: f32, rotation: f32) -> Layer {
        let mut layer = create_text_layer(&LayerPatch::default(), 100, 100);
        layer.x = x;
        layer.y = y;
        layer.rotation = rotation;
        layer
    }

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-6
    }

    #[test]
    fn to_local_inverts_local_frame() {
        let layer = layer_at(300.0, 200.0, 33.0);
        let local = Point::new(40.0, -15.0);
        let canvas = local_frame(&layer) * local;
        assert!(close(to_local(&layer, canvas), local));
    }

    #[test]
    fn quarter_turn() {
        let layer = layer_at(0.0, 0.0, 90.0);
        // Local +x points down the canvas after a clockwise quarter turn.
        let canvas = local_frame(&layer) * Point::new(10.0, 0.0);
        assert!(close(canvas, Point::new(0.0, 10.0)));
        assert!(close(to_local(&layer, Point::new(0.0, 10.0)), Point::new(10.0, 0.0)));
    }

    #[test]
    fn deltas_roundtrip() {
        let layer = layer_at(0.0, 0.0, -127.0);
        let d = Vec2::new(3.0, 4.0);
        let back = delta_to_canvas(&layer, delta_to_local(&layer, d));
        assert!((back - d).hypot() < 1e-9);
    }

    #[test]
    fn normalize_range() {
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(190.0), -170.0);
        assert_eq!(normalize_degrees(-190.0), 170.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert_eq!(normalize_degrees(45.0), 45.0);
    }

    #[test]
    fn snapping() {
        assert_eq!(snap_degrees(22.0, 15.0), 15.0);
        assert_eq!(snap_degrees(23.0, 15.0), 30.0);
        assert_eq!(snap_degrees(-8.0, 15.0), -15.0);
        assert_eq!(snap_degrees(12.3, 0.0), 12.3);
    }
}
