pub mod geometry;
pub mod id;
pub mod model;
pub mod patch;
pub mod reducer;
pub mod snapshot;
pub mod state;

pub use id::LayerId;
pub use model::*;
pub use patch::LayerPatch;
pub use reducer::{LayerAction, reduce};
pub use snapshot::SnapshotError;
pub use state::CanvasState;

// Re-export kurbo geometry types so downstream crates share one version
pub use kurbo::{Affine, Point, Rect, Vec2};
