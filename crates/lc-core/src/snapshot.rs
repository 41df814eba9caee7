//! Opaque snapshot save/load of a `CanvasState`.
//!
//! JSON is the human-readable interchange form; MessagePack is the compact
//! one. Loading drops a selection that does not point at a layer.

use crate::state::CanvasState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("json snapshot error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("msgpack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("msgpack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

pub fn to_json(state: &CanvasState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(state)?)
}

pub fn from_json(text: &str) -> Result<CanvasState, SnapshotError> {
    let mut state: CanvasState = serde_json::from_str(text)?;
    state.normalize();
    Ok(state)
}

pub fn to_msgpack(state: &CanvasState) -> Result<Vec<u8>, SnapshotError> {
    Ok(rmp_serde::to_vec_named(state)?)
}

pub fn from_msgpack(bytes: &[u8]) -> Result<CanvasState, SnapshotError> {
    let mut state: CanvasState = rmp_serde::from_slice(bytes)?;
    state.normalize();
    Ok(state)
}
