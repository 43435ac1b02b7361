//! Hard errors raised at the submission boundary, before a run starts.
//!
//! Expected placement failures (no valid candidate, missing rule target) are
//! never errors; they come back as [`crate::placement::Failure`] entries.

use thiserror::Error;

/// Problems with a [`crate::config::RoomConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("room {axis} must be a positive finite length, got {value}")]
    InvalidRoomSize { axis: &'static str, value: f32 },
    #[error("cell size must be a positive finite length, got {0}")]
    InvalidCellSize(f32),
    #[error("cell size {cell_size} does not fit in a {width}×{depth} room")]
    CellLargerThanRoom {
        cell_size: f32,
        width: f32,
        depth: f32,
    },
    #[error("a {cols}×{rows} grid exceeds the {max} cell limit; use larger cells")]
    GridTooLarge { cols: u64, rows: u64, max: u64 },
    #[error("wall height must be a positive finite length, got {0}")]
    InvalidWallHeight(f32),
    #[error("all four walls are excluded; wall-bound objects could never be placed")]
    NoUsableWalls,
    #[error("config JSON is invalid: {0}")]
    Parse(String),
}

/// Malformed [`crate::object::PlaceableObject`] input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjectError {
    #[error("object #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("object name '{0}' is used more than once")]
    DuplicateName(String),
    #[error("object '{name}' has invalid {dimension}: {value}")]
    InvalidDimension {
        name: String,
        dimension: &'static str,
        value: f32,
    },
    #[error("object '{name}' declares negative clearance {meters}")]
    NegativeClearance { name: String, meters: f32 },
    #[error("object '{name}' declares negative adjacency gap {gap}")]
    NegativeGap { name: String, gap: f32 },
    #[error("object '{name}' has a {rule} rule targeting itself")]
    SelfTarget { name: String, rule: &'static str },
    #[error("object '{name}' has slot #{slot} outside its footprint")]
    SlotOutsideFootprint { name: String, slot: usize },
    #[error("object '{name}' has a non-finite rotation")]
    InvalidRotation { name: String },
}

/// Asset manifest and rule catalog problems.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManifestError {
    #[error("manifest JSON is invalid: {0}")]
    Parse(String),
    #[error("asset '{0}' not found in manifest")]
    UnknownAsset(String),
}

/// Any error a top-level entry point can return.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoomgenError {
    #[error("invalid room config: {}", join(.0))]
    Config(Vec<ConfigError>),
    #[error(transparent)]
    Object(#[from] ObjectError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl From<Vec<ConfigError>> for RoomgenError {
    fn from(errors: Vec<ConfigError>) -> Self {
        RoomgenError::Config(errors)
    }
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
