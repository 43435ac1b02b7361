//! Room configuration: the construction-time parameters of a run.
//!
//! ```
//! use roomgen_logic::config::{validate_config, RoomConfig};
//!
//! let config = RoomConfig::from_json(r#"{ "room_width": 8, "room_depth": 6, "wall_height": 3 }"#).unwrap();
//! assert_eq!(config.cell_size, 0.25);
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{room_defaults, DEFAULT_MAX_RETRIES, MAX_GRID_CELLS};
use crate::error::ConfigError;
use crate::geometry::Wall;

/// Room and run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Extent along x, meters.
    pub room_width: f32,
    /// Extent along y, meters.
    pub room_depth: f32,
    /// Grid cell side and scan step, meters.
    pub cell_size: f32,
    /// Ceiling height, meters.
    pub wall_height: f32,
    /// Extra attempts per object after the first one fails.
    pub max_retries: u32,
    /// Room edges that are not physical walls (e.g. the open camera side).
    pub excluded_walls: Vec<Wall>,
    /// Seed for candidate selection. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            room_width: room_defaults::WIDTH,
            room_depth: room_defaults::DEPTH,
            cell_size: room_defaults::CELL_SIZE,
            wall_height: room_defaults::WALL_HEIGHT,
            max_retries: DEFAULT_MAX_RETRIES,
            excluded_walls: Vec::new(),
            seed: None,
        }
    }
}

impl RoomConfig {
    pub fn new(room_width: f32, room_depth: f32, cell_size: f32, wall_height: f32) -> Self {
        Self {
            room_width,
            room_depth,
            cell_size,
            wall_height,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn with_excluded_walls(mut self, walls: impl IntoIterator<Item = Wall>) -> Self {
        self.excluded_walls = walls.into_iter().collect();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Walls that wall-bound objects may stand against.
    pub fn usable_walls(&self) -> Vec<Wall> {
        Wall::all()
            .into_iter()
            .filter(|w| !self.excluded_walls.contains(w))
            .collect()
    }

    pub fn is_excluded(&self, wall: Wall) -> bool {
        self.excluded_walls.contains(&wall)
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// Validate a room configuration, returning all errors found.
pub fn validate_config(config: &RoomConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if !positive(config.room_width) {
        errors.push(ConfigError::InvalidRoomSize {
            axis: "width",
            value: config.room_width,
        });
    }
    if !positive(config.room_depth) {
        errors.push(ConfigError::InvalidRoomSize {
            axis: "depth",
            value: config.room_depth,
        });
    }
    if !positive(config.cell_size) {
        errors.push(ConfigError::InvalidCellSize(config.cell_size));
    } else if config.cell_size > config.room_width || config.cell_size > config.room_depth {
        errors.push(ConfigError::CellLargerThanRoom {
            cell_size: config.cell_size,
            width: config.room_width,
            depth: config.room_depth,
        });
    } else if positive(config.room_width) && positive(config.room_depth) {
        let cols = (f64::from(config.room_width) / f64::from(config.cell_size)).ceil() as u64;
        let rows = (f64::from(config.room_depth) / f64::from(config.cell_size)).ceil() as u64;
        if cols.saturating_mul(rows) > MAX_GRID_CELLS {
            errors.push(ConfigError::GridTooLarge {
                cols,
                rows,
                max: MAX_GRID_CELLS,
            });
        }
    }
    if !positive(config.wall_height) {
        errors.push(ConfigError::InvalidWallHeight(config.wall_height));
    }
    if config.usable_walls().is_empty() {
        errors.push(ConfigError::NoUsableWalls);
    }

    errors
}
