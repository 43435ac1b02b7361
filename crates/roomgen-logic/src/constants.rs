//! Placement constants: tolerances, default gaps and the default room.
//!
//! All lengths are meters, all angles radians.

/// Tolerance for comparing room-space coordinates (0.1 mm).
pub const EPSILON: f32 = 1e-4;

/// Tolerance, in cell units, applied when snapping coordinates to cell
/// indices so that `4.0 / 0.25` never claims a spurious extra cell.
pub const GRID_EPSILON: f32 = 1e-4;

/// Default gap for `AdjacentTo` when the rule does not give one.
pub const DEFAULT_ADJACENT_GAP: f32 = 0.2;

/// Fixed gap used by `AlignWith` and `NextTo`.
pub const NEIGHBOR_GAP: f32 = 0.05;

/// Default retry budget per object.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Upper bound on grid cells per run; every cell is allocated up front.
pub const MAX_GRID_CELLS: u64 = 4_000_000;

/// Base heights are bucketed to millimeters when deduplicating candidates.
pub const BASE_BUCKETS_PER_METER: f32 = 1000.0;

pub mod room_defaults {
    pub const WIDTH: f32 = 13.0;
    pub const DEPTH: f32 = 13.0;
    pub const CELL_SIZE: f32 = 0.25;
    pub const WALL_HEIGHT: f32 = 10.0;
}

/// Rotation about the vertical axis that turns an object's front away from
/// the wall it stands against.
pub mod facing {
    use std::f32::consts::{FRAC_PI_2, PI};

    pub const NORTH_WALL: f32 = 0.0;
    pub const SOUTH_WALL: f32 = PI;
    pub const WEST_WALL: f32 = FRAC_PI_2;
    pub const EAST_WALL: f32 = -FRAC_PI_2;
}
