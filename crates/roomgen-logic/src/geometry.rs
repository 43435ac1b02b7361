//! Axis-aligned floor rectangles and the four room walls.
//!
//! Everything in the engine is an AABB approximation: an object's footprint is
//! the rectangle `[x, x+width) × [y, y+depth)` on the floor plane and its
//! vertical extent is the interval `[base, base+height)`.

use serde::{Deserialize, Serialize};

use crate::constants::{facing, EPSILON};

/// An axis-aligned rectangle on the floor plane, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub depth: f32,
}

impl Footprint {
    pub fn new(x: f32, y: f32, width: f32, depth: f32) -> Self {
        Self {
            x,
            y,
            width,
            depth,
        }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.depth
    }

    /// Strict interior intersection. Rectangles that only share an edge do
    /// not intersect.
    pub fn intersects(&self, other: &Footprint) -> bool {
        self.x < other.max_x() - EPSILON
            && other.x < self.max_x() - EPSILON
            && self.y < other.max_y() - EPSILON
            && other.y < self.max_y() - EPSILON
    }

    /// True if `other` lies entirely inside `self`, within tolerance.
    pub fn contains(&self, other: &Footprint) -> bool {
        other.x >= self.x - EPSILON
            && other.max_x() <= self.max_x() + EPSILON
            && other.y >= self.y - EPSILON
            && other.max_y() <= self.max_y() + EPSILON
    }

    /// Grow the rectangle by `margin` on all four sides.
    pub fn expanded(&self, margin: f32) -> Footprint {
        Footprint {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            depth: self.depth + 2.0 * margin,
        }
    }

    /// Origin that centers a `width × depth` rectangle over this one.
    pub fn centered_origin(&self, width: f32, depth: f32) -> (f32, f32) {
        (
            self.x + (self.width - width) / 2.0,
            self.y + (self.depth - depth) / 2.0,
        )
    }
}

/// Half-open vertical intervals `[a_base, a_top)` and `[b_base, b_top)` overlap.
pub fn vertical_overlap(a_base: f32, a_top: f32, b_base: f32, b_top: f32) -> bool {
    a_base < b_top - EPSILON && a_top > b_base + EPSILON
}

/// One edge of the rectangular room.
///
/// North is the `y = 0` edge, south `y = depth`, west `x = 0`, east `x = width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wall {
    North,
    South,
    West,
    East,
}

impl Wall {
    pub fn all() -> [Wall; 4] {
        [Wall::North, Wall::South, Wall::West, Wall::East]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Wall::North => "north",
            Wall::South => "south",
            Wall::West => "west",
            Wall::East => "east",
        }
    }

    /// Rotation that points an object standing against this wall into the room.
    pub fn facing_away(&self) -> f32 {
        match self {
            Wall::North => facing::NORTH_WALL,
            Wall::South => facing::SOUTH_WALL,
            Wall::West => facing::WEST_WALL,
            Wall::East => facing::EAST_WALL,
        }
    }

    /// Does `fp` abut this wall of a `room_width × room_depth` room?
    pub fn touches(&self, fp: &Footprint, room_width: f32, room_depth: f32) -> bool {
        match self {
            Wall::North => fp.y.abs() <= EPSILON,
            Wall::South => (fp.max_y() - room_depth).abs() <= EPSILON,
            Wall::West => fp.x.abs() <= EPSILON,
            Wall::East => (fp.max_x() - room_width).abs() <= EPSILON,
        }
    }
}
