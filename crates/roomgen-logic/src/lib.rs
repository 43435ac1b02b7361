//! Procedural furniture placement for rectangular rooms.
//!
//! Given a room and an ordered list of objects, each carrying declarative
//! placement rules, the engine places them one at a time: it proposes
//! candidate positions, filters them against room bounds, the rules and the
//! space already taken, and commits one surviving candidate at random. Objects
//! that cannot be placed are reported, never fatal.
//!
//! Everything here is pure data in, data out. Randomness is injected through
//! [`rand::Rng`], so a seeded run is reproducible.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`audit`] | Whole-layout checks (overlap, support, bounds, wall contact) |
//! | [`candidates`] | Candidate generation from relative rules and floor/wall scans |
//! | [`config`] | Room configuration and validation |
//! | [`constants`] | Tolerances, default gaps, default room setup, wall rotations |
//! | [`error`] | Config, object and manifest errors |
//! | [`geometry`] | Footprints, vertical overlap, room walls |
//! | [`grid`] | 2D occupancy grid over the floor |
//! | [`manifest`] | Asset manifest, furniture rule catalog, room generation pipeline |
//! | [`object`] | Placeable and placed objects, input validation |
//! | [`placement`] | Sequential placement with retries, removal cascades |
//! | [`rules`] | The placement rule model |
//! | [`validate`] | Ordered pass/fail checks for a single candidate |

pub mod audit;
pub mod candidates;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod manifest;
pub mod object;
pub mod placement;
pub mod rules;
pub mod validate;
