//! Candidate validation with pass/fail and a human-readable reason.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. room bounds
//! 2. vertical bounds (floor and ceiling)
//! 3. ground contact (`TouchGround(true)`)
//! 4. minimum clearance to vertically overlapping neighbors
//! 5. continuous support for raised objects not placed by `OnTopOf`/`InsideOf`,
//!    and stacking permission of whatever the candidate rests on
//! 6. occupancy: the grid for floor-level candidates, the placed list for
//!    raised ones
//!
//! Only step 6 reports [`RejectionKind::Occupied`]; everything else is a rule
//! or bounds rejection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::candidates::Candidate;
use crate::config::RoomConfig;
use crate::constants::EPSILON;
use crate::geometry::vertical_overlap;
use crate::grid::OccupancyGrid;
use crate::object::{ObjectId, PlaceableObject, PlacedObject};
use crate::rules::RuleSet;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RejectionKind {
    Bounds,
    Vertical,
    Ground,
    Clearance,
    Support,
    Stacking,
    Occupied,
}

impl RejectionKind {
    pub fn label(&self) -> &'static str {
        match self {
            RejectionKind::Bounds => "out of bounds",
            RejectionKind::Vertical => "vertical bounds",
            RejectionKind::Ground => "ground contact",
            RejectionKind::Clearance => "clearance",
            RejectionKind::Support => "no support",
            RejectionKind::Stacking => "stacking disallowed",
            RejectionKind::Occupied => "occupied",
        }
    }

    /// Space is taken, as opposed to a rule being violated.
    pub fn is_occupancy(&self) -> bool {
        matches!(self, RejectionKind::Occupied)
    }
}

/// A failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub reason: String,
}

impl Rejection {
    fn new(kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.reason)
    }
}

/// Check one candidate for `obj` against the room, the rules and everything
/// placed so far.
pub fn validate_candidate(
    obj: &PlaceableObject,
    c: &Candidate,
    placed: &[PlacedObject],
    grid: &OccupancyGrid,
    config: &RoomConfig,
) -> Result<(), Rejection> {
    let dims = obj.dimensions;
    let fp = c.footprint(obj);
    let top = c.base + dims.height;
    let rules = obj.rules.as_slice();
    let host = rules.host();

    // 1. room bounds
    if fp.x < -EPSILON
        || fp.y < -EPSILON
        || fp.max_x() > config.room_width + EPSILON
        || fp.max_y() > config.room_depth + EPSILON
    {
        return Err(Rejection::new(
            RejectionKind::Bounds,
            format!(
                "({:.2},{:.2})→({:.2},{:.2}) leaves the {}×{} room",
                fp.x,
                fp.y,
                fp.max_x(),
                fp.max_y(),
                config.room_width,
                config.room_depth
            ),
        ));
    }

    // 2. vertical bounds
    if c.base < -EPSILON {
        return Err(Rejection::new(
            RejectionKind::Vertical,
            format!("base {:.2} is below the floor", c.base),
        ));
    }
    if top > config.wall_height + EPSILON {
        return Err(Rejection::new(
            RejectionKind::Vertical,
            format!(
                "top {:.2} exceeds wall height {:.2}",
                top, config.wall_height
            ),
        ));
    }

    // 3. ground contact
    if rules.requires_ground() && c.base.abs() > EPSILON {
        return Err(Rejection::new(
            RejectionKind::Ground,
            format!("must touch ground but base is {:.2}", c.base),
        ));
    }

    // 4. clearance
    if let Some(clearance) = rules.min_clearance() {
        let halo = fp.expanded(clearance);
        let blocker = placed.iter().find(|p| {
            Some(p.name()) != host
                && vertical_overlap(c.base, top, p.base, p.top())
                && halo.intersects(&p.footprint())
        });
        if let Some(p) = blocker {
            return Err(Rejection::new(
                RejectionKind::Clearance,
                format!("{} is within {:.2}m", p.name(), clearance),
            ));
        }
    }

    let raised = c.base > EPSILON;

    // 5. support and stacking permission
    if raised {
        if !rules.is_stacked_by_rule() {
            let supported = placed.iter().any(|p| {
                (p.top() - c.base).abs() <= EPSILON && p.footprint().contains(&fp)
            });
            if !supported {
                return Err(Rejection::new(
                    RejectionKind::Support,
                    format!("nothing fully supports the footprint at {:.2}m", c.base),
                ));
            }
        }

        let forbidding = placed.iter().find(|p| {
            (p.top() - c.base).abs() <= EPSILON
                && p.footprint().intersects(&fp)
                && p.rules().forbids_stacking()
        });
        if let Some(p) = forbidding {
            return Err(Rejection::new(
                RejectionKind::Stacking,
                format!("{} does not allow stacking", p.name()),
            ));
        }
    }

    // 6. occupancy
    if raised {
        let blocker = placed.iter().find(|p| {
            Some(p.name()) != host
                && vertical_overlap(c.base, top, p.base, p.top())
                && fp.intersects(&p.footprint())
        });
        if let Some(p) = blocker {
            return Err(Rejection::new(
                RejectionKind::Occupied,
                format!("overlaps {} at {:.2}m", p.name(), p.base),
            ));
        }
    } else {
        // With a host, cells also held by things above the candidate (a lamp
        // on the desk it goes under) stay shareable.
        let shared: Vec<ObjectId> = match host {
            Some(name) if placed.iter().any(|p| p.name() == name) => placed
                .iter()
                .filter(|p| {
                    p.name() == name || !vertical_overlap(c.base, top, p.base, p.top())
                })
                .map(|p| p.id)
                .collect(),
            _ => Vec::new(),
        };
        if !grid.can_place_sharing(c.x, c.y, dims.width, dims.depth, &shared) {
            let occupants: Vec<String> = grid
                .occupants(&fp)
                .into_iter()
                .map(|id| describe(id, placed))
                .collect();
            let reason = if occupants.is_empty() {
                "footprint leaves the grid".to_string()
            } else {
                format!("grid cells held by {}", occupants.join(", "))
            };
            return Err(Rejection::new(RejectionKind::Occupied, reason));
        }
    }

    Ok(())
}

fn describe(id: ObjectId, placed: &[PlacedObject]) -> String {
    placed
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name().to_string())
        .unwrap_or_else(|| format!("#{id}"))
}
