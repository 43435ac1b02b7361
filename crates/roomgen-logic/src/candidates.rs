//! Candidate generation: geometric proposals for one object.
//!
//! Two sources feed the pool:
//!
//! 1. **Relative candidates** from rules whose target is already placed
//!    (`OnTopOf`, `InsideOf`, `Under`, `AdjacentTo`, `AlignWith`, `NextTo`).
//!    A rule whose target is missing contributes nothing.
//! 2. **Floor/wall scan** when the object must touch the ground or has no
//!    vertical anchor: step-aligned positions along the usable walls for
//!    wall-bound objects, otherwise the whole floor.
//!
//! The union is deduplicated by cell-quantized position and millimeter base.
//! Candidates are only proposals; [`crate::validate`] decides legality.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::RoomConfig;
use crate::constants::{BASE_BUCKETS_PER_METER, DEFAULT_ADJACENT_GAP, EPSILON, NEIGHBOR_GAP};
use crate::geometry::{Footprint, Wall};
use crate::object::{PlaceableObject, PlacedObject};
use crate::rules::{Direction, Rule, RuleSet};

/// A proposed placement that has not been validated yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub x: f32,
    pub y: f32,
    pub base: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    /// Diagnostic tag such as `onTopOf:Desk` or `wall-north`.
    pub reason: String,
}

impl Candidate {
    pub fn new(x: f32, y: f32, base: f32, reason: impl Into<String>) -> Self {
        Self {
            x,
            y,
            base,
            rotation: None,
            reason: reason.into(),
        }
    }

    pub fn footprint(&self, obj: &PlaceableObject) -> Footprint {
        Footprint::new(self.x, self.y, obj.dimensions.width, obj.dimensions.depth)
    }
}

/// Produce the deduplicated candidate pool for `obj`.
pub fn generate_candidates(
    obj: &PlaceableObject,
    placed: &[PlacedObject],
    config: &RoomConfig,
) -> Vec<Candidate> {
    let mut out = relative_candidates(obj, placed);

    if wants_floor(&obj.rules) {
        if obj.rules.touches_wall() {
            out.extend(wall_candidates(obj, config));
        } else {
            out.extend(floor_candidates(obj, config));
        }
    }

    for c in &mut out {
        if obj.rotation.is_some() {
            c.rotation = obj.rotation;
        }
    }

    dedup_by_cell(out, config.cell_size)
}

/// Ground contact is required, or nothing else decides the vertical placement.
fn wants_floor(rules: &[Rule]) -> bool {
    rules.requires_ground() || !rules.has_vertical_anchor()
}

fn find<'a>(placed: &'a [PlacedObject], name: &str) -> Option<&'a PlacedObject> {
    placed.iter().find(|p| p.name() == name)
}

/// Candidates derived from rules whose target is already placed.
pub fn relative_candidates(obj: &PlaceableObject, placed: &[PlacedObject]) -> Vec<Candidate> {
    let dims = obj.dimensions;
    let mut out = Vec::new();

    for rule in &obj.rules {
        let Some(target) = rule.target().and_then(|name| find(placed, name)) else {
            continue;
        };
        let t = target.footprint();
        let name = target.name();

        match rule {
            Rule::OnTopOf { .. } => {
                let (x, y) = t.centered_origin(dims.width, dims.depth);
                out.push(Candidate::new(x, y, target.top(), format!("onTopOf:{name}")));
            }
            Rule::InsideOf { .. } => {
                let slots = &target.object.slots;
                if slots.is_empty() {
                    let (x, y) = t.centered_origin(dims.width, dims.depth);
                    out.push(Candidate::new(
                        x,
                        y,
                        target.base,
                        format!("insideOf:{name}:fallback"),
                    ));
                } else {
                    for slot in slots {
                        out.push(Candidate::new(
                            t.x + slot.x,
                            t.y + slot.y,
                            slot.base.unwrap_or(target.base),
                            format!("insideOf:{name}:slot"),
                        ));
                    }
                }
            }
            Rule::Under { .. } => {
                let (x, y) = t.centered_origin(dims.width, dims.depth);
                out.push(Candidate::new(x, y, 0.0, format!("under:{name}")));
            }
            Rule::AdjacentTo { direction, gap, .. } => {
                let gap = gap.unwrap_or(DEFAULT_ADJACENT_GAP);
                let (cx, cy) = t.centered_origin(dims.width, dims.depth);
                let (x, y) = match direction {
                    Direction::Right => (t.max_x() + gap, cy),
                    Direction::Left => (t.x - dims.width - gap, cy),
                    Direction::Front => (cx, t.max_y() + gap),
                    Direction::Behind => (cx, t.y - dims.depth - gap),
                };
                out.push(Candidate::new(
                    x,
                    y,
                    0.0,
                    format!("{}:{name}", direction.label()),
                ));
            }
            Rule::AlignWith { .. } => {
                out.push(Candidate::new(
                    t.max_x() + NEIGHBOR_GAP,
                    t.y,
                    0.0,
                    format!("alignWith:{name}"),
                ));
            }
            Rule::NextTo { .. } => {
                let sides = [
                    ("right", t.max_x() + NEIGHBOR_GAP, t.y),
                    ("left", t.x - dims.width - NEIGHBOR_GAP, t.y),
                    ("above", t.x, t.y - dims.depth - NEIGHBOR_GAP),
                    ("below", t.x, t.max_y() + NEIGHBOR_GAP),
                ];
                for (side, x, y) in sides {
                    out.push(Candidate::new(x, y, 0.0, format!("nextTo:{name}:{side}")));
                }
            }
            _ => {}
        }
    }

    out
}

/// Step-aligned origins `0, step, 2·step, …` that keep `extent` inside `room`.
fn scan_positions(extent: f32, room: f32, step: f32) -> impl Iterator<Item = f32> {
    let last = ((room - extent + EPSILON) / step).floor();
    let count = if last >= 0.0 { last as i64 + 1 } else { 0 };
    (0..count).map(move |i| i as f32 * step)
}

/// Positions along each usable wall, dropping any that would touch an
/// excluded wall.
pub fn wall_candidates(obj: &PlaceableObject, config: &RoomConfig) -> Vec<Candidate> {
    let dims = obj.dimensions;
    let step = config.cell_size;
    let face_away = obj.rules.faces_away_from_wall();
    let mut out = Vec::new();

    for wall in config.usable_walls() {
        let origins: Vec<(f32, f32)> = match wall {
            Wall::North => scan_positions(dims.width, config.room_width, step)
                .map(|x| (x, 0.0))
                .collect(),
            Wall::South => scan_positions(dims.width, config.room_width, step)
                .map(|x| (x, config.room_depth - dims.depth))
                .collect(),
            Wall::West => scan_positions(dims.depth, config.room_depth, step)
                .map(|y| (0.0, y))
                .collect(),
            Wall::East => scan_positions(dims.depth, config.room_depth, step)
                .map(|y| (config.room_width - dims.width, y))
                .collect(),
        };

        for (x, y) in origins {
            let fp = Footprint::new(x, y, dims.width, dims.depth);
            let touches_excluded = config
                .excluded_walls
                .iter()
                .any(|w| w.touches(&fp, config.room_width, config.room_depth));
            if touches_excluded {
                continue;
            }
            let mut c = Candidate::new(x, y, 0.0, format!("wall-{}", wall.label()));
            if face_away {
                c.rotation = Some(wall.facing_away());
            }
            out.push(c);
        }
    }

    out
}

/// Every step-aligned floor position that keeps the footprint in the room.
pub fn floor_candidates(obj: &PlaceableObject, config: &RoomConfig) -> Vec<Candidate> {
    let dims = obj.dimensions;
    let step = config.cell_size;
    let mut out = Vec::new();
    for y in scan_positions(dims.depth, config.room_depth, step) {
        for x in scan_positions(dims.width, config.room_width, step) {
            out.push(Candidate::new(x, y, 0.0, "floor-scan"));
        }
    }
    out
}

/// Keep the first candidate per `(x cell, y cell, base mm)` bucket.
pub fn dedup_by_cell(candidates: Vec<Candidate>, cell_size: f32) -> Vec<Candidate> {
    let mut seen: HashSet<(i64, i64, i64)> = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| {
            seen.insert((
                (c.x / cell_size).round() as i64,
                (c.y / cell_size).round() as i64,
                (c.base * BASE_BUCKETS_PER_METER).round() as i64,
            ))
        })
        .collect()
}
