//! Layout audit for finished placements.
//!
//! Pure functions over a placed list that return validation errors. The
//! validator already enforces all of this per candidate; the audit re-checks a
//! whole layout after the fact, e.g. one loaded from disk or edited by hand.

use crate::config::RoomConfig;
use crate::constants::EPSILON;
use crate::geometry::vertical_overlap;
use crate::object::PlacedObject;
use crate::rules::RuleSet;

/// A layout problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

fn find<'a>(placed: &'a [PlacedObject], name: &str) -> Option<&'a PlacedObject> {
    placed.iter().find(|p| p.name() == name)
}

// ── A. Per-object ───────────────────────────────────────────────────────

/// Check every object lies inside the room, floor to ceiling.
pub fn check_bounds(placed: &[PlacedObject], config: &RoomConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for p in placed {
        let fp = p.footprint();
        if fp.x < -EPSILON
            || fp.y < -EPSILON
            || fp.max_x() > config.room_width + EPSILON
            || fp.max_y() > config.room_depth + EPSILON
        {
            errors.push(ValidationError {
                category: "bounds",
                severity: Severity::Error,
                message: format!(
                    "{} #{} extends outside the room: ({:.2},{:.2})→({:.2},{:.2}) vs {}×{}",
                    p.name(),
                    p.id,
                    fp.x,
                    fp.y,
                    fp.max_x(),
                    fp.max_y(),
                    config.room_width,
                    config.room_depth
                ),
            });
        }
        if p.base < -EPSILON || p.top() > config.wall_height + EPSILON {
            errors.push(ValidationError {
                category: "bounds",
                severity: Severity::Error,
                message: format!(
                    "{} #{} spans {:.2}..{:.2}m, outside floor to ceiling ({}m)",
                    p.name(),
                    p.id,
                    p.base,
                    p.top(),
                    config.wall_height
                ),
            });
        }
    }
    errors
}

/// Check `TouchGround(true)` objects sit on the floor.
pub fn check_ground_contact(placed: &[PlacedObject]) -> Vec<ValidationError> {
    placed
        .iter()
        .filter(|p| p.rules().requires_ground() && p.base.abs() > EPSILON)
        .map(|p| ValidationError {
            category: "ground",
            severity: Severity::Error,
            message: format!("{} #{} must touch ground but base is {:.2}", p.name(), p.id, p.base),
        })
        .collect()
}

/// Warn when a `TouchWall(true)` object does not abut a usable wall.
pub fn check_wall_contact(placed: &[PlacedObject], config: &RoomConfig) -> Vec<ValidationError> {
    let walls = config.usable_walls();
    placed
        .iter()
        .filter(|p| p.rules().touches_wall())
        .filter(|p| {
            let fp = p.footprint();
            !walls
                .iter()
                .any(|w| w.touches(&fp, config.room_width, config.room_depth))
        })
        .map(|p| ValidationError {
            category: "wall_contact",
            severity: Severity::Warning,
            message: format!("{} #{} should stand against a wall", p.name(), p.id),
        })
        .collect()
}

// ── B. Pairwise ─────────────────────────────────────────────────────────

/// No two objects may share volume, except an object with its `InsideOf`
/// container or `Under` target.
pub fn check_overlaps(placed: &[PlacedObject]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for i in 0..placed.len() {
        for j in (i + 1)..placed.len() {
            let a = &placed[i];
            let b = &placed[j];
            if a.rules().host() == Some(b.name()) || b.rules().host() == Some(a.name()) {
                continue;
            }
            if vertical_overlap(a.base, a.top(), b.base, b.top())
                && a.footprint().intersects(&b.footprint())
            {
                errors.push(ValidationError {
                    category: "overlap",
                    severity: Severity::Error,
                    message: format!(
                        "{} #{} and {} #{} overlap",
                        a.name(),
                        a.id,
                        b.name(),
                        b.id
                    ),
                });
            }
        }
    }
    errors
}

/// Raised objects must rest on something: their `OnTopOf` target, their
/// `InsideOf` container, or a surface that fully contains their footprint.
pub fn check_support(placed: &[PlacedObject]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for p in placed.iter().filter(|p| p.base > EPSILON) {
        let rules = p.rules();
        let fp = p.footprint();

        let supported = if let Some(container) = rules.container() {
            find(placed, container).is_some()
        } else if rules.is_stacked_by_rule() {
            rules
                .anchor_targets()
                .iter()
                .filter_map(|t| find(placed, t))
                .any(|t| (t.top() - p.base).abs() <= EPSILON && t.footprint().intersects(&fp))
        } else {
            placed.iter().any(|s| {
                s.id != p.id
                    && (s.top() - p.base).abs() <= EPSILON
                    && s.footprint().contains(&fp)
            })
        };

        if !supported {
            errors.push(ValidationError {
                category: "support",
                severity: Severity::Error,
                message: format!("{} #{} floats at {:.2}m", p.name(), p.id, p.base),
            });
        }
    }
    errors
}

// ── Master audit ────────────────────────────────────────────────────────

pub fn audit_layout(placed: &[PlacedObject], config: &RoomConfig) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_bounds(placed, config));
    all.extend(check_ground_contact(placed));
    all.extend(check_wall_contact(placed, config));
    all.extend(check_overlaps(placed));
    all.extend(check_support(placed));
    all
}
