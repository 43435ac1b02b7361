//! Declarative placement rules attached to each object.
//!
//! The set is closed: every constraint the engine understands is a variant of
//! [`Rule`]. Rules are evaluated independently and a candidate must satisfy
//! every applicable one. Relative rules name another object; they only
//! contribute candidates once that object has been placed.
//!
//! JSON form (as used by the rule catalog):
//!
//! ```
//! use roomgen_logic::rules::{Direction, Rule};
//!
//! let rules: Vec<Rule> = serde_json::from_str(r#"[
//!     { "type": "touchGround", "value": true },
//!     { "type": "adjacentTo", "direction": "right", "target": "BedBasic", "gap": 0.1 },
//!     { "type": "minClearance", "meters": 0.5 }
//! ]"#).unwrap();
//! assert_eq!(rules[1], Rule::AdjacentTo {
//!     direction: Direction::Right,
//!     target: "BedBasic".into(),
//!     gap: Some(0.1),
//! });
//! ```

use serde::{Deserialize, Serialize};

/// Side of a target object used by [`Rule::AdjacentTo`].
///
/// `Right`/`Left` move along +x/−x, `Front`/`Behind` along +y/−y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Right,
    Left,
    Front,
    Behind,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Right => "right",
            Direction::Left => "left",
            Direction::Front => "front",
            Direction::Behind => "behind",
        }
    }
}

/// One placement constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Rule {
    /// Must stand against one of the usable room walls.
    TouchWall { value: bool },
    /// When against a wall, rotate to face into the room.
    FaceAwayFromWall { value: bool },
    /// Bottom must rest on the floor (`base == 0`).
    TouchGround { value: bool },
    /// Stack exactly on top of the target.
    OnTopOf { target: String },
    /// Sit inside the target container (slot or centered fallback).
    InsideOf { target: String },
    /// Stand on the floor centered under the target.
    Under { target: String },
    /// Stand beside the target on the given side, `gap` meters away.
    AdjacentTo {
        direction: Direction,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gap: Option<f32>,
    },
    /// Share the target's y origin, just to its right.
    AlignWith { target: String },
    /// Any side of the target is acceptable.
    NextTo { target: String },
    /// Keep at least `meters` of free floor to every vertically overlapping
    /// neighbor.
    MinClearance { meters: f32 },
    /// Whether other objects may rest on top of this one.
    AllowStacking { value: bool },
}

impl Rule {
    /// Name of the object this rule is relative to, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Rule::OnTopOf { target }
            | Rule::InsideOf { target }
            | Rule::Under { target }
            | Rule::AdjacentTo { target, .. }
            | Rule::AlignWith { target }
            | Rule::NextTo { target } => Some(target.as_str()),
            Rule::TouchWall { .. }
            | Rule::FaceAwayFromWall { .. }
            | Rule::TouchGround { .. }
            | Rule::MinClearance { .. }
            | Rule::AllowStacking { .. } => None,
        }
    }

    /// Rules that decide an object's vertical placement relative to another.
    pub fn is_vertical_anchor(&self) -> bool {
        matches!(
            self,
            Rule::OnTopOf { .. } | Rule::InsideOf { .. } | Rule::Under { .. }
        )
    }

    /// Short tag used in logs and candidate reasons.
    pub fn tag(&self) -> &'static str {
        match self {
            Rule::TouchWall { .. } => "touchWall",
            Rule::FaceAwayFromWall { .. } => "faceAwayFromWall",
            Rule::TouchGround { .. } => "touchGround",
            Rule::OnTopOf { .. } => "onTopOf",
            Rule::InsideOf { .. } => "insideOf",
            Rule::Under { .. } => "under",
            Rule::AdjacentTo { .. } => "adjacentTo",
            Rule::AlignWith { .. } => "alignWith",
            Rule::NextTo { .. } => "nextTo",
            Rule::MinClearance { .. } => "minClearance",
            Rule::AllowStacking { .. } => "allowStacking",
        }
    }
}

/// Queries over an object's rule list.
pub trait RuleSet {
    fn touches_wall(&self) -> bool;
    fn faces_away_from_wall(&self) -> bool;
    fn requires_ground(&self) -> bool;
    /// Largest declared minimum clearance.
    fn min_clearance(&self) -> Option<f32>;
    /// `OnTopOf` or `InsideOf` decides the base height.
    fn is_stacked_by_rule(&self) -> bool;
    fn has_vertical_anchor(&self) -> bool;
    /// `AllowStacking(false)` present. Stacking is allowed by default.
    fn forbids_stacking(&self) -> bool;
    /// Target of the first `InsideOf` rule.
    fn container(&self) -> Option<&str>;
    /// Object whose bounding box this one may share: the `InsideOf`
    /// container, else the `Under` target.
    fn host(&self) -> Option<&str>;
    /// Names this object's vertical placement depends on.
    fn anchor_targets(&self) -> Vec<&str>;
}

impl RuleSet for [Rule] {
    fn touches_wall(&self) -> bool {
        self.iter()
            .any(|r| matches!(r, Rule::TouchWall { value: true }))
    }

    fn faces_away_from_wall(&self) -> bool {
        self.iter()
            .any(|r| matches!(r, Rule::FaceAwayFromWall { value: true }))
    }

    fn requires_ground(&self) -> bool {
        self.iter()
            .any(|r| matches!(r, Rule::TouchGround { value: true }))
    }

    fn min_clearance(&self) -> Option<f32> {
        self.iter()
            .filter_map(|r| match r {
                Rule::MinClearance { meters } => Some(*meters),
                _ => None,
            })
            .reduce(f32::max)
    }

    fn is_stacked_by_rule(&self) -> bool {
        self.iter()
            .any(|r| matches!(r, Rule::OnTopOf { .. } | Rule::InsideOf { .. }))
    }

    fn has_vertical_anchor(&self) -> bool {
        self.iter().any(Rule::is_vertical_anchor)
    }

    fn forbids_stacking(&self) -> bool {
        self.iter()
            .any(|r| matches!(r, Rule::AllowStacking { value: false }))
    }

    fn container(&self) -> Option<&str> {
        self.iter().find_map(|r| match r {
            Rule::InsideOf { target } => Some(target.as_str()),
            _ => None,
        })
    }

    fn host(&self) -> Option<&str> {
        self.container().or_else(|| {
            self.iter().find_map(|r| match r {
                Rule::Under { target } => Some(target.as_str()),
                _ => None,
            })
        })
    }

    fn anchor_targets(&self) -> Vec<&str> {
        self.iter()
            .filter(|r| r.is_vertical_anchor())
            .filter_map(Rule::target)
            .collect()
    }
}
