//! Objects submitted to a placement run and the records produced for them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON;
use crate::error::ObjectError;
use crate::geometry::Footprint;
use crate::grid::Cell;
use crate::rules::Rule;

/// Run-local identifier assigned on commit.
pub type ObjectId = u32;

/// Bounding-box size in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub depth: f32,
    pub height: f32,
}

impl Dimensions {
    pub fn new(width: f32, depth: f32, height: f32) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }
}

/// A named placement offset inside a container, relative to the
/// container's origin. `base` defaults to the container's own base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<f32>,
}

/// Input to a placement run. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceableObject {
    /// Unique within a run; relative rules target objects by this name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub dimensions: Dimensions,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<Slot>,
    /// Fixed rotation in radians; overrides wall-facing rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
}

impl PlaceableObject {
    pub fn new(name: impl Into<String>, dimensions: Dimensions) -> Self {
        Self {
            name: name.into(),
            path: None,
            dimensions,
            rules: Vec::new(),
            slots: Vec::new(),
            rotation: None,
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Floor-plane position in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// A committed placement. Never moves once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub object: PlaceableObject,
    pub position: Position,
    /// Height of the bottom surface; 0 is the floor.
    pub base: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    /// Grid cells claimed at commit time.
    pub cells: Vec<Cell>,
    /// Tag of the candidate that produced this placement.
    pub reason: String,
}

impl PlacedObject {
    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn dimensions(&self) -> Dimensions {
        self.object.dimensions
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::new(
            self.position.x,
            self.position.y,
            self.object.dimensions.width,
            self.object.dimensions.depth,
        )
    }

    /// Height of the top surface.
    pub fn top(&self) -> f32 {
        self.base + self.object.dimensions.height
    }

    pub fn rules(&self) -> &[Rule] {
        &self.object.rules
    }
}

/// Reject malformed input before a run starts.
///
/// Returns the first problem found, scanning objects in order.
pub fn validate_objects(objects: &[PlaceableObject]) -> Result<(), ObjectError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for (index, obj) in objects.iter().enumerate() {
        if obj.name.trim().is_empty() {
            return Err(ObjectError::EmptyName { index });
        }
        if !seen.insert(obj.name.as_str()) {
            return Err(ObjectError::DuplicateName(obj.name.clone()));
        }
        validate_object(obj)?;
    }
    Ok(())
}

fn validate_object(obj: &PlaceableObject) -> Result<(), ObjectError> {
    let dims = obj.dimensions;
    for (dimension, value) in [
        ("width", dims.width),
        ("depth", dims.depth),
        ("height", dims.height),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ObjectError::InvalidDimension {
                name: obj.name.clone(),
                dimension,
                value,
            });
        }
    }

    if let Some(rotation) = obj.rotation {
        if !rotation.is_finite() {
            return Err(ObjectError::InvalidRotation {
                name: obj.name.clone(),
            });
        }
    }

    for rule in &obj.rules {
        if rule.target() == Some(obj.name.as_str()) {
            return Err(ObjectError::SelfTarget {
                name: obj.name.clone(),
                rule: rule.tag(),
            });
        }
        match rule {
            Rule::MinClearance { meters } if !(*meters >= 0.0) => {
                return Err(ObjectError::NegativeClearance {
                    name: obj.name.clone(),
                    meters: *meters,
                });
            }
            Rule::AdjacentTo { gap: Some(gap), .. } if !(*gap >= 0.0) => {
                return Err(ObjectError::NegativeGap {
                    name: obj.name.clone(),
                    gap: *gap,
                });
            }
            _ => {}
        }
    }

    let own = Footprint::new(0.0, 0.0, dims.width, dims.depth);
    for (i, slot) in obj.slots.iter().enumerate() {
        let inside = own.contains(&Footprint::new(slot.x, slot.y, 0.0, 0.0));
        let base_ok = slot
            .base
            .map_or(true, |b| b.is_finite() && b >= -EPSILON);
        if !inside || !base_ok {
            return Err(ObjectError::SlotOutsideFootprint {
                name: obj.name.clone(),
                slot: i,
            });
        }
    }

    Ok(())
}
