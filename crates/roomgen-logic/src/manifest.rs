//! Asset manifest and furniture rule catalog, turning object names into
//! placeable objects.
//!
//! A request names an asset. The asset source supplies its model path and
//! bounding-box dimensions; the rule catalog supplies the placement rules for
//! the requested room type. [`generate_room`] runs the whole pipeline:
//! validate config → build objects → place → result.
//!
//! Both default tables are loaded from `data/*.json` at compile time via
//! `include_str!()`. To add furniture, edit the JSON files.

use serde::{Deserialize, Serialize};

use crate::config::RoomConfig;
use crate::error::{ManifestError, RoomgenError};
use crate::object::{Dimensions, PlaceableObject, Slot};
use crate::placement::{run_placement, PlacementResult};
use crate::rules::Rule;

const ASSETS_JSON: &str = include_str!("../../../data/assets_manifest.json");
const RULES_JSON: &str = include_str!("../../../data/furniture_rules.json");

/// One model known to the asset source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub name: String,
    pub path: String,
    pub dimensions: Dimensions,
    /// Container slots, for shelves and the like.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<Slot>,
}

/// Anything that can resolve an asset name to its record.
pub trait AssetSource {
    fn lookup(&self, name: &str) -> Option<AssetRecord>;
}

/// A list of asset records, usually deserialized from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetManifest {
    pub assets: Vec<AssetRecord>,
}

impl AssetManifest {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|e| ManifestError::Parse(e.to_string()))
    }

    /// The manifest shipped in `data/assets_manifest.json`.
    pub fn builtin() -> Result<Self, ManifestError> {
        Self::from_json(ASSETS_JSON)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetSource for AssetManifest {
    fn lookup(&self, name: &str) -> Option<AssetRecord> {
        self.assets.iter().find(|a| a.name == name).cloned()
    }
}

/// Which room a catalog entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(alias = "BedRoom", alias = "bedroom")]
    Bedroom,
    #[serde(alias = "Livingroom", alias = "livingroom")]
    LivingRoom,
    #[serde(alias = "both")]
    Both,
}

impl RoomType {
    /// `Both` on either side matches anything.
    pub fn matches(&self, other: RoomType) -> bool {
        *self == RoomType::Both || other == RoomType::Both || *self == other
    }
}

/// Placement rules for one kind of furniture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnitureRules {
    pub name: String,
    pub room_type: RoomType,
    pub rules: Vec<Rule>,
}

/// Rule lookup by furniture name and room type.
///
/// A name may appear more than once; the first entry compatible with the
/// requested room type wins and later ones are alternates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleCatalog {
    pub entries: Vec<FurnitureRules>,
}

impl RuleCatalog {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|e| ManifestError::Parse(e.to_string()))
    }

    /// The catalog shipped in `data/furniture_rules.json`.
    pub fn builtin() -> Result<Self, ManifestError> {
        Self::from_json(RULES_JSON)
    }

    pub fn rules_for(&self, name: &str, room_type: RoomType) -> Option<&[Rule]> {
        self.entries
            .iter()
            .find(|e| e.name == name && e.room_type.matches(room_type))
            .map(|e| e.rules.as_slice())
    }

    /// Every entry for `name`, in catalog order.
    pub fn variants<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FurnitureRules> {
        self.entries.iter().filter(move |e| e.name == name)
    }
}

/// One object the caller wants in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRequest {
    /// Asset name, also the object's name in the run.
    pub name: String,
    /// Appended after the catalog rules.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl ObjectRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Join asset records and catalog rules into placeable objects.
///
/// An unknown asset is an error. A name missing from the catalog just gets
/// no catalog rules.
pub fn build_objects(
    requests: &[ObjectRequest],
    source: &impl AssetSource,
    catalog: &RuleCatalog,
    room_type: RoomType,
) -> Result<Vec<PlaceableObject>, ManifestError> {
    requests
        .iter()
        .map(|req| {
            let record = source
                .lookup(&req.name)
                .ok_or_else(|| ManifestError::UnknownAsset(req.name.clone()))?;
            let catalog_rules = catalog.rules_for(&req.name, room_type).unwrap_or_default();
            if catalog_rules.is_empty() {
                log::debug!("{}: no catalog rules for {:?}", req.name, room_type);
            }

            let mut obj = PlaceableObject::new(record.name, record.dimensions)
                .with_path(record.path)
                .with_rules(catalog_rules.iter().cloned())
                .with_rules(req.rules.iter().cloned());
            obj.slots = record.slots;
            Ok(obj)
        })
        .collect()
}

/// Build every requested object and place them in one run.
pub fn generate_room(
    config: &RoomConfig,
    requests: &[ObjectRequest],
    source: &impl AssetSource,
    catalog: &RuleCatalog,
    room_type: RoomType,
) -> Result<PlacementResult, RoomgenError> {
    let objects = build_objects(requests, source, catalog, room_type)?;
    let result = run_placement(config, &objects)?;

    for failure in &result.failures {
        log::warn!("{} not placed: {}", failure.object, failure.reason);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;

    #[test]
    fn test_builtin_tables_parse() {
        let manifest = AssetManifest::builtin().unwrap();
        let catalog = RuleCatalog::builtin().unwrap();
        assert!(manifest.len() > 5);
        assert!(catalog.entries.len() > 5);

        // every catalog entry has a model
        for entry in &catalog.entries {
            assert!(
                manifest.lookup(&entry.name).is_some(),
                "{} has rules but no asset",
                entry.name
            );
        }
    }

    #[test]
    fn test_room_type_aliases() {
        let catalog = RuleCatalog::builtin().unwrap();
        let armchair = catalog.variants("armchair").next().unwrap();
        assert_eq!(armchair.room_type, RoomType::LivingRoom);
        let bed = catalog.variants("BedBasic").next().unwrap();
        assert_eq!(bed.room_type, RoomType::Bedroom);
    }

    #[test]
    fn test_rules_for_room_type() {
        let catalog = RuleCatalog::builtin().unwrap();
        let bed = catalog.rules_for("BedBasic", RoomType::Bedroom).unwrap();
        assert!(bed.touches_wall());
        assert!(bed.faces_away_from_wall());
        assert!(catalog.rules_for("BedBasic", RoomType::LivingRoom).is_none());
        assert!(catalog.rules_for("DeskBasicNormal", RoomType::LivingRoom).is_some());
        assert!(catalog.rules_for("Piano", RoomType::Both).is_none());
    }

    #[test]
    fn test_first_variant_wins() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert_eq!(catalog.variants("BookStackBasic").count(), 2);
        let books = catalog.rules_for("BookStackBasic", RoomType::Bedroom).unwrap();
        assert!(books.requires_ground());
        assert!(books.container().is_none());
    }

    #[test]
    fn test_build_objects_joins_sources() {
        let manifest = AssetManifest::builtin().unwrap();
        let catalog = RuleCatalog::builtin().unwrap();
        let requests = vec![
            ObjectRequest::new("BedBasic"),
            ObjectRequest::new("BookShelfFancy").with_rule(Rule::MinClearance { meters: 0.3 }),
        ];
        let objects = build_objects(&requests, &manifest, &catalog, RoomType::Bedroom).unwrap();

        assert_eq!(objects[0].path.as_deref(), Some("/models/bedroom/BedBasic.glb"));
        assert!(objects[0].rules.touches_wall());
        // living-room shelf in a bedroom: no catalog rules, only the request's
        assert_eq!(objects[1].rules, vec![Rule::MinClearance { meters: 0.3 }]);
        assert_eq!(objects[1].slots.len(), 2);
    }

    #[test]
    fn test_unknown_asset() {
        let manifest = AssetManifest::from_json(
            r#"[{ "name": "Crate", "path": "crate.glb", "dimensions": { "width": 1, "depth": 1, "height": 1 } }]"#,
        )
        .unwrap();
        let err = build_objects(
            &[ObjectRequest::new("Crate"), ObjectRequest::new("Piano")],
            &manifest,
            &RuleCatalog::default(),
            RoomType::Both,
        )
        .unwrap_err();
        assert_eq!(err, ManifestError::UnknownAsset("Piano".into()));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            RuleCatalog::from_json("[{]"),
            Err(ManifestError::Parse(_))
        ));
        assert!(matches!(
            AssetManifest::from_json(r#"[{ "name": "X" }]"#),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn test_generate_bedroom() {
        let manifest = AssetManifest::builtin().unwrap();
        let catalog = RuleCatalog::builtin().unwrap();
        let config = RoomConfig::new(8.0, 6.0, 0.25, 3.0).with_seed(5);
        let requests = vec![
            ObjectRequest::new("BedBasic"),
            ObjectRequest::new("BedsideTableBasic"),
            ObjectRequest::new("DeskBasicNormal"),
            ObjectRequest::new("DeskLamp"),
        ];
        let result =
            generate_room(&config, &requests, &manifest, &catalog, RoomType::Bedroom).unwrap();

        assert!(result.find("BedBasic").is_some());
        let desk = result.find("DeskBasicNormal").unwrap();
        let lamp = result.find("DeskLamp").unwrap();
        assert!((lamp.base - desk.top()).abs() < 1e-4);
    }
}
