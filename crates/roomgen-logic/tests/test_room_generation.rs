//! Integration tests for the full placement pipeline.
//!
//! Exercises: RoomConfig → PlaceableObjects → candidates → validation
//! → PlacementRun → PlacementResult → layout audit
//!
//! All tests are pure logic with seeded RNGs.

use rand::rngs::StdRng;
use rand::SeedableRng;

use roomgen_logic::audit::{audit_layout, Severity};
use roomgen_logic::candidates::{generate_candidates, Candidate};
use roomgen_logic::config::RoomConfig;
use roomgen_logic::geometry::Wall;
use roomgen_logic::grid::OccupancyGrid;
use roomgen_logic::manifest::{generate_room, AssetManifest, ObjectRequest, RoomType, RuleCatalog};
use roomgen_logic::object::{Dimensions, PlaceableObject, Slot};
use roomgen_logic::placement::{place_objects, run_placement, PlacementResult, PlacementRun};
use roomgen_logic::rules::{Direction, Rule};
use roomgen_logic::validate::{validate_candidate, RejectionKind};

// ── Helpers ────────────────────────────────────────────────────────────

fn bedroom_config() -> RoomConfig {
    RoomConfig::new(8.0, 6.0, 0.25, 3.0)
}

/// A small furnished bedroom: wall-bound bed and shelf, a desk with a lamp
/// and a chair in front, books on the shelf.
fn bedroom_objects() -> Vec<PlaceableObject> {
    vec![
        PlaceableObject::new("Bed", Dimensions::new(2.0, 2.0, 1.0)).with_rules([
            Rule::TouchWall { value: true },
            Rule::FaceAwayFromWall { value: true },
            Rule::TouchGround { value: true },
            Rule::AllowStacking { value: false },
        ]),
        PlaceableObject::new("Bedside", Dimensions::new(0.5, 0.5, 0.6)).with_rules([
            Rule::TouchGround { value: true },
            Rule::NextTo {
                target: "Bed".into(),
            },
        ]),
        PlaceableObject::new("Desk", Dimensions::new(1.5, 0.75, 0.75))
            .with_rule(Rule::TouchGround { value: true }),
        PlaceableObject::new("Lamp", Dimensions::new(0.25, 0.25, 0.45)).with_rule(Rule::OnTopOf {
            target: "Desk".into(),
        }),
        PlaceableObject::new("Chair", Dimensions::new(0.5, 0.5, 0.9)).with_rule(
            Rule::AdjacentTo {
                direction: Direction::Front,
                target: "Desk".into(),
                gap: Some(0.1),
            },
        ),
        PlaceableObject::new("Shelf", Dimensions::new(1.0, 0.4, 2.0))
            .with_rules([
                Rule::TouchWall { value: true },
                Rule::TouchGround { value: true },
            ])
            .with_slot(Slot {
                name: Some("middle".into()),
                x: 0.1,
                y: 0.05,
                base: Some(1.0),
            }),
        PlaceableObject::new("Books", Dimensions::new(0.3, 0.25, 0.2)).with_rule(
            Rule::InsideOf {
                target: "Shelf".into(),
            },
        ),
    ]
}

fn run(seed: u64) -> PlacementResult {
    let config = bedroom_config().with_seed(seed);
    run_placement(&config, &bedroom_objects()).expect("valid input")
}

fn cube(name: &str, size: f32) -> PlaceableObject {
    PlaceableObject::new(name, Dimensions::new(size, size, size))
}

// ── Invariants ─────────────────────────────────────────────────────────

#[test]
fn layouts_pass_audit_across_seeds() {
    let config = bedroom_config();
    for seed in 0..20 {
        let result = run(seed);
        let errors: Vec<_> = audit_layout(&result.placed, &config)
            .into_iter()
            .filter(|e| e.severity == Severity::Error)
            .collect();
        assert!(errors.is_empty(), "seed {seed}: {errors:?}");
    }
}

#[test]
fn every_object_is_placed_or_failed() {
    for seed in 0..10 {
        let result = run(seed);
        assert_eq!(result.placed.len() + result.failures.len(), 7, "seed {seed}");
    }
}

#[test]
fn anchored_objects_sit_on_their_targets() {
    for seed in 0..10 {
        let result = run(seed);
        if let (Some(desk), Some(lamp)) = (result.find("Desk"), result.find("Lamp")) {
            assert!((lamp.base - desk.top()).abs() < 1e-4);
        }
        if let (Some(shelf), Some(books)) = (result.find("Shelf"), result.find("Books")) {
            assert!((books.base - 1.0).abs() < 1e-4);
            assert!(shelf.footprint().contains(&books.footprint()));
            assert_eq!(books.reason, "insideOf:Shelf:slot");
        }
    }
}

#[test]
fn ids_are_unique_and_cells_recorded() {
    let result = run(7);
    let mut ids: Vec<_> = result.placed.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), result.placed.len());
    for p in &result.placed {
        assert!(!p.cells.is_empty(), "{} has no cells", p.name());
    }
}

#[test]
fn deterministic_output() {
    assert_eq!(run(42), run(42));
}

#[test]
fn explicit_rng_matches_config_seed() {
    let config = bedroom_config().with_seed(9);
    let mut rng = StdRng::seed_from_u64(9);
    let explicit = place_objects(&config, &bedroom_objects(), &mut rng).unwrap();
    assert_eq!(explicit, run(9));
}

#[test]
fn result_serializes() {
    let result = run(1);
    let json = serde_json::to_string(&result).unwrap();
    let back: PlacementResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.placed.len(), result.placed.len());
    assert!(json.contains("\"reason\""));
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn scenario_grid_occupy_and_free() {
    let mut grid = OccupancyGrid::new(10.0, 10.0, 0.5);
    assert!(grid.can_place(1.0, 1.0, 3.2, 2.1));
    grid.occupy(1.0, 1.0, 3.2, 2.1, 1);
    assert!(!grid.can_place(2.0, 1.0, 1.5, 0.5));
    grid.free(1);
    assert!(grid.can_place(2.0, 1.0, 1.5, 0.5));
    // freeing twice is harmless
    grid.free(1);
    assert_eq!(grid.occupied_count(), 0);
}

#[test]
fn scenario_ground_rule_rejects_raised_candidate() {
    let config = RoomConfig::new(10.0, 10.0, 0.5, 10.0);
    let grid = OccupancyGrid::new(10.0, 10.0, 0.5);
    let chair = cube("Chair", 1.0).with_rule(Rule::TouchGround { value: true });
    let err = validate_candidate(
        &chair,
        &Candidate::new(1.0, 1.0, 5.0, "test"),
        &[],
        &grid,
        &config,
    )
    .unwrap_err();
    assert_eq!(err.kind, RejectionKind::Ground);
    assert!(!err.kind.is_occupancy());
}

#[test]
fn scenario_stacking_and_removal() {
    let mut run = PlacementRun::new(RoomConfig::new(6.0, 6.0, 0.5, 3.0));
    let mut rng = StdRng::seed_from_u64(0);
    let a = run.place(&cube("A", 1.0), &mut rng).unwrap();
    let b = run
        .place(
            &cube("B", 0.5).with_rule(Rule::OnTopOf { target: "A".into() }),
            &mut rng,
        )
        .unwrap();
    assert!((run.get(b).unwrap().base - 1.0).abs() < 1e-6);

    let dropped = run.remove(a);
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].object, "B");
    assert!(run.placed().is_empty());
    assert_eq!(run.grid().occupied_count(), 0);
}

#[test]
fn scenario_excluded_walls() {
    let config = RoomConfig::new(6.0, 4.0, 0.25, 3.0)
        .with_excluded_walls([Wall::South, Wall::East]);
    let shelf = PlaceableObject::new("Shelf", Dimensions::new(1.0, 0.4, 2.0))
        .with_rule(Rule::TouchWall { value: true });
    let candidates = generate_candidates(&shelf, &[], &config);
    assert!(!candidates.is_empty());
    for c in &candidates {
        assert!((c.y + 0.4 - 4.0).abs() > 1e-4, "{c:?} touches south");
        assert!((c.x + 1.0 - 6.0).abs() > 1e-4, "{c:?} touches east");
    }
}

#[test]
fn scenario_clearance_fails_without_retrying() {
    let config = RoomConfig::new(2.0, 2.0, 0.5, 3.0).with_seed(1);
    let objects = vec![
        cube("Table", 1.0),
        cube("Armchair", 1.0).with_rule(Rule::MinClearance { meters: 1.0 }),
    ];
    let result = run_placement(&config, &objects).unwrap();
    assert!(result.find("Table").is_some());
    let failure = result.failure("Armchair").unwrap();
    // nothing about the room changes between attempts, so no retries
    assert_eq!(failure.reason, "Failed after 0 retries");
    assert!(failure.details.contains(&"attempts: 1".to_string()));
}

#[test]
fn scenario_crowded_room_uses_every_retry() {
    let config = RoomConfig::new(2.0, 2.0, 0.5, 3.0)
        .with_seed(1)
        .with_max_retries(3);
    let objects = vec![cube("Wardrobe", 2.0), cube("Box", 1.0)];
    let result = run_placement(&config, &objects).unwrap();
    let failure = result.failure("Box").unwrap();
    assert_eq!(failure.reason, "Failed after 3 retries");
    assert!(failure.details.contains(&"attempts: 4".to_string()));
}

#[test]
fn scenario_desk_keeps_hosting_under_a_lamp() {
    let config = RoomConfig::new(6.0, 6.0, 0.25, 3.0).with_seed(4);
    let desk = PlaceableObject::new("Desk", Dimensions::new(2.0, 1.0, 0.75));
    let lamp = cube("Lamp", 0.25).with_rule(Rule::OnTopOf {
        target: "Desk".into(),
    });
    let books = PlaceableObject::new("Books", Dimensions::new(0.3, 0.25, 0.2)).with_rule(
        Rule::InsideOf {
            target: "Desk".into(),
        },
    );
    let stool = cube("Stool", 0.5).with_rule(Rule::Under {
        target: "Desk".into(),
    });

    for extra in [books, stool] {
        let objects = vec![desk.clone(), lamp.clone(), extra];
        let result = run_placement(&config, &objects).unwrap();
        assert!(result.is_complete(), "{:?}", result.failures);
        assert!(audit_layout(&result.placed, &config)
            .iter()
            .all(|e| e.severity == Severity::Warning));
    }
}

// ── Catalog pipeline ───────────────────────────────────────────────────

#[test]
fn builtin_catalog_furnishes_a_living_room() {
    let manifest = AssetManifest::builtin().unwrap();
    let catalog = RuleCatalog::builtin().unwrap();
    let config = RoomConfig::default().with_seed(3);
    let requests: Vec<_> = [
        "BookshelfBasic",
        "BookShelfFancy",
        "armchair",
        "ChairBasicBroken",
        "DeskBasicNormal",
        "DeskLamp",
        "WaterBottle",
    ]
    .into_iter()
    .map(ObjectRequest::new)
    .collect();

    let result =
        generate_room(&config, &requests, &manifest, &catalog, RoomType::LivingRoom).unwrap();
    assert!(result.is_complete(), "{:?}", result.failures);
    assert!(audit_layout(&result.placed, &config)
        .iter()
        .all(|e| e.severity == Severity::Warning));
}
