//! Sequential placement, driving generation and validation object by object.
//!
//! Each object goes `Pending → Placed | Failed`. An attempt generates the
//! candidate pool, filters it through the validator and commits one passing
//! candidate chosen uniformly at random. When nothing passes because of grid
//! occupancy the attempt is repeated up to `max_retries` more times; rule
//! rejections and empty pools fail at once. Either way a [`Failure`] is
//! recorded and the run goes on with the next object.
//!
//! The run owns its grid and placed list. Randomness is injected, so a seeded
//! `StdRng` reproduces a layout exactly.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::candidates::{generate_candidates, Candidate};
use crate::config::{validate_config, RoomConfig};
use crate::constants::EPSILON;
use crate::error::RoomgenError;
use crate::grid::OccupancyGrid;
use crate::object::{validate_objects, ObjectId, PlaceableObject, PlacedObject, Position};
use crate::rules::RuleSet;
use crate::validate::{validate_candidate, Rejection, RejectionKind};

/// An object that could not be placed, or was dropped by a removal cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub object: String,
    pub reason: String,
    /// Summary of the last attempt: candidate count and rejection tally.
    pub details: Vec<String>,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub placed: Vec<PlacedObject>,
    pub failures: Vec<Failure>,
}

impl PlacementResult {
    pub fn find(&self, name: &str) -> Option<&PlacedObject> {
        self.placed.iter().find(|p| p.name() == name)
    }

    pub fn failure(&self, name: &str) -> Option<&Failure> {
        self.failures.iter().find(|f| f.object == name)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What one attempt produced.
struct Attempt {
    candidates: usize,
    valid: Vec<Candidate>,
    rejections: BTreeMap<RejectionKind, (usize, String)>,
}

impl Attempt {
    /// Only grid occupancy can clear up between attempts.
    fn retryable(&self) -> bool {
        self.rejections.contains_key(&RejectionKind::Occupied)
    }

    fn details(&self) -> Vec<String> {
        let mut details = vec![format!("{} candidates tried", self.candidates)];
        if self.candidates == 0 {
            details.push("no candidates: targets missing or the room is too small".into());
        }
        for (kind, (count, example)) in &self.rejections {
            details.push(format!("{}: {} (e.g. {})", kind.label(), count, example));
        }
        details
    }
}

/// State of one placement run: room config, grid and everything committed.
#[derive(Debug, Clone)]
pub struct PlacementRun {
    config: RoomConfig,
    grid: OccupancyGrid,
    placed: Vec<PlacedObject>,
    failures: Vec<Failure>,
    next_id: ObjectId,
}

impl PlacementRun {
    /// Start an empty run. The config is assumed valid; see
    /// [`validate_config`].
    pub fn new(config: RoomConfig) -> Self {
        let grid = OccupancyGrid::new(config.room_width, config.room_depth, config.cell_size);
        Self {
            config,
            grid,
            placed: Vec::new(),
            failures: Vec::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn placed(&self) -> &[PlacedObject] {
        &self.placed
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn get(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.placed.iter().find(|p| p.id == id)
    }

    /// Place one object. Returns its new ID, or `None` after recording a
    /// failure.
    pub fn place<R: Rng + ?Sized>(
        &mut self,
        obj: &PlaceableObject,
        rng: &mut R,
    ) -> Option<ObjectId> {
        let attempts = self.config.max_retries + 1;
        let mut retries = 0;

        let last = loop {
            let result = self.attempt(obj);
            log::debug!(
                "{}: attempt {}/{}, {} candidates, {} valid",
                obj.name,
                retries + 1,
                attempts,
                result.candidates,
                result.valid.len()
            );
            if let Some(choice) = result.valid.choose(rng) {
                return Some(self.commit(obj, choice));
            }
            if !result.retryable() || retries == self.config.max_retries {
                break result;
            }
            retries += 1;
        };

        let mut details = last.details();
        details.push(format!("attempts: {}", retries + 1));
        log::warn!(
            "{}: failed after {} retries ({})",
            obj.name,
            retries,
            details.join("; ")
        );
        self.failures.push(Failure {
            object: obj.name.clone(),
            reason: format!("Failed after {} retries", retries),
            details,
        });
        None
    }

    /// Place every object in input order.
    pub fn place_all<R: Rng + ?Sized>(&mut self, objects: &[PlaceableObject], rng: &mut R) {
        for obj in objects {
            self.place(obj, rng);
        }
    }

    fn attempt(&self, obj: &PlaceableObject) -> Attempt {
        let candidates = generate_candidates(obj, &self.placed, &self.config);
        let mut valid = Vec::new();
        let mut rejections: BTreeMap<RejectionKind, (usize, String)> = BTreeMap::new();

        for c in &candidates {
            match validate_candidate(obj, c, &self.placed, &self.grid, &self.config) {
                Ok(()) => valid.push(c.clone()),
                Err(Rejection { kind, reason }) => {
                    rejections
                        .entry(kind)
                        .and_modify(|(count, _)| *count += 1)
                        .or_insert_with(|| (1, format!("{} at {}", reason, c.reason)));
                }
            }
        }

        Attempt {
            candidates: candidates.len(),
            valid,
            rejections,
        }
    }

    fn commit(&mut self, obj: &PlaceableObject, c: &Candidate) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;

        let fp = c.footprint(obj);
        self.grid.occupy(fp.x, fp.y, fp.width, fp.depth, id);
        let cells = self.grid.covered_cells(&fp);

        log::debug!(
            "{} #{} committed at ({:.2}, {:.2}) base {:.2} via {}",
            obj.name,
            id,
            c.x,
            c.y,
            c.base,
            c.reason
        );

        self.placed.push(PlacedObject {
            id,
            object: obj.clone(),
            position: Position { x: c.x, y: c.y },
            base: c.base,
            rotation: c.rotation,
            cells,
            reason: c.reason.clone(),
        });
        id
    }

    /// Remove a placed object and cascade-fail everything that depended on
    /// it: objects whose `OnTopOf`/`InsideOf`/`Under` target it was, and
    /// objects resting on its top surface. Cascades recurse.
    ///
    /// Returns the failures recorded for dependents; they are also appended
    /// to the run's failures. Unknown IDs are a no-op.
    pub fn remove(&mut self, id: ObjectId) -> Vec<Failure> {
        let Some(removed) = self.take(id) else {
            return Vec::new();
        };

        let mut cascade = Vec::new();
        let mut queue = vec![removed];
        while let Some(gone) = queue.pop() {
            let dependents: Vec<ObjectId> = self
                .placed
                .iter()
                .filter(|p| depends_on(p, &gone))
                .map(|p| p.id)
                .collect();
            for dep in dependents {
                let Some(dropped) = self.take(dep) else {
                    continue;
                };
                log::warn!(
                    "{} #{} dropped: support {} removed",
                    dropped.name(),
                    dropped.id,
                    gone.name()
                );
                cascade.push(Failure {
                    object: dropped.name().to_string(),
                    reason: format!("support removed: {}", gone.name()),
                    details: vec![format!(
                        "was at ({:.2}, {:.2}) base {:.2}",
                        dropped.position.x, dropped.position.y, dropped.base
                    )],
                });
                queue.push(dropped);
            }
        }

        self.failures.extend(cascade.iter().cloned());
        cascade
    }

    fn take(&mut self, id: ObjectId) -> Option<PlacedObject> {
        let index = self.placed.iter().position(|p| p.id == id)?;
        self.grid.free(id);
        Some(self.placed.remove(index))
    }

    pub fn finish(self) -> PlacementResult {
        log::info!(
            "placement finished: {} placed, {} failed",
            self.placed.len(),
            self.failures.len()
        );
        PlacementResult {
            placed: self.placed,
            failures: self.failures,
        }
    }
}

fn depends_on(p: &PlacedObject, gone: &PlacedObject) -> bool {
    if p.rules().anchor_targets().contains(&gone.name()) {
        return true;
    }
    p.base > EPSILON
        && (p.base - gone.top()).abs() <= EPSILON
        && p.footprint().intersects(&gone.footprint())
}

/// Validate input and place every object with the given RNG.
pub fn place_objects<R: Rng + ?Sized>(
    config: &RoomConfig,
    objects: &[PlaceableObject],
    rng: &mut R,
) -> Result<PlacementResult, RoomgenError> {
    let errors = validate_config(config);
    if !errors.is_empty() {
        return Err(errors.into());
    }
    validate_objects(objects)?;

    log::info!(
        "placing {} objects in a {}×{} room",
        objects.len(),
        config.room_width,
        config.room_depth
    );
    let mut run = PlacementRun::new(config.clone());
    run.place_all(objects, rng);
    Ok(run.finish())
}

/// [`place_objects`] with an RNG seeded from `config.seed`, or from OS
/// entropy when no seed is set.
pub fn run_placement(
    config: &RoomConfig,
    objects: &[PlaceableObject],
) -> Result<PlacementResult, RoomgenError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    place_objects(config, objects, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ObjectError;
    use crate::object::Dimensions;
    use crate::rules::Rule;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn cube(name: &str, size: f32) -> PlaceableObject {
        PlaceableObject::new(name, Dimensions::new(size, size, size))
    }

    #[test]
    fn on_top_of_sits_on_target() {
        let config = RoomConfig::new(6.0, 6.0, 0.5, 3.0);
        let mut run = PlacementRun::new(config);
        let a = run.place(&cube("A", 1.0), &mut rng()).unwrap();
        let b_obj = cube("B", 0.5).with_rule(Rule::OnTopOf { target: "A".into() });
        let b = run.place(&b_obj, &mut rng()).unwrap();

        assert_eq!(a, 1);
        assert_eq!(b, 2);
        let placed_b = run.get(b).unwrap();
        assert!((placed_b.base - 1.0).abs() < 1e-6);
        assert_eq!(placed_b.reason, "onTopOf:A");
        assert!(run.get(a).unwrap().footprint().contains(&placed_b.footprint()));
    }

    #[test]
    fn removing_support_cascades() {
        let config = RoomConfig::new(6.0, 6.0, 0.5, 5.0);
        let mut run = PlacementRun::new(config);
        let mut r = rng();
        let a = run.place(&cube("A", 1.0), &mut r).unwrap();
        run.place(&cube("B", 0.5).with_rule(Rule::OnTopOf { target: "A".into() }), &mut r)
            .unwrap();
        run.place(&cube("C", 0.25).with_rule(Rule::OnTopOf { target: "B".into() }), &mut r)
            .unwrap();
        run.place(&cube("D", 1.0), &mut r).unwrap();

        let dropped = run.remove(a);
        let names: Vec<_> = dropped.iter().map(|f| f.object.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);
        assert_eq!(dropped[0].reason, "support removed: A");
        assert_eq!(dropped[1].reason, "support removed: B");

        assert_eq!(run.placed().len(), 1);
        assert_eq!(run.placed()[0].name(), "D");
        assert_eq!(run.failures().len(), 2);
        let d_cells = run.placed()[0].cells.len();
        assert_eq!(run.grid().occupied_count(), d_cells);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut run = PlacementRun::new(RoomConfig::new(4.0, 4.0, 0.5, 3.0));
        assert!(run.remove(99).is_empty());
        assert!(run.failures().is_empty());
    }

    #[test]
    fn committed_cells_are_recorded() {
        let mut run = PlacementRun::new(RoomConfig::new(4.0, 4.0, 0.5, 3.0));
        let id = run.place(&cube("Box", 1.0), &mut rng()).unwrap();
        let placed = run.get(id).unwrap();
        assert_eq!(placed.cells.len(), 4);
        for cell in &placed.cells {
            assert_eq!(run.grid().cell(*cell), &[id]);
        }
    }

    #[test]
    fn rule_failures_are_not_retried() {
        // two 1m cubes cannot keep 1m apart in a 2m room
        let config = RoomConfig::new(2.0, 2.0, 0.5, 3.0);
        let mut run = PlacementRun::new(config);
        let mut r = rng();
        run.place(&cube("Table", 1.0), &mut r).unwrap();
        let armchair = cube("Armchair", 1.0).with_rule(Rule::MinClearance { meters: 1.0 });
        assert!(run.place(&armchair, &mut r).is_none());

        let failure = &run.failures()[0];
        assert_eq!(failure.object, "Armchair");
        assert_eq!(failure.reason, "Failed after 0 retries");
        assert!(failure.details[0].ends_with("candidates tried"));
        assert!(failure.details.iter().any(|d| d.starts_with("clearance:")));
        assert!(!failure.details.iter().any(|d| d.starts_with("occupied:")));
        assert_eq!(failure.details.last().unwrap(), "attempts: 1");
    }

    #[test]
    fn occupied_failures_use_every_retry() {
        let mut run = PlacementRun::new(RoomConfig::new(2.0, 2.0, 0.5, 3.0));
        let mut r = rng();
        run.place(&cube("Wardrobe", 2.0), &mut r).unwrap();
        assert!(run.place(&cube("Box", 1.0), &mut r).is_none());

        let failure = &run.failures()[0];
        assert_eq!(failure.reason, "Failed after 5 retries");
        assert!(failure.details.iter().any(|d| d.starts_with("occupied: 9")));
        assert_eq!(failure.details.last().unwrap(), "attempts: 6");
    }

    fn desk_with_lamp() -> (PlacementRun, StdRng) {
        let mut run = PlacementRun::new(RoomConfig::new(6.0, 6.0, 0.25, 3.0));
        let mut r = rng();
        let desk = PlaceableObject::new("Desk", Dimensions::new(2.0, 1.0, 0.75));
        run.place(&desk, &mut r).unwrap();
        let lamp = cube("Lamp", 0.25).with_rule(Rule::OnTopOf {
            target: "Desk".into(),
        });
        run.place(&lamp, &mut r).unwrap();
        (run, r)
    }

    #[test]
    fn host_stays_usable_with_something_on_top() {
        let books = PlaceableObject::new("Books", Dimensions::new(0.3, 0.25, 0.2)).with_rule(
            Rule::InsideOf {
                target: "Desk".into(),
            },
        );
        let (mut run, mut r) = desk_with_lamp();
        let id = run.place(&books, &mut r);
        assert!(run.failures().is_empty(), "{:?}", run.failures());
        let desk_fp = run.placed()[0].footprint();
        assert!(desk_fp.contains(&run.get(id.unwrap()).unwrap().footprint()));

        let stool = cube("Stool", 0.5).with_rule(Rule::Under {
            target: "Desk".into(),
        });
        let (mut run, mut r) = desk_with_lamp();
        let id = run.place(&stool, &mut r);
        assert!(run.failures().is_empty(), "{:?}", run.failures());
        assert_eq!(run.get(id.unwrap()).unwrap().reason, "under:Desk");
    }

    #[test]
    fn missing_target_fails_without_error() {
        let mut run = PlacementRun::new(RoomConfig::new(4.0, 4.0, 0.5, 3.0).with_max_retries(0));
        let lamp = cube("Lamp", 0.3).with_rule(Rule::OnTopOf {
            target: "Desk".into(),
        });
        assert!(run.place(&lamp, &mut rng()).is_none());
        let result = run.finish();
        let failure = result.failure("Lamp").unwrap();
        assert_eq!(failure.reason, "Failed after 0 retries");
        assert!(failure.details.iter().any(|d| d.starts_with("no candidates")));
        assert!(!result.is_complete());
    }

    #[test]
    fn failures_do_not_stop_the_run() {
        let config = RoomConfig::new(4.0, 4.0, 0.5, 3.0).with_seed(3);
        let objects = vec![cube("Giant", 5.0), cube("Small", 0.5)];
        let result = run_placement(&config, &objects).unwrap();
        assert!(result.failure("Giant").is_some());
        assert!(result.find("Small").is_some());
    }

    #[test]
    fn same_seed_same_layout() {
        let config = RoomConfig::new(8.0, 6.0, 0.25, 3.0).with_seed(11);
        let objects = vec![
            PlaceableObject::new("Bed", Dimensions::new(2.0, 2.0, 1.0))
                .with_rule(Rule::TouchWall { value: true }),
            cube("Chair", 0.5),
            cube("Book", 0.2).with_rule(Rule::OnTopOf {
                target: "Bed".into(),
            }),
        ];
        let first = run_placement(&config, &objects).unwrap();
        let second = run_placement(&config, &objects).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.placed.len(), 3);
    }

    #[test]
    fn rejects_bad_input_before_running() {
        let objects = vec![cube("Box", 1.0), cube("Box", 1.0)];
        let err = run_placement(&RoomConfig::default(), &objects).unwrap_err();
        assert_eq!(
            err,
            RoomgenError::Object(ObjectError::DuplicateName("Box".into()))
        );

        let bad = RoomConfig::new(-1.0, 4.0, 0.5, 3.0);
        assert!(matches!(
            run_placement(&bad, &[]),
            Err(RoomgenError::Config(_))
        ));
    }
}
