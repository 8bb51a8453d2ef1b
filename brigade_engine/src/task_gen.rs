// Task generation: what work exists this turn for the locked order.
//
// `generate_tasks` is a pure function of (order, snapshot, assembly counter,
// config). It walks a fixed list of rules and emits every viable
// (kind, target) pair with its configured priority. Rules never look at which
// agent will take a task beyond hand contents; collisions between agents are
// resolved later by `assign.rs`.
//
// Rule order (priorities come from `TaskPriorities`):
//
//  1. submit / pickup-plate    a clean plate exactly matches the order
//  2. take-from-pan            a pan holds cooked or burnt food
//  3. trash                    someone holds burnt food
//  4. stale plate              the working plate carries food the order does
//                              not want: pick it up, then trash its contents
//  5. plate supply / placement take a clean plate or buy one; put a held
//                              plate on the assembly counter
//  6. add-to-plate             finished food meets the working plate
//  7. ingredient pipeline      buy, chop, cook the top missing ingredients
//  8. pans                     put a held pan on an empty cooker
//  9. dirty plates             carry a held dirty plate to a sink
// 10. free hands               stash or trash held items with nowhere to go,
//                              clear off-order food from full counters
// 11. wash                     sinks holding dirty plates
//
// A stale plate is what an expired order leaves behind. While it exists the
// plate rules (5, 6) stand down, so nothing is added to it and no second
// plate is bought; once its contents are trashed the same plate becomes the
// working plate for the new order.
//
// The pipeline covers at most `pipeline_ingredients` missing ingredients,
// cook-required first. Pickups for cooking are only offered when a pan is
// free, and pickups for plating only when the plate sits on a counter, so an
// agent never picks something up only to stash it again.
//
// See also: `task.rs` for the per-kind feasibility and action table,
// `recipe.rs` for plate matching, `scheduler.rs` which caches the assembly
// counter between turns.

use crate::config::{EngineConfig, TaskPriorities};
use crate::recipe::{food_satisfies, missing_ingredients, plate_fits_order, plate_matches_order};
use crate::snapshot::{PlateSpot, WorldSnapshot};
use crate::task::{Task, TaskKind, TaskMeta};
use crate::types::{AgentId, CookStage, Food, FoodType, Item, Location, Order, TileContents};

/// Pick the counter where the working plate is assembled. The cached counter
/// is kept while it stays empty; otherwise the empty counter nearest (by
/// Manhattan distance) to the first submit station wins, falling back to any
/// counter when none is empty.
pub fn select_assembly_counter(
    snapshot: &WorldSnapshot,
    cached: Option<Location>,
) -> Option<Location> {
    if let Some(at) = cached {
        if snapshot.counters.get(&at).is_some_and(TileContents::is_empty) {
            return Some(at);
        }
    }

    let anchor = snapshot
        .submits
        .first()
        .copied()
        .unwrap_or(Location::new(0, 0));
    let empty: Vec<Location> = snapshot.empty_counters().collect();
    let candidates = if empty.is_empty() {
        snapshot.counters.keys().copied().collect()
    } else {
        empty
    };
    candidates
        .into_iter()
        .min_by_key(|at| at.manhattan(anchor))
}

/// Every task the team could work on this turn for `order`.
pub fn generate_tasks(
    order: &Order,
    snapshot: &WorldSnapshot,
    assembly: Option<Location>,
    config: &EngineConfig,
) -> Vec<Task> {
    let required = order.required_foods();
    let plate = snapshot.find_plate();
    let stale_plate = plate.is_some_and(|(p, _)| !plate_fits_order(p, &required));
    // A stale plate gets emptied, so none of its food counts.
    let usable = plate.filter(|_| !stale_plate).map(|(p, _)| p);
    let missing = missing_ingredients(&required, usable);
    let plate_spot = plate.map(|(_, spot)| spot);

    let work_counters = snapshot
        .empty_counters()
        .filter(|&at| Some(at) != assembly)
        .collect();

    let mut planner = Planner {
        snapshot,
        p: &config.priorities,
        tasks: Vec::new(),
        required,
        missing,
        plate_spot,
        stale_plate,
        assembly,
        work_counters,
    };

    planner.submit();
    planner.take_from_pans();
    planner.trash_burnt();
    planner.discard_stale_plate();
    planner.plates();
    planner.add_to_plate();
    planner.pipeline(config.pipeline_ingredients);
    planner.pans();
    planner.dirty_plates();
    planner.free_hands();
    planner.clear_counters();
    planner.wash();
    planner.tasks
}

struct Planner<'a> {
    snapshot: &'a WorldSnapshot,
    p: &'a TaskPriorities,
    tasks: Vec<Task>,
    required: Vec<FoodType>,
    missing: Vec<FoodType>,
    plate_spot: Option<PlateSpot>,
    /// The working plate carries food the locked order does not want.
    stale_plate: bool,
    assembly: Option<Location>,
    /// Empty counters other than the assembly counter.
    work_counters: Vec<Location>,
}

impl Planner<'_> {
    fn push(&mut self, kind: TaskKind, target: Location, priority: i64, meta: TaskMeta) {
        self.tasks
            .push(Task::new(kind, target, priority).with_meta(meta));
    }

    /// One trash task per trash can, reserved for `holder`.
    fn trash_for(&mut self, holder: AgentId, priority: i64, food: Option<FoodType>) {
        let meta = TaskMeta {
            food,
            holder: Some(holder),
            ..TaskMeta::default()
        };
        let snapshot = self.snapshot;
        for &at in &snapshot.trashes {
            self.push(TaskKind::Trash, at, priority, meta);
        }
    }

    fn plate_on_counter(&self) -> Option<Location> {
        match self.plate_spot {
            Some(PlateSpot::OnCounter(at)) if !self.stale_plate => Some(at),
            _ => None,
        }
    }

    fn plate_held(&self) -> bool {
        !self.stale_plate && matches!(self.plate_spot, Some(PlateSpot::Held(_)))
    }

    /// Finished food the working plate still lacks.
    fn is_wanted_and_ready(&self, food: &Food) -> bool {
        self.missing.contains(&food.kind) && food_satisfies(food, food.kind)
    }

    fn submit(&mut self) {
        if self.required.is_empty() {
            return;
        }
        let snapshot = self.snapshot;
        let p = self.p;

        for agent in snapshot.agents.values() {
            let Some(plate) = agent.held_clean_plate() else {
                continue;
            };
            if !plate_matches_order(plate, &self.required) {
                continue;
            }
            let meta = TaskMeta {
                holder: Some(agent.id),
                ..TaskMeta::default()
            };
            for &at in &snapshot.submits {
                self.push(TaskKind::Submit, at, p.submit, meta);
            }
        }

        for (&at, tile) in &snapshot.counters {
            let matches = tile
                .item
                .as_ref()
                .and_then(Item::as_clean_plate)
                .is_some_and(|plate| plate_matches_order(plate, &self.required));
            if matches {
                self.push(TaskKind::PickupPlate, at, p.pickup_plate, TaskMeta::default());
            }
        }
    }

    fn take_from_pans(&mut self) {
        let snapshot = self.snapshot;
        let p = self.p;
        for (&at, tile) in &snapshot.cookers {
            let Some(food) = tile.pan().and_then(|pan| pan.food.as_ref()) else {
                continue;
            };
            match food.stage {
                CookStage::Raw => {}
                CookStage::Cooked => {
                    self.push(TaskKind::TakeFromPan, at, p.take_from_pan, TaskMeta::default());
                }
                CookStage::Burnt => {
                    let meta = TaskMeta {
                        burnt: true,
                        ..TaskMeta::default()
                    };
                    self.push(TaskKind::TakeFromPan, at, p.take_burnt_from_pan, meta);
                }
            }
        }
    }

    fn trash_burnt(&mut self) {
        let snapshot = self.snapshot;
        for agent in snapshot.agents.values() {
            if let Some(food) = agent.held_food().filter(|f| f.is_burnt()) {
                self.trash_for(agent.id, self.p.trash_burnt, Some(food.kind));
            }
        }
    }

    fn discard_stale_plate(&mut self) {
        if !self.stale_plate {
            return;
        }
        let priority = self.p.discard_plate;
        match self.plate_spot {
            Some(PlateSpot::Held(holder)) => self.trash_for(holder, priority, None),
            Some(PlateSpot::OnCounter(at)) => {
                self.push(TaskKind::PickupPlate, at, priority, TaskMeta::default());
            }
            None => {}
        }
    }

    fn plates(&mut self) {
        let snapshot = self.snapshot;
        let p = self.p;

        if self.stale_plate {
            return;
        }
        if self.plate_spot.is_none() {
            for (&at, tile) in &snapshot.sink_tables {
                if tile.clean_plates > 0 {
                    self.push(TaskKind::TakeCleanPlate, at, p.take_clean_plate, TaskMeta::default());
                }
            }
            for &at in &snapshot.shops {
                self.push(TaskKind::BuyPlate, at, p.buy_plate, TaskMeta::default());
            }
            return;
        }

        if self.plate_held() {
            let empty: Vec<Location> = snapshot.empty_counters().collect();
            match self.assembly.filter(|at| empty.contains(at)) {
                Some(at) => {
                    self.push(TaskKind::PlacePlate, at, p.place_plate_assembly, TaskMeta::default());
                }
                None => {
                    for at in empty {
                        self.push(TaskKind::PlacePlate, at, p.place_plate_any, TaskMeta::default());
                    }
                }
            }
        }
    }

    fn add_to_plate(&mut self) {
        let snapshot = self.snapshot;
        let p = self.p;

        if let Some(plate_at) = self.plate_on_counter() {
            for agent in snapshot.agents.values() {
                if let Some(food) = agent.held_food().filter(|f| self.is_wanted_and_ready(f)) {
                    let meta = TaskMeta::food(food.kind);
                    self.push(TaskKind::AddHeldFoodToPlate, plate_at, p.add_held_food_to_plate, meta);
                }
            }
            for (&at, tile) in &snapshot.counters {
                if let Some(food) = counter_food(tile).filter(|f| self.is_wanted_and_ready(f)) {
                    self.push(TaskKind::PickupFood, at, p.pickup_food, TaskMeta::food(food.kind));
                }
            }
        }

        if self.plate_held() {
            for (&at, tile) in &snapshot.counters {
                if let Some(food) = counter_food(tile).filter(|f| self.is_wanted_and_ready(f)) {
                    let meta = TaskMeta::food(food.kind);
                    self.push(
                        TaskKind::AddCounterFoodToHeldPlate,
                        at,
                        p.add_counter_food_to_held_plate,
                        meta,
                    );
                }
            }
        }
    }

    fn pipeline(&mut self, breadth: usize) {
        let snapshot = self.snapshot;
        let p = self.p;

        let mut window = self.missing.clone();
        window.sort_by_key(|&ft| (ft.pipeline_rank(), ft));
        window.truncate(breadth);
        window.dedup();
        if window.is_empty() {
            return;
        }

        if window.iter().any(|ft| ft.needs_cook()) && !snapshot.any_pan_on_cooker() {
            self.supply_pan();
        }

        let free_pans: Vec<Location> = snapshot
            .cookers
            .iter()
            .filter(|(_, tile)| tile.pan().is_some_and(|pan| pan.food.is_none()))
            .map(|(&at, _)| at)
            .collect();
        let available = snapshot.available_food_counts();
        let plate_at = self.plate_on_counter();

        for ft in window {
            let meta = TaskMeta::food(ft);

            for agent in snapshot.agents.values() {
                let Some(food) = agent.held_food().filter(|f| f.kind == ft) else {
                    continue;
                };
                if ft.needs_chop() && !food.chopped {
                    for at in self.work_counters.clone() {
                        self.push(TaskKind::PlaceForChop, at, p.place_for_chop, meta);
                    }
                } else if ft.needs_cook() && food.stage == CookStage::Raw {
                    for &at in &free_pans {
                        self.push(TaskKind::PlaceInCooker, at, p.place_in_cooker, meta);
                    }
                } else if food_satisfies(food, ft) {
                    if let Some(plate_at) = plate_at {
                        self.push(TaskKind::AddHeldFoodToPlate, plate_at, p.add_held_food_to_plate, meta);
                    }
                }
            }

            for (&at, tile) in &snapshot.counters {
                let Some(food) = counter_food(tile).filter(|f| f.kind == ft) else {
                    continue;
                };
                if ft.needs_chop() && !food.chopped {
                    self.push(TaskKind::Chop, at, p.chop, meta);
                } else if ft.needs_cook() && food.stage == CookStage::Raw {
                    if !free_pans.is_empty() {
                        self.push(TaskKind::PickupFood, at, p.pickup_food, meta);
                    }
                } else if food_satisfies(food, ft) && plate_at.is_some() {
                    self.push(TaskKind::PickupFood, at, p.pickup_food, meta);
                }
            }

            // Buy only what is not already somewhere in the kitchen.
            let wanted = self.missing.iter().filter(|&&m| m == ft).count();
            let have = available.get(&ft).copied().unwrap_or(0);
            if have < wanted {
                for &at in &snapshot.shops {
                    self.push(TaskKind::BuyFood, at, p.buy_food, meta);
                }
            }
        }
    }

    /// No cooker has a pan and nobody carries one: fetch a spare pan from a
    /// counter, or buy one.
    fn supply_pan(&mut self) {
        let snapshot = self.snapshot;
        let p = self.p;
        let pan_held = snapshot
            .agents
            .values()
            .any(|a| matches!(a.holding, Some(Item::Pan(_))));
        if pan_held {
            return;
        }

        let spare: Vec<Location> = snapshot
            .counters
            .iter()
            .filter(|(_, tile)| tile.pan().is_some())
            .map(|(&at, _)| at)
            .collect();
        if spare.is_empty() {
            for &at in &snapshot.shops {
                self.push(TaskKind::BuyPan, at, p.buy_pan, TaskMeta::default());
            }
        } else {
            for at in spare {
                self.push(TaskKind::PickupPan, at, p.pickup_pan, TaskMeta::default());
            }
        }
    }

    /// A held pan goes on any empty cooker.
    fn pans(&mut self) {
        let snapshot = self.snapshot;
        let pan_held = snapshot
            .agents
            .values()
            .any(|a| matches!(a.holding, Some(Item::Pan(_))));
        if !pan_held {
            return;
        }
        for (&at, tile) in &snapshot.cookers {
            if tile.is_empty() {
                self.push(TaskKind::PlacePan, at, self.p.place_pan, TaskMeta::default());
            }
        }
    }

    fn dirty_plates(&mut self) {
        let snapshot = self.snapshot;
        let anyone_dirty = snapshot
            .agents
            .values()
            .any(|a| matches!(&a.holding, Some(Item::Plate(plate)) if plate.dirty));
        if !anyone_dirty {
            return;
        }
        for &at in snapshot.sinks.keys() {
            let priority = self.p.put_dirty_plate_in_sink;
            self.push(TaskKind::PutDirtyPlateInSink, at, priority, TaskMeta::default());
        }
    }

    /// Every held item gets a way out of the agent's hands. Food the order
    /// still needs is stashed on a work counter, or trashed when none is
    /// free; food it does not need is trashed. A pan with no empty cooker to
    /// go to is stashed (trashing only empties a pan).
    fn free_hands(&mut self) {
        let snapshot = self.snapshot;
        let p = self.p;
        let cooker_free = snapshot.cookers.values().any(TileContents::is_empty);

        for agent in snapshot.agents.values() {
            let stash_meta = |food: Option<FoodType>| TaskMeta {
                food,
                holder: Some(agent.id),
                ..TaskMeta::default()
            };
            match &agent.holding {
                Some(Item::Food(food)) if !food.is_burnt() => {
                    let wanted = self.missing.contains(&food.kind);
                    if wanted && !self.work_counters.is_empty() {
                        for at in self.work_counters.clone() {
                            self.push(TaskKind::Stash, at, p.stash, stash_meta(Some(food.kind)));
                        }
                    } else {
                        self.trash_for(agent.id, p.discard_held, Some(food.kind));
                    }
                }
                Some(Item::Pan(_)) if !cooker_free => {
                    for at in self.work_counters.clone() {
                        self.push(TaskKind::Stash, at, p.stash, stash_meta(None));
                    }
                }
                _ => {}
            }
        }
    }

    /// With every work counter taken, food the order has no use for is
    /// picked up (and then trashed by `free_hands`) to make room.
    fn clear_counters(&mut self) {
        if !self.work_counters.is_empty() {
            return;
        }
        let snapshot = self.snapshot;
        for (&at, tile) in &snapshot.counters {
            let Some(food) = counter_food(tile) else {
                continue;
            };
            if food.is_burnt() || !self.missing.contains(&food.kind) {
                let meta = TaskMeta::food(food.kind);
                self.push(TaskKind::PickupFood, at, self.p.discard_held, meta);
            }
        }
    }

    fn wash(&mut self) {
        let snapshot = self.snapshot;
        for (&at, tile) in &snapshot.sinks {
            if tile.dirty_plates > 0 {
                self.push(TaskKind::WashSink, at, self.p.wash_sink, TaskMeta::default());
            }
        }
    }
}

fn counter_food(tile: &TileContents) -> Option<&Food> {
    tile.item.as_ref().and_then(Item::as_food)
}
