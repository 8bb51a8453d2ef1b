// Test-only in-memory kitchen for end-to-end scheduler tests.
//
// `TestKitchen` implements the engine's `Kitchen` trait over plain maps: an
// ASCII grid, agents, per-tile contents, team money, orders with expiry and
// a cooking clock. Every action primitive follows the game's rules closely
// enough for the scheduler to complete real orders: buying charges money,
// chopping needs an unchopped food on a counter, a pan on a cooker cooks its
// food after `cook_turns` and burns it after `burn_turns`, submitting a
// matching plate pays the reward and sends a dirty plate to the sink.
//
// On top of the game rules the kitchen records `Violation`s for anything the
// scheduler must never do: acting on a tile that is not adjacent, moving
// into an occupied cell, or acting twice in one turn. Scenario tests assert
// that this list stays empty.
//
// Map format: the engine's ASCII glyphs plus digits `1`-`9` for agents
// standing on floor cells (the digit is the agent id).
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use std::collections::{BTreeMap, BTreeSet};

use brigade_engine::config::ShopPrices;
use brigade_engine::event::TurnReport;
use brigade_engine::grid::GridMap;
use brigade_engine::kitchen::{Action, Buyable, Kitchen};
use brigade_engine::map_index::{MapIndex, TileCategory};
use brigade_engine::recipe::plate_matches_order;
use brigade_engine::scheduler::Scheduler;
use brigade_engine::types::{
    AgentId, AgentState, CookStage, Food, Item, Location, Order, OrderId, Pan, Plate, Step,
    TileContents,
};

/// Something the scheduler did that the game would never allow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    NotAdjacent { turn: u32, agent: AgentId, action: Action },
    Collision { turn: u32, agent: AgentId, at: Location },
    SecondAction { turn: u32, agent: AgentId },
    BadStep { turn: u32, agent: AgentId, step: Step },
}

/// Install a test logger once per process. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct TestKitchen {
    grid: GridMap,
    index: MapIndex,
    pub turn: u32,
    pub money: i64,
    pub prices: ShopPrices,
    pub orders: Vec<Order>,
    agents: BTreeMap<AgentId, AgentState>,
    tiles: BTreeMap<Location, TileContents>,
    /// Turns the food in each cooker's pan has been cooking.
    cook_timers: BTreeMap<Location, u32>,
    pub cook_turns: u32,
    pub burn_turns: u32,
    acted: BTreeSet<AgentId>,
    pub violations: Vec<Violation>,
    /// Orders completed, in submission order.
    pub submitted: Vec<OrderId>,
    next_order_id: u32,
}

impl TestKitchen {
    /// Parse a map with agents marked by digits.
    pub fn from_ascii(map: &str, money: i64) -> Self {
        let mut agents = BTreeMap::new();
        let rows: Vec<String> = map
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(y, row)| {
                row.chars()
                    .enumerate()
                    .map(|(x, glyph)| match glyph.to_digit(10) {
                        Some(d) if d > 0 => {
                            let id = AgentId(d);
                            agents.insert(
                                id,
                                AgentState {
                                    id,
                                    position: Location::new(x as i32, y as i32),
                                    holding: None,
                                },
                            );
                            '.'
                        }
                        _ => glyph,
                    })
                    .collect()
            })
            .collect();
        let grid = GridMap::from_ascii(&rows.join("\n")).expect("test map parses");
        let index = MapIndex::build(&grid);

        Self {
            grid,
            index,
            turn: 0,
            money,
            prices: ShopPrices::default(),
            orders: Vec::new(),
            agents,
            tiles: BTreeMap::new(),
            cook_timers: BTreeMap::new(),
            cook_turns: 5,
            burn_turns: 25,
            acted: BTreeSet::new(),
            violations: Vec::new(),
            submitted: Vec::new(),
            next_order_id: 1,
        }
    }

    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    pub fn locations(&self, category: TileCategory) -> &[Location] {
        self.index.locations(category)
    }

    pub fn add_order(&mut self, required: &[&str], reward: i64, expires_turn: u32) -> OrderId {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        self.orders.push(Order {
            id,
            required: required.iter().map(|s| s.to_string()).collect(),
            reward,
            expires_turn,
            active: expires_turn > self.turn,
        });
        id
    }

    pub fn agent_state(&self, id: AgentId) -> &AgentState {
        &self.agents[&id]
    }

    pub fn give(&mut self, id: AgentId, item: Item) {
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.holding = Some(item);
        }
    }

    pub fn set_tile(&mut self, at: Location, contents: TileContents) {
        self.tiles.insert(at, contents);
    }

    pub fn tile_at(&self, at: Location) -> TileContents {
        self.tiles.get(&at).cloned().unwrap_or_default()
    }

    /// Advance the clock: cook pans, expire orders, reset per-turn action
    /// tracking.
    pub fn end_turn(&mut self) {
        self.turn += 1;
        self.acted.clear();

        let cooking: Vec<Location> = self.cook_timers.keys().copied().collect();
        for at in cooking {
            let elapsed = {
                let timer = self.cook_timers.entry(at).or_default();
                *timer += 1;
                *timer
            };
            let stage = if elapsed >= self.burn_turns {
                CookStage::Burnt
            } else if elapsed >= self.cook_turns {
                CookStage::Cooked
            } else {
                CookStage::Raw
            };
            if let Some(Item::Pan(Pan { food: Some(food) })) = &mut self.tile_mut(at).item {
                food.stage = stage;
            }
        }

        for order in &mut self.orders {
            if order.active && self.turn >= order.expires_turn {
                order.active = false;
            }
        }
    }

    /// Play `turns` full turns, returning every report.
    pub fn run(&mut self, scheduler: &mut Scheduler, turns: u32) -> Vec<TurnReport> {
        let mut reports = Vec::new();
        for _ in 0..turns {
            reports.push(scheduler.play_turn(self));
            self.end_turn();
        }
        reports
    }

    /// Play until `order` is submitted or `max_turns` pass. Returns the number
    /// of turns taken, or `None` on timeout.
    pub fn run_until_submitted(
        &mut self,
        scheduler: &mut Scheduler,
        order: OrderId,
        max_turns: u32,
    ) -> Option<u32> {
        for played in 1..=max_turns {
            scheduler.play_turn(self);
            self.end_turn();
            if self.submitted.contains(&order) {
                return Some(played);
            }
        }
        None
    }

    fn tile_mut(&mut self, at: Location) -> &mut TileContents {
        self.tiles.entry(at).or_default()
    }

    fn category(&self, at: Location) -> Option<TileCategory> {
        self.index.category_at(at)
    }

    fn occupied(&self, at: Location, except: AgentId) -> bool {
        self.agents
            .values()
            .any(|a| a.id != except && a.position == at)
    }

    fn do_move(&mut self, id: AgentId, step: Step) -> bool {
        if step.is_stay() || step.dx.abs() > 1 || step.dy.abs() > 1 {
            self.violations.push(Violation::BadStep {
                turn: self.turn,
                agent: id,
                step,
            });
            return false;
        }
        let to = self.agents[&id].position.offset(step);
        if !self.grid.is_walkable(to) {
            return false;
        }
        if self.occupied(to, id) {
            self.violations.push(Violation::Collision {
                turn: self.turn,
                agent: id,
                at: to,
            });
            return false;
        }
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.position = to;
        }
        true
    }

    fn buy(&mut self, id: AgentId, item: Buyable, at: Location) -> bool {
        if self.category(at) != Some(TileCategory::Shop) || self.agents[&id].holding.is_some() {
            return false;
        }
        let price = self.prices.price(item);
        if self.money < price {
            return false;
        }
        self.money -= price;
        let bought = match item {
            Buyable::Food(ft) => Item::Food(Food::raw(ft)),
            Buyable::Plate => Item::Plate(Plate::clean()),
            Buyable::Pan => Item::Pan(Pan::default()),
        };
        self.give(id, bought);
        true
    }

    fn place(&mut self, id: AgentId, at: Location) -> bool {
        let Some(held) = self.agents[&id].holding.clone() else {
            return false;
        };
        let placed = match (self.category(at), held) {
            (Some(TileCategory::Counter), item) => {
                let tile = self.tile_mut(at);
                if tile.item.is_some() {
                    return false;
                }
                tile.item = Some(item);
                true
            }
            (Some(TileCategory::Cooker), Item::Pan(pan)) => {
                let tile = self.tile_mut(at);
                if tile.item.is_some() {
                    return false;
                }
                tile.item = Some(Item::Pan(pan));
                if pan.food.is_some() {
                    self.cook_timers.insert(at, 0);
                }
                true
            }
            (Some(TileCategory::Cooker), Item::Food(food)) if food.kind.needs_cook() => {
                match &mut self.tile_mut(at).item {
                    Some(Item::Pan(pan)) if pan.food.is_none() => {
                        pan.food = Some(food);
                    }
                    _ => return false,
                }
                self.cook_timers.insert(at, 0);
                true
            }
            _ => false,
        };
        if placed {
            if let Some(agent) = self.agents.get_mut(&id) {
                agent.holding = None;
            }
        }
        placed
    }

    fn pickup(&mut self, id: AgentId, at: Location) -> bool {
        if self.agents[&id].holding.is_some() || self.category(at) != Some(TileCategory::Counter) {
            return false;
        }
        let Some(item) = self.tile_mut(at).item.take() else {
            return false;
        };
        self.give(id, item);
        true
    }

    fn chop(&mut self, id: AgentId, at: Location) -> bool {
        if self.agents[&id].holding.is_some() || self.category(at) != Some(TileCategory::Counter) {
            return false;
        }
        match &mut self.tile_mut(at).item {
            Some(Item::Food(food)) if food.kind.needs_chop() && !food.chopped => {
                food.chopped = true;
                true
            }
            _ => false,
        }
    }

    fn take_from_pan(&mut self, id: AgentId, at: Location) -> bool {
        if self.agents[&id].holding.is_some() {
            return false;
        }
        let food = match &mut self.tile_mut(at).item {
            Some(Item::Pan(pan)) => pan.food.take(),
            _ => None,
        };
        let Some(food) = food else {
            return false;
        };
        self.cook_timers.remove(&at);
        self.give(id, Item::Food(food));
        true
    }

    fn add_food_to_plate(&mut self, id: AgentId, at: Location) -> bool {
        let Some(held) = self.agents[&id].holding.clone() else {
            return false;
        };
        match held {
            Item::Food(food) => {
                match &mut self.tile_mut(at).item {
                    Some(Item::Plate(plate)) if plate.is_clean() => plate.foods.push(food),
                    _ => return false,
                }
                if let Some(agent) = self.agents.get_mut(&id) {
                    agent.holding = None;
                }
                true
            }
            Item::Plate(mut plate) if plate.is_clean() => {
                let food = match &self.tile_mut(at).item {
                    Some(Item::Food(food)) => *food,
                    _ => return false,
                };
                self.tile_mut(at).item = None;
                plate.foods.push(food);
                self.give(id, Item::Plate(plate));
                true
            }
            _ => false,
        }
    }

    fn take_clean_plate(&mut self, id: AgentId, at: Location) -> bool {
        if self.agents[&id].holding.is_some() || self.category(at) != Some(TileCategory::SinkTable) {
            return false;
        }
        let tile = self.tile_mut(at);
        if tile.clean_plates == 0 {
            return false;
        }
        tile.clean_plates -= 1;
        self.give(id, Item::Plate(Plate::clean()));
        true
    }

    fn put_dirty_plate_in_sink(&mut self, id: AgentId, at: Location) -> bool {
        let holds_dirty = matches!(&self.agents[&id].holding, Some(Item::Plate(p)) if p.dirty);
        if !holds_dirty || self.category(at) != Some(TileCategory::Sink) {
            return false;
        }
        self.tile_mut(at).dirty_plates += 1;
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.holding = None;
        }
        true
    }

    fn wash_sink(&mut self, at: Location) -> bool {
        if self.category(at) != Some(TileCategory::Sink) || self.tile_at(at).dirty_plates == 0 {
            return false;
        }
        let Some(&table) = self.index.locations(TileCategory::SinkTable).first() else {
            return false;
        };
        self.tile_mut(at).dirty_plates -= 1;
        self.tile_mut(table).clean_plates += 1;
        true
    }

    fn submit(&mut self, id: AgentId, at: Location) -> bool {
        if self.category(at) != Some(TileCategory::Submit) {
            return false;
        }
        let Some(Item::Plate(plate)) = self.agents[&id].holding.clone() else {
            return false;
        };
        if !plate.is_clean() {
            return false;
        }
        let Some(order) = self
            .orders
            .iter_mut()
            .find(|o| o.active && plate_matches_order(&plate, &o.required_foods()))
        else {
            return false;
        };
        order.active = false;
        self.money += order.reward;
        self.submitted.push(order.id);
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.holding = None;
        }
        if let Some(&sink) = self.index.locations(TileCategory::Sink).first() {
            self.tile_mut(sink).dirty_plates += 1;
        }
        true
    }

    fn trash(&mut self, id: AgentId, at: Location) -> bool {
        if self.category(at) != Some(TileCategory::Trash) {
            return false;
        }
        let Some(agent) = self.agents.get_mut(&id) else {
            return false;
        };
        agent.holding = match agent.holding.take() {
            Some(Item::Food(_)) => None,
            Some(Item::Plate(mut plate)) => {
                plate.foods.clear();
                Some(Item::Plate(plate))
            }
            Some(Item::Pan(_)) => Some(Item::Pan(Pan::default())),
            None => return false,
        };
        true
    }
}

impl Kitchen for TestKitchen {
    fn turn(&self) -> u32 {
        self.turn
    }

    fn money(&self) -> i64 {
        self.money
    }

    fn orders(&self) -> Vec<Order> {
        self.orders.clone()
    }

    fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    fn agent(&self, id: AgentId) -> Option<AgentState> {
        self.agents.get(&id).cloned()
    }

    fn tile(&self, at: Location) -> Option<TileContents> {
        self.category(at)?;
        Some(self.tile_at(at))
    }

    fn act(&mut self, id: AgentId, action: Action) -> bool {
        let Some(position) = self.agents.get(&id).map(|a| a.position) else {
            return false;
        };
        if !self.acted.insert(id) {
            self.violations.push(Violation::SecondAction {
                turn: self.turn,
                agent: id,
            });
            return false;
        }
        if let Some(at) = action.target() {
            if !position.is_adjacent(at) {
                self.violations.push(Violation::NotAdjacent {
                    turn: self.turn,
                    agent: id,
                    action,
                });
                return false;
            }
        }

        let success = match action {
            Action::Move { step } => self.do_move(id, step),
            Action::Buy { item, at } => self.buy(id, item, at),
            Action::Place { at } => self.place(id, at),
            Action::Pickup { at } => self.pickup(id, at),
            Action::Chop { at } => self.chop(id, at),
            Action::TakeFromPan { at } => self.take_from_pan(id, at),
            Action::AddFoodToPlate { at } => self.add_food_to_plate(id, at),
            Action::TakeCleanPlate { at } => self.take_clean_plate(id, at),
            Action::PutDirtyPlateInSink { at } => self.put_dirty_plate_in_sink(id, at),
            Action::WashSink { at } => self.wash_sink(at),
            Action::Submit { at } => self.submit(id, at),
            Action::Trash { at } => self.trash(id, at),
        };
        if !success {
            log::trace!("turn {}: {id} {action:?} rejected", self.turn);
        }
        success
    }
}
