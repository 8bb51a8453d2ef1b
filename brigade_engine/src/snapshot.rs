// World snapshot: one consistent read of the kitchen per turn.
//
// `WorldSnapshot::capture` reads the turn number, team money, every agent and
// the live contents of every counter, cooker, sink-table and sink listed in
// the `MapIndex`. Shop, submit and trash locations are static and copied
// straight from the index. Nothing is cached between turns: a new snapshot is
// captured every turn and all planning for that turn reads from it.
//
// The query helpers below (`find_plate`, `available_food_counts`, ...) are
// the shared vocabulary of the order selector and the task generator.
//
// See also: `kitchen.rs` for the read interface, `scheduler.rs` which
// captures the snapshot at the start of every turn.

use crate::kitchen::Kitchen;
use crate::map_index::{MapIndex, TileCategory};
use crate::types::{AgentId, AgentState, Food, FoodType, Item, Location, Plate, TileContents};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub turn: u32,
    pub money: i64,
    pub agents: BTreeMap<AgentId, AgentState>,
    pub counters: BTreeMap<Location, TileContents>,
    pub cookers: BTreeMap<Location, TileContents>,
    pub sink_tables: BTreeMap<Location, TileContents>,
    pub sinks: BTreeMap<Location, TileContents>,
    pub shops: Vec<Location>,
    pub submits: Vec<Location>,
    pub trashes: Vec<Location>,
}

/// Where the engine's working plate is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlateSpot {
    Held(AgentId),
    OnCounter(Location),
}

fn read_tiles<K: Kitchen + ?Sized>(
    kitchen: &K,
    index: &MapIndex,
    category: TileCategory,
) -> BTreeMap<Location, TileContents> {
    index
        .locations(category)
        .iter()
        .map(|&at| (at, kitchen.tile(at).unwrap_or_default()))
        .collect()
}

impl WorldSnapshot {
    /// Read everything the planner needs for this turn. Agents the simulator
    /// no longer knows about are left out.
    pub fn capture<K: Kitchen + ?Sized>(
        kitchen: &K,
        index: &MapIndex,
        agent_ids: &[AgentId],
    ) -> Self {
        let agents = agent_ids
            .iter()
            .filter_map(|&id| kitchen.agent(id).map(|state| (id, state)))
            .collect();

        Self {
            turn: kitchen.turn(),
            money: kitchen.money(),
            agents,
            counters: read_tiles(kitchen, index, TileCategory::Counter),
            cookers: read_tiles(kitchen, index, TileCategory::Cooker),
            sink_tables: read_tiles(kitchen, index, TileCategory::SinkTable),
            sinks: read_tiles(kitchen, index, TileCategory::Sink),
            shops: index.locations(TileCategory::Shop).to_vec(),
            submits: index.locations(TileCategory::Submit).to_vec(),
            trashes: index.locations(TileCategory::Trash).to_vec(),
        }
    }

    /// The working plate: the first clean plate held by an agent (by id),
    /// else the first clean plate on a counter.
    pub fn find_plate(&self) -> Option<(&Plate, PlateSpot)> {
        let held = self.agents.values().find_map(|agent| {
            agent
                .held_clean_plate()
                .map(|plate| (plate, PlateSpot::Held(agent.id)))
        });
        held.or_else(|| {
            self.counters.iter().find_map(|(&at, tile)| {
                tile.item
                    .as_ref()
                    .and_then(Item::as_clean_plate)
                    .map(|plate| (plate, PlateSpot::OnCounter(at)))
            })
        })
    }

    /// Whether a clean plate can be had without buying one.
    pub fn has_accessible_plate(&self) -> bool {
        self.find_plate().is_some() || self.sink_tables.values().any(|t| t.clean_plates > 0)
    }

    /// How many foods of each type exist anywhere the team can reach them:
    /// in hand, loose on a counter, or in a pan.
    pub fn available_food_counts(&self) -> BTreeMap<FoodType, usize> {
        let mut counts = BTreeMap::new();
        for food in self.loose_foods() {
            *counts.entry(food.kind).or_default() += 1;
        }
        counts
    }

    fn loose_foods(&self) -> impl Iterator<Item = &Food> + '_ {
        let held = self.agents.values().filter_map(AgentState::held_food);
        let on_counters = self
            .counters
            .values()
            .filter_map(|t| t.item.as_ref().and_then(Item::as_food));
        let in_pans = self
            .cookers
            .values()
            .filter_map(|t| t.pan().and_then(|pan| pan.food.as_ref()));
        held.chain(on_counters).chain(in_pans)
    }

    pub fn empty_counters(&self) -> impl Iterator<Item = Location> + '_ {
        self.counters
            .iter()
            .filter(|(_, tile)| tile.is_empty())
            .map(|(&at, _)| at)
    }

    /// Whether any cooker carries a pan.
    pub fn any_pan_on_cooker(&self) -> bool {
        self.cookers.values().any(|t| t.pan().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridMap;
    use crate::kitchen::Action;
    use crate::types::{Order, Pan};
    use smallvec::SmallVec;

    struct FixedKitchen {
        tiles: BTreeMap<Location, TileContents>,
        agents: Vec<AgentState>,
    }

    impl Kitchen for FixedKitchen {
        fn turn(&self) -> u32 {
            7
        }
        fn money(&self) -> i64 {
            42
        }
        fn orders(&self) -> Vec<Order> {
            Vec::new()
        }
        fn agent_ids(&self) -> Vec<AgentId> {
            self.agents.iter().map(|a| a.id).collect()
        }
        fn agent(&self, id: AgentId) -> Option<AgentState> {
            self.agents.iter().find(|a| a.id == id).cloned()
        }
        fn tile(&self, at: Location) -> Option<TileContents> {
            self.tiles.get(&at).cloned()
        }
        fn act(&mut self, _agent: AgentId, _action: Action) -> bool {
            false
        }
    }

    fn setup() -> (FixedKitchen, MapIndex) {
        let grid = GridMap::from_ascii(
            "
            #$CCU
            K...T
            #R#S#
            ",
        )
        .unwrap();
        let index = MapIndex::build(&grid);
        let mut tiles = BTreeMap::new();
        tiles.insert(
            Location::new(2, 0),
            TileContents::holding(Item::Food(Food::raw(FoodType::Onions))),
        );
        tiles.insert(
            Location::new(3, 0),
            TileContents::holding(Item::Plate(Plate::clean())),
        );
        tiles.insert(
            Location::new(0, 1),
            TileContents::holding(Item::Pan(Pan {
                food: Some(Food::raw(FoodType::Meat)),
            })),
        );
        let agents = vec![
            AgentState {
                id: AgentId(2),
                position: Location::new(2, 1),
                holding: Some(Item::Food(Food::raw(FoodType::Onions))),
            },
            AgentState {
                id: AgentId(1),
                position: Location::new(1, 1),
                holding: None,
            },
        ];
        (FixedKitchen { tiles, agents }, index)
    }

    #[test]
    fn capture_reads_every_functional_tile() {
        let (kitchen, index) = setup();
        let snap = WorldSnapshot::capture(&kitchen, &index, &[AgentId(1), AgentId(2), AgentId(9)]);
        assert_eq!(snap.turn, 7);
        assert_eq!(snap.money, 42);
        assert_eq!(snap.agents.len(), 2);
        assert_eq!(snap.counters.len(), 2);
        assert_eq!(snap.cookers.len(), 1);
        assert_eq!(snap.sink_tables.len(), 1);
        assert_eq!(snap.sinks.len(), 1);
        assert_eq!(snap.shops, vec![Location::new(1, 0)]);
        assert_eq!(snap.submits, vec![Location::new(4, 0)]);
        assert_eq!(snap.trashes, vec![Location::new(1, 2)]);
    }

    #[test]
    fn food_counts_cover_hands_counters_and_pans() {
        let (kitchen, index) = setup();
        let snap = WorldSnapshot::capture(&kitchen, &index, &[AgentId(1), AgentId(2)]);
        let counts = snap.available_food_counts();
        assert_eq!(counts.get(&FoodType::Onions), Some(&2));
        assert_eq!(counts.get(&FoodType::Meat), Some(&1));
        assert_eq!(counts.get(&FoodType::Egg), None);
        assert!(snap.any_pan_on_cooker());
    }

    #[test]
    fn held_plate_wins_over_counter_plate() {
        let (mut kitchen, index) = setup();
        let snap = WorldSnapshot::capture(&kitchen, &index, &[AgentId(1), AgentId(2)]);
        assert_eq!(
            snap.find_plate().map(|(_, spot)| spot),
            Some(PlateSpot::OnCounter(Location::new(3, 0)))
        );

        kitchen.agents[1].holding = Some(Item::Plate(Plate {
            foods: SmallVec::new(),
            dirty: false,
        }));
        let snap = WorldSnapshot::capture(&kitchen, &index, &[AgentId(1), AgentId(2)]);
        assert_eq!(
            snap.find_plate().map(|(_, spot)| spot),
            Some(PlateSpot::Held(AgentId(1)))
        );
    }

    #[test]
    fn dirty_plates_are_not_accessible() {
        let (mut kitchen, index) = setup();
        kitchen.tiles.insert(
            Location::new(3, 0),
            TileContents::holding(Item::Plate(Plate {
                foods: SmallVec::new(),
                dirty: true,
            })),
        );
        let snap = WorldSnapshot::capture(&kitchen, &index, &[AgentId(1)]);
        assert!(!snap.has_accessible_plate());
        assert_eq!(snap.empty_counters().count(), 0);
    }
}
