// Scheduler: the per-turn pipeline and the state it carries between turns.
//
// One `play_turn` call runs, in order:
//
//   capture snapshot -> select order -> pick assembly counter
//     -> generate tasks -> assign -> plan moves -> apply
//
// Everything except `SchedulerState` is rebuilt from live reads every turn.
// The state holds exactly three things: the locked order, the cached
// assembly counter, and last turn's (kind, target) per agent for
// stickiness. It is an explicit value owned by the `Scheduler` (and
// serializable), never a global, so each stage can be driven and tested
// on its own.
//
// `plan_turn` runs every stage up to and including move planning without
// touching the simulator, which is what the benchmark and the stage tests
// use. `play_turn` wraps it with the snapshot read and the action writes.
//
// See also: `order.rs`, `task_gen.rs`, `assign.rs`, `executor.rs` for the
// individual stages, `event.rs` for the report.

use crate::assign::{StickinessCache, assign_tasks};
use crate::config::EngineConfig;
use crate::event::{TurnEvent, TurnReport};
use crate::executor::{AgentPlan, apply_plans, plan_moves};
use crate::grid::GridMap;
use crate::kitchen::Kitchen;
use crate::map_index::MapIndex;
use crate::order::{OrderChoice, select_order};
use crate::snapshot::{PlateSpot, WorldSnapshot};
use crate::task::Task;
use crate::task_gen::{generate_tasks, select_assembly_counter};
use crate::types::{AgentId, Location, Order, OrderId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the scheduler remembers from one turn to the next.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerState {
    /// The order the team is locked onto, if any.
    pub current_order: Option<OrderId>,
    /// Counter where the working plate is assembled.
    pub assembly_counter: Option<Location>,
    /// Last turn's assignment per agent.
    pub last_assignments: StickinessCache,
}

/// The decisions of one turn, before any action is taken.
#[derive(Clone, Debug)]
pub struct TurnPlan {
    pub order: OrderChoice,
    pub tasks: Vec<Task>,
    pub assignments: BTreeMap<AgentId, Task>,
    pub plans: Vec<AgentPlan>,
}

pub struct Scheduler {
    grid: GridMap,
    index: MapIndex,
    config: EngineConfig,
    state: SchedulerState,
}

impl Scheduler {
    /// Classify the map once and start with empty state.
    pub fn new(grid: GridMap, config: EngineConfig) -> Self {
        let index = MapIndex::build(&grid);
        Self {
            grid,
            index,
            config,
            state: SchedulerState::default(),
        }
    }

    /// Resume from a saved state.
    pub fn with_state(mut self, state: SchedulerState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn index(&self) -> &MapIndex {
        &self.index
    }

    /// Run every planning stage against a captured snapshot. Updates the
    /// order lock, the assembly counter and the stickiness cache.
    pub fn plan_turn(&mut self, snapshot: &WorldSnapshot, orders: &[Order]) -> TurnPlan {
        let order = select_order(&mut self.state.current_order, orders, snapshot, &self.config);

        // The assembly counter is (re)chosen only when a plate is about to
        // be put down; while the plate sits on it the cached value stands.
        if matches!(snapshot.find_plate(), Some((_, PlateSpot::Held(_)))) {
            self.state.assembly_counter =
                select_assembly_counter(snapshot, self.state.assembly_counter);
        }

        let tasks = match order.order() {
            Some(order) => generate_tasks(order, snapshot, self.state.assembly_counter, &self.config),
            None => Vec::new(),
        };

        let agent_ids: Vec<AgentId> = snapshot.agents.keys().copied().collect();
        let assignments = assign_tasks(
            snapshot,
            &tasks,
            &agent_ids,
            &mut self.state.last_assignments,
            &self.config,
        );

        let busy: Vec<Location> = snapshot
            .shops
            .iter()
            .chain(&snapshot.submits)
            .chain(snapshot.cookers.keys())
            .copied()
            .collect();
        let plans = plan_moves(&self.grid, snapshot, &assignments, &busy);

        TurnPlan {
            order,
            tasks,
            assignments,
            plans,
        }
    }

    /// Play one full turn against the simulator.
    pub fn play_turn<K: Kitchen + ?Sized>(&mut self, kitchen: &mut K) -> TurnReport {
        let mut agent_ids = kitchen.agent_ids();
        agent_ids.sort_unstable();
        let snapshot = WorldSnapshot::capture(kitchen, &self.index, &agent_ids);
        let mut report = TurnReport {
            turn: snapshot.turn,
            ..TurnReport::default()
        };
        if snapshot.agents.is_empty() {
            return report;
        }

        let orders = kitchen.orders();
        let plan = self.plan_turn(&snapshot, &orders);

        report.order = plan.order.order().map(|o| o.id);
        report.events.push(match &plan.order {
            OrderChoice::Kept(order) => TurnEvent::OrderKept { order: order.id },
            OrderChoice::Selected { order, score } => {
                log::info!(
                    "turn {}: locked {} {:?} (score {score:.3})",
                    snapshot.turn,
                    order.id,
                    order.required
                );
                TurnEvent::OrderSelected {
                    order: order.id,
                    score: *score,
                }
            }
            OrderChoice::NoneActive => {
                log::debug!("turn {}: no active orders", snapshot.turn);
                TurnEvent::NoActiveOrder
            }
        });

        log::debug!(
            "turn {}: {} tasks, {} assigned",
            snapshot.turn,
            plan.tasks.len(),
            plan.assignments.len()
        );
        for (&agent, task) in &plan.assignments {
            log::debug!("{agent} -> {} at {} (p{})", task.kind, task.target, task.priority);
            report.events.push(TurnEvent::Assigned {
                agent,
                kind: task.kind,
                target: task.target,
                priority: task.priority,
            });
        }

        report.events.extend(apply_plans(kitchen, &plan.plans));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Intent;
    use crate::task::TaskKind;
    use crate::types::{AgentState, Item, Plate, TileContents};

    fn grid() -> GridMap {
        GridMap::from_ascii(
            "
            #$#CC#U#
            #......#
            #......#
            ########
            ",
        )
        .unwrap()
    }

    fn order(id: u32, required: &[&str]) -> Order {
        Order {
            id: OrderId(id),
            required: required.iter().map(|s| s.to_string()).collect(),
            reward: 50,
            expires_turn: 100,
            active: true,
        }
    }

    fn snapshot(scheduler: &Scheduler) -> WorldSnapshot {
        let index = scheduler.index();
        let mut snap = WorldSnapshot {
            money: 100,
            shops: index.locations(crate::map_index::TileCategory::Shop).to_vec(),
            submits: index.locations(crate::map_index::TileCategory::Submit).to_vec(),
            ..WorldSnapshot::default()
        };
        for &at in index.locations(crate::map_index::TileCategory::Counter) {
            snap.counters.insert(at, TileContents::default());
        }
        snap.agents.insert(
            AgentId(1),
            AgentState {
                id: AgentId(1),
                position: Location::new(1, 1),
                holding: None,
            },
        );
        snap
    }

    #[test]
    fn plan_turn_buys_plate_first() {
        let mut scheduler = Scheduler::new(grid(), EngineConfig::default());
        let snap = snapshot(&scheduler);
        let plan = scheduler.plan_turn(&snap, &[order(7, &["SAUCE"])]);
        assert!(matches!(plan.order, OrderChoice::Selected { .. }));
        assert_eq!(scheduler.state().current_order, Some(OrderId(7)));
        let task = plan.assignments[&AgentId(1)];
        assert_eq!(task.kind, TaskKind::BuyPlate);
        assert_eq!(plan.plans[0].intent, Intent::Act(task.action().unwrap()));
        assert_eq!(
            scheduler.state().last_assignments[&AgentId(1)],
            (TaskKind::BuyPlate, Location::new(1, 0))
        );
    }

    #[test]
    fn no_orders_means_idle() {
        let mut scheduler = Scheduler::new(grid(), EngineConfig::default());
        let snap = snapshot(&scheduler);
        let plan = scheduler.plan_turn(&snap, &[]);
        assert_eq!(plan.order, OrderChoice::NoneActive);
        assert!(plan.tasks.is_empty());
        assert!(plan.assignments.is_empty());
        assert_eq!(plan.plans[0].task.map(|t| t.kind), Some(TaskKind::Idle));
    }

    #[test]
    fn assembly_counter_cached_while_plate_held() {
        let mut scheduler = Scheduler::new(grid(), EngineConfig::default());
        let mut snap = snapshot(&scheduler);
        assert_eq!(scheduler.state().assembly_counter, None);

        snap.agents.get_mut(&AgentId(1)).unwrap().holding = Some(Item::Plate(Plate::clean()));
        scheduler.plan_turn(&snap, &[order(1, &["SAUCE"])]);
        // Counter nearest to the submit station at (6,0).
        assert_eq!(scheduler.state().assembly_counter, Some(Location::new(4, 0)));

        // Plate placed: the cache is left alone.
        snap.agents.get_mut(&AgentId(1)).unwrap().holding = None;
        snap.counters
            .insert(Location::new(4, 0), TileContents::holding(Item::Plate(Plate::clean())));
        scheduler.plan_turn(&snap, &[order(1, &["SAUCE"])]);
        assert_eq!(scheduler.state().assembly_counter, Some(Location::new(4, 0)));
    }

    #[test]
    fn state_roundtrips_through_json() {
        let mut state = SchedulerState {
            current_order: Some(OrderId(3)),
            assembly_counter: Some(Location::new(2, 5)),
            ..SchedulerState::default()
        };
        state
            .last_assignments
            .insert(AgentId(4), (TaskKind::WashSink, Location::new(1, 1)));
        let json = serde_json::to_string(&state).unwrap();
        let restored: SchedulerState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, restored);

        let scheduler = Scheduler::new(grid(), EngineConfig::default()).with_state(restored);
        assert_eq!(scheduler.state().current_order, Some(OrderId(3)));
    }
}
