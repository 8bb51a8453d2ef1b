// brigade_engine: per-turn task scheduling for a grid kitchen game.
//
// Each game turn, a team of agents (bots) on a 2D kitchen grid must be told
// what to do: buy ingredients, chop and cook them, assemble a plate, submit
// it against a customer order. This crate decides those actions. It owns no
// game state; the simulator is reached through the `Kitchen` trait, read
// once per turn into a `WorldSnapshot` and written only through single-turn
// action primitives.
//
// Module overview:
// - `scheduler.rs`:   Scheduler + SchedulerState, the per-turn pipeline.
// - `snapshot.rs`:    WorldSnapshot, one consistent read of the kitchen per turn.
// - `order.rs`:       Order selection with a sticky lock.
// - `task_gen.rs`:    Task generation rules, assembly counter choice.
// - `task.rs`:        Task kinds and the per-kind feasibility/action table.
// - `assign.rs`:      Greedy agent-task assignment with target reservation.
// - `executor.rs`:    Collision-free move planning (a fold over agents) and action dispatch.
// - `pathfinding.rs`: 8-connected BFS first-step search, idle spot search.
// - `recipe.rs`:      Food processing flags, plate signatures.
// - `kitchen.rs`:     The simulator trait and the Action primitives.
// - `grid.rs`:        Static walkability grid + ASCII map loader.
// - `map_index.rs`:   One-time classification of station tiles.
// - `event.rs`:       TurnEvent / TurnReport narrative output.
// - `config.rs`:      EngineConfig, all tunable numbers.
// - `types.rs`:       Location, ids, the Food/Pan/Plate item model, orders.
//
// **Critical constraint: determinism.** A turn is a pure function of
// `(state, snapshot, orders) -> (new state, actions)`. Agents are processed
// in ascending id order, ordered maps are `BTreeMap`, and every tie-break is
// explicit. Hash sets are used for membership only, never iterated.

pub mod assign;
pub mod config;
pub mod event;
pub mod executor;
pub mod grid;
pub mod kitchen;
pub mod map_index;
pub mod order;
pub mod pathfinding;
pub mod recipe;
pub mod scheduler;
pub mod snapshot;
pub mod task;
pub mod task_gen;
pub mod types;
