// Turn executor: one outcome per agent, collision-free.
//
// Execution is split in two:
//
// 1. `plan_moves` is a pure fold over agents in ascending id order. The
//    accumulator is the map of committed positions, seeded with every
//    agent's current cell. Each step sees the positions committed by the
//    agents before it (and the current cells of those after it), picks the
//    agent's outcome, and commits its next position. So agent N never routes
//    into a cell that agents 1..N-1 already claimed this turn.
// 2. `apply_plans` walks the plans in the same order and invokes the
//    simulator, turning each call's result into a `TurnEvent`. The fold
//    assumed every earlier move succeeds; when the simulator rejects one,
//    that agent still stands on its old cell, so any later move into that
//    cell is skipped (and the skip cascades the same way).
//
// Agents without an assignment walk toward an idle spot: the nearest
// walkable cell not adjacent to any shop, submit station or cooker.
//
// Failed actions are reported and otherwise ignored. Nothing is retried
// within a turn; the next turn replans from a fresh snapshot.
//
// See also: `pathfinding.rs` for `first_step` and `idle_target`,
// `scheduler.rs` which calls both phases.

use crate::event::TurnEvent;
use crate::grid::GridMap;
use crate::kitchen::{Action, Kitchen};
use crate::pathfinding::{first_step, idle_target};
use crate::snapshot::WorldSnapshot;
use crate::task::{Task, TaskKind};
use crate::types::{AgentId, AgentState, Location, Step};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What one agent will do this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Adjacent to the target: invoke the primitive.
    Act(Action),
    Move { step: Step, to: Location },
    /// Adjacent to a target that needs no action (an idle spot).
    Wait,
    /// Target unreachable this turn; stay put.
    Stalled { target: Location },
    /// Unassigned and no idle spot exists.
    NoIdleSpot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPlan {
    pub agent: AgentId,
    /// The assigned task, or the synthesised idle walk.
    pub task: Option<Task>,
    pub intent: Intent,
}

impl AgentPlan {
    /// The cell this agent occupies at the end of the turn if everything
    /// succeeds.
    pub fn destination(&self, from: Location) -> Location {
        match self.intent {
            Intent::Move { to, .. } => to,
            _ => from,
        }
    }
}

/// Positions agents will hold after this turn's moves.
pub type Commitments = BTreeMap<AgentId, Location>;

/// Outcome for a single agent given what is already committed.
fn plan_agent(
    grid: &GridMap,
    agent: &AgentState,
    task: Option<Task>,
    committed: &Commitments,
) -> AgentPlan {
    let Some(task) = task else {
        return AgentPlan {
            agent: agent.id,
            task: None,
            intent: Intent::NoIdleSpot,
        };
    };

    let blocked: FxHashSet<Location> = committed
        .iter()
        .filter(|&(&id, _)| id != agent.id)
        .map(|(_, &at)| at)
        .collect();

    let intent = if task.kind == TaskKind::Idle {
        walk_to_idle_spot(grid, agent.position, task.target, &blocked)
    } else if agent.position.is_adjacent(task.target) {
        match task.action() {
            Some(action) => Intent::Act(action),
            None => Intent::Wait,
        }
    } else {
        step_toward(grid, agent.position, task.target, &blocked)
    };

    AgentPlan {
        agent: agent.id,
        task: Some(task),
        intent,
    }
}

fn step_toward(
    grid: &GridMap,
    from: Location,
    target: Location,
    blocked: &FxHashSet<Location>,
) -> Intent {
    match first_step(grid, from, target, blocked) {
        Some(step) if step.is_stay() => Intent::Wait,
        Some(step) => Intent::Move {
            step,
            to: from.offset(step),
        },
        None => Intent::Stalled { target },
    }
}

/// Idle agents stand *on* their spot rather than next to it.
fn walk_to_idle_spot(
    grid: &GridMap,
    from: Location,
    spot: Location,
    blocked: &FxHashSet<Location>,
) -> Intent {
    if from == spot {
        return Intent::Wait;
    }
    if !from.is_adjacent(spot) {
        return step_toward(grid, from, spot, blocked);
    }
    if blocked.contains(&spot) {
        return Intent::Wait;
    }
    Intent::Move {
        step: Step {
            dx: spot.x - from.x,
            dy: spot.y - from.y,
        },
        to: spot,
    }
}

/// Plan every agent's outcome for this turn. Assigned agents pursue their
/// task; the rest walk toward an idle spot away from `busy` stations.
pub fn plan_moves(
    grid: &GridMap,
    snapshot: &WorldSnapshot,
    assignments: &BTreeMap<AgentId, Task>,
    busy: &[Location],
) -> Vec<AgentPlan> {
    let seed: Commitments = snapshot
        .agents
        .values()
        .map(|agent| (agent.id, agent.position))
        .collect();

    let (plans, _) = snapshot.agents.values().fold(
        (Vec::with_capacity(snapshot.agents.len()), seed),
        |(mut plans, mut committed), agent| {
            let task = assignments.get(&agent.id).copied().or_else(|| {
                idle_target(grid, agent.position, busy)
                    .map(|at| Task::new(TaskKind::Idle, at, 0))
            });
            let plan = plan_agent(grid, agent, task, &committed);
            committed.insert(agent.id, plan.destination(agent.position));
            plans.push(plan);
            (plans, committed)
        },
    );
    plans
}

/// Invoke the simulator for every plan, in order.
pub fn apply_plans<K: Kitchen + ?Sized>(kitchen: &mut K, plans: &[AgentPlan]) -> Vec<TurnEvent> {
    // Cells still held by agents whose move did not happen.
    let mut stuck: FxHashSet<Location> = FxHashSet::default();
    plans
        .iter()
        .map(|plan| {
            let agent = plan.agent;
            match plan.intent {
                Intent::Move { step, to } if stuck.contains(&to) => {
                    log::debug!("{agent} move {step:?} skipped, {to} still occupied");
                    stuck.insert(Location::new(to.x - step.dx, to.y - step.dy));
                    TurnEvent::Moved {
                        agent,
                        step,
                        success: false,
                    }
                }
                Intent::Act(action) => {
                    let success = kitchen.act(agent, action);
                    log::debug!("{agent} {action:?} -> {success}");
                    TurnEvent::Acted {
                        agent,
                        action,
                        success,
                    }
                }
                Intent::Move { step, to } => {
                    let success = kitchen.act(agent, Action::Move { step });
                    if !success {
                        log::debug!("{agent} move {step:?} rejected");
                        stuck.insert(Location::new(to.x - step.dx, to.y - step.dy));
                    }
                    TurnEvent::Moved {
                        agent,
                        step,
                        success,
                    }
                }
                Intent::Wait => TurnEvent::Waiting { agent },
                Intent::Stalled { target } => {
                    log::debug!("{agent} has no path to {target}");
                    TurnEvent::Stalled { agent, target }
                }
                Intent::NoIdleSpot => TurnEvent::NoIdleSpot { agent },
            }
        })
        .collect()
}
