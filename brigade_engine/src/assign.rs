// Assignment engine: greedy matching of agents to tasks.
//
// Every (agent, task) pair is first checked for feasibility through the
// task-kind table in `task.rs`; infeasible pairs are dropped outright. The
// rest are scored
//
//   score = priority * 100 - max(0, chebyshev(agent, target) - 1)
//           + stickiness_bonus   if the agent held this (kind, target) last turn
//
// and sorted by descending score. Equal scores keep candidate order (agents
// in the order given, then tasks in generation order), so the result is a
// pure function of its inputs. The greedy pass then gives each agent its
// best remaining pair, skipping pairs whose target another agent already
// reserved this turn. Trash and wash-sink targets are exempt: several agents
// may use them in the same turn.
//
// The winning (kind, target) per agent becomes next turn's stickiness cache.
//
// See also: `task.rs` for feasibility, `scheduler.rs` which owns the cache.

use crate::config::EngineConfig;
use crate::snapshot::WorldSnapshot;
use crate::task::{Task, TaskKind};
use crate::types::{AgentId, AgentState, Location};
use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Last turn's assignment per agent, by (kind, target).
pub type StickinessCache = BTreeMap<AgentId, (TaskKind, Location)>;

/// Score of a feasible (agent, task) pair.
pub fn task_score(
    agent: &AgentState,
    task: &Task,
    last: Option<&(TaskKind, Location)>,
    config: &EngineConfig,
) -> i64 {
    let travel = i64::from(agent.position.chebyshev(task.target).saturating_sub(1));
    let mut score = task.priority * 100 - travel;
    if last == Some(&(task.kind, task.target)) {
        score += config.stickiness_bonus;
    }
    score
}

struct Candidate {
    score: i64,
    agent: AgentId,
    task: usize,
}

/// Assign at most one task per agent and refresh `sticky` with the result.
pub fn assign_tasks(
    snapshot: &WorldSnapshot,
    tasks: &[Task],
    agent_ids: &[AgentId],
    sticky: &mut StickinessCache,
    config: &EngineConfig,
) -> BTreeMap<AgentId, Task> {
    let mut candidates = Vec::new();
    for &id in agent_ids {
        let Some(agent) = snapshot.agents.get(&id) else {
            continue;
        };
        let last = sticky.get(&id);
        for (i, task) in tasks.iter().enumerate() {
            if !task.is_feasible_for(agent, snapshot.money, &config.prices) {
                continue;
            }
            candidates.push(Candidate {
                score: task_score(agent, task, last, config),
                agent: id,
                task: i,
            });
        }
    }

    // Stable sort: ties keep candidate order.
    candidates.sort_by_key(|c| Reverse(c.score));

    let mut assigned: BTreeMap<AgentId, Task> = BTreeMap::new();
    let mut reserved: FxHashSet<Location> = FxHashSet::default();
    for candidate in candidates {
        if assigned.contains_key(&candidate.agent) {
            continue;
        }
        let task = tasks[candidate.task];
        if reserved.contains(&task.target) && !task.kind.is_shared_target() {
            continue;
        }
        reserved.insert(task.target);
        assigned.insert(candidate.agent, task);
        if assigned.len() == agent_ids.len() {
            break;
        }
    }

    *sticky = assigned
        .iter()
        .map(|(&id, task)| (id, (task.kind, task.target)))
        .collect();
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskMeta;
    use crate::types::{Food, FoodType, Item, Plate};

    fn snapshot_with(agents: &[(u32, Location, Option<Item>)]) -> WorldSnapshot {
        let mut snap = WorldSnapshot {
            money: 100,
            ..WorldSnapshot::default()
        };
        for (id, position, holding) in agents {
            snap.agents.insert(
                AgentId(*id),
                AgentState {
                    id: AgentId(*id),
                    position: *position,
                    holding: holding.clone(),
                },
            );
        }
        snap
    }

    fn ids(snap: &WorldSnapshot) -> Vec<AgentId> {
        snap.agents.keys().copied().collect()
    }

    #[test]
    fn score_combines_priority_distance_and_stickiness() {
        let config = EngineConfig::default();
        let agent = AgentState {
            id: AgentId(1),
            position: Location::new(0, 0),
            holding: None,
        };
        let task = Task::new(TaskKind::Chop, Location::new(4, 2), 60);
        assert_eq!(task_score(&agent, &task, None, &config), 6000 - 3);
        let last = (TaskKind::Chop, Location::new(4, 2));
        assert_eq!(task_score(&agent, &task, Some(&last), &config), 6000 - 3 + 25);
        let other = (TaskKind::Chop, Location::new(4, 3));
        assert_eq!(task_score(&agent, &task, Some(&other), &config), 6000 - 3);

        let adjacent = Task::new(TaskKind::Chop, Location::new(1, 1), 60);
        assert_eq!(task_score(&agent, &adjacent, None, &config), 6000);
    }

    #[test]
    fn infeasible_pairs_are_never_assigned() {
        let snap = snapshot_with(&[(1, Location::new(0, 0), None)]);
        let tasks = [Task::new(TaskKind::Submit, Location::new(1, 0), 90)];
        let mut sticky = StickinessCache::new();
        let out = assign_tasks(&snap, &tasks, &ids(&snap), &mut sticky, &EngineConfig::default());
        assert!(out.is_empty());
        assert!(sticky.is_empty());
    }

    #[test]
    fn one_submit_tile_one_submitter() {
        let plate = Some(Item::Plate(Plate {
            foods: [FoodType::Sauce.finished()].into_iter().collect(),
            dirty: false,
        }));
        let snap = snapshot_with(&[
            (1, Location::new(1, 1), plate.clone()),
            (2, Location::new(2, 1), plate),
        ]);
        let submit = Location::new(1, 0);
        let tasks = [
            Task::new(TaskKind::Submit, submit, 90),
            Task::new(TaskKind::PlacePlate, Location::new(3, 0), 55),
        ];
        let mut sticky = StickinessCache::new();
        let out = assign_tasks(&snap, &tasks, &ids(&snap), &mut sticky, &EngineConfig::default());
        assert_eq!(out[&AgentId(1)].kind, TaskKind::Submit);
        assert_eq!(out[&AgentId(2)].kind, TaskKind::PlacePlate);
    }

    #[test]
    fn no_target_is_double_booked() {
        let snap = snapshot_with(&[
            (1, Location::new(0, 0), None),
            (2, Location::new(5, 5), None),
            (3, Location::new(2, 2), None),
        ]);
        let tasks = [
            Task::new(TaskKind::Chop, Location::new(1, 1), 60),
            Task::new(TaskKind::PickupFood, Location::new(1, 1), 65),
            Task::new(TaskKind::BuyPlate, Location::new(6, 6), 50),
        ];
        let mut sticky = StickinessCache::new();
        let out = assign_tasks(&snap, &tasks, &ids(&snap), &mut sticky, &EngineConfig::default());
        let mut targets: Vec<Location> = out.values().map(|t| t.target).collect();
        let before = targets.len();
        targets.sort();
        targets.dedup();
        assert_eq!(targets.len(), before);
        assert_eq!(out.len(), 2);
        assert_eq!(out[&AgentId(1)].kind, TaskKind::PickupFood);
        assert_eq!(out[&AgentId(2)].kind, TaskKind::BuyPlate);
    }

    #[test]
    fn trash_and_sink_are_shared() {
        let burnt = Some(Item::Food(Food {
            stage: crate::types::CookStage::Burnt,
            ..Food::raw(FoodType::Egg)
        }));
        let snap = snapshot_with(&[
            (1, Location::new(0, 0), burnt.clone()),
            (2, Location::new(0, 1), burnt),
            (3, Location::new(3, 3), None),
            (4, Location::new(3, 4), None),
        ]);
        let trash = Location::new(1, 0);
        let sink = Location::new(4, 4);
        let tasks = [
            Task::new(TaskKind::Trash, trash, 85),
            Task::new(TaskKind::WashSink, sink, 10),
        ];
        let mut sticky = StickinessCache::new();
        let out = assign_tasks(&snap, &tasks, &ids(&snap), &mut sticky, &EngineConfig::default());
        assert_eq!(out[&AgentId(1)].target, trash);
        assert_eq!(out[&AgentId(2)].target, trash);
        assert_eq!(out[&AgentId(3)].target, sink);
        assert_eq!(out[&AgentId(4)].target, sink);
    }

    #[test]
    fn stickiness_breaks_near_ties_and_is_refreshed() {
        let snap = snapshot_with(&[(1, Location::new(2, 2), None)]);
        let near = Location::new(3, 2);
        let far = Location::new(2, 7);
        let tasks = [
            Task::new(TaskKind::BuyFood, near, 40).with_meta(TaskMeta::food(FoodType::Egg)),
            Task::new(TaskKind::BuyFood, far, 40).with_meta(TaskMeta::food(FoodType::Egg)),
        ];
        let mut sticky = StickinessCache::new();
        let config = EngineConfig::default();

        let out = assign_tasks(&snap, &tasks, &ids(&snap), &mut sticky, &config);
        assert_eq!(out[&AgentId(1)].target, near);
        assert_eq!(sticky[&AgentId(1)], (TaskKind::BuyFood, near));

        // Last turn's far target is four tiles worse but 25 points stickier.
        sticky.insert(AgentId(1), (TaskKind::BuyFood, far));
        let out = assign_tasks(&snap, &tasks, &ids(&snap), &mut sticky, &config);
        assert_eq!(out[&AgentId(1)].target, far);
    }

    #[test]
    fn unassigned_agents_leave_the_cache() {
        let snap = snapshot_with(&[(1, Location::new(0, 0), None)]);
        let mut sticky = StickinessCache::new();
        sticky.insert(AgentId(1), (TaskKind::Chop, Location::new(1, 1)));
        let out = assign_tasks(&snap, &[], &ids(&snap), &mut sticky, &EngineConfig::default());
        assert!(out.is_empty());
        assert!(sticky.is_empty());
    }
}
