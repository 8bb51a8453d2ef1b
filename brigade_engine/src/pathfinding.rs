// Breadth-first pathfinding on the 8-connected kitchen grid.
//
// Every move costs one turn, diagonals included, so plain BFS gives shortest
// step counts. The search ends at the first cell Chebyshev-adjacent to the
// target (agents act on stations from a neighbouring cell, and stations are
// never walkable) and returns only the first move of that path: the
// executor replans from scratch every turn.
//
// `blocked` holds cells other agents have committed to this turn. They are
// forbidden for the first move only; deeper path cells may pass through them
// because those agents will have moved on by the time this one arrives.
// Neighbours are expanded in `Step::MOVES` order (dx-major, then dy), which
// fixes tie-breaking between equally short paths.
//
// See also: `grid.rs` for walkability, `executor.rs` which threads the
// blocked set between agents.
//
// **Critical constraint: determinism.** The result is a pure function of the
// grid, start, target and blocked set. The visited set is membership-only;
// queue order alone decides which path wins.

use crate::grid::GridMap;
use crate::types::{Location, Step};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// First move toward `target`.
///
/// Returns `Some(Step::STAY)` when `start` is already adjacent to the target,
/// `Some(step)` with a non-zero unit move otherwise, and `None` when no
/// adjacent cell is reachable.
pub fn first_step(
    grid: &GridMap,
    start: Location,
    target: Location,
    blocked: &FxHashSet<Location>,
) -> Option<Step> {
    if start.is_adjacent(target) {
        return Some(Step::STAY);
    }

    let mut queue: VecDeque<(Location, Option<Step>)> = VecDeque::new();
    let mut visited: FxHashSet<Location> = FxHashSet::default();
    queue.push_back((start, None));
    visited.insert(start);

    while let Some((at, first)) = queue.pop_front() {
        if at.is_adjacent(target) {
            return Some(first.unwrap_or(Step::STAY));
        }
        for step in Step::MOVES {
            let next = at.offset(step);
            if visited.contains(&next) || !grid.is_walkable(next) {
                continue;
            }
            if first.is_none() && blocked.contains(&next) {
                continue;
            }
            visited.insert(next);
            queue.push_back((next, Some(first.unwrap_or(step))));
        }
    }
    None
}

/// Nearest walkable cell (BFS order from `start`, `start` included) that is
/// not adjacent to any location in `avoid`. Idle agents walk there so they
/// stay out of the way of shops, submit stations and cookers.
pub fn idle_target(grid: &GridMap, start: Location, avoid: &[Location]) -> Option<Location> {
    let mut queue: VecDeque<Location> = VecDeque::new();
    let mut visited: FxHashSet<Location> = FxHashSet::default();
    queue.push_back(start);
    visited.insert(start);

    while let Some(at) = queue.pop_front() {
        if grid.is_walkable(at) && !avoid.iter().any(|&busy| at.is_adjacent(busy)) {
            return Some(at);
        }
        for step in Step::MOVES {
            let next = at.offset(step);
            if visited.contains(&next) || !grid.is_walkable(next) {
                continue;
            }
            visited.insert(next);
            queue.push_back(next);
        }
    }
    None
}
