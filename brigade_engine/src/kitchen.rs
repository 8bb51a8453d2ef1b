// The simulator boundary: live reads and atomic action primitives.
//
// The engine never owns game state. Each turn it reads everything it needs
// through the `Kitchen` trait and writes back only through `Kitchen::act`,
// one `Action` per agent. Reads are side-effect free and may be repeated;
// actions are single-turn calls that report success or failure and are never
// retried within the same turn.
//
// Every `Action` except `Move` names the tile it operates on. The simulator
// requires the acting agent to be Chebyshev-adjacent to that tile, and the
// executor checks this before calling `act`.
//
// See also: `snapshot.rs` which performs the reads, `executor.rs` which
// issues the actions, `task.rs` which maps task kinds to actions.

use crate::types::{AgentId, AgentState, FoodType, Location, Order, Step, TileContents};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something the shop sells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Buyable {
    Food(FoodType),
    Plate,
    Pan,
}

impl fmt::Display for Buyable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Buyable::Food(ft) => write!(f, "{ft}"),
            Buyable::Plate => f.write_str("PLATE"),
            Buyable::Pan => f.write_str("PAN"),
        }
    }
}

/// A single-turn action primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Unit step; never `Step::STAY`.
    Move { step: Step },
    Buy { item: Buyable, at: Location },
    /// Put the held item on a counter, cooker or sink table.
    Place { at: Location },
    Pickup { at: Location },
    Chop { at: Location },
    TakeFromPan { at: Location },
    /// Either put the held food on the plate at `at`, or pull the food at
    /// `at` onto the held plate.
    AddFoodToPlate { at: Location },
    TakeCleanPlate { at: Location },
    PutDirtyPlateInSink { at: Location },
    WashSink { at: Location },
    Submit { at: Location },
    Trash { at: Location },
}

impl Action {
    /// The tile this action operates on, or `None` for a move.
    pub fn target(&self) -> Option<Location> {
        match *self {
            Action::Move { .. } => None,
            Action::Buy { at, .. }
            | Action::Place { at }
            | Action::Pickup { at }
            | Action::Chop { at }
            | Action::TakeFromPan { at }
            | Action::AddFoodToPlate { at }
            | Action::TakeCleanPlate { at }
            | Action::PutDirtyPlateInSink { at }
            | Action::WashSink { at }
            | Action::Submit { at }
            | Action::Trash { at } => Some(at),
        }
    }
}

/// Everything the engine needs from the game simulator, for one team.
pub trait Kitchen {
    fn turn(&self) -> u32;

    fn money(&self) -> i64;

    /// Orders currently listed for the team, including inactive ones.
    fn orders(&self) -> Vec<Order>;

    fn agent_ids(&self) -> Vec<AgentId>;

    /// Live state of one agent, or `None` if the id is unknown.
    fn agent(&self, id: AgentId) -> Option<AgentState>;

    /// Live contents of the tile at `at`, or `None` for non-station cells.
    fn tile(&self, at: Location) -> Option<TileContents>;

    /// Perform one action for `agent`. Returns whether the simulator
    /// accepted it.
    fn act(&mut self, agent: AgentId, action: Action) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_has_no_target() {
        let action = Action::Move {
            step: Step { dx: 1, dy: 0 },
        };
        assert_eq!(action.target(), None);
    }

    #[test]
    fn station_actions_report_their_tile() {
        let at = Location::new(4, 2);
        let actions = [
            Action::Buy {
                item: Buyable::Pan,
                at,
            },
            Action::Chop { at },
            Action::WashSink { at },
            Action::Submit { at },
        ];
        for action in actions {
            assert_eq!(action.target(), Some(at));
        }
    }

    #[test]
    fn action_serialization_roundtrip() {
        let action = Action::Buy {
            item: Buyable::Food(FoodType::Meat),
            at: Location::new(1, 0),
        };
        let json = serde_json::to_string(&action).unwrap();
        let restored: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, restored);
    }
}
