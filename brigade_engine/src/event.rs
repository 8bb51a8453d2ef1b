// Turn events: the narrative record of what the scheduler decided and did.
//
// `Scheduler::play_turn` returns a `TurnReport` listing, in order: the order
// decision, every assignment, then one outcome per agent (action, move,
// wait, stall) in ascending agent id. Nothing in the engine reads these back;
// they exist for logging, debugging and tests.
//
// See also: `scheduler.rs` which emits order and assignment events,
// `executor.rs` which emits per-agent outcomes.

use crate::kitchen::Action;
use crate::task::TaskKind;
use crate::types::{AgentId, Location, OrderId, Step};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TurnEvent {
    /// A new order was locked.
    OrderSelected { order: OrderId, score: f64 },
    /// The locked order is still active and was kept.
    OrderKept { order: OrderId },
    /// No active orders; the team idles this turn.
    NoActiveOrder,
    Assigned {
        agent: AgentId,
        kind: TaskKind,
        target: Location,
        priority: i64,
    },
    /// An action primitive was invoked. `success` is the simulator's answer.
    Acted {
        agent: AgentId,
        action: Action,
        success: bool,
    },
    Moved {
        agent: AgentId,
        step: Step,
        success: bool,
    },
    /// Adjacent to its target with nothing to do (idle spot reached).
    Waiting { agent: AgentId },
    /// No path to the target this turn.
    Stalled { agent: AgentId, target: Location },
    /// No assignment and no quiet tile to walk to.
    NoIdleSpot { agent: AgentId },
}

impl TurnEvent {
    pub fn agent(&self) -> Option<AgentId> {
        match *self {
            TurnEvent::Assigned { agent, .. }
            | TurnEvent::Acted { agent, .. }
            | TurnEvent::Moved { agent, .. }
            | TurnEvent::Waiting { agent }
            | TurnEvent::Stalled { agent, .. }
            | TurnEvent::NoIdleSpot { agent } => Some(agent),
            TurnEvent::OrderSelected { .. } | TurnEvent::OrderKept { .. } | TurnEvent::NoActiveOrder => {
                None
            }
        }
    }
}

/// Everything that happened in one `play_turn` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: u32,
    /// The order the team worked on, if any.
    pub order: Option<OrderId>,
    pub events: Vec<TurnEvent>,
}

impl TurnReport {
    /// Every action primitive invoked this turn, with its result.
    pub fn actions(&self) -> impl Iterator<Item = (AgentId, Action, bool)> + '_ {
        self.events.iter().filter_map(|event| match *event {
            TurnEvent::Acted {
                agent,
                action,
                success,
            } => Some((agent, action, success)),
            _ => None,
        })
    }

    /// The assignment made to `agent` this turn.
    pub fn assignment(&self, agent: AgentId) -> Option<(TaskKind, Location)> {
        self.events.iter().find_map(|event| match *event {
            TurnEvent::Assigned {
                agent: a,
                kind,
                target,
                ..
            } if a == agent => Some((kind, target)),
            _ => None,
        })
    }
}
