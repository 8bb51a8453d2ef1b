// Tasks: per-turn units of physical work.
//
// A `Task` names a kind, a target tile, a priority and kind-specific
// metadata. Tasks are generated fresh every turn by `task_gen.rs`, consumed
// the same turn by `assign.rs` and then dropped; nothing about a task
// survives the turn except the (kind, target) pair the assignment engine
// remembers for stickiness.
//
// Everything kind-specific lives in one table, `TaskKind::rule`:
//
// - `hands`  what the agent must be holding for the task to be feasible;
// - `buys`   what the shop must sell the team (money check);
// - `shared` whether several agents may target the same tile this turn
//            (trash cans and sinks tolerate crowding);
// - `action` which primitive to invoke once the agent is adjacent.
//
// Adding a task kind means adding an enum variant and one `rule` arm.
//
// See also: `task_gen.rs` which creates tasks, `assign.rs` which checks
// feasibility through `Task::is_feasible_for`, `executor.rs` which calls
// `Task::action`.

use crate::config::ShopPrices;
use crate::kitchen::{Action, Buyable};
use crate::types::{AgentId, AgentState, FoodType, Item, Location};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskKind {
    BuyFood,
    BuyPlate,
    BuyPan,
    PlacePan,
    TakeCleanPlate,
    PlaceForChop,
    Chop,
    PickupFood,
    PlaceInCooker,
    TakeFromPan,
    /// Agent holds the food; the plate sits on the target counter.
    AddHeldFoodToPlate,
    /// Agent holds the plate; the food sits on the target counter.
    AddCounterFoodToHeldPlate,
    PlacePlate,
    PickupPlate,
    Submit,
    Trash,
    PutDirtyPlateInSink,
    WashSink,
    /// Put down a held item that has nowhere better to go, freeing the hands.
    Stash,
    /// Pick a spare pan up off a counter.
    PickupPan,
    /// Walk toward a quiet tile. Never generated, only synthesised by the
    /// executor for unassigned agents.
    Idle,
}

/// What an agent must be holding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hands {
    Empty,
    /// A food of the task's `meta.food` type (any food if the task names none).
    TaskFood,
    /// Anything at all; the task's `meta.holder` says whose hands.
    Holding,
    CleanPlate,
    DirtyPlate,
    Pan,
    Any,
}

/// What a buy task purchases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Purchase {
    Nothing,
    Plate,
    Pan,
    /// The task's `meta.food`.
    TaskFood,
}

/// One row of the task-kind dispatch table.
#[derive(Clone, Copy, Debug)]
pub struct KindRule {
    pub hands: Hands,
    pub buys: Purchase,
    pub shared: bool,
    pub action: fn(Location, &TaskMeta) -> Option<Action>,
}

fn buy_food(at: Location, meta: &TaskMeta) -> Option<Action> {
    meta.food.map(|ft| Action::Buy {
        item: Buyable::Food(ft),
        at,
    })
}

fn row(
    hands: Hands,
    buys: Purchase,
    shared: bool,
    action: fn(Location, &TaskMeta) -> Option<Action>,
) -> KindRule {
    KindRule {
        hands,
        buys,
        shared,
        action,
    }
}

impl TaskKind {
    pub fn rule(self) -> KindRule {
        use Hands as H;
        use Purchase as P;
        match self {
            TaskKind::BuyFood => row(H::Empty, P::TaskFood, false, buy_food),
            TaskKind::BuyPlate => row(H::Empty, P::Plate, false, |at, _| {
                Some(Action::Buy {
                    item: Buyable::Plate,
                    at,
                })
            }),
            TaskKind::BuyPan => row(H::Empty, P::Pan, false, |at, _| {
                Some(Action::Buy {
                    item: Buyable::Pan,
                    at,
                })
            }),
            TaskKind::PlacePan => row(H::Pan, P::Nothing, false, |at, _| {
                Some(Action::Place { at })
            }),
            TaskKind::TakeCleanPlate => row(H::Empty, P::Nothing, false, |at, _| {
                Some(Action::TakeCleanPlate { at })
            }),
            TaskKind::PlaceForChop => row(H::TaskFood, P::Nothing, false, |at, _| {
                Some(Action::Place { at })
            }),
            TaskKind::Chop => row(H::Empty, P::Nothing, false, |at, _| Some(Action::Chop { at })),
            TaskKind::PickupFood => row(H::Empty, P::Nothing, false, |at, _| {
                Some(Action::Pickup { at })
            }),
            TaskKind::PlaceInCooker => row(H::TaskFood, P::Nothing, false, |at, _| {
                Some(Action::Place { at })
            }),
            TaskKind::TakeFromPan => row(H::Empty, P::Nothing, false, |at, _| {
                Some(Action::TakeFromPan { at })
            }),
            TaskKind::AddHeldFoodToPlate => row(H::TaskFood, P::Nothing, false, |at, _| {
                Some(Action::AddFoodToPlate { at })
            }),
            TaskKind::AddCounterFoodToHeldPlate => row(H::CleanPlate, P::Nothing, false, |at, _| {
                Some(Action::AddFoodToPlate { at })
            }),
            TaskKind::PlacePlate => row(H::CleanPlate, P::Nothing, false, |at, _| {
                Some(Action::Place { at })
            }),
            TaskKind::PickupPlate => row(H::Empty, P::Nothing, false, |at, _| {
                Some(Action::Pickup { at })
            }),
            TaskKind::Submit => row(H::CleanPlate, P::Nothing, false, |at, _| {
                Some(Action::Submit { at })
            }),
            TaskKind::Trash => row(H::Holding, P::Nothing, true, |at, _| {
                Some(Action::Trash { at })
            }),
            TaskKind::PutDirtyPlateInSink => row(H::DirtyPlate, P::Nothing, false, |at, _| {
                Some(Action::PutDirtyPlateInSink { at })
            }),
            TaskKind::WashSink => row(H::Any, P::Nothing, true, |at, _| {
                Some(Action::WashSink { at })
            }),
            TaskKind::Stash => row(H::Holding, P::Nothing, false, |at, _| {
                Some(Action::Place { at })
            }),
            TaskKind::PickupPan => row(H::Empty, P::Nothing, false, |at, _| {
                Some(Action::Pickup { at })
            }),
            TaskKind::Idle => row(H::Any, P::Nothing, false, |_, _| None),
        }
    }

    /// Whether several agents may target the same tile in one turn.
    pub fn is_shared_target(self) -> bool {
        self.rule().shared
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Kind-specific detail carried by a task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMeta {
    /// The ingredient this task moves along the pipeline.
    pub food: Option<FoodType>,
    /// Set on take-from-pan tasks whose pan holds burnt food.
    pub burnt: bool,
    /// Restricts the task to one agent, e.g. submitting the plate it holds.
    pub holder: Option<AgentId>,
}

impl TaskMeta {
    pub fn food(ft: FoodType) -> Self {
        Self {
            food: Some(ft),
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub kind: TaskKind,
    pub target: Location,
    pub priority: i64,
    pub meta: TaskMeta,
}

impl Task {
    pub fn new(kind: TaskKind, target: Location, priority: i64) -> Self {
        Self {
            kind,
            target,
            priority,
            meta: TaskMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: TaskMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Feasibility check from the dispatch table: the agent's hands match
    /// and, for purchases, the team can pay.
    pub fn is_feasible_for(&self, agent: &AgentState, money: i64, prices: &ShopPrices) -> bool {
        if self.meta.holder.is_some_and(|id| id != agent.id) {
            return false;
        }
        let rule = self.kind.rule();
        self.hands_ok(rule.hands, agent) && self.purchase_ok(rule.buys, money, prices)
    }

    fn hands_ok(&self, hands: Hands, agent: &AgentState) -> bool {
        let holding = agent.holding.as_ref();
        match hands {
            Hands::Empty => holding.is_none(),
            Hands::Any => true,
            Hands::TaskFood => match holding {
                Some(Item::Food(food)) => self.meta.food.is_none_or(|ft| food.kind == ft),
                _ => false,
            },
            Hands::Holding => holding.is_some(),
            Hands::CleanPlate => matches!(holding, Some(Item::Plate(p)) if p.is_clean()),
            Hands::DirtyPlate => matches!(holding, Some(Item::Plate(p)) if p.dirty),
            Hands::Pan => matches!(holding, Some(Item::Pan(_))),
        }
    }

    fn purchase_ok(&self, buys: Purchase, money: i64, prices: &ShopPrices) -> bool {
        let item = match buys {
            Purchase::Nothing => return true,
            Purchase::Plate => Buyable::Plate,
            Purchase::Pan => Buyable::Pan,
            Purchase::TaskFood => match self.meta.food {
                Some(ft) => Buyable::Food(ft),
                None => return false,
            },
        };
        money >= prices.price(item)
    }

    /// The primitive to invoke once adjacent to the target. `None` for idle
    /// walks.
    pub fn action(&self) -> Option<Action> {
        (self.kind.rule().action)(self.target, &self.meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CookStage, Food, Pan, Plate};

    fn agent(holding: Option<Item>) -> AgentState {
        AgentState {
            id: AgentId(1),
            position: Location::new(0, 0),
            holding,
        }
    }

    fn prices() -> ShopPrices {
        ShopPrices::default()
    }

    #[test]
    fn submit_requires_clean_plate() {
        let task = Task::new(TaskKind::Submit, Location::new(3, 3), 90);
        assert!(task.is_feasible_for(&agent(Some(Item::Plate(Plate::clean()))), 0, &prices()));
        let dirty = Plate {
            dirty: true,
            ..Plate::clean()
        };
        assert!(!task.is_feasible_for(&agent(Some(Item::Plate(dirty))), 0, &prices()));
        assert!(!task.is_feasible_for(&agent(None), 0, &prices()));
    }

    #[test]
    fn buy_food_requires_empty_hands_and_money() {
        let task = Task::new(TaskKind::BuyFood, Location::new(1, 0), 40)
            .with_meta(TaskMeta::food(FoodType::Meat));
        let price = prices().price(Buyable::Food(FoodType::Meat));
        assert!(task.is_feasible_for(&agent(None), price, &prices()));
        assert!(!task.is_feasible_for(&agent(None), price - 1, &prices()));
        let holding = agent(Some(Item::Food(Food::raw(FoodType::Egg))));
        assert!(!task.is_feasible_for(&holding, price, &prices()));
    }

    #[test]
    fn task_food_must_match_held_food() {
        let task = Task::new(TaskKind::PlaceInCooker, Location::new(0, 1), 70)
            .with_meta(TaskMeta::food(FoodType::Meat));
        assert!(task.is_feasible_for(&agent(Some(Item::Food(Food::raw(FoodType::Meat)))), 0, &prices()));
        assert!(!task.is_feasible_for(&agent(Some(Item::Food(Food::raw(FoodType::Onions)))), 0, &prices()));
        assert!(!task.is_feasible_for(&agent(Some(Item::Pan(Pan::default()))), 0, &prices()));
    }

    #[test]
    fn holder_restricts_task_to_one_agent() {
        let task = Task::new(TaskKind::Submit, Location::new(3, 3), 90).with_meta(TaskMeta {
            holder: Some(AgentId(2)),
            ..TaskMeta::default()
        });
        let mut holder = agent(Some(Item::Plate(Plate::clean())));
        assert!(!task.is_feasible_for(&holder, 0, &prices()));
        holder.id = AgentId(2);
        assert!(task.is_feasible_for(&holder, 0, &prices()));
    }

    #[test]
    fn trash_needs_full_hands_of_its_holder() {
        let task = Task::new(TaskKind::Trash, Location::new(5, 5), 85).with_meta(TaskMeta {
            holder: Some(AgentId(1)),
            ..TaskMeta::default()
        });
        let burnt = Food {
            kind: FoodType::Egg,
            chopped: false,
            stage: CookStage::Burnt,
        };
        assert!(task.is_feasible_for(&agent(Some(Item::Food(burnt))), 0, &prices()));
        let stale = Plate {
            foods: [FoodType::Noodles.finished()].into_iter().collect(),
            dirty: false,
        };
        assert!(task.is_feasible_for(&agent(Some(Item::Plate(stale))), 0, &prices()));
        assert!(!task.is_feasible_for(&agent(None), 0, &prices()));

        let mut other = agent(Some(Item::Food(burnt)));
        other.id = AgentId(2);
        assert!(!task.is_feasible_for(&other, 0, &prices()));
    }

    #[test]
    fn only_trash_and_wash_targets_are_shared() {
        let shared: Vec<TaskKind> = [
            TaskKind::BuyFood,
            TaskKind::Submit,
            TaskKind::Trash,
            TaskKind::WashSink,
            TaskKind::Chop,
        ]
        .into_iter()
        .filter(|k| k.is_shared_target())
        .collect();
        assert_eq!(shared, vec![TaskKind::Trash, TaskKind::WashSink]);
    }

    #[test]
    fn actions_follow_kind() {
        let at = Location::new(2, 2);
        let buy = Task::new(TaskKind::BuyFood, at, 40).with_meta(TaskMeta::food(FoodType::Sauce));
        assert_eq!(
            buy.action(),
            Some(Action::Buy {
                item: Buyable::Food(FoodType::Sauce),
                at
            })
        );
        assert_eq!(
            Task::new(TaskKind::AddCounterFoodToHeldPlate, at, 75).action(),
            Some(Action::AddFoodToPlate { at })
        );
        assert_eq!(Task::new(TaskKind::Idle, at, 0).action(), None);
        assert_eq!(Task::new(TaskKind::BuyFood, at, 40).action(), None);
    }
}
