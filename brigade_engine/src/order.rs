// Order selection: which customer order the team works on.
//
// The selector is a two-state machine over `SchedulerState::current_order`:
//
//   locked(K)  --K still active-->        locked(K)
//   locked(K)  --K gone from active list--> re-select
//   unlocked   --any active order-->      locked(best)
//   any        --no active orders-->      unlocked, returns None
//
// Switching mid-assembly wastes whatever was already bought for the locked
// order, so a locked order is kept even when a better one appears. The one
// exception is the optional `order_switch_margin` in `EngineConfig`.
//
// Scoring (see `order_score`):
//
//   missing_cost = sum of buy prices of required ingredients not already
//                  available (in hand, on a counter, in a pan)
//                  + plate price if no clean plate is reachable
//   penalty      = affordability_penalty if missing_cost > money < 0
//   score        = (reward - missing_cost - penalty) / max(1, expires - now)
//
// See also: `snapshot.rs` for the availability queries, `scheduler.rs` which
// owns the lock.

use crate::config::EngineConfig;
use crate::kitchen::Buyable;
use crate::snapshot::WorldSnapshot;
use crate::types::{FoodType, Order, OrderId};
use std::collections::BTreeMap;

/// What the selector decided this turn.
#[derive(Clone, Debug, PartialEq)]
pub enum OrderChoice {
    /// The locked order is still active and was kept.
    Kept(Order),
    /// A new order was locked (first pick, or the old one disappeared, or
    /// the switch margin was exceeded).
    Selected { order: Order, score: f64 },
    /// No active orders; the team idles.
    NoneActive,
}

impl OrderChoice {
    pub fn order(&self) -> Option<&Order> {
        match self {
            OrderChoice::Kept(order) | OrderChoice::Selected { order, .. } => Some(order),
            OrderChoice::NoneActive => None,
        }
    }
}

/// Cost of buying whatever the order still needs.
pub fn missing_cost(order: &Order, snapshot: &WorldSnapshot, config: &EngineConfig) -> i64 {
    let available = snapshot.available_food_counts();

    let mut needed: BTreeMap<FoodType, usize> = BTreeMap::new();
    for ft in order.required_foods() {
        *needed.entry(ft).or_default() += 1;
    }

    let mut cost: i64 = 0;
    for (ft, count) in needed {
        let have = available.get(&ft).copied().unwrap_or(0);
        let missing = count.saturating_sub(have) as i64;
        if missing > 0 {
            cost = cost.saturating_add(config.prices.price(Buyable::Food(ft)).saturating_mul(missing));
        }
    }
    if !snapshot.has_accessible_plate() {
        cost = cost.saturating_add(config.prices.plate);
    }
    cost
}

/// Greedy value-per-turn estimate for an order.
pub fn order_score(order: &Order, snapshot: &WorldSnapshot, config: &EngineConfig) -> f64 {
    let cost = missing_cost(order, snapshot, config);
    let penalty = if cost > snapshot.money && snapshot.money < 0 {
        config.affordability_penalty
    } else {
        0.0
    };
    let time_left = (i64::from(order.expires_turn) - i64::from(snapshot.turn)).max(1);
    (order.reward as f64 - cost as f64 - penalty) / time_left as f64
}

/// Choose this turn's order and update the lock in `current`.
pub fn select_order(
    current: &mut Option<OrderId>,
    orders: &[Order],
    snapshot: &WorldSnapshot,
    config: &EngineConfig,
) -> OrderChoice {
    let active: Vec<&Order> = orders.iter().filter(|o| o.active).collect();
    if active.is_empty() {
        *current = None;
        return OrderChoice::NoneActive;
    }

    let scored: Vec<(f64, &Order)> = active
        .iter()
        .map(|&o| (order_score(o, snapshot, config), o))
        .collect();

    // First maximum wins ties, so listing order breaks them.
    let mut best = scored[0];
    for &candidate in &scored[1..] {
        if candidate.0 > best.0 {
            best = candidate;
        }
    }

    if let Some(locked_id) = *current {
        if let Some(&(locked_score, locked)) = scored.iter().find(|(_, o)| o.id == locked_id) {
            let switch = match config.order_switch_margin {
                None => false,
                Some(margin) => {
                    best.1.id != locked_id && best.0 > locked_score + margin * locked_score.abs()
                }
            };
            if !switch {
                return OrderChoice::Kept(locked.clone());
            }
        }
    }

    let (score, order) = best;
    *current = Some(order.id);
    OrderChoice::Selected {
        order: order.clone(),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentId, AgentState, Food, Item, Location, Plate, TileContents};

    fn order(id: u32, required: &[&str], reward: i64, expires_turn: u32) -> Order {
        Order {
            id: OrderId(id),
            required: required.iter().map(|s| s.to_string()).collect(),
            reward,
            expires_turn,
            active: true,
        }
    }

    fn scenario_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.prices.foods.insert(FoodType::Meat, 10);
        config.prices.foods.insert(FoodType::Onions, 5);
        config.prices.plate = 2;
        config
    }

    fn snapshot(turn: u32, money: i64) -> WorldSnapshot {
        WorldSnapshot {
            turn,
            money,
            ..WorldSnapshot::default()
        }
    }

    #[test]
    fn missing_cost_matches_worked_example() {
        let config = scenario_config();
        let snap = snapshot(10, 20);
        let o = order(1, &["MEAT", "ONIONS"], 57, 30);
        assert_eq!(missing_cost(&o, &snap, &config), 17);
        assert_eq!(order_score(&o, &snap, &config), (57.0 - 17.0) / 20.0);
    }

    #[test]
    fn available_food_and_plate_reduce_cost() {
        let config = scenario_config();
        let mut snap = snapshot(0, 20);
        snap.agents.insert(
            AgentId(1),
            AgentState {
                id: AgentId(1),
                position: Location::new(0, 0),
                holding: Some(Item::Food(Food::raw(FoodType::Meat))),
            },
        );
        snap.counters.insert(
            Location::new(3, 3),
            TileContents::holding(Item::Plate(Plate::clean())),
        );
        let o = order(1, &["MEAT", "ONIONS", "ONIONS"], 40, 10);
        assert_eq!(missing_cost(&o, &snap, &config), 10);
    }

    #[test]
    fn debt_triggers_affordability_penalty() {
        let config = scenario_config();
        let snap = snapshot(0, -5);
        let o = order(1, &["MEAT"], 100, 1);
        let score = order_score(&o, &snap, &config);
        assert_eq!(score, 100.0 - 12.0 - config.affordability_penalty);

        let solvent = snapshot(0, 5);
        assert_eq!(order_score(&o, &solvent, &config), 88.0);
    }

    #[test]
    fn expired_deadline_divides_by_one() {
        let config = scenario_config();
        let snap = snapshot(50, 100);
        let o = order(1, &["ONIONS"], 27, 40);
        assert_eq!(order_score(&o, &snap, &config), 20.0);
    }

    #[test]
    fn selects_highest_score_and_locks() {
        let config = scenario_config();
        let snap = snapshot(0, 100);
        let orders = vec![order(1, &["MEAT"], 20, 10), order(2, &["ONIONS"], 50, 10)];
        let mut current = None;
        let choice = select_order(&mut current, &orders, &snap, &config);
        assert_eq!(choice.order().map(|o| o.id), Some(OrderId(2)));
        assert!(matches!(choice, OrderChoice::Selected { .. }));
        assert_eq!(current, Some(OrderId(2)));
    }

    #[test]
    fn locked_order_is_kept_when_better_one_appears() {
        let config = scenario_config();
        let snap = snapshot(0, 100);
        let mut current = Some(OrderId(1));
        let orders = vec![order(1, &["MEAT"], 20, 10), order(2, &["ONIONS"], 500, 10)];
        for _ in 0..3 {
            let choice = select_order(&mut current, &orders, &snap, &config);
            assert!(matches!(&choice, OrderChoice::Kept(o) if o.id == OrderId(1)));
        }
        assert_eq!(current, Some(OrderId(1)));
    }

    #[test]
    fn lock_released_when_order_leaves_active_list() {
        let config = scenario_config();
        let snap = snapshot(0, 100);
        let mut current = Some(OrderId(1));
        let mut orders = vec![order(1, &["MEAT"], 20, 10), order(2, &["ONIONS"], 50, 10)];
        orders[0].active = false;
        let choice = select_order(&mut current, &orders, &snap, &config);
        assert_eq!(choice.order().map(|o| o.id), Some(OrderId(2)));
        assert_eq!(current, Some(OrderId(2)));
    }

    #[test]
    fn no_active_orders_unlocks() {
        let config = scenario_config();
        let snap = snapshot(0, 100);
        let mut current = Some(OrderId(1));
        let mut orders = vec![order(1, &["MEAT"], 20, 10)];
        orders[0].active = false;
        assert_eq!(
            select_order(&mut current, &orders, &snap, &config),
            OrderChoice::NoneActive
        );
        assert_eq!(current, None);
    }

    #[test]
    fn switch_margin_allows_much_better_order() {
        let mut config = scenario_config();
        config.order_switch_margin = Some(0.5);
        let snap = snapshot(0, 100);
        let mut current = Some(OrderId(1));

        // 1: (20 - 12) / 10 = 0.8; 2: (16 - 7) / 10 = 0.9 -> within margin.
        let orders = vec![order(1, &["MEAT"], 20, 10), order(2, &["ONIONS"], 16, 10)];
        let choice = select_order(&mut current, &orders, &snap, &config);
        assert!(matches!(choice, OrderChoice::Kept(_)));

        // 2: (57 - 7) / 10 = 5.0 -> beyond 0.8 * 1.5.
        let orders = vec![order(1, &["MEAT"], 20, 10), order(2, &["ONIONS"], 57, 10)];
        let choice = select_order(&mut current, &orders, &snap, &config);
        assert_eq!(choice.order().map(|o| o.id), Some(OrderId(2)));
        assert_eq!(current, Some(OrderId(2)));
    }
}
