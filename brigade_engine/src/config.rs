// Data-driven engine configuration.
//
// All tunable scheduling parameters live in `EngineConfig`: task priorities,
// shop prices, the stickiness bonus, the affordability penalty and the
// optional order-switch margin. The engine reads numbers from here rather
// than from literals, so balance changes are a JSON edit.
//
// `EngineConfig::from_json` accepts partial documents: any field left out
// falls back to the `Default` value. The loaded config is validated (every
// food has a price, no price is negative) before it is returned.
//
// See also: `order.rs` (prices, penalty, switch margin), `task_gen.rs`
// (priorities, pipeline breadth), `assign.rs` (stickiness bonus).

use crate::kitchen::Buyable;
use crate::types::FoodType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no shop price configured for {0}")]
    MissingPrice(FoodType),
    #[error("negative shop price {price} for {item}")]
    NegativePrice { item: Buyable, price: i64 },
}

/// What the shop charges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopPrices {
    pub plate: i64,
    pub pan: i64,
    pub foods: BTreeMap<FoodType, i64>,
}

impl ShopPrices {
    /// Price of `item`. Foods without an entry are treated as unaffordable.
    pub fn price(&self, item: Buyable) -> i64 {
        match item {
            Buyable::Plate => self.plate,
            Buyable::Pan => self.pan,
            Buyable::Food(ft) => self.foods.get(&ft).copied().unwrap_or(i64::MAX),
        }
    }
}

impl Default for ShopPrices {
    fn default() -> Self {
        let foods = BTreeMap::from([
            (FoodType::Egg, 20),
            (FoodType::Onions, 30),
            (FoodType::Meat, 80),
            (FoodType::Noodles, 40),
            (FoodType::Sauce, 10),
        ]);
        Self {
            plate: 2,
            pan: 4,
            foods,
        }
    }
}

/// Base priority of each task kind. Higher wins; the assignment score is
/// `priority * 100 - distance`, so one priority point outweighs 99 tiles of
/// travel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPriorities {
    pub take_from_pan: i64,
    pub take_burnt_from_pan: i64,
    pub submit: i64,
    pub trash_burnt: i64,
    /// Clearing a plate that can no longer become the locked order.
    pub discard_plate: i64,
    pub add_held_food_to_plate: i64,
    pub pickup_plate: i64,
    pub add_counter_food_to_held_plate: i64,
    pub place_pan: i64,
    pub place_in_cooker: i64,
    pub pickup_food: i64,
    pub place_plate_assembly: i64,
    pub place_plate_any: i64,
    pub chop: i64,
    pub place_for_chop: i64,
    pub take_clean_plate: i64,
    pub buy_plate: i64,
    pub pickup_pan: i64,
    pub buy_pan: i64,
    pub buy_food: i64,
    pub put_dirty_plate_in_sink: i64,
    pub stash: i64,
    /// Trashing held food the order has no use for, or that has nowhere to go.
    pub discard_held: i64,
    pub wash_sink: i64,
}

impl Default for TaskPriorities {
    fn default() -> Self {
        Self {
            take_from_pan: 100,
            take_burnt_from_pan: 95,
            submit: 90,
            trash_burnt: 85,
            discard_plate: 85,
            add_held_food_to_plate: 80,
            pickup_plate: 80,
            add_counter_food_to_held_plate: 75,
            place_pan: 72,
            place_in_cooker: 70,
            pickup_food: 65,
            place_plate_assembly: 60,
            place_plate_any: 55,
            chop: 60,
            place_for_chop: 60,
            take_clean_plate: 55,
            buy_plate: 50,
            pickup_pan: 48,
            buy_pan: 45,
            buy_food: 40,
            put_dirty_plate_in_sink: 20,
            stash: 15,
            discard_held: 12,
            wash_sink: 10,
        }
    }
}

/// Top-level engine configuration. Loaded once, never mutated mid-game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub prices: ShopPrices,
    pub priorities: TaskPriorities,

    /// Added to an (agent, task) score when the agent held exactly this
    /// (kind, target) last turn.
    pub stickiness_bonus: i64,

    /// Subtracted from an order's score when its missing ingredients cost more
    /// than the team has and the team is already in debt.
    pub affordability_penalty: f64,

    /// `None` keeps the locked order until it leaves the active list. `Some(m)`
    /// abandons it for an order scoring above `current + m * |current|`.
    pub order_switch_margin: Option<f64>,

    /// How many missing ingredients get pipeline tasks (buy, chop, cook) in a
    /// single turn, highest-priority first.
    pub pipeline_ingredients: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prices: ShopPrices::default(),
            priorities: TaskPriorities::default(),
            stickiness_bonus: 25,
            affordability_penalty: 100_000.0,
            order_switch_margin: None,
            pipeline_ingredients: 2,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for ft in FoodType::ALL {
            if !self.prices.foods.contains_key(&ft) {
                return Err(ConfigError::MissingPrice(ft));
            }
        }
        let items = FoodType::ALL
            .into_iter()
            .map(Buyable::Food)
            .chain([Buyable::Plate, Buyable::Pan]);
        for item in items {
            let price = self.prices.price(item);
            if price < 0 {
                return Err(ConfigError::NegativePrice { item, price });
            }
        }
        Ok(())
    }
}
