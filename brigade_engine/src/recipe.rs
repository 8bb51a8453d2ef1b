// Recipes: what each food needs and when a plate satisfies an order.
//
// Every `FoodType` has fixed processing flags (`needs_chop`, `needs_cook`).
// An order ingredient is satisfied by a food of that type that has been
// chopped iff the type needs chopping and cooked (stage 1, not burnt) iff it
// needs cooking. A food that needs no cooking must still be raw.
//
// Plates are compared to orders through *signatures*: the multiset of
// `(name, chopped, cook stage)` tuples. Signatures are sorted before
// comparison, so neither the order's ingredient list nor the plate's food
// order matters.
//
// See also: `order.rs` which costs missing ingredients, `task_gen.rs` which
// drives the chop/cook pipeline from these flags.

use crate::types::{CookStage, Food, FoodType, Plate};
use std::collections::BTreeMap;

impl FoodType {
    pub fn needs_chop(self) -> bool {
        matches!(self, FoodType::Onions | FoodType::Meat)
    }

    pub fn needs_cook(self) -> bool {
        matches!(self, FoodType::Egg | FoodType::Meat)
    }

    /// The state a food of this type must reach before it goes on a plate.
    pub fn finished(self) -> Food {
        Food {
            kind: self,
            chopped: self.needs_chop(),
            stage: if self.needs_cook() {
                CookStage::Cooked
            } else {
                CookStage::Raw
            },
        }
    }

    /// Pipeline ordering: cook-required ingredients first (they take
    /// longest), then chop-only, then ready-to-plate.
    pub fn pipeline_rank(self) -> (bool, bool) {
        (!self.needs_cook(), !self.needs_chop())
    }
}

/// One element of a plate signature.
pub type FoodSignature = (&'static str, bool, u8);

fn food_signature(food: &Food) -> FoodSignature {
    (food.kind.name(), food.chopped, food.stage.as_index())
}

/// Sorted signature an order's ingredients require.
pub fn order_signature(required: &[FoodType]) -> Vec<FoodSignature> {
    let mut sig: Vec<FoodSignature> = required
        .iter()
        .map(|ft| food_signature(&ft.finished()))
        .collect();
    sig.sort_unstable();
    sig
}

/// Sorted signature of a plate's current contents.
pub fn plate_signature(plate: &Plate) -> Vec<FoodSignature> {
    let mut sig: Vec<FoodSignature> = plate.foods.iter().map(food_signature).collect();
    sig.sort_unstable();
    sig
}

/// True when the plate holds exactly the required ingredients, fully
/// processed, in any order.
pub fn plate_matches_order(plate: &Plate, required: &[FoodType]) -> bool {
    plate_signature(plate) == order_signature(required)
}

/// True when everything already on the plate is part of the order, so the
/// plate can still be completed by adding food. An empty plate always fits.
pub fn plate_fits_order(plate: &Plate, required: &[FoodType]) -> bool {
    let mut wanted: BTreeMap<FoodSignature, usize> = BTreeMap::new();
    for sig in order_signature(required) {
        *wanted.entry(sig).or_default() += 1;
    }
    plate
        .foods
        .iter()
        .all(|food| match wanted.get_mut(&food_signature(food)) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        })
}

/// True when `food` is ready to go on a plate as `requirement`.
pub fn food_satisfies(food: &Food, requirement: FoodType) -> bool {
    *food == requirement.finished()
}

/// Required ingredients the plate does not yet carry, in order-list order.
/// With no plate, everything is missing.
pub fn missing_ingredients(required: &[FoodType], plate: Option<&Plate>) -> Vec<FoodType> {
    let Some(plate) = plate else {
        return required.to_vec();
    };

    let mut on_plate: BTreeMap<FoodSignature, usize> = BTreeMap::new();
    for food in &plate.foods {
        *on_plate.entry(food_signature(food)).or_default() += 1;
    }

    let mut missing = Vec::new();
    for &ft in required {
        let key = food_signature(&ft.finished());
        match on_plate.get_mut(&key) {
            Some(count) if *count > 0 => *count -= 1,
            _ => missing.push(ft),
        }
    }
    missing
}
