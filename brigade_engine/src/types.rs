// Core types shared across the engine.
//
// Defines grid coordinates (`Location`), agent and order identifiers, the
// closed item model (`Item` = Food | Pan | Plate), live tile contents, orders
// and per-turn agent state. Everything here is a plain value type that
// derives `Serialize`/`Deserialize`; nothing holds references into the
// simulator.
//
// The simulator owns item physics. In particular `CookStage` only ever
// advances Raw -> Cooked -> Burnt on the simulator's clock; this engine reads
// the stage and never writes it.
//
// See also: `recipe.rs` for the per-food processing flags and plate
// signatures, `kitchen.rs` for the collaborator trait that produces these
// values, `snapshot.rs` which captures them once per turn.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A cell of the kitchen grid. `x` grows east, `y` grows south.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: the number of 8-connected steps on an open grid.
    pub fn chebyshev(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    /// Manhattan distance.
    pub fn manhattan(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// True when `other` is this cell or one of its 8 neighbours. Every
    /// action primitive requires this of the acting agent.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.chebyshev(other) <= 1
    }

    pub fn offset(self, step: Step) -> Self {
        Self::new(self.x + step.dx, self.y + step.dy)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A unit move on the 8-connected grid. `Step::STAY` is the zero move returned
/// by the pathfinder when the agent is already next to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    pub dx: i32,
    pub dy: i32,
}

impl Step {
    pub const STAY: Step = Step { dx: 0, dy: 0 };

    /// The 8 non-zero moves, in the order the pathfinder expands them.
    pub const MOVES: [Step; 8] = [
        Step { dx: -1, dy: -1 },
        Step { dx: -1, dy: 0 },
        Step { dx: -1, dy: 1 },
        Step { dx: 0, dy: -1 },
        Step { dx: 0, dy: 1 },
        Step { dx: 1, dy: -1 },
        Step { dx: 1, dy: 0 },
        Step { dx: 1, dy: 1 },
    ];

    pub fn is_stay(self) -> bool {
        self == Self::STAY
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Simulator-assigned agent (bot) id. Agents are always processed in
/// ascending id order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bot#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u32);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Every ingredient the shop sells. Processing requirements per type live in
/// `recipe.rs`; prices live in `EngineConfig`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoodType {
    Egg,
    Onions,
    Meat,
    Noodles,
    Sauce,
}

impl FoodType {
    pub const ALL: [FoodType; 5] = [
        FoodType::Egg,
        FoodType::Onions,
        FoodType::Meat,
        FoodType::Noodles,
        FoodType::Sauce,
    ];

    /// The simulator's name for this food, as it appears in orders.
    pub fn name(self) -> &'static str {
        match self {
            FoodType::Egg => "EGG",
            FoodType::Onions => "ONIONS",
            FoodType::Meat => "MEAT",
            FoodType::Noodles => "NOODLES",
            FoodType::Sauce => "SAUCE",
        }
    }

    /// Parse an order ingredient name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ft| ft.name() == name)
    }
}

impl fmt::Display for FoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How far a food has cooked. Advanced only by the simulator's clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CookStage {
    #[default]
    Raw,
    Cooked,
    Burnt,
}

impl CookStage {
    /// Numeric stage as the simulator reports it: 0 raw, 1 cooked, 2 burnt.
    pub fn as_index(self) -> u8 {
        match self {
            CookStage::Raw => 0,
            CookStage::Cooked => 1,
            CookStage::Burnt => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Food {
    pub kind: FoodType,
    pub chopped: bool,
    pub stage: CookStage,
}

impl Food {
    /// A freshly bought, unprocessed food.
    pub fn raw(kind: FoodType) -> Self {
        Self {
            kind,
            chopped: false,
            stage: CookStage::Raw,
        }
    }

    pub fn is_burnt(&self) -> bool {
        self.stage == CookStage::Burnt
    }
}

/// A pan holds at most one food.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pan {
    pub food: Option<Food>,
}

/// A plate: ordered food contents plus a dirty flag. Dirty plates must be
/// washed before they can carry food again.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plate {
    pub foods: SmallVec<[Food; 4]>,
    pub dirty: bool,
}

impl Plate {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        !self.dirty
    }
}

/// Anything an agent can hold or a tile can carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    Food(Food),
    Pan(Pan),
    Plate(Plate),
}

impl Item {
    pub fn as_food(&self) -> Option<&Food> {
        match self {
            Item::Food(food) => Some(food),
            _ => None,
        }
    }

    pub fn as_pan(&self) -> Option<&Pan> {
        match self {
            Item::Pan(pan) => Some(pan),
            _ => None,
        }
    }

    pub fn as_plate(&self) -> Option<&Plate> {
        match self {
            Item::Plate(plate) => Some(plate),
            _ => None,
        }
    }

    /// The plate, if this item is a clean one.
    pub fn as_clean_plate(&self) -> Option<&Plate> {
        self.as_plate().filter(|p| p.is_clean())
    }
}

/// Live contents of a functional tile. Counters, cookers and storage boxes
/// carry at most one `item`; sinks count dirty plates and sink-tables count
/// clean ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileContents {
    pub item: Option<Item>,
    pub clean_plates: u32,
    pub dirty_plates: u32,
}

impl TileContents {
    pub fn holding(item: Item) -> Self {
        Self {
            item: Some(item),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }

    /// The pan on this tile, if any.
    pub fn pan(&self) -> Option<&Pan> {
        self.item.as_ref().and_then(Item::as_pan)
    }
}

// ---------------------------------------------------------------------------
// Orders and agents
// ---------------------------------------------------------------------------

/// A customer order as the simulator lists it. Read-only to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Ingredient names, e.g. `["MEAT", "ONIONS"]`. Duplicates are meaningful.
    pub required: Vec<String>,
    pub reward: i64,
    pub expires_turn: u32,
    pub active: bool,
}

impl Order {
    /// The required ingredients that name a known food, in order-list order.
    pub fn required_foods(&self) -> Vec<FoodType> {
        self.required
            .iter()
            .filter_map(|name| FoodType::from_name(name))
            .collect()
    }
}

/// One agent as seen at the start of a turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentId,
    pub position: Location,
    pub holding: Option<Item>,
}

impl AgentState {
    pub fn held_food(&self) -> Option<&Food> {
        self.holding.as_ref().and_then(Item::as_food)
    }

    pub fn held_clean_plate(&self) -> Option<&Plate> {
        self.holding.as_ref().and_then(Item::as_clean_plate)
    }
}
