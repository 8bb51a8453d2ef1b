// Map index: one-time classification of grid cells by function.
//
// Built once from the static `GridMap` when the scheduler is created and
// never mutated afterwards. Each station cell gets exactly one
// `TileCategory`; the index keeps the locations of each category in
// row-major order so every consumer iterates them deterministically.
//
// See also: `grid.rs` for the terrain the index is built from,
// `snapshot.rs` which queries live tile contents at these locations.

use crate::grid::{GridMap, Terrain};
use crate::types::Location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Functional category of a station tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileCategory {
    Cooker,
    Sink,
    SinkTable,
    Submit,
    Shop,
    Trash,
    Counter,
    StorageBox,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MapIndex {
    by_category: BTreeMap<TileCategory, Vec<Location>>,
}

impl MapIndex {
    pub fn build(grid: &GridMap) -> Self {
        let mut by_category: BTreeMap<TileCategory, Vec<Location>> = BTreeMap::new();
        for (at, terrain) in grid.cells() {
            if let Terrain::Station(category) = terrain {
                by_category.entry(category).or_default().push(at);
            }
        }
        Self { by_category }
    }

    /// Locations of every tile in `category`, row-major. Empty if the map
    /// has none.
    pub fn locations(&self, category: TileCategory) -> &[Location] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn category_at(&self, at: Location) -> Option<TileCategory> {
        self.by_category
            .iter()
            .find(|(_, locs)| locs.contains(&at))
            .map(|(&category, _)| category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kitchen() -> GridMap {
        GridMap::from_ascii(
            "
            #$CU#
            K...C
            #RTSB
            ",
        )
        .unwrap()
    }

    #[test]
    fn stations_are_classified() {
        let index = MapIndex::build(&kitchen());
        assert_eq!(index.locations(TileCategory::Shop), &[Location::new(1, 0)]);
        assert_eq!(
            index.locations(TileCategory::Counter),
            &[Location::new(2, 0), Location::new(4, 1)]
        );
        assert_eq!(index.locations(TileCategory::Cooker), &[Location::new(0, 1)]);
        assert_eq!(
            index.locations(TileCategory::StorageBox),
            &[Location::new(4, 2)]
        );
    }

    #[test]
    fn floor_and_walls_have_no_category() {
        let index = MapIndex::build(&kitchen());
        assert_eq!(index.category_at(Location::new(1, 1)), None);
        assert_eq!(index.category_at(Location::new(0, 0)), None);
        assert_eq!(
            index.category_at(Location::new(3, 2)),
            Some(TileCategory::Sink)
        );
    }

    #[test]
    fn missing_category_is_empty() {
        let index = MapIndex::build(&GridMap::open(3, 3));
        assert!(index.locations(TileCategory::Trash).is_empty());
    }
}
