// Static kitchen grid.
//
// The grid is stored as a flat `Vec<Terrain>` indexed by `x + y * width`,
// giving O(1) lookups for the pathfinder. Out-of-bounds reads report `Wall`,
// so callers never need a separate bounds check before asking whether a cell
// is walkable. Only `Floor` is walkable; every station (counter, cooker,
// shop, ...) is an obstacle that agents interact with from a neighbouring
// cell.
//
// The grid is static for the lifetime of a game. It is handed to the engine
// once at startup and classified by `map_index.rs`.
//
// `GridMap::from_ascii` loads the plain-text map format used by tests and
// tooling, one glyph per cell:
//
//   `.` floor   `#` wall      `C` counter   `K` cooker    `S` sink
//   `T` sink table            `U` submit    `$` shop      `R` trash
//   `B` storage box
//
// See also: `map_index.rs` for the category lookup built on top of this,
// `pathfinding.rs` which searches it.

use crate::map_index::TileCategory;
use crate::types::Location;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What occupies a grid cell permanently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    Floor,
    Wall,
    Station(TileCategory),
}

impl Terrain {
    pub fn is_walkable(self) -> bool {
        self == Terrain::Floor
    }

    fn from_glyph(glyph: char) -> Option<Self> {
        let terrain = match glyph {
            '.' => Terrain::Floor,
            '#' => Terrain::Wall,
            'C' => Terrain::Station(TileCategory::Counter),
            'K' => Terrain::Station(TileCategory::Cooker),
            'S' => Terrain::Station(TileCategory::Sink),
            'T' => Terrain::Station(TileCategory::SinkTable),
            'U' => Terrain::Station(TileCategory::Submit),
            '$' => Terrain::Station(TileCategory::Shop),
            'R' => Terrain::Station(TileCategory::Trash),
            'B' => Terrain::Station(TileCategory::StorageBox),
            _ => return None,
        };
        Some(terrain)
    }
}

/// Reasons an ASCII map is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("map has no rows")]
    Empty,
    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown map glyph {glyph:?} at {at}")]
    UnknownGlyph { glyph: char, at: Location },
}

/// Dense 2D grid of static terrain.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GridMap {
    cells: Vec<Terrain>,
    pub width: u32,
    pub height: u32,
}

impl GridMap {
    /// Create an open grid: every cell is floor.
    pub fn open(width: u32, height: u32) -> Self {
        Self {
            cells: vec![Terrain::Floor; (width as usize) * (height as usize)],
            width,
            height,
        }
    }

    /// Parse the ASCII map format. Blank lines are skipped; leading and
    /// trailing whitespace on each row is ignored.
    pub fn from_ascii(text: &str) -> Result<Self, GridError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(GridError::Empty);
        };
        let width = first.chars().count();

        let mut cells = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(GridError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let terrain = Terrain::from_glyph(glyph).ok_or(GridError::UnknownGlyph {
                    glyph,
                    at: Location::new(x as i32, y as i32),
                })?;
                cells.push(terrain);
            }
        }

        Ok(Self {
            cells,
            width: width as u32,
            height: rows.len() as u32,
        })
    }

    pub fn in_bounds(&self, at: Location) -> bool {
        at.x >= 0 && at.y >= 0 && (at.x as u32) < self.width && (at.y as u32) < self.height
    }

    fn index(&self, at: Location) -> Option<usize> {
        if self.in_bounds(at) {
            Some(at.x as usize + at.y as usize * self.width as usize)
        } else {
            None
        }
    }

    /// Read a cell. Out-of-bounds cells read as `Wall`.
    pub fn get(&self, at: Location) -> Terrain {
        self.index(at).map(|i| self.cells[i]).unwrap_or(Terrain::Wall)
    }

    pub fn is_walkable(&self, at: Location) -> bool {
        self.get(at).is_walkable()
    }

    /// All cells in row-major order (y outer, x inner).
    pub fn cells(&self) -> impl Iterator<Item = (Location, Terrain)> + '_ {
        (0..self.height as i32).flat_map(move |y| {
            (0..self.width as i32).map(move |x| {
                let at = Location::new(x, y);
                (at, self.get(at))
            })
        })
    }
}
