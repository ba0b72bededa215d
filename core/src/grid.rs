//! Per-floor tile storage addressed by `(floor, x, y)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, FloorId};

/// Largest number of cells a single floor may hold.
pub const MAX_FLOOR_CELLS: u64 = 1 << 20;

/// Reasons a decoded floor cannot be used.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FloorError {
    /// `length × width` exceeds [`MAX_FLOOR_CELLS`].
    #[error("floor of {length}x{width} cells exceeds the limit of {MAX_FLOOR_CELLS}")]
    TooLarge {
        /// Declared number of columns.
        length: u32,
        /// Declared number of rows.
        width: u32,
    },
    /// The cell array does not match the declared dimensions.
    #[error("floor of {length}x{width} is backed by {cells} cells")]
    CellCountMismatch {
        /// Declared number of columns.
        length: u32,
        /// Declared number of rows.
        width: u32,
        /// Number of stored cells.
        cells: usize,
    },
}

/// Closed set of tile categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridType {
    /// Outer edge of a floor.
    Boundary,
    /// Walkable empty floor.
    Floor,
    /// Impassable wall.
    Wall,
    /// Stairs; the id indexes the stairs list.
    Stairs,
    /// Door; the id selects the key color.
    Door,
    /// Non-player character reachable only through scripts.
    Npc,
    /// Monster; the id indexes the monster list.
    Monster,
    /// Collectable item; the id indexes the item list.
    Item,
    /// Missing or unrecognised tile.
    #[default]
    Unknown,
}

impl GridType {
    /// Reports whether the tile can never be walked through.
    #[must_use]
    pub const fn is_obstacle(self) -> bool {
        matches!(self, Self::Boundary | Self::Wall)
    }

    /// Reports whether the tile is plain terrain with unit traversal cost.
    #[must_use]
    pub const fn is_plain(self) -> bool {
        matches!(self, Self::Floor | Self::Item)
    }
}

/// Single tile: a type tag plus an auxiliary record id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TowerGrid {
    /// Category of the tile.
    pub kind: GridType,
    /// Monster, item, door or stairs index depending on `kind`.
    pub id: u32,
}

impl TowerGrid {
    /// Creates a tile of the given kind and id.
    #[must_use]
    pub const fn new(kind: GridType, id: u32) -> Self {
        Self { kind, id }
    }

    /// Empty walkable floor.
    #[must_use]
    pub const fn floor() -> Self {
        Self::new(GridType::Floor, 0)
    }

    /// Tile reported for any out-of-range lookup.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::new(GridType::Unknown, 0)
    }
}

/// One level of the tower stored as a row-major cell array.
///
/// Decoding goes through [`TowerFloor::check`], so a deserialized floor
/// always holds exactly `length × width` cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FloorRecord")]
pub struct TowerFloor {
    length: u32,
    width: u32,
    background: u32,
    name: String,
    cells: Vec<TowerGrid>,
}

impl TowerFloor {
    /// Creates a floor filled with plain floor tiles.
    #[must_use]
    pub fn new(name: impl Into<String>, length: u32, width: u32) -> Self {
        let count = usize::try_from(u64::from(length) * u64::from(width)).unwrap_or(0);
        Self {
            length,
            width,
            background: 0,
            name: name.into(),
            cells: vec![TowerGrid::floor(); count],
        }
    }

    /// Creates a floor from explicit cells, padding or truncating to `length × width`.
    #[must_use]
    pub fn from_cells(
        name: impl Into<String>,
        length: u32,
        width: u32,
        background: u32,
        mut cells: Vec<TowerGrid>,
    ) -> Self {
        let count = usize::try_from(u64::from(length) * u64::from(width)).unwrap_or(0);
        cells.resize(count, TowerGrid::unknown());
        Self {
            length,
            width,
            background,
            name: name.into(),
            cells,
        }
    }

    /// Verifies that the dimensions are within bounds and match the cell array.
    pub fn check(&self) -> Result<(), FloorError> {
        let count = u64::from(self.length) * u64::from(self.width);
        if count > MAX_FLOOR_CELLS {
            return Err(FloorError::TooLarge {
                length: self.length,
                width: self.width,
            });
        }
        if u64::try_from(self.cells.len()).ok() != Some(count) {
            return Err(FloorError::CellCountMismatch {
                length: self.length,
                width: self.width,
                cells: self.cells.len(),
            });
        }
        Ok(())
    }

    /// Number of columns (x extent).
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Number of rows (y extent).
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Default background tile id used by renderers.
    #[must_use]
    pub const fn background(&self) -> u32 {
        self.background
    }

    /// Display name of the floor.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports whether the coordinate lies inside the floor.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.length && cell.y() < self.width
    }

    /// Tile at the provided cell, if it lies inside the floor.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<&TowerGrid> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Mutable tile at the provided cell, if it lies inside the floor.
    pub fn cell_mut(&mut self, cell: CellCoord) -> Option<&mut TowerGrid> {
        self.index(cell).and_then(|index| self.cells.get_mut(index))
    }

    /// Tile at the provided cell, or the unknown tile when out of range.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> TowerGrid {
        self.cell(cell).copied().unwrap_or_else(TowerGrid::unknown)
    }

    /// Replaces the tile at the provided cell; returns `false` when out of range.
    pub fn set(&mut self, cell: CellCoord, grid: TowerGrid) -> bool {
        match self.cell_mut(cell) {
            Some(slot) => {
                *slot = grid;
                true
            }
            None => false,
        }
    }

    /// Iterator over `(cell, tile)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, TowerGrid)> + '_ {
        let length = self.length.max(1);
        self.cells.iter().enumerate().map(move |(index, grid)| {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            (CellCoord::new(index % length, index / length), *grid)
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.y()).ok()?;
        let column = usize::try_from(cell.x()).ok()?;
        let length = usize::try_from(self.length).ok()?;
        row.checked_mul(length)?.checked_add(column)
    }
}

/// Wire shape of [`TowerFloor`] before its dimensions are checked.
#[derive(Deserialize)]
struct FloorRecord {
    length: u32,
    width: u32,
    #[serde(default)]
    background: u32,
    #[serde(default)]
    name: String,
    cells: Vec<TowerGrid>,
}

impl TryFrom<FloorRecord> for TowerFloor {
    type Error = FloorError;

    fn try_from(record: FloorRecord) -> Result<Self, Self::Error> {
        let floor = Self {
            length: record.length,
            width: record.width,
            background: record.background,
            name: record.name,
            cells: record.cells,
        };
        floor.check()?;
        Ok(floor)
    }
}

/// All floors of the tower keyed by floor id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerMap {
    floors: BTreeMap<FloorId, TowerFloor>,
}

impl TowerMap {
    /// Creates an empty tower.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a floor.
    pub fn insert(&mut self, id: FloorId, floor: TowerFloor) {
        let _ = self.floors.insert(id, floor);
    }

    /// Floor with the provided id.
    #[must_use]
    pub fn floor(&self, id: FloorId) -> Option<&TowerFloor> {
        self.floors.get(&id)
    }

    /// Mutable floor with the provided id.
    pub fn floor_mut(&mut self, id: FloorId) -> Option<&mut TowerFloor> {
        self.floors.get_mut(&id)
    }

    /// Reports whether the tower contains the floor.
    #[must_use]
    pub fn contains(&self, id: FloorId) -> bool {
        self.floors.contains_key(&id)
    }

    /// Floors with their ids in ascending order.
    pub fn floors(&self) -> impl Iterator<Item = (FloorId, &TowerFloor)> + '_ {
        self.floors.iter().map(|(id, floor)| (*id, floor))
    }

    /// Floor ids in ascending order.
    pub fn floor_ids(&self) -> impl Iterator<Item = FloorId> + '_ {
        self.floors.keys().copied()
    }

    /// Lowest floor id, if any floor exists.
    #[must_use]
    pub fn bottom(&self) -> Option<FloorId> {
        self.floors.keys().next().copied()
    }

    /// Highest floor id, if any floor exists.
    #[must_use]
    pub fn top(&self) -> Option<FloorId> {
        self.floors.keys().next_back().copied()
    }

    /// Tile at `(floor, cell)`, or the unknown tile when either is out of range.
    #[must_use]
    pub fn get(&self, floor: FloorId, cell: CellCoord) -> TowerGrid {
        self.floor(floor)
            .map_or_else(TowerGrid::unknown, |tower_floor| tower_floor.get(cell))
    }

    /// Replaces the tile at `(floor, cell)`; out-of-range writes are ignored.
    pub fn set(&mut self, floor: FloorId, cell: CellCoord, grid: TowerGrid) -> bool {
        self.floor_mut(floor)
            .is_some_and(|tower_floor| tower_floor.set(cell, grid))
    }

    /// Reports whether `(floor, cell)` addresses an existing tile.
    #[must_use]
    pub fn contains_cell(&self, floor: FloorId, cell: CellCoord) -> bool {
        self.floor(floor)
            .is_some_and(|tower_floor| tower_floor.contains(cell))
    }
}
