//! Tile grid for building placement, adjacency, and terrain lookups.
//!
//! Provides the map the simulation runs on: a terrain layer, the cells the
//! enemy path currently crosses, and a spatial index from cells to placed
//! buildings. [`TileGrid`] implements [`WorldOracle`], so it can be handed to
//! the engine directly.

use serde::{Deserialize, Serialize};
use slotmap::{Key, SecondaryMap};
use std::collections::{BTreeMap, BTreeSet};
use towerworks_core::grid::{Direction, Footprint, GridPosition};
use towerworks_core::id::{BuildingId, TerrainId};
use towerworks_core::world::WorldOracle;

pub mod placement;
pub use placement::{PlacementError, demolish, place_building, validate_placement};

/// Errors from spatial operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpatialError {
    #[error("position {0:?} is occupied")]
    Occupied(GridPosition),
    #[error("position {0:?} is outside the map")]
    OutOfBounds(GridPosition),
    #[error("building is not placed on the grid")]
    NotPlaced,
    #[error("building is already placed on the grid")]
    AlreadyPlaced,
    #[error("terrain has {actual} cells, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// A rectangular terrain layer. Cell (0, 0) is the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainMap {
    width: u32,
    height: u32,
    cells: Vec<TerrainId>,
}

impl TerrainMap {
    /// A map filled with one terrain.
    pub fn new(width: u32, height: u32, fill: TerrainId) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width as usize * height as usize],
        }
    }

    /// A map from row-major cells.
    pub fn from_cells(width: u32, height: u32, cells: Vec<TerrainId>) -> Result<Self, SpatialError> {
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(SpatialError::SizeMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        self.index(pos).is_some()
    }

    pub fn get(&self, pos: GridPosition) -> Option<TerrainId> {
        self.index(pos).map(|i| self.cells[i])
    }

    pub fn set(&mut self, pos: GridPosition, terrain: TerrainId) -> Result<(), SpatialError> {
        let i = self.index(pos).ok_or(SpatialError::OutOfBounds(pos))?;
        self.cells[i] = terrain;
        Ok(())
    }

    fn index(&self, pos: GridPosition) -> Option<usize> {
        let x = u32::try_from(pos.x).ok()?;
        let y = u32::try_from(pos.y).ok()?;
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }
}

// ---------------------------------------------------------------------------
// SpatialIndex
// ---------------------------------------------------------------------------

/// A spatial index mapping grid cells to placed buildings.
///
/// Maintains a bidirectional mapping:
/// - `tiles`: cell -> building (which building covers each cell)
/// - `positions`: building -> origin cell
/// - `footprints`: building -> footprint
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tiles: BTreeMap<GridPosition, BuildingId>,
    positions: SecondaryMap<BuildingId, GridPosition>,
    footprints: SecondaryMap<BuildingId, Footprint>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Placement --

    /// Claim every cell of `footprint` at `origin` (top-left corner).
    pub fn place(
        &mut self,
        building: BuildingId,
        origin: GridPosition,
        footprint: Footprint,
    ) -> Result<(), SpatialError> {
        if self.positions.contains_key(building) {
            return Err(SpatialError::AlreadyPlaced);
        }
        if let Some(taken) = footprint.tiles(origin).find(|t| self.tiles.contains_key(t)) {
            return Err(SpatialError::Occupied(taken));
        }

        for tile in footprint.tiles(origin) {
            self.tiles.insert(tile, building);
        }
        self.positions.insert(building, origin);
        self.footprints.insert(building, footprint);
        Ok(())
    }

    /// Release a building's cells. Returns its origin.
    pub fn remove(&mut self, building: BuildingId) -> Result<GridPosition, SpatialError> {
        let origin = self.positions.remove(building).ok_or(SpatialError::NotPlaced)?;
        let footprint = self
            .footprints
            .remove(building)
            .ok_or(SpatialError::NotPlaced)?;
        for tile in footprint.tiles(origin) {
            self.tiles.remove(&tile);
        }
        Ok(origin)
    }

    pub fn can_place(&self, origin: GridPosition, footprint: Footprint) -> bool {
        footprint
            .tiles(origin)
            .all(|tile| !self.tiles.contains_key(&tile))
    }

    // -- Point queries --

    pub fn building_at(&self, pos: GridPosition) -> Option<BuildingId> {
        self.tiles.get(&pos).copied()
    }

    pub fn position(&self, building: BuildingId) -> Option<GridPosition> {
        self.positions.get(building).copied()
    }

    pub fn footprint(&self, building: BuildingId) -> Option<Footprint> {
        self.footprints.get(building).copied()
    }

    pub fn is_occupied(&self, pos: GridPosition) -> bool {
        self.tiles.contains_key(&pos)
    }

    // -- Area queries --

    /// Unique buildings touching an axis-aligned rectangle (inclusive).
    pub fn buildings_in_rect(&self, min: GridPosition, max: GridPosition) -> Vec<BuildingId> {
        self.collect_unique(min, max, |_| true)
    }

    /// Unique buildings with a cell within `radius` (Manhattan) of `center`.
    pub fn buildings_in_radius(&self, center: GridPosition, radius: u32) -> Vec<BuildingId> {
        let r = radius as i32;
        let min = GridPosition::new(center.x - r, center.y - r);
        let max = GridPosition::new(center.x + r, center.y + r);
        self.collect_unique(min, max, |pos| center.manhattan_distance(pos) <= radius)
    }

    fn collect_unique(
        &self,
        min: GridPosition,
        max: GridPosition,
        keep: impl Fn(&GridPosition) -> bool,
    ) -> Vec<BuildingId> {
        let mut seen = BTreeSet::new();
        let mut result = Vec::new();
        if min > max {
            return result;
        }
        for (pos, &building) in self.tiles.range(min..=max) {
            if pos.y < min.y || pos.y > max.y || !keep(pos) {
                continue;
            }
            if seen.insert(building.data().as_ffi()) {
                result.push(building);
            }
        }
        result
    }

    // -- Adjacency --

    /// Unique buildings touching any edge of `building`, tagged with the side
    /// they touch.
    pub fn neighbors_4(&self, building: BuildingId) -> Vec<(Direction, BuildingId)> {
        let (Some(&origin), Some(&footprint)) =
            (self.positions.get(building), self.footprints.get(building))
        else {
            return Vec::new();
        };

        let mut seen = BTreeSet::new();
        let mut result = Vec::new();
        for (dir, cell) in footprint.perimeter(origin) {
            if let Some(&other) = self.tiles.get(&cell)
                && seen.insert((dir as u8, other.data().as_ffi()))
            {
                result.push((dir, other));
            }
        }
        result
    }

    /// First building touching the `dir` side of `building`.
    pub fn neighbor_in_direction(&self, building: BuildingId, dir: Direction) -> Option<BuildingId> {
        let origin = *self.positions.get(building)?;
        let footprint = *self.footprints.get(building)?;
        footprint
            .perimeter(origin)
            .into_iter()
            .filter(|(side, _)| *side == dir)
            .find_map(|(_, cell)| self.tiles.get(&cell).copied())
    }

    // -- Stats --

    pub fn building_count(&self) -> usize {
        self.positions.len()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
}

// ---------------------------------------------------------------------------
// TileGrid
// ---------------------------------------------------------------------------

/// Terrain, enemy path and placed buildings for one map.
#[derive(Debug)]
pub struct TileGrid {
    terrain: TerrainMap,
    index: SpatialIndex,
    /// Cells the enemy path crosses. Nothing may be built on them.
    path: BTreeSet<GridPosition>,
}

impl TileGrid {
    pub fn new(terrain: TerrainMap) -> Self {
        Self {
            terrain,
            index: SpatialIndex::new(),
            path: BTreeSet::new(),
        }
    }

    pub fn terrain(&self) -> &TerrainMap {
        &self.terrain
    }

    pub fn terrain_mut(&mut self) -> &mut TerrainMap {
        &mut self.terrain
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub(crate) fn index_mut(&mut self) -> &mut SpatialIndex {
        &mut self.index
    }

    /// Replace the enemy path. Pass an empty iterator while no wave is
    /// running to allow building anywhere.
    pub fn set_path(&mut self, cells: impl IntoIterator<Item = GridPosition>) {
        self.path = cells.into_iter().collect();
    }

    pub fn clear_path(&mut self) {
        self.path.clear();
    }

    pub fn is_path(&self, pos: GridPosition) -> bool {
        self.path.contains(&pos)
    }
}

impl WorldOracle for TileGrid {
    fn building_at(&self, pos: GridPosition) -> Option<BuildingId> {
        self.index.building_at(pos)
    }

    fn terrain_at(&self, pos: GridPosition) -> Option<TerrainId> {
        self.terrain.get(pos)
    }
}
