//! Placing and demolishing buildings on a [`TileGrid`].
//!
//! Placement checks the whole footprint before touching anything: the map
//! bounds, solid terrain, existing buildings and the current enemy path.
//! When a player stock is supplied, the block's build cost is checked and
//! paid from it, and refunded on demolition.

use tracing::{debug, warn};
use towerworks_core::building::Building;
use towerworks_core::engine::{Engine, EngineError};
use towerworks_core::grid::{Footprint, GridPosition, Rotation};
use towerworks_core::id::{BlockId, BuildingId, ItemTypeId};
use towerworks_core::item::Inventory;
use towerworks_core::registry::Registry;

use crate::{SpatialError, TileGrid};

#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("unknown block: {0:?}")]
    UnknownBlock(BlockId),
    #[error("{0:?} is outside the map")]
    OutOfBounds(GridPosition),
    #[error("{0:?} has solid terrain")]
    SolidTerrain(GridPosition),
    #[error("{0:?} is already occupied")]
    Occupied(GridPosition),
    #[error("{0:?} is on the enemy path")]
    OnEnemyPath(GridPosition),
    #[error("not enough {item:?}: need {needed}, have {available}")]
    InsufficientItems {
        item: ItemTypeId,
        needed: u32,
        available: u32,
    },
    #[error("no building at {0:?}")]
    NothingThere(GridPosition),
    #[error("{0} cannot be removed")]
    NotRemovable(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

/// Check whether `block` may go at `origin` without changing anything.
pub fn validate_placement(
    grid: &TileGrid,
    registry: &Registry,
    block: BlockId,
    origin: GridPosition,
    stock: Option<&Inventory>,
) -> Result<(), PlacementError> {
    let def = registry
        .get_block(block)
        .ok_or(PlacementError::UnknownBlock(block))?;

    if let Some(stock) = stock {
        for cost in &def.cost {
            let available = stock.count(cost.item);
            if available < cost.amount {
                return Err(PlacementError::InsufficientItems {
                    item: cost.item,
                    needed: cost.amount,
                    available,
                });
            }
        }
    }

    for cell in Footprint::square(def.size).tiles(origin) {
        let terrain = grid
            .terrain()
            .get(cell)
            .ok_or(PlacementError::OutOfBounds(cell))?;
        if registry.terrain_is_solid(terrain) {
            return Err(PlacementError::SolidTerrain(cell));
        }
        if grid.index().is_occupied(cell) {
            return Err(PlacementError::Occupied(cell));
        }
        if grid.is_path(cell) {
            return Err(PlacementError::OnEnemyPath(cell));
        }
    }
    Ok(())
}

/// Validate, register with the engine, claim the cells and pay the cost.
pub fn place_building(
    engine: &mut Engine,
    grid: &mut TileGrid,
    block: BlockId,
    origin: GridPosition,
    rotation: Rotation,
    mut stock: Option<&mut Inventory>,
) -> Result<BuildingId, PlacementError> {
    validate_placement(grid, engine.registry(), block, origin, stock.as_deref())?;

    let id = engine.register(block, origin, rotation)?;
    let footprint = engine
        .building(id)
        .map(Building::footprint)
        .unwrap_or_else(Footprint::single);
    if let Err(e) = grid.index_mut().place(id, origin, footprint) {
        engine.unregister(id);
        return Err(e.into());
    }

    if let Some(stock) = stock.as_deref_mut()
        && let Some(def) = engine.registry().get_block(block)
    {
        for cost in &def.cost {
            let paid = stock.remove(cost.item, cost.amount);
            debug_assert!(paid, "cost was validated");
        }
    }
    debug!(building = ?id, ?block, ?origin, ?rotation, "building placed");
    Ok(id)
}

/// Remove the building covering `pos`, refunding its cost into `stock`.
pub fn demolish(
    engine: &mut Engine,
    grid: &mut TileGrid,
    pos: GridPosition,
    stock: Option<&mut Inventory>,
) -> Result<Building, PlacementError> {
    let id = grid
        .index()
        .building_at(pos)
        .ok_or(PlacementError::NothingThere(pos))?;
    let block = engine
        .building(id)
        .map(Building::block)
        .ok_or(PlacementError::NothingThere(pos))?;
    let def = engine
        .registry()
        .get_block(block)
        .ok_or(PlacementError::UnknownBlock(block))?;
    if !def.removable {
        return Err(PlacementError::NotRemovable(def.name.clone()));
    }
    let refund = def.cost.clone();

    grid.index_mut().remove(id)?;
    let building = engine
        .unregister(id)
        .ok_or(PlacementError::NothingThere(pos))?;

    if let Some(stock) = stock {
        for cost in refund {
            if !stock.add(cost.item, cost.amount) {
                warn!(item = ?cost.item, amount = cost.amount, "refund did not fit in stock");
            }
        }
    }
    debug!(building = ?id, ?pos, "building demolished");
    Ok(building)
}
