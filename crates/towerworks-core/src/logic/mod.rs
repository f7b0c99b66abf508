//! Per-building behavior.
//!
//! Every registered building owns exactly one [`Logic`]. The variants use
//! **enum dispatch**: the set of behaviors is closed, the scheduler walks a
//! homogeneous list, and [`Logic::initialize`] acts as the factory table that
//! maps a [`BlockKind`] to its behavior.
//!
//! Item flow between buildings goes through two capabilities:
//!
//! - [`ItemAcceptor`]: takes items in (belts, storage, turrets, the base).
//! - [`ItemProvider`]: hands items out (storage, drills, creative sources).
//!
//! `peek_first` never mutates. `extract_first` / `extract` are destructive
//! and are only called once the receiving side has agreed to take the item.
//!
//! # Logic Types
//!
//! - [`ConveyorLogic`]: a belt of N slots moving items toward its facing.
//! - [`SplitLogic`]: one slot, round-robin over forward, right and left.
//! - [`StorageLogic`]: a slotted inventory, both acceptor and provider.
//! - [`DrillLogic`]: mines the terrain under its footprint.
//! - [`CreativeItemProviderLogic`]: an endless source of one item.
//! - [`TurretLogic`]: consumes ammo to fire at the nearest enemy.
//! - [`BaseLogic`]: the player stockpile.

mod base;
mod conveyor;
mod creative;
mod drill;
mod slot;
mod split;
mod storage;
mod turret;

/// A block's logic configuration that cannot be built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be at least {min}, got {actual}")]
    TooSmall {
        field: &'static str,
        min: u64,
        actual: u64,
    },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

impl ConfigError {
    /// Check `actual >= min` for a count or tick setting.
    pub(crate) fn at_least(field: &'static str, min: u64, actual: u64) -> Result<(), Self> {
        if actual < min {
            return Err(ConfigError::TooSmall { field, min, actual });
        }
        Ok(())
    }
}

pub use base::BaseLogic;
pub use conveyor::ConveyorLogic;
pub use creative::CreativeItemProviderLogic;
pub use drill::DrillLogic;
pub use slot::BeltSlot;
pub use split::SplitLogic;
pub use storage::StorageLogic;
pub use turret::{ProjectileSpawn, TurretLogic};

use glam::Vec2;

use crate::context::TickContext;
use crate::engine::EngineError;
use crate::grid::{Direction, Footprint, GridPosition, Rotation};
use crate::id::{BlockId, BuildingId, ItemTypeId};
use crate::item::Inventory;
use crate::registry::{BlockDef, BlockKind, Item};
use crate::sim::StateHash;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Something items can be handed to.
pub trait ItemAcceptor {
    /// Whether `insert` would succeed right now.
    fn can_accept(&self, item: Item<'_>) -> bool;

    /// Take one unit. Returns false (and changes nothing) on rejection.
    fn insert(&mut self, item: Item<'_>) -> bool;
}

/// Something items can be taken from.
pub trait ItemProvider {
    /// The item `extract_first` would return, without removing it.
    fn peek_first(&self) -> Option<ItemTypeId>;

    fn extract_first(&mut self) -> Option<ItemTypeId>;

    /// Remove one unit of a specific item.
    fn extract(&mut self, item: ItemTypeId) -> bool;
}

// ---------------------------------------------------------------------------
// Kinds and frames
// ---------------------------------------------------------------------------

/// Discriminant tag for logic variants, used for filtering queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LogicKind {
    Conveyor,
    Splitter,
    Storage,
    Drill,
    CreativeSource,
    Turret,
    Base,
}

impl LogicKind {
    /// Belts move items themselves and never act as providers.
    pub fn is_belt(self) -> bool {
        matches!(self, LogicKind::Conveyor | LogicKind::Splitter)
    }
}

/// Where a building sits: everything a logic needs to know about its own
/// placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingFrame {
    pub id: BuildingId,
    pub block: BlockId,
    pub origin: GridPosition,
    pub rotation: Rotation,
    pub footprint: Footprint,
}

impl BuildingFrame {
    pub fn facing(&self) -> Direction {
        self.rotation.facing()
    }

    pub fn cell_ahead(&self) -> GridPosition {
        self.footprint.side_cell(self.origin, self.facing())
    }

    pub fn cell_behind(&self) -> GridPosition {
        self.footprint.side_cell(self.origin, self.facing().opposite())
    }

    pub fn cell_right(&self) -> GridPosition {
        self.footprint.side_cell(self.origin, self.facing().clockwise())
    }

    pub fn cell_left(&self) -> GridPosition {
        self.footprint
            .side_cell(self.origin, self.facing().counter_clockwise())
    }

    /// Side cells in pull order: right, then left.
    pub fn lateral_cells(&self) -> [GridPosition; 2] {
        [self.cell_right(), self.cell_left()]
    }

    pub fn occupies(&self, pos: GridPosition) -> bool {
        self.footprint.contains(self.origin, pos)
    }

    pub fn tiles(&self) -> impl Iterator<Item = GridPosition> {
        self.footprint.tiles(self.origin)
    }

    pub fn perimeter(&self) -> Vec<(Direction, GridPosition)> {
        self.footprint.perimeter(self.origin)
    }

    pub fn center(&self) -> Vec2 {
        self.footprint.center(self.origin)
    }
}

// ---------------------------------------------------------------------------
// Logic
// ---------------------------------------------------------------------------

/// The behavior owned by a registered building.
#[derive(Debug, Clone)]
pub enum Logic {
    Conveyor(ConveyorLogic),
    Splitter(SplitLogic),
    Storage(StorageLogic),
    Drill(DrillLogic),
    CreativeSource(CreativeItemProviderLogic),
    Turret(TurretLogic),
    Base(BaseLogic),
}

impl Logic {
    /// Build the logic for a block template, validating its configuration.
    /// Passive blocks have no logic and yield `Ok(None)`.
    pub fn initialize(block: &BlockDef) -> Result<Option<Logic>, EngineError> {
        let invalid = |source: ConfigError| EngineError::InvalidConfig {
            block: block.name.clone(),
            source,
        };
        let logic = match &block.kind {
            BlockKind::Passive => return Ok(None),
            BlockKind::Conveyor(cfg) => Logic::Conveyor(ConveyorLogic::new(cfg).map_err(invalid)?),
            BlockKind::Splitter(cfg) => Logic::Splitter(SplitLogic::new(cfg).map_err(invalid)?),
            BlockKind::Storage(cfg) => Logic::Storage(StorageLogic::new(cfg).map_err(invalid)?),
            BlockKind::Drill(cfg) => Logic::Drill(DrillLogic::new(cfg).map_err(invalid)?),
            BlockKind::CreativeSource(cfg) => {
                Logic::CreativeSource(CreativeItemProviderLogic::new(cfg))
            }
            BlockKind::Turret(cfg) => Logic::Turret(TurretLogic::new(cfg).map_err(invalid)?),
            BlockKind::Base(cfg) => Logic::Base(BaseLogic::new(cfg).map_err(invalid)?),
        };
        Ok(Some(logic))
    }

    pub fn kind(&self) -> LogicKind {
        match self {
            Logic::Conveyor(_) => LogicKind::Conveyor,
            Logic::Splitter(_) => LogicKind::Splitter,
            Logic::Storage(_) => LogicKind::Storage,
            Logic::Drill(_) => LogicKind::Drill,
            Logic::CreativeSource(_) => LogicKind::CreativeSource,
            Logic::Turret(_) => LogicKind::Turret,
            Logic::Base(_) => LogicKind::Base,
        }
    }

    /// Called once, right after registration.
    pub fn on_placed(&mut self) {
        if let Logic::Conveyor(c) = self {
            c.on_placed();
        }
    }

    /// Run one tick. Variants without per-tick work do nothing.
    pub fn tick(&mut self, frame: &BuildingFrame, ctx: &mut TickContext<'_>) {
        match self {
            Logic::Conveyor(c) => c.tick(frame, ctx),
            Logic::Splitter(s) => s.tick(frame, ctx),
            Logic::Drill(d) => d.tick(frame, ctx),
            Logic::Turret(t) => t.tick(frame, ctx),
            Logic::Storage(_) | Logic::CreativeSource(_) | Logic::Base(_) => {}
        }
    }

    pub fn as_acceptor(&self) -> Option<&dyn ItemAcceptor> {
        match self {
            Logic::Conveyor(c) => Some(c),
            Logic::Splitter(s) => Some(s),
            Logic::Storage(s) => Some(s),
            Logic::Turret(t) => Some(t),
            Logic::Base(b) => Some(b),
            Logic::Drill(_) | Logic::CreativeSource(_) => None,
        }
    }

    pub fn as_acceptor_mut(&mut self) -> Option<&mut dyn ItemAcceptor> {
        match self {
            Logic::Conveyor(c) => Some(c),
            Logic::Splitter(s) => Some(s),
            Logic::Storage(s) => Some(s),
            Logic::Turret(t) => Some(t),
            Logic::Base(b) => Some(b),
            Logic::Drill(_) | Logic::CreativeSource(_) => None,
        }
    }

    pub fn as_provider(&self) -> Option<&dyn ItemProvider> {
        match self {
            Logic::Storage(s) => Some(s),
            Logic::Drill(d) => Some(d),
            Logic::CreativeSource(c) => Some(c),
            Logic::Conveyor(_) | Logic::Splitter(_) | Logic::Turret(_) | Logic::Base(_) => None,
        }
    }

    pub fn as_provider_mut(&mut self) -> Option<&mut dyn ItemProvider> {
        match self {
            Logic::Storage(s) => Some(s),
            Logic::Drill(d) => Some(d),
            Logic::CreativeSource(c) => Some(c),
            Logic::Conveyor(_) | Logic::Splitter(_) | Logic::Turret(_) | Logic::Base(_) => None,
        }
    }

    /// Cells a belt may deliver into. Empty for everything else.
    pub fn output_cells(&self, frame: &BuildingFrame) -> Vec<GridPosition> {
        match self {
            Logic::Conveyor(_) => vec![frame.cell_ahead()],
            Logic::Splitter(_) => vec![frame.cell_ahead(), frame.cell_right(), frame.cell_left()],
            _ => Vec::new(),
        }
    }

    /// The inventory behind storage and base buildings.
    pub fn inventory(&self) -> Option<&Inventory> {
        match self {
            Logic::Storage(s) => Some(s.inventory()),
            Logic::Base(b) => Some(b.inventory()),
            _ => None,
        }
    }

    pub fn inventory_mut(&mut self) -> Option<&mut Inventory> {
        match self {
            Logic::Storage(s) => Some(s.inventory_mut()),
            Logic::Base(b) => Some(b.inventory_mut()),
            _ => None,
        }
    }

    /// Belt slots for conveyors and splitters, with their threshold.
    pub fn belt_slots(&self) -> Option<(&[BeltSlot], u64)> {
        match self {
            Logic::Conveyor(c) => Some((c.slots(), c.threshold())),
            Logic::Splitter(s) => Some((std::slice::from_ref(s.slot()), s.threshold())),
            _ => None,
        }
    }

    pub fn as_conveyor(&self) -> Option<&ConveyorLogic> {
        match self {
            Logic::Conveyor(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_conveyor_mut(&mut self) -> Option<&mut ConveyorLogic> {
        match self {
            Logic::Conveyor(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_splitter(&self) -> Option<&SplitLogic> {
        match self {
            Logic::Splitter(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_drill(&self) -> Option<&DrillLogic> {
        match self {
            Logic::Drill(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_turret(&self) -> Option<&TurretLogic> {
        match self {
            Logic::Turret(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_turret_mut(&mut self) -> Option<&mut TurretLogic> {
        match self {
            Logic::Turret(t) => Some(t),
            _ => None,
        }
    }

    /// Feed this logic's mutable state into a state hash.
    pub fn hash_into(&self, hash: &mut StateHash) {
        hash.write_u32(self.kind() as u32);
        match self {
            Logic::Conveyor(c) => hash_slots(hash, c.slots()),
            Logic::Splitter(s) => {
                hash_slots(hash, std::slice::from_ref(s.slot()));
                hash.write_u32(s.next_output() as u32);
            }
            Logic::Storage(s) => hash_inventory(hash, s.inventory()),
            Logic::Base(b) => hash_inventory(hash, b.inventory()),
            Logic::Drill(d) => {
                hash.write_fixed64(d.accumulator());
                hash.write_u32(d.available());
            }
            Logic::CreativeSource(c) => hash.write_u32(c.item().0),
            Logic::Turret(t) => {
                hash.write_u64(t.countdown());
                hash.write_u32(t.ammo_len() as u32);
                for item in t.ammo() {
                    hash.write_item(Some(item));
                }
            }
        }
    }
}

fn hash_slots(hash: &mut StateHash, slots: &[BeltSlot]) {
    for slot in slots {
        hash.write_item(slot.item());
        hash.write_u64(slot.progress());
    }
}

fn hash_inventory(hash: &mut StateHash, inventory: &Inventory) {
    for slot in inventory.slots() {
        hash.write_item(slot.item);
        hash.write_u32(slot.amount);
    }
}
