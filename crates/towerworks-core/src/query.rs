//! Read-only query API for inspecting simulation state.
//!
//! Snapshot types aggregate engine state into convenient views for
//! rendering and UI. All types are owned copies -- no references into
//! internal engine storage.

use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Direction, GridPosition};
use crate::id::{BlockId, BuildingId, ItemTypeId};
use crate::item::ItemStack;
use crate::logic::LogicKind;

/// One belt slot as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotView {
    pub item: Option<ItemTypeId>,
    /// Progress through the slot as a 0..1 fraction.
    pub progress: Fixed64,
}

/// A conveyor or splitter and the items on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeltSnapshot {
    pub id: BuildingId,
    pub kind: LogicKind,
    pub origin: GridPosition,
    pub facing: Direction,
    pub slots: Vec<SlotView>,
}

/// A storage building or the base and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub id: BuildingId,
    pub kind: LogicKind,
    pub contents: Vec<ItemStack>,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurretSnapshot {
    pub id: BuildingId,
    pub ammo: usize,
    pub max_ammo: usize,
    /// Ticks until the next shot is allowed.
    pub countdown: Ticks,
}

/// Summary of any building, for tooltips and debug overlays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingSnapshot {
    pub id: BuildingId,
    pub block: BlockId,
    pub origin: GridPosition,
    pub facing: Direction,
    pub kind: Option<LogicKind>,
    pub active: bool,
}
