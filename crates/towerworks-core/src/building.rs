use crate::grid::{Footprint, GridPosition, Rotation};
use crate::id::{BlockId, BuildingId};
use crate::logic::{BuildingFrame, Logic, LogicKind};

/// A placed structure as the engine stores it.
///
/// Passive blocks (walls) are kept as records with no logic; everything else
/// carries its logic for as long as it stays registered.
#[derive(Debug, Clone)]
pub struct Building {
    pub(crate) frame: BuildingFrame,
    pub(crate) active: bool,
    pub(crate) logic: Option<Logic>,
}

impl Building {
    pub fn id(&self) -> BuildingId {
        self.frame.id
    }

    pub fn block(&self) -> BlockId {
        self.frame.block
    }

    pub fn origin(&self) -> GridPosition {
        self.frame.origin
    }

    pub fn rotation(&self) -> Rotation {
        self.frame.rotation
    }

    pub fn footprint(&self) -> Footprint {
        self.frame.footprint
    }

    pub fn frame(&self) -> &BuildingFrame {
        &self.frame
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn logic(&self) -> Option<&Logic> {
        self.logic.as_ref()
    }

    pub fn kind(&self) -> Option<LogicKind> {
        self.logic.as_ref().map(Logic::kind)
    }

    /// Whether the scheduler ticks this building.
    pub fn is_registered(&self) -> bool {
        self.logic.is_some()
    }
}
