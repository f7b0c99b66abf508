use crate::fixed::{Fixed64, Ticks, ratio};
use crate::id::ItemTypeId;

/// One position on a belt: at most one item and how long it has been there.
///
/// Item and progress are only ever written together. Progress grows while the
/// slot is occupied and stops at the threshold; the item may leave once the
/// threshold is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BeltSlot {
    item: Option<ItemTypeId>,
    progress: Ticks,
}

impl BeltSlot {
    pub fn item(&self) -> Option<ItemTypeId> {
        self.item
    }

    pub fn progress(&self) -> Ticks {
        self.progress
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }

    /// Occupied and done waiting.
    pub fn is_ready(&self, threshold: Ticks) -> bool {
        self.item.is_some() && self.progress >= threshold
    }

    pub fn fill(&mut self, item: ItemTypeId) {
        self.fill_at(item, 0);
    }

    pub fn fill_at(&mut self, item: ItemTypeId, progress: Ticks) {
        self.item = Some(item);
        self.progress = progress;
    }

    pub fn take(&mut self) -> Option<ItemTypeId> {
        self.progress = 0;
        self.item.take()
    }

    pub fn advance(&mut self, threshold: Ticks) {
        if self.item.is_some() {
            self.progress = (self.progress + 1).min(threshold);
        }
    }

    /// Progress as a 0..1 fraction of `threshold`.
    pub fn normalized(&self, threshold: Ticks) -> Fixed64 {
        if self.item.is_none() {
            return Fixed64::ZERO;
        }
        ratio(self.progress as u32, threshold as u32)
    }
}
