use tracing::trace;

use super::{BeltSlot, BuildingFrame, ConfigError, ItemAcceptor};
use crate::context::TickContext;
use crate::fixed::Ticks;
use crate::grid::GridPosition;
use crate::id::ItemTypeId;
use crate::registry::{ConveyorConfig, Item};

/// A belt of `slot_count` slots. Items enter at slot 0 and leave from the last
/// slot into whatever sits ahead.
#[derive(Debug, Clone)]
pub struct ConveyorLogic {
    slots: Vec<BeltSlot>,
    threshold: Ticks,
    seed_item: Option<ItemTypeId>,
}

impl ConveyorLogic {
    pub fn new(config: &ConveyorConfig) -> Result<Self, ConfigError> {
        ConfigError::at_least("ticks_per_slot", 1, config.ticks_per_slot)?;
        ConfigError::at_least("slot_count", 2, config.slot_count as u64)?;
        Ok(Self {
            slots: vec![BeltSlot::default(); config.slot_count],
            threshold: config.ticks_per_slot,
            seed_item: config.seed_item,
        })
    }

    pub fn slots(&self) -> &[BeltSlot] {
        &self.slots
    }

    pub fn threshold(&self) -> Ticks {
        self.threshold
    }

    /// Items currently on the belt.
    pub fn item_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    pub(crate) fn on_placed(&mut self) {
        if let Some(item) = self.seed_item
            && self.slots[0].is_empty()
        {
            self.slots[0].fill(item);
        }
    }

    /// Merge an item arriving from the side: it lands in slot 1, one tick
    /// away from ready.
    pub fn can_side_insert(&self) -> bool {
        self.slots[1].is_empty()
    }

    pub fn side_insert(&mut self, item: ItemTypeId) -> bool {
        if !self.can_side_insert() {
            return false;
        }
        self.slots[1].fill_at(item, self.threshold.saturating_sub(1));
        true
    }

    pub(crate) fn tick(&mut self, frame: &BuildingFrame, ctx: &mut TickContext<'_>) {
        for slot in &mut self.slots {
            slot.advance(self.threshold);
        }
        self.move_items(frame, ctx);
        if self.slots[0].is_empty() {
            self.try_collect_from_nearby_providers(frame, ctx);
        }
        if self.slots[0].is_empty() {
            self.pull_from_inventory_behind(frame, ctx);
        }
    }

    /// Walk the slots from the tail so an item moved into slot i+1 is never
    /// looked at again in the same tick.
    fn move_items(&mut self, frame: &BuildingFrame, ctx: &mut TickContext<'_>) {
        let last = self.slots.len() - 1;
        for i in (0..=last).rev() {
            if !self.slots[i].is_ready(self.threshold) {
                continue;
            }
            if i == last {
                if let Some(item) = self.slots[i].item()
                    && self.try_output_to_next_building(frame, ctx, item)
                {
                    self.slots[i].take();
                }
            } else if self.slots[i + 1].is_empty()
                && let Some(item) = self.slots[i].take()
            {
                self.slots[i + 1].fill(item);
            }
        }
    }

    fn try_output_to_next_building(
        &self,
        frame: &BuildingFrame,
        ctx: &mut TickContext<'_>,
        item: ItemTypeId,
    ) -> bool {
        let Some(target) = ctx.neighbor_at(frame.id, frame.cell_ahead()) else {
            return false;
        };
        match ctx.conveyor_facing(target) {
            // Head-on belts would hand the same item back and forth forever.
            Some(facing) if facing == frame.facing().opposite() => false,
            Some(facing) if facing != frame.facing() => ctx.offer_side(frame.id, target, item),
            _ => ctx.offer(frame.id, target, item),
        }
    }

    fn try_collect_from_nearby_providers(
        &mut self,
        frame: &BuildingFrame,
        ctx: &mut TickContext<'_>,
    ) {
        for cell in frame.lateral_cells() {
            if self.pull_from(cell, frame, ctx) {
                return;
            }
        }
    }

    fn pull_from_inventory_behind(&mut self, frame: &BuildingFrame, ctx: &mut TickContext<'_>) {
        self.pull_from(frame.cell_behind(), frame, ctx);
    }

    fn pull_from(
        &mut self,
        cell: GridPosition,
        frame: &BuildingFrame,
        ctx: &mut TickContext<'_>,
    ) -> bool {
        let Some(source) = ctx.neighbor_at(frame.id, cell) else {
            return false;
        };
        match ctx.take_from(source, frame.id) {
            Some(item) => {
                trace!(building = ?frame.id, ?item, "conveyor pulled item");
                self.slots[0].fill(item);
                true
            }
            None => false,
        }
    }
}

impl ItemAcceptor for ConveyorLogic {
    fn can_accept(&self, _item: Item<'_>) -> bool {
        self.slots[0].is_empty()
    }

    fn insert(&mut self, item: Item<'_>) -> bool {
        if !self.slots[0].is_empty() {
            return false;
        }
        self.slots[0].fill(item.id);
        true
    }
}
