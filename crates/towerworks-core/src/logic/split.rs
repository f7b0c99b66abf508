use super::{BeltSlot, BuildingFrame, ConfigError, ItemAcceptor};
use crate::context::TickContext;
use crate::fixed::Ticks;
use crate::registry::{Item, SplitterConfig};

const OUTPUTS: usize = 3;

/// A single-slot belt piece that hands items out to forward, right and left
/// in turn.
///
/// The round-robin pointer only moves when an output takes the item, so a
/// blocked output is skipped without losing its place in the rotation.
#[derive(Debug, Clone)]
pub struct SplitLogic {
    slot: BeltSlot,
    threshold: Ticks,
    next_output: usize,
}

impl SplitLogic {
    pub fn new(config: &SplitterConfig) -> Result<Self, ConfigError> {
        ConfigError::at_least("ticks_per_slot", 1, config.ticks_per_slot)?;
        Ok(Self {
            slot: BeltSlot::default(),
            threshold: config.ticks_per_slot,
            next_output: 0,
        })
    }

    pub fn slot(&self) -> &BeltSlot {
        &self.slot
    }

    pub fn threshold(&self) -> Ticks {
        self.threshold
    }

    /// Index into forward / right / left that is tried first next time.
    pub fn next_output(&self) -> usize {
        self.next_output
    }

    fn entry_progress(&self) -> Ticks {
        self.threshold.saturating_sub(1)
    }

    pub(crate) fn tick(&mut self, frame: &BuildingFrame, ctx: &mut TickContext<'_>) {
        self.slot.advance(self.threshold);
        if self.slot.is_ready(self.threshold) {
            self.try_output(frame, ctx);
        }
        if self.slot.is_empty() {
            self.pull_input(frame, ctx);
        }
    }

    fn try_output(&mut self, frame: &BuildingFrame, ctx: &mut TickContext<'_>) {
        let Some(item) = self.slot.item() else {
            return;
        };
        debug_assert!(self.next_output < OUTPUTS);
        let start = self.next_output % OUTPUTS;
        let candidates = [frame.cell_ahead(), frame.cell_right(), frame.cell_left()];

        for offset in 0..OUTPUTS {
            let index = (start + offset) % OUTPUTS;
            let Some(target) = ctx.neighbor_at(frame.id, candidates[index]) else {
                continue;
            };
            if ctx.feeds_into(target, frame.id) {
                continue;
            }
            if ctx.offer(frame.id, target, item) {
                self.slot.take();
                self.next_output = (index + 1) % OUTPUTS;
                return;
            }
        }
    }

    fn pull_input(&mut self, frame: &BuildingFrame, ctx: &mut TickContext<'_>) {
        let [right, left] = frame.lateral_cells();
        for cell in [right, left, frame.cell_behind()] {
            let Some(source) = ctx.neighbor_at(frame.id, cell) else {
                continue;
            };
            if let Some(item) = ctx.take_from(source, frame.id) {
                self.slot.fill_at(item, self.entry_progress());
                return;
            }
        }
    }
}

impl ItemAcceptor for SplitLogic {
    fn can_accept(&self, _item: Item<'_>) -> bool {
        self.slot.is_empty()
    }

    fn insert(&mut self, item: Item<'_>) -> bool {
        if !self.slot.is_empty() {
            return false;
        }
        self.slot.fill_at(item.id, self.entry_progress());
        true
    }
}
