use super::{BuildingFrame, ConfigError, ItemProvider};
use crate::context::TickContext;
use crate::fixed::Fixed64;
use crate::id::{ItemTypeId, TerrainId};
use crate::registry::DrillConfig;

/// Mines its output item from the footprint cells that sit on the configured
/// terrain. Mined units wait in a small buffer until something takes them.
///
/// The accumulator counts in units of 1/ticks_per_second: every tick adds
/// `efficiency_per_tile * matching_tiles`, and each whole `ticks_per_second`
/// becomes one unit.
#[derive(Debug, Clone)]
pub struct DrillLogic {
    output: ItemTypeId,
    terrain: TerrainId,
    efficiency_per_tile: Fixed64,
    buffer_cap: u32,
    accumulator: Fixed64,
    available: u32,
}

impl DrillLogic {
    pub fn new(config: &DrillConfig) -> Result<Self, ConfigError> {
        if config.efficiency_per_tile < Fixed64::ZERO {
            return Err(ConfigError::Negative {
                field: "efficiency_per_tile",
                value: config.efficiency_per_tile.to_num(),
            });
        }
        ConfigError::at_least("buffer_cap", 1, u64::from(config.buffer_cap))?;
        Ok(Self {
            output: config.output,
            terrain: config.terrain,
            efficiency_per_tile: config.efficiency_per_tile,
            buffer_cap: config.buffer_cap,
            accumulator: Fixed64::ZERO,
            available: 0,
        })
    }

    pub fn output(&self) -> ItemTypeId {
        self.output
    }

    /// Mined units waiting to be taken.
    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn accumulator(&self) -> Fixed64 {
        self.accumulator
    }

    pub fn is_full(&self) -> bool {
        self.available >= self.buffer_cap
    }

    pub(crate) fn tick(&mut self, frame: &BuildingFrame, ctx: &mut TickContext<'_>) {
        if self.is_full() {
            return;
        }
        let matching = frame
            .tiles()
            .filter(|&pos| ctx.env.world.terrain_at(pos) == Some(self.terrain))
            .count();
        self.accumulator += self.efficiency_per_tile * Fixed64::from_num(matching as u32);

        let per_unit = Fixed64::from_num(ctx.ticks_per_second);
        while self.accumulator >= per_unit && !self.is_full() {
            self.accumulator -= per_unit;
            self.available += 1;
        }
    }
}

impl ItemProvider for DrillLogic {
    fn peek_first(&self) -> Option<ItemTypeId> {
        (self.available > 0).then_some(self.output)
    }

    fn extract_first(&mut self) -> Option<ItemTypeId> {
        if self.available == 0 {
            return None;
        }
        self.available -= 1;
        Some(self.output)
    }

    fn extract(&mut self, item: ItemTypeId) -> bool {
        item == self.output && self.extract_first().is_some()
    }
}
