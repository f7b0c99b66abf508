//! Simulation clock and state hashing.
//!
//! The engine runs a fixed-timestep loop: real elapsed time is added to an
//! accumulator, and every whole step length it holds becomes one tick. Render
//! rate and simulation rate are independent.

use crate::fixed::{Fixed64, Ticks};
use crate::grid::GridPosition;
use crate::id::ItemTypeId;

/// Clock state owned by the engine.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Ticks completed so far.
    pub tick: Ticks,

    /// Seconds of real time not yet turned into ticks. Below one step length
    /// after `advance` returns.
    pub accumulator: Fixed64,
}

/// What one `Engine::advance` call did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceResult {
    pub steps_run: u64,
    /// Set when the catch-up limit was hit and leftover time was dropped.
    pub clamped: bool,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// FNV-1a (64-bit) over the simulation state, for lockstep and replay
/// comparisons. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(u64);

/// Written in place of an item id for empty slots.
const NO_ITEM: u32 = u32::MAX;

impl StateHash {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    pub fn new() -> Self {
        Self(Self::OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 ^ u64::from(b)).wrapping_mul(Self::PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write(&[u8::from(v)]);
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn write_position(&mut self, pos: GridPosition) {
        self.write(&pos.x.to_le_bytes());
        self.write(&pos.y.to_le_bytes());
    }

    /// An optional item; `None` hashes differently from every real id.
    pub fn write_item(&mut self, item: Option<ItemTypeId>) {
        self.write_u32(item.map_or(NO_ITEM, |i| i.0));
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
