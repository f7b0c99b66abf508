use serde::{Deserialize, Serialize};

/// Engine tuning loaded alongside content definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed simulation rate. One tick lasts `1 / ticks_per_second` seconds.
    pub ticks_per_second: u32,
    /// Ring buffer size per event kind.
    pub event_buffer_capacity: usize,
    /// Upper bound on ticks run by a single `advance` call. `None` runs every
    /// tick the elapsed time covers.
    pub max_catch_up_steps: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 60,
            event_buffer_capacity: 1024,
            max_catch_up_steps: None,
        }
    }
}
