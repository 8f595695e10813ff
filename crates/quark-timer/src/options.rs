use serde::{Deserialize, Serialize};

/// Upper bound on catch-up fires for one timer within a single tick.
pub const DEFAULT_MAX_FIRES_PER_TICK: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerOptions {
    /// Catch-up bound per timer per tick. `0` is treated as `1`.
    pub max_fires_per_tick: u32,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            max_fires_per_tick: DEFAULT_MAX_FIRES_PER_TICK,
        }
    }
}

impl TimerOptions {
    #[must_use]
    pub fn with_max_fires_per_tick(mut self, max: u32) -> Self {
        self.max_fires_per_tick = max;
        self
    }
}
