use serde::{Deserialize, Serialize};

/// Converts externally supplied elapsed time into whole fixed-interval ticks.
///
/// The accumulator never ticks on its own; a paused game simply stops calling
/// [`FixedStep::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedStep {
    interval_ms: u32,
    elapsed_ms: u32,
}

impl FixedStep {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            elapsed_ms: 0,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn set_interval_ms(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms.max(1);
        self.elapsed_ms = self.elapsed_ms.min(self.interval_ms - 1);
    }

    /// Adds `dt_ms` and returns how many ticks are now due. The remainder is kept.
    pub fn advance(&mut self, dt_ms: u32) -> u32 {
        let total = u64::from(self.elapsed_ms) + u64::from(dt_ms);
        let interval = u64::from(self.interval_ms);
        self.elapsed_ms = (total % interval) as u32;
        (total / interval).min(u64::from(u32::MAX)) as u32
    }

    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
    }
}
