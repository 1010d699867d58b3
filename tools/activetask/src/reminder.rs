pub const DEFAULT_REMINDER_INTERVAL_MS: i64 = 4 * 60 * 1_000;

/// Recurring check-in reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderTimer {
    interval_ms: i64,
    last_fired_ms: Option<i64>,
}

impl ReminderTimer {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            last_fired_ms: None,
        }
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    pub fn last_fired_ms(&self) -> Option<i64> {
        self.last_fired_ms
    }

    /// Fires on the first poll and then once more than an interval has passed.
    pub fn poll(&mut self, now_ms: i64) -> bool {
        let due = match self.last_fired_ms {
            None => true,
            Some(last) => now_ms - last > self.interval_ms,
        };
        if due {
            self.last_fired_ms = Some(now_ms);
        }
        due
    }

    pub fn reset(&mut self) {
        self.last_fired_ms = None;
    }
}

impl Default for ReminderTimer {
    fn default() -> Self {
        Self::new(DEFAULT_REMINDER_INTERVAL_MS)
    }
}
