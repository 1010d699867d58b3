use serde::{Deserialize, Serialize};

/// One continuous span of attention on a named activity. Times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTask {
    /// Archive key, assigned only when the task is archived.
    pub id: Option<String>,
    pub name: String,
    pub started: i64,
    pub last_checkin: i64,
    pub time_distracted: i64,
    pub distracted: bool,
    /// Productive time.
    pub task_length: i64,
}

impl ActiveTask {
    pub fn new(name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            started: now_ms,
            last_checkin: now_ms,
            time_distracted: 0,
            distracted: false,
            task_length: 0,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started > 0
    }

    pub fn is_archived(&self) -> bool {
        self.id.is_some()
    }

    /// Total time accounted for so far, productive plus distracted.
    pub fn accounted_ms(&self) -> i64 {
        self.task_length.saturating_add(self.time_distracted)
    }

    /// Closes the span since the last check-in as productive time.
    ///
    /// While distracted, the open span is closed as distracted time instead and
    /// the distracted flag is cleared.
    pub fn still_working(&mut self, now_ms: i64) {
        if !self.is_started() {
            tracing::error!(task = %self.name, "cannot check in a task that has not started");
            return;
        }
        if self.distracted {
            self.mark_distracted(now_ms);
            self.distracted = false;
        } else {
            let elapsed = self.take_elapsed(now_ms);
            self.task_length = self.task_length.saturating_add(elapsed);
        }
    }

    /// Closes the span since the last check-in as distracted time.
    pub fn mark_distracted(&mut self, now_ms: i64) {
        let elapsed = self.take_elapsed(now_ms);
        self.distracted = true;
        self.time_distracted = self.time_distracted.saturating_add(elapsed);
    }

    /// Finalizes the last open span; same accounting as [`ActiveTask::still_working`].
    pub fn complete(&mut self, now_ms: i64) {
        if !self.is_started() {
            tracing::error!(task = %self.name, "cannot complete a task that has not started");
            return;
        }
        self.still_working(now_ms);
    }

    fn take_elapsed(&mut self, now_ms: i64) -> i64 {
        // A clock stepping backwards must not rewind the check-in or shrink totals.
        let now_ms = now_ms.max(self.last_checkin);
        let elapsed = now_ms.saturating_sub(self.last_checkin);
        self.last_checkin = now_ms;
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn check_in_accumulates_productive_time() {
        let mut task = ActiveTask::new("write", T0);
        task.still_working(T0 + 1_000);
        task.still_working(T0 + 3_500);
        assert_eq!(task.task_length, 3_500);
        assert_eq!(task.time_distracted, 0);
        assert_eq!(task.last_checkin, T0 + 3_500);
    }

    #[test]
    fn first_check_in_after_distraction_counts_as_distracted() {
        let mut task = ActiveTask::new("write", T0);
        task.mark_distracted(T0 + 1_000);
        task.still_working(T0 + 5_000);
        assert_eq!(task.time_distracted, 5_000);
        assert_eq!(task.task_length, 0);
        assert!(!task.distracted);

        task.still_working(T0 + 6_000);
        assert_eq!(task.task_length, 1_000);
    }

    #[test]
    fn repeated_distraction_adds_successive_deltas() {
        let mut task = ActiveTask::new("write", T0);
        task.mark_distracted(T0 + 2_000);
        task.mark_distracted(T0 + 5_000);
        assert_eq!(task.time_distracted, 5_000);
        assert!(task.distracted);
    }

    #[test]
    fn unstarted_task_ignores_check_in_and_complete() {
        let mut task = ActiveTask::new("broken", 0);
        let before = task.clone();
        task.still_working(T0);
        task.complete(T0);
        assert_eq!(task, before);
    }

    #[test]
    fn backwards_clock_never_decreases_totals() {
        let mut task = ActiveTask::new("write", T0);
        task.still_working(T0 + 10_000);
        task.still_working(T0 + 4_000);
        assert_eq!(task.task_length, 10_000);
        assert_eq!(task.last_checkin, T0 + 10_000);
    }

    #[test]
    fn extreme_timestamps_saturate_instead_of_overflowing() {
        let mut task = ActiveTask::new("edited", T0);
        task.last_checkin = i64::MIN;
        task.task_length = i64::MAX - 1;
        task.still_working(T0);
        assert_eq!(task.task_length, i64::MAX);
        assert_eq!(task.last_checkin, T0);

        task.time_distracted = i64::MAX;
        task.mark_distracted(i64::MAX);
        assert_eq!(task.time_distracted, i64::MAX);
        assert_eq!(task.accounted_ms(), i64::MAX);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let task = ActiveTask::new("write", T0);
        let json = serde_json::to_value(&task).expect("serialize task");
        for key in ["id", "name", "started", "lastCheckin", "timeDistracted", "distracted", "taskLength"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
