//! Session timers as explicit deadlines.
//!
//! Two families with deliberately separate types:
//!
//! - [`DecayTimer`]: single-shot combo window, rearmed on every accept.
//! - [`CountdownTimer`]: recurring budget tick for time-bound modes.
//!
//! Both are checked by the session's scheduler tick against a caller-supplied
//! clock (`now_ms`), so a discarded session can never be mutated by a stale
//! callback. Cancelling is idempotent for both.

/// Single-shot deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecayTimer {
    deadline: Option<u64>,
}

impl DecayTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)arm to fire at `now + window`.
    pub fn arm(&mut self, now_ms: u64, window_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(window_ms));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed. Returns true exactly once per arming.
    pub fn fire_if_due(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Recurring tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTimer {
    interval_ms: u64,
    next_at: Option<u64>,
}

impl CountdownTimer {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_at: None,
        }
    }

    pub fn start(&mut self, now_ms: u64) {
        self.next_at = Some(now_ms.saturating_add(self.interval_ms));
    }

    pub fn cancel(&mut self) {
        self.next_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_at.is_some()
    }

    /// Number of whole intervals elapsed since the last call; advances the schedule.
    pub fn due_ticks(&mut self, now_ms: u64) -> u32 {
        let Some(mut next) = self.next_at else {
            return 0;
        };
        let mut ticks = 0u32;
        while now_ms >= next {
            ticks += 1;
            next += self.interval_ms;
        }
        self.next_at = Some(next);
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_fires_once_after_deadline() {
        let mut t = DecayTimer::new();
        assert!(!t.fire_if_due(10_000));
        t.arm(1_000, 4_500);
        assert_eq!(t.deadline(), Some(5_500));
        assert!(!t.fire_if_due(5_499));
        assert!(t.fire_if_due(5_500));
        assert!(!t.fire_if_due(9_000));
        assert!(!t.is_armed());
    }

    #[test]
    fn rearming_pushes_deadline() {
        let mut t = DecayTimer::new();
        t.arm(0, 4_500);
        t.arm(3_000, 4_500);
        assert!(!t.fire_if_due(5_000));
        assert!(t.fire_if_due(7_500));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut d = DecayTimer::new();
        d.cancel();
        d.cancel();
        assert!(!d.is_armed());

        let mut c = CountdownTimer::new(1_000);
        c.cancel();
        c.start(0);
        c.cancel();
        c.cancel();
        assert_eq!(c.due_ticks(50_000), 0);
    }

    #[test]
    fn countdown_counts_whole_intervals() {
        let mut c = CountdownTimer::new(1_000);
        c.start(0);
        assert_eq!(c.due_ticks(999), 0);
        assert_eq!(c.due_ticks(1_000), 1);
        assert_eq!(c.due_ticks(3_500), 2);
        assert_eq!(c.due_ticks(3_999), 0);
        assert_eq!(c.due_ticks(4_000), 1);
    }
}
