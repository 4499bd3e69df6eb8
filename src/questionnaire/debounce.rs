use std::time::{Duration, Instant};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Token for a scheduled recomputation. Only the most recent token can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRecompute {
    generation: u64,
    due_at: Instant,
}

impl PendingRecompute {
    pub fn due_at(&self) -> Instant {
        self.due_at
    }
}

/// Rate-limits recomputation while the user is typing.
#[derive(Debug, Clone)]
pub struct RecomputeScheduler {
    quiet_period: Duration,
    generation: u64,
    pending: Option<PendingRecompute>,
}

impl Default for RecomputeScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl RecomputeScheduler {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            generation: 0,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Issue a new token, superseding any outstanding one.
    pub fn schedule(&mut self, now: Instant) -> PendingRecompute {
        self.generation += 1;
        let token = PendingRecompute {
            generation: self.generation,
            due_at: now + self.quiet_period,
        };
        self.pending = Some(token);
        token
    }

    pub fn pending(&self) -> Option<PendingRecompute> {
        self.pending
    }

    pub fn is_current(&self, token: PendingRecompute) -> bool {
        self.pending == Some(token)
    }

    /// Consume `token` if it is still current and its quiet period has elapsed.
    pub fn fire(&mut self, token: PendingRecompute, now: Instant) -> bool {
        if self.is_current(token) && now >= token.due_at {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Drop the outstanding token, returning it if there was one.
    pub fn cancel(&mut self) -> Option<PendingRecompute> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_fires_only_after_quiet_period() {
        let mut scheduler = RecomputeScheduler::default();
        let start = Instant::now();
        let token = scheduler.schedule(start);

        assert!(!scheduler.fire(token, start + Duration::from_millis(299)));
        assert!(scheduler.fire(token, start + Duration::from_millis(300)));
        assert!(!scheduler.fire(token, start + Duration::from_millis(400)));
    }

    #[test]
    fn newer_input_supersedes_pending_token() {
        let mut scheduler = RecomputeScheduler::new(Duration::from_millis(100));
        let start = Instant::now();
        let first = scheduler.schedule(start);
        let second = scheduler.schedule(start + Duration::from_millis(50));

        assert!(!scheduler.is_current(first));
        assert!(!scheduler.fire(first, start + Duration::from_secs(1)));
        assert!(scheduler.fire(second, start + Duration::from_millis(150)));
    }

    #[test]
    fn cancel_clears_pending_work() {
        let mut scheduler = RecomputeScheduler::default();
        let token = scheduler.schedule(Instant::now());
        assert_eq!(scheduler.cancel(), Some(token));
        assert!(scheduler.pending().is_none());
        assert!(!scheduler.fire(token, token.due_at()));
    }
}
