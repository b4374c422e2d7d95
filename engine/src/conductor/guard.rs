//! Time Guard
//!
//! Hard ceiling on the duration of the exploration loop. Checked at the top
//! of every iteration; a call that is already running is allowed to finish.
//! Once expired the guard stays expired.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when advanced
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Running,
    Expired,
}

pub struct TimeGuard {
    clock: Arc<dyn Clock>,
    start: Instant,
    budget: Duration,
    state: GuardState,
}

impl TimeGuard {
    /// Start the budget now
    pub fn start(clock: Arc<dyn Clock>, budget: Duration) -> Self {
        let start = clock.now();
        Self {
            clock,
            start,
            budget,
            state: GuardState::Running,
        }
    }

    /// Evaluate the guard at the start of a loop iteration.
    ///
    /// Expires the first time the elapsed time exceeds the budget.
    pub fn check(&mut self) -> GuardState {
        if self.state == GuardState::Running && self.elapsed() > self.budget {
            tracing::warn!(
                "Time budget of {}s exhausted after {:.1}s",
                self.budget.as_secs(),
                self.elapsed().as_secs_f64()
            );
            self.state = GuardState::Expired;
        }
        self.state
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_until_budget_exceeded() {
        let clock = Arc::new(ManualClock::new());
        let mut guard = TimeGuard::start(clock.clone(), Duration::from_secs(900));

        assert_eq!(guard.check(), GuardState::Running);
        clock.advance(Duration::from_secs(900));
        // Exactly at the deadline is still within budget
        assert_eq!(guard.check(), GuardState::Running);
        clock.advance(Duration::from_millis(1));
        assert_eq!(guard.check(), GuardState::Expired);
    }

    #[test]
    fn test_expired_is_terminal() {
        let clock = Arc::new(ManualClock::new());
        let mut guard = TimeGuard::start(clock.clone(), Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));
        assert_eq!(guard.check(), GuardState::Expired);
        assert_eq!(guard.check(), GuardState::Expired);
        assert_eq!(guard.state(), GuardState::Expired);
    }

    #[test]
    fn test_elapsed_follows_clock() {
        let clock = Arc::new(ManualClock::new());
        let guard = TimeGuard::start(clock.clone(), Duration::from_secs(30));
        assert_eq!(guard.elapsed(), Duration::ZERO);
        clock.advance(Duration::from_secs(12));
        assert_eq!(guard.elapsed(), Duration::from_secs(12));
    }
}
