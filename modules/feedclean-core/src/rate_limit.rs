use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_LIMIT: u32 = 100;
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

/// Fixed-window request counter. Bursts on either side of a window boundary
/// can reach twice the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBudget {
    pub count: u32,
    pub window_start: Instant,
    pub limit: u32,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    budget: RateBudget,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::starting_at(limit, window, Instant::now())
    }

    pub fn starting_at(limit: u32, window: Duration, start: Instant) -> Self {
        Self {
            budget: RateBudget {
                count: 0,
                window_start: start,
                limit,
                window,
            },
        }
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Count one attempt at `now`, or deny it if the window is spent.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        let budget = &mut self.budget;
        if now.saturating_duration_since(budget.window_start) > budget.window {
            budget.count = 0;
            budget.window_start = now;
        }
        if budget.count >= budget.limit {
            return false;
        }
        budget.count += 1;
        true
    }

    pub fn budget(&self) -> &RateBudget {
        &self.budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_resets_after_elapsed() {
        let start = Instant::now();
        let mut limiter = RateLimiter::starting_at(2, Duration::from_millis(1000), start);

        assert!(limiter.try_acquire_at(start));
        assert!(limiter.try_acquire_at(start + Duration::from_millis(400)));
        assert!(!limiter.try_acquire_at(start + Duration::from_millis(900)));
        // Exactly one window later is still the same window.
        assert!(!limiter.try_acquire_at(start + Duration::from_millis(1000)));
        assert!(limiter.try_acquire_at(start + Duration::from_millis(1001)));
        assert_eq!(limiter.budget().count, 1);
    }

    #[test]
    fn test_zero_limit_always_denies() {
        let start = Instant::now();
        let mut limiter = RateLimiter::starting_at(0, Duration::from_secs(1), start);
        assert!(!limiter.try_acquire_at(start));
        assert!(!limiter.try_acquire_at(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_defaults() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.budget().limit, 100);
        assert_eq!(limiter.budget().window, Duration::from_secs(60));
    }
}
