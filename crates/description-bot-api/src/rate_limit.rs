//! Process-wide fixed-window request limiter.
//!
//! One bucket is shared by all callers. The counter is guarded by a mutex so
//! concurrent requests are counted exactly once each; the window restarts on
//! the first request after it has elapsed.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

#[derive(Debug)]
struct WindowState {
    started_at: Instant,
    count: u32,
}

/// Request was refused because the current window is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitExceeded {
    /// Time until the current window rolls over
    pub retry_after: Duration,
}

impl RateLimitExceeded {
    /// Retry delay rounded up to whole seconds, never zero.
    pub fn retry_after_seconds(&self) -> u64 {
        let seconds = self.retry_after.as_secs();
        if self.retry_after.subsec_nanos() > 0 || seconds == 0 {
            seconds + 1
        } else {
            seconds
        }
    }
}

/// Thread-safe fixed-window counter.
///
/// # Examples
///
/// ```
/// use description_bot_api::rate_limit::FixedWindowRateLimiter;
/// use std::time::Duration;
///
/// let limiter = FixedWindowRateLimiter::new(2, Duration::from_secs(60));
///
/// assert!(limiter.try_acquire().is_ok());
/// assert!(limiter.try_acquire().is_ok());
/// assert!(limiter.try_acquire().is_err());
/// ```
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(WindowState {
                started_at: Instant::now(),
                count: 0,
            }),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request against the current window.
    pub fn try_acquire(&self) -> Result<(), RateLimitExceeded> {
        self.try_acquire_at(Instant::now())
    }

    /// Count one request as if it arrived at `now`.
    pub fn try_acquire_at(&self, now: Instant) -> Result<(), RateLimitExceeded> {
        // A poisoned lock still holds a usable counter.
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let elapsed = now.saturating_duration_since(state.started_at);
        if elapsed >= self.window {
            state.started_at = now;
            state.count = 0;
        }

        if state.count >= self.max_requests {
            let retry_after = self.window.saturating_sub(elapsed.min(self.window));
            return Err(RateLimitExceeded { retry_after });
        }

        state.count += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;
