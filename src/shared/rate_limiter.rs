use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

/// Per-email limiter for sign-in attempts.
///
/// Every attempt consumes one cell and cells replenish steadily over the window.
/// Default: 5 attempts per 15 minutes, one attempt back every 3 minutes.
#[derive(Clone)]
pub struct SignInRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    clock: DefaultClock,
}

impl SignInRateLimiter {
    pub fn new() -> Self {
        Self::with_config(5, 15)
    }

    pub fn with_config(max_attempts: u32, window_minutes: u64) -> Self {
        let burst = NonZeroU32::new(max_attempts.max(1)).unwrap_or(NonZeroU32::MIN);
        let window = Duration::from_secs(window_minutes.max(1) * 60);
        // Replenish one cell every window / burst so a full burst refills over the window
        let period = window / burst.get();
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            clock: DefaultClock::default(),
        }
    }

    /// Record an attempt for `email`.
    ///
    /// Returns `Err(wait)` when the email is over its quota.
    pub fn check(&self, email: &str) -> Result<(), Duration> {
        self.limiter
            .check_key(&email.to_lowercase())
            .map_err(|negative| negative.wait_time_from(self.clock.now()))
    }

    /// Forget emails whose quota has fully replenished.
    ///
    /// Returns how many emails were dropped.
    pub fn cleanup(&self) -> usize {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        before.saturating_sub(self.limiter.len())
    }

    pub fn tracked(&self) -> usize {
        self.limiter.len()
    }
}

impl Default for SignInRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
