//! Upstream request budgets.
//!
//! Each provider family gets a fixed quota window so that a burst of metric
//! requests cannot hammer a rate-limited upstream. When the budget is spent
//! the gateway degrades to cached/stale data instead of queueing.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token-bucket budget for one provider family.
#[derive(Clone)]
pub struct RequestBudget {
    limiter: Arc<DirectRateLimiter>,
}

impl RequestBudget {
    /// Allow `quota_limit` requests per `quota_window`, with the full limit
    /// available as burst.
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let quota = quota_from_window(quota_window, quota_limit);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Generous default: 120 requests per minute.
    pub fn default_per_minute() -> Self {
        Self::new(Duration::from_secs(60), 120)
    }

    /// Try to spend one unit of budget.
    pub fn acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = quota_limit.max(1);
    let burst = NonZeroU32::new(safe_limit).expect("safe limit must be non-zero");

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausting_the_window_denies_further_requests() {
        let budget = RequestBudget::new(Duration::from_secs(60), 2);

        assert!(budget.acquire());
        assert!(budget.acquire());
        assert!(!budget.acquire());
    }

    #[test]
    fn zero_limit_is_clamped_to_one() {
        let budget = RequestBudget::new(Duration::from_secs(60), 0);

        assert!(budget.acquire());
        assert!(!budget.acquire());
    }
}
