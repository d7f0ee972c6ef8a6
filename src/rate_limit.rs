use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Whether the recognizer may be called now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStatus {
    Ready,
    RateLimited { retry_after: Duration },
}

/// Spaces out recognizer calls, backing off exponentially on consecutive failures.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    base_backoff: Duration,
    max_backoff: Duration,
    backoff_factor: f64,
    consecutive_failures: u32,
    last_call: Option<Instant>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            min_interval: Duration::from_millis(config.min_interval_ms),
            base_backoff: Duration::from_millis(config.base_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            backoff_factor: config.backoff_factor,
            consecutive_failures: 0,
            last_call: None,
        }
    }

    /// Gap required since the last call: `min_interval` while healthy,
    /// `base * factor^(n-1)` capped at the maximum after `n` failures in a row.
    pub fn required_gap(&self) -> Duration {
        if self.consecutive_failures == 0 {
            return self.min_interval;
        }

        let exponent = (self.consecutive_failures - 1).min(64) as i32;
        let backoff = self.base_backoff.as_secs_f64() * self.backoff_factor.powi(exponent);
        let backoff = Duration::try_from_secs_f64(backoff)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff);
        backoff.max(self.min_interval)
    }

    pub fn check(&self, now: Instant) -> RateLimitStatus {
        let Some(last_call) = self.last_call else {
            return RateLimitStatus::Ready;
        };

        let elapsed = now.saturating_duration_since(last_call);
        let gap = self.required_gap();
        if elapsed >= gap {
            RateLimitStatus::Ready
        } else {
            RateLimitStatus::RateLimited {
                retry_after: gap - elapsed,
            }
        }
    }

    pub fn record_call(&mut self, now: Instant) {
        self.last_call = Some(now);
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
        self.last_call = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            min_interval_ms: 1000,
            base_backoff_ms: 2000,
            max_backoff_ms: 10_000,
            backoff_factor: 2.0,
        })
    }

    #[test]
    fn test_first_call_ready() {
        assert_eq!(limiter().check(Instant::now()), RateLimitStatus::Ready);
    }

    #[test]
    fn test_min_interval_enforced() {
        let mut limiter = limiter();
        let t0 = Instant::now();
        limiter.record_call(t0);

        assert_eq!(
            limiter.check(t0 + Duration::from_millis(400)),
            RateLimitStatus::RateLimited {
                retry_after: Duration::from_millis(600)
            }
        );
        assert_eq!(limiter.check(t0 + Duration::from_millis(1000)), RateLimitStatus::Ready);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let mut limiter = limiter();
        let expected_ms = [2000, 4000, 8000, 10_000, 10_000];
        for expected in expected_ms {
            limiter.record_failure();
            assert_eq!(limiter.required_gap(), Duration::from_millis(expected));
        }
        assert_eq!(limiter.consecutive_failures(), 5);
    }

    #[test]
    fn test_success_resets_backoff() {
        let mut limiter = limiter();
        let t0 = Instant::now();
        limiter.record_call(t0);
        limiter.record_failure();
        limiter.record_failure();
        assert!(matches!(
            limiter.check(t0 + Duration::from_millis(3000)),
            RateLimitStatus::RateLimited { .. }
        ));

        limiter.record_success();
        assert_eq!(limiter.required_gap(), Duration::from_millis(1000));
        assert_eq!(limiter.check(t0 + Duration::from_millis(3000)), RateLimitStatus::Ready);
    }

    #[test]
    fn test_reset_clears_last_call() {
        let mut limiter = limiter();
        let t0 = Instant::now();
        limiter.record_call(t0);
        limiter.record_failure();
        limiter.reset();
        assert_eq!(limiter.check(t0), RateLimitStatus::Ready);
    }
}
