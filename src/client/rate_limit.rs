//! Token bucket rate limiting for outbound control-plane traffic.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::RateLimit;
use crate::observability::metrics;

/// A simple token bucket.
///
/// Capacity and refill rate are passed on every call so one type can back
/// both the client limiter and the keyed event correlator.
#[derive(Debug)]
pub struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    /// Create a full bucket.
    pub fn new(capacity: f64) -> Self {
        Self::new_at(capacity, Instant::now())
    }

    pub fn new_at(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    pub fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        self.try_acquire_at(Instant::now(), capacity, refill_rate)
    }

    /// Take one token if available at `now`.
    pub fn try_acquire_at(&mut self, now: Instant, capacity: f64, refill_rate: f64) -> bool {
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until one whole token is available. Saturates at
    /// `Duration::MAX` for rates too small to represent.
    pub fn wait_time(&self, refill_rate: f64) -> Duration {
        let missing = (1.0 - self.tokens).max(0.0);
        Duration::try_from_secs_f64(missing / refill_rate).unwrap_or(Duration::MAX)
    }
}

/// Shared limiter for a single client.
#[derive(Debug)]
pub struct RequestLimiter {
    limit: RateLimit,
    bucket: Mutex<TokenBucket>,
}

impl RequestLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            bucket: Mutex::new(TokenBucket::new(limit.burst as f64)),
        }
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Take a token without waiting.
    pub fn try_acquire(&self) -> bool {
        self.lock()
            .try_acquire(self.limit.burst as f64, self.limit.qps)
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&self) {
        let mut throttled = false;
        loop {
            let wait = {
                let mut bucket = self.lock();
                if bucket.try_acquire(self.limit.burst as f64, self.limit.qps) {
                    return;
                }
                bucket.wait_time(self.limit.qps)
            };

            if !throttled {
                metrics::record_client_throttled();
                tracing::debug!(wait = ?wait, "Client request throttled");
                throttled = true;
            }
            tokio::time::sleep(wait).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_allows_burst_then_refuses() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new_at(3.0, start);

        assert!(bucket.try_acquire_at(start, 3.0, 1.0));
        assert!(bucket.try_acquire_at(start, 3.0, 1.0));
        assert!(bucket.try_acquire_at(start, 3.0, 1.0));
        assert!(!bucket.try_acquire_at(start, 3.0, 1.0));
    }

    #[test]
    fn test_bucket_refills_at_rate() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new_at(1.0, start);
        assert!(bucket.try_acquire_at(start, 1.0, 2.0));
        assert!(!bucket.try_acquire_at(start, 1.0, 2.0));

        // 2 tokens/s: half a second buys one token
        assert!(!bucket.try_acquire_at(start + Duration::from_millis(200), 1.0, 2.0));
        assert!(bucket.try_acquire_at(start + Duration::from_millis(500), 1.0, 2.0));
    }

    #[test]
    fn test_bucket_never_exceeds_capacity() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new_at(2.0, start);
        let later = start + Duration::from_secs(3600);

        assert!(bucket.try_acquire_at(later, 2.0, 10.0));
        assert!(bucket.try_acquire_at(later, 2.0, 10.0));
        assert!(!bucket.try_acquire_at(later, 2.0, 10.0));
    }

    #[test]
    fn test_wait_time() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new_at(1.0, start);
        assert!(bucket.try_acquire_at(start, 1.0, 4.0));

        assert_eq!(bucket.wait_time(4.0), Duration::from_millis(250));
    }

    #[test]
    fn test_wait_time_saturates_for_tiny_rates() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new_at(1.0, start);
        assert!(bucket.try_acquire_at(start, 1.0, 1e-30));

        assert_eq!(bucket.wait_time(1e-30), Duration::MAX);
    }

    #[tokio::test]
    async fn test_limiter_with_tiny_rate_waits_instead_of_panicking() {
        let limiter = RequestLimiter::new(RateLimit::new(1e-30, 1));
        limiter.acquire().await;

        let second = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(second.is_err());
    }

    #[test]
    fn test_limiter_try_acquire_uses_burst() {
        let limiter = RequestLimiter::new(RateLimit::new(0.001, 2));

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_limiter_acquire_waits_for_refill() {
        let limiter = RequestLimiter::new(RateLimit::new(50.0, 1));
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
