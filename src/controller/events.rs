//! Per-object event throttling.
//!
//! Each tracked object gets its own token bucket sized by the events burst
//! and refilled at the events QPS, so a flapping object cannot flood the
//! event stream while quiet objects keep their full allowance.

use std::time::Instant;

use dashmap::DashMap;

use crate::client::TokenBucket;
use crate::config::RateLimit;
use crate::observability::metrics;

pub struct EventCorrelator {
    limit: RateLimit,
    buckets: DashMap<String, TokenBucket>,
}

impl EventCorrelator {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            buckets: DashMap::new(),
        }
    }

    /// Whether an event for `object` may be emitted now.
    pub fn allow(&self, object: &str) -> bool {
        self.allow_at(object, Instant::now())
    }

    pub fn allow_at(&self, object: &str, now: Instant) -> bool {
        let capacity = self.limit.burst as f64;
        let allowed = self
            .buckets
            .entry(object.to_string())
            .or_insert_with(|| TokenBucket::new_at(capacity, now))
            .try_acquire_at(now, capacity, self.limit.qps);

        if !allowed {
            metrics::record_event_suppressed();
            tracing::debug!(object = %object, "Event suppressed by rate limit");
        }
        allowed
    }

    /// Number of objects currently tracked.
    pub fn tracked(&self) -> usize {
        self.buckets.len()
    }
}
