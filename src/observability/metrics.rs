//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define agent metrics (discovery, cache flushes, events, lifecycle)
//! - Install the Prometheus recorder whose handle backs `/metrics`
//!
//! # Metrics
//! - `agent_discovery_refresh_total` (counter): discovery runs by result
//! - `agent_discovered_resources` (gauge): resource kinds from the last run
//! - `agent_cache_flush_total` (counter): relist generations issued
//! - `agent_events_suppressed_total` (counter): events dropped by the correlator
//! - `agent_client_throttled_total` (counter): client calls that waited for a token
//! - `agent_client_requests_total` (counter): control-plane requests by method and status
//! - `agent_client_request_duration_seconds` (histogram): control-plane request latency
//! - `agent_lifecycle_events_total` (counter): startup/shutdown steps by event
//! - `agent_shutdown_errors_total` (counter): failed teardown steps by step

use std::time::Duration;

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

pub const DISCOVERY_REFRESH_TOTAL: &str = "agent_discovery_refresh_total";
pub const DISCOVERED_RESOURCES: &str = "agent_discovered_resources";
pub const CACHE_FLUSH_TOTAL: &str = "agent_cache_flush_total";
pub const EVENTS_SUPPRESSED_TOTAL: &str = "agent_events_suppressed_total";
pub const CLIENT_THROTTLED_TOTAL: &str = "agent_client_throttled_total";
pub const CLIENT_REQUESTS_TOTAL: &str = "agent_client_requests_total";
pub const CLIENT_REQUEST_DURATION: &str = "agent_client_request_duration_seconds";
pub const LIFECYCLE_EVENTS_TOTAL: &str = "agent_lifecycle_events_total";
pub const SHUTDOWN_ERRORS_TOTAL: &str = "agent_shutdown_errors_total";

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to install metrics recorder: {0}")]
    Install(String),
}

/// Install the global Prometheus recorder and describe all metrics.
pub fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(CLIENT_REQUEST_DURATION.to_string()),
            &[0.005, 0.025, 0.1, 0.25, 0.5, 1.0, 2.5, 10.0],
        )
        .map_err(|e| MetricsError::Install(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;
    describe();
    Ok(handle)
}

fn describe() {
    describe_counter!(DISCOVERY_REFRESH_TOTAL, "Discovery refreshes by result");
    describe_gauge!(DISCOVERED_RESOURCES, "Resource kinds seen by the last discovery refresh");
    describe_counter!(CACHE_FLUSH_TOTAL, "Cache flush generations issued");
    describe_counter!(EVENTS_SUPPRESSED_TOTAL, "Events dropped by per-object rate limiting");
    describe_counter!(CLIENT_THROTTLED_TOTAL, "Client requests delayed by the request limiter");
    describe_counter!(CLIENT_REQUESTS_TOTAL, "Control-plane requests by method and status");
    describe_histogram!(
        CLIENT_REQUEST_DURATION,
        Unit::Seconds,
        "Control-plane request latency"
    );
    describe_counter!(LIFECYCLE_EVENTS_TOTAL, "Startup and shutdown steps reached");
    describe_counter!(SHUTDOWN_ERRORS_TOTAL, "Teardown steps that failed");
}

pub fn record_discovery(success: bool, resources: Option<usize>) {
    let result = if success { "success" } else { "error" };
    counter!(DISCOVERY_REFRESH_TOTAL, "result" => result).increment(1);
    if let Some(count) = resources {
        gauge!(DISCOVERED_RESOURCES).set(count as f64);
    }
}

pub fn record_cache_flush() {
    counter!(CACHE_FLUSH_TOTAL).increment(1);
}

pub fn record_event_suppressed() {
    counter!(EVENTS_SUPPRESSED_TOTAL).increment(1);
}

pub fn record_client_throttled() {
    counter!(CLIENT_THROTTLED_TOTAL).increment(1);
}

/// Record one finished control-plane request. `status` is `None` when no
/// response came back.
pub fn record_client_request(method: String, status: Option<u16>, elapsed: Duration) {
    let status = status.map_or_else(|| "error".to_string(), |code| code.to_string());
    counter!(CLIENT_REQUESTS_TOTAL, "method" => method.clone(), "status" => status).increment(1);
    histogram!(CLIENT_REQUEST_DURATION, "method" => method).record(elapsed.as_secs_f64());
}

pub fn record_lifecycle(event: &'static str) {
    counter!(LIFECYCLE_EVENTS_TOTAL, "event" => event).increment(1);
}

pub fn record_shutdown_error(step: &'static str) {
    counter!(SHUTDOWN_ERRORS_TOTAL, "step" => step).increment(1);
}
