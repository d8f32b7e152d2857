//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → debug endpoint /metrics (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with key/value fields, JSON for machine parsing
//! - One global metrics recorder, installed once by the binary
//! - Library code only emits through the facades; without a recorder
//!   installed every metric call is a no-op

pub mod logging;
pub mod metrics;
