//! Debug HTTP endpoint subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection on debug-addr
//!     → server.rs (Axum setup, graceful shutdown, drain deadline)
//!     → handlers.rs (/metrics, /healthz, /debug/config)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Observability is best-effort: bind or serve failures are logged, never fatal
//! - The server runs as its own task with its own shutdown channel
//! - Shutdown waits a bounded grace period, then cuts remaining connections

pub mod handlers;
pub mod server;

pub use server::{AuxiliaryServerError, DebugServer, DebugServerHandle};
