//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Build client → Start controller → Start debug server
//!
//! Shutdown (shutdown.rs):
//!     Trigger set → Stop controller (wait) → Drain debug server (bounded) → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then client, then controller, then listeners
//! - Ordered shutdown: controller fully stopped before the debug server drains
//! - Debug server shutdown has a deadline; controller stop does not
//! - Every step is written to the journal for inspection

pub mod journal;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use journal::{Journal, LifecycleEvent};
pub use shutdown::{CoordinatorState, Shutdown, ShutdownCoordinator, ShutdownError, ShutdownSignal};
pub use startup::{Orchestrator, StartupError};
