//! Controller subsystem contract.
//!
//! # Data Flow
//! ```text
//! Orchestrator
//!     → Controller::start(ControllerOptions)
//!     → StopHandle (held until shutdown)
//!     → StopHandle::stop() awaits full quiescence
//! ```
//!
//! # Design Decisions
//! - The orchestrator only sees this trait; any reconciliation engine can
//!   sit behind it
//! - `StopHandle::stop` consumes the handle, so a stop can only be requested once
//! - `runtime.rs` is the built-in implementation used by the binary

pub mod catalog;
pub mod events;
pub mod runtime;

use std::future::Future;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;

use crate::client::ClientHandle;
use crate::config::resolver::BoxError;
use crate::config::{RateLimit, RuntimeConfiguration};

pub use catalog::{ResourceCatalog, ResourceKind};
pub use events::EventCorrelator;
pub use runtime::ControllerRuntime;

/// Controller subsystem failed to initialize. Fatal.
#[derive(Debug, Error)]
pub enum SubsystemStartError {
    #[error("failed to create control-plane client: {0}")]
    Client(#[from] kube::Error),

    #[error("controller failed to start: {0}")]
    Other(#[source] BoxError),
}

/// Controller subsystem reported a failure while stopping.
#[derive(Debug, Error)]
#[error("controller stop failed: {0}")]
pub struct StopError(#[source] pub BoxError);

/// Everything the controller subsystem is started with.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub client: ClientHandle,
    pub discovery_interval: Duration,
    pub cache_flush_interval: Duration,
    pub workers: usize,
    /// Per-object event limits.
    pub events: RateLimit,
}

impl ControllerOptions {
    pub fn new(config: &RuntimeConfiguration, client: ClientHandle) -> Self {
        Self {
            client,
            discovery_interval: config.discovery_interval,
            cache_flush_interval: config.cache_flush_interval,
            workers: config.workers,
            events: config.event_rate,
        }
    }
}

/// Request shutdown of a running controller and wait until it has stopped.
pub struct StopHandle {
    stop: Box<dyn FnOnce() -> BoxFuture<'static, Result<(), StopError>> + Send>,
}

impl StopHandle {
    pub fn new<F, Fut>(stop: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), StopError>> + Send + 'static,
    {
        Self {
            stop: Box::new(move || stop().boxed()),
        }
    }

    /// Resolves once all controller activity has ceased.
    pub async fn stop(self) -> Result<(), StopError> {
        (self.stop)().await
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle").finish_non_exhaustive()
    }
}

/// A controller subsystem that can be started once.
pub trait Controller: Send + Sync {
    fn start(
        &self,
        options: ControllerOptions,
    ) -> impl Future<Output = Result<StopHandle, SubsystemStartError>> + Send;
}
