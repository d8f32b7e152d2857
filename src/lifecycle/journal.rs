//! Ordered record of lifecycle steps.
//!
//! Every step the orchestrator takes is logged, counted, and appended here so
//! the startup/teardown order can be inspected after the fact.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    ControllerStarted,
    /// Debug server start attempted; `None` if the bind failed.
    DebugServerStarted(Option<SocketAddr>),
    ShutdownRequested,
    ControllerStopped,
    DebugServerStopped,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::ControllerStarted => "controller_started",
            LifecycleEvent::DebugServerStarted(_) => "debug_server_started",
            LifecycleEvent::ShutdownRequested => "shutdown_requested",
            LifecycleEvent::ControllerStopped => "controller_stopped",
            LifecycleEvent::DebugServerStopped => "debug_server_stopped",
        }
    }
}

/// Shared, append-only event list.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: LifecycleEvent) {
        tracing::debug!(event = event.name(), "Lifecycle step");
        metrics::record_lifecycle(event.name());
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn snapshot(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bound address of the debug server, once it has started.
    pub fn debug_addr(&self) -> Option<SocketAddr> {
        self.snapshot().into_iter().find_map(|event| match event {
            LifecycleEvent::DebugServerStarted(addr) => addr,
            _ => None,
        })
    }

    pub fn count(&self, name: &str) -> usize {
        self.snapshot().iter().filter(|e| e.name() == name).count()
    }
}
