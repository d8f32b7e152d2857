//! Shutdown coordination for the agent.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::controller::StopError;

/// Teardown step failure. Logged, never blocks exit.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error(transparent)]
    Controller(#[from] StopError),

    #[error("debug server did not drain within {0:?}; connections were cut")]
    AuxiliaryDeadline(Duration),

    #[error("debug server task failed: {0}")]
    AuxiliaryTask(#[from] tokio::task::JoinError),
}

/// Single-slot shutdown trigger.
///
/// Cloning shares the slot. Once set it stays set; later triggers are no-ops.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create a new, untriggered shutdown slot.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Wait handle for the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Set the slot. Returns `true` only for the call that actually set it.
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|triggered| {
            if *triggered {
                false
            } else {
                *triggered = true;
                true
            }
        })
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once the slot is set, immediately if it already is.
    pub async fn recv(&mut self) {
        // The sender lives inside every `Shutdown` clone; if all are gone
        // nothing can trigger any more, so treat that as shutdown too.
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

/// Coordinator state. There is no way back from `ShuttingDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Running,
    ShuttingDown,
}

const RUNNING: u8 = 0;
const SHUTTING_DOWN: u8 = 1;

/// Two-state machine guarding the teardown sequence.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: AtomicU8,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(RUNNING),
        }
    }

    pub fn state(&self) -> CoordinatorState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => CoordinatorState::Running,
            _ => CoordinatorState::ShuttingDown,
        }
    }

    /// Running → ShuttingDown. Returns `true` only for the caller that made
    /// the transition.
    pub fn begin_shutdown(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, SHUTTING_DOWN, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
