//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals into the shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Repeated signals are logged and otherwise ignored; the first one wins
//! - No other signals are handled

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Forward termination signals into `shutdown` until the process exits.
///
/// Handlers are registered before this returns, so a signal arriving right
/// after startup is not lost.
#[cfg(unix)]
pub fn spawn_listener(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(_) = interrupt.recv() => "SIGINT",
                Some(_) = terminate.recv() => "SIGTERM",
                else => break,
            };
            deliver(&shutdown, name);
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_listener(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            deliver(&shutdown, "ctrl-c");
        }
    }))
}

fn deliver(shutdown: &Shutdown, signal: &'static str) {
    if shutdown.trigger() {
        tracing::info!(signal, "Shutting down...");
    } else {
        tracing::warn!(signal, "Shutdown already in progress; ignoring signal");
    }
}
