//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the control-plane client from the resolved configuration
//! - Start the controller subsystem, then the debug server
//! - Block until shutdown is triggered, then tear down in order
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Debug server starts only after the controller started successfully
//! - Controller stop completes before the debug server begins shutting down

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;

use crate::client::{ClientBuilder, ClientHandle, CredentialLoader};
use crate::config::{ConfigError, RuntimeConfiguration};
use crate::controller::{Controller, ControllerOptions, SubsystemStartError};
use crate::http::DebugServer;
use crate::lifecycle::journal::{Journal, LifecycleEvent};
use crate::lifecycle::shutdown::{Shutdown, ShutdownCoordinator, ShutdownError};
use crate::observability::metrics;

/// Fatal startup failure; the process exits non-zero.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Subsystem(#[from] SubsystemStartError),

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}

/// Drives the agent from a resolved configuration to a finished shutdown.
pub struct Orchestrator<C> {
    config: RuntimeConfiguration,
    client: ClientHandle,
    controller: C,
    metrics: PrometheusHandle,
    shutdown: Shutdown,
    coordinator: Arc<ShutdownCoordinator>,
    journal: Journal,
}

impl<C: Controller> Orchestrator<C> {
    pub fn new(
        config: RuntimeConfiguration,
        client: ClientHandle,
        controller: C,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            config,
            client,
            controller,
            metrics,
            shutdown: Shutdown::new(),
            coordinator: Arc::new(ShutdownCoordinator::new()),
            journal: Journal::new(),
        }
    }

    /// Build the client, then the orchestrator. Credential failures are fatal
    /// and happen before anything is started.
    pub async fn bootstrap<L: CredentialLoader>(
        config: RuntimeConfiguration,
        builder: &ClientBuilder<L>,
        controller: C,
        metrics: PrometheusHandle,
    ) -> Result<Self, StartupError> {
        let client = builder.build(&config).await?;
        Ok(Self::new(config, client, controller, metrics))
    }

    /// Trigger that ends [`run`](Self::run). Wire OS signals or tests to it.
    pub fn shutdown_trigger(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Read-only view of the Running/ShuttingDown state.
    pub fn coordinator(&self) -> Arc<ShutdownCoordinator> {
        self.coordinator.clone()
    }

    /// Run until shutdown is triggered.
    ///
    /// Returns an error only for fatal startup failures; teardown problems are
    /// logged and do not affect the result.
    pub async fn run(self) -> Result<(), StartupError> {
        let mut signal = self.shutdown.subscribe();

        let options = ControllerOptions::new(&self.config, self.client.clone());
        let stop = self.controller.start(options).await?;
        self.journal.record(LifecycleEvent::ControllerStarted);

        let debug_server = DebugServer::new(
            self.config.debug_addr.clone(),
            self.metrics.clone(),
            self.config.snapshot(),
        )
        .start()
        .await;
        self.journal
            .record(LifecycleEvent::DebugServerStarted(debug_server.local_addr()));

        tracing::info!("Agent running; waiting for termination signal");
        signal.recv().await;

        if !self.coordinator.begin_shutdown() {
            tracing::warn!("Coordinator already left Running state");
        }
        self.journal.record(LifecycleEvent::ShutdownRequested);

        if let Err(e) = stop.stop().await.map_err(ShutdownError::from) {
            metrics::record_shutdown_error("controller");
            tracing::error!(error = %e, "Error stopping controller");
        }
        self.journal.record(LifecycleEvent::ControllerStopped);

        if let Err(e) = debug_server.shutdown(self.config.shutdown_grace).await {
            metrics::record_shutdown_error("debug_server");
            tracing::error!(error = %e, "Error shutting down http endpoint");
        }
        self.journal.record(LifecycleEvent::DebugServerStopped);

        tracing::info!("Shutdown complete");
        Ok(())
    }
}
