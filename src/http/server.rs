//! Debug HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create Axum Router with the debug handlers
//! - Bind the debug address and serve in a background task
//! - Graceful shutdown with a drain deadline
//!
//! # Design Decisions
//! - `:port` binds `[::]` (dual-stack) and falls back to `0.0.0.0` on hosts
//!   without IPv6
//! - Hostnames are resolved at bind time; every resolved address is tried
//! - The drain deadline aborts the accept loop. axum runs each connection as
//!   its own task, so a handler still running past the deadline is dropped
//!   with the runtime when the process exits

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::{BindAddress, ConfigSnapshot};
use crate::http::handlers::{get_config, get_healthz, get_metrics, DebugState};
use crate::lifecycle::ShutdownError;

/// Debug endpoint failure. Never fatal to the controller.
#[derive(Debug, Error)]
pub enum AuxiliaryServerError {
    #[error("failed to bind debug endpoint on {addr}: {source}")]
    Bind {
        addr: BindAddress,
        #[source]
        source: std::io::Error,
    },

    #[error("error serving debug endpoint: {0}")]
    Serve(#[source] std::io::Error),
}

/// Metrics/debug HTTP server, not yet started.
pub struct DebugServer {
    addr: BindAddress,
    state: DebugState,
}

impl DebugServer {
    pub fn new(addr: BindAddress, metrics: PrometheusHandle, config: ConfigSnapshot) -> Self {
        Self {
            addr,
            state: DebugState {
                metrics,
                config: Arc::new(config),
            },
        }
    }

    /// Build the Axum router with all debug routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(get_metrics))
            .route("/healthz", get(get_healthz))
            .route("/debug/config", get(get_config))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and start serving in a background task.
    ///
    /// A bind failure is logged and yields a handle that is not serving.
    pub async fn start(self) -> DebugServerHandle {
        let router = self.router();

        let listener = match bind(&self.addr).await {
            Ok(listener) => listener,
            Err(source) => {
                let err = AuxiliaryServerError::Bind {
                    addr: self.addr,
                    source,
                };
                tracing::error!(error = %err, "Error serving http endpoint");
                return DebugServerHandle::idle();
            }
        };
        let local_addr = listener.local_addr().ok();

        tracing::info!(
            address = ?local_addr,
            "Debug server listening"
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .map_err(AuxiliaryServerError::Serve);

            if let Err(ref e) = result {
                tracing::error!(error = %e, "Error serving http endpoint");
            }
            result
        });

        DebugServerHandle {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

async fn bind(addr: &BindAddress) -> io::Result<TcpListener> {
    match addr.host() {
        Some(host) => TcpListener::bind((host, addr.port())).await,
        None => match TcpListener::bind((Ipv6Addr::UNSPECIFIED, addr.port())).await {
            Ok(listener) => Ok(listener),
            Err(e) => {
                tracing::debug!(error = %e, "IPv6 unavailable; binding IPv4 only");
                TcpListener::bind((Ipv4Addr::UNSPECIFIED, addr.port())).await
            }
        },
    }
}

/// A running (or failed-to-bind) debug server.
#[derive(Debug)]
pub struct DebugServerHandle {
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), AuxiliaryServerError>>>,
}

impl DebugServerHandle {
    fn idle() -> Self {
        Self {
            local_addr: None,
            shutdown_tx: None,
            task: None,
        }
    }

    /// Address actually bound, if the server is serving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn is_serving(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop accepting, let in-flight requests finish for up to `grace`, then
    /// abort the serve task. Connection tasks still running at that point end
    /// when the runtime shuts down.
    pub async fn shutdown(mut self, grace: Duration) -> Result<(), ShutdownError> {
        let Some(mut task) = self.task.take() else {
            return Ok(());
        };
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        match tokio::time::timeout(grace, &mut task).await {
            // Serve errors were already logged by the task itself.
            Ok(Ok(_)) => Ok(()),
            Ok(Err(join_error)) => Err(ShutdownError::AuxiliaryTask(join_error)),
            Err(_) => {
                task.abort();
                Err(ShutdownError::AuxiliaryDeadline(grace))
            }
        }
    }
}
