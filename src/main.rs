//! Control-plane agent (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   flags ──▶ config::resolve ──▶ RuntimeConfiguration
//!                                        │
//!                                        ▼
//!                               client::ClientBuilder ──▶ ClientHandle (rate limited)
//!                                        │
//!                                        ▼
//!   ┌──────────────────────── lifecycle::Orchestrator ─────────────────────────┐
//!   │                                                                          │
//!   │   Controller::start ──▶ StopHandle        DebugServer (/metrics) task    │
//!   │                                                                          │
//!   │   SIGINT/SIGTERM ──▶ Shutdown ──▶ stop controller ──▶ drain debug server │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;

use controller_agent::client::ClientBuilder;
use controller_agent::config::{self, Args};
use controller_agent::controller::ControllerRuntime;
use controller_agent::lifecycle::{signals, Orchestrator, StartupError};
use controller_agent::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "controller-agent starting"
    );

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Terminating");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), StartupError> {
    let config = config::resolve(&args)?;

    tracing::info!(
        discovery_interval = ?config.discovery_interval,
        cache_flush_interval = ?config.cache_flush_interval,
        debug_addr = %config.debug_addr,
        workers = config.workers,
        events_qps = config.event_rate.qps,
        events_burst = config.event_rate.burst,
        "Configuration loaded"
    );

    let metrics = match metrics::install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            // Keep running; /metrics will simply be empty.
            tracing::warn!(error = %e, "Metrics recorder unavailable");
            PrometheusBuilder::new().build_recorder().handle()
        }
    };

    let orchestrator =
        Orchestrator::bootstrap(config, &ClientBuilder::new(), ControllerRuntime::new(), metrics)
            .await?;

    signals::spawn_listener(orchestrator.shutdown_trigger()).map_err(StartupError::Signals)?;

    orchestrator.run().await
}
