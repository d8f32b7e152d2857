//! Shared fakes for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use controller_agent::client::CredentialLoader;
use controller_agent::config::resolver::BoxError;
use controller_agent::config::{resolve, Args, RuntimeConfiguration};
use controller_agent::controller::{Controller, ControllerOptions, StopHandle, SubsystemStartError};
use controller_agent::lifecycle::Journal;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// In-cluster credentials always available; kubeconfig files never readable.
pub struct AmbientOnly;

impl CredentialLoader for AmbientOnly {
    async fn load_kubeconfig(&self, path: &Path) -> Result<kube::Config, BoxError> {
        Err(format!("no such file: {}", path.display()).into())
    }

    fn in_cluster(&self) -> Result<kube::Config, BoxError> {
        Ok(kube::Config::new("https://10.96.0.1:443".parse().unwrap()))
    }
}

/// Controller that records how it was driven.
#[derive(Clone, Default)]
pub struct RecordingController {
    pub fail_start: bool,
    pub stop_delay: Duration,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    /// Debug address to probe while stopping.
    pub probe_addr: Arc<Mutex<Option<SocketAddr>>>,
    /// Whether the debug endpoint answered during stop.
    pub probe_ok: Arc<AtomicBool>,
}

impl RecordingController {
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Default::default()
        }
    }
}

impl Controller for RecordingController {
    async fn start(&self, options: ControllerOptions) -> Result<StopHandle, SubsystemStartError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        assert!(options.workers > 0);

        if self.fail_start {
            return Err(SubsystemStartError::Other("informer cache never synced".into()));
        }

        let stops = self.stops.clone();
        let probe_addr = self.probe_addr.clone();
        let probe_ok = self.probe_ok.clone();
        let delay = self.stop_delay;

        Ok(StopHandle::new(move || async move {
            stops.fetch_add(1, Ordering::SeqCst);
            let addr = *probe_addr.lock().unwrap();
            if let Some(addr) = addr {
                probe_ok.store(get(addr, "/healthz").await.is_ok(), Ordering::SeqCst);
            }
            tokio::time::sleep(delay).await;
            Ok(())
        }))
    }
}

pub fn test_config() -> RuntimeConfiguration {
    let mut args = Args::default();
    args.debug_addr = "127.0.0.1:0".to_string();
    args.shutdown_grace = Duration::from_secs(2);
    resolve(&args).unwrap()
}

pub fn metrics_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

pub async fn get(addr: SocketAddr, path: &str) -> Result<String, reqwest::Error> {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(2))
        .build()?;
    client
        .get(format!("http://{addr}{path}"))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

/// Wait until the orchestrator has bound its debug server.
pub async fn wait_for_debug_addr(journal: &Journal) -> SocketAddr {
    for _ in 0..500 {
        if let Some(addr) = journal.debug_addr() {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("debug server never started");
}
