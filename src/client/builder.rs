//! Control-plane client construction.

use std::sync::Arc;

use crate::client::credentials::{CredentialLoader, KubeCredentials};
use crate::client::layer::RequestLimitLayer;
use crate::client::rate_limit::RequestLimiter;
use crate::config::{ConfigError, CredentialsSource, RateLimit, RuntimeConfiguration};

/// Authenticated, rate-limited handle to the control-plane API.
///
/// Clones share the same limiter, so the configured QPS/burst applies to the
/// process as a whole, across every client built by [`ClientHandle::connect`].
#[derive(Debug, Clone)]
pub struct ClientHandle {
    config: kube::Config,
    source: CredentialsSource,
    limiter: Arc<RequestLimiter>,
}

impl ClientHandle {
    pub fn new(config: kube::Config, source: CredentialsSource, rate: RateLimit) -> Self {
        Self {
            config,
            source,
            limiter: Arc::new(RequestLimiter::new(rate)),
        }
    }

    /// Resolved connection settings.
    pub fn kube_config(&self) -> &kube::Config {
        &self.config
    }

    /// Credential source that produced this handle.
    pub fn source(&self) -> &CredentialsSource {
        &self.source
    }

    pub fn rate_limit(&self) -> RateLimit {
        self.limiter.limit()
    }

    pub fn try_acquire(&self) -> bool {
        self.limiter.try_acquire()
    }

    /// Build a `kube::Client` whose every request goes through the shared
    /// limiter. Must be called inside a Tokio runtime; performs no network
    /// traffic.
    pub fn connect(&self) -> Result<kube::Client, kube::Error> {
        let client = kube::client::ClientBuilder::try_from(self.config.clone())?
            .with_layer(&RequestLimitLayer::new(self.limiter.clone()))
            .build();
        Ok(client)
    }
}

/// Builds a [`ClientHandle`] from the runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder<L = KubeCredentials> {
    loader: L,
}

impl ClientBuilder<KubeCredentials> {
    pub fn new() -> Self {
        Self {
            loader: KubeCredentials,
        }
    }
}

impl<L: CredentialLoader> ClientBuilder<L> {
    pub fn with_loader(loader: L) -> Self {
        Self { loader }
    }

    /// Resolve credentials and apply the client rate limits.
    ///
    /// An explicit kubeconfig path is used exclusively when set; ambient
    /// credentials are not consulted even as a fallback.
    pub async fn build(&self, config: &RuntimeConfiguration) -> Result<ClientHandle, ConfigError> {
        let source = config.credentials.clone();

        let loaded = match &source {
            CredentialsSource::Explicit(path) => {
                tracing::info!(
                    path = %path.display(),
                    "Using current context from kubeconfig file"
                );
                self.loader.load_kubeconfig(path).await
            }
            CredentialsSource::Ambient => {
                tracing::info!("No kubeconfig file specified; trying in-cluster auto-config");
                self.loader.in_cluster()
            }
        };
        let kube_config = loaded.map_err(|cause| ConfigError::credentials(&source, cause))?;

        tracing::info!(
            cluster_url = %kube_config.cluster_url,
            qps = config.client_rate.qps,
            burst = config.client_rate.burst,
            "Control-plane client configured"
        );

        Ok(ClientHandle::new(kube_config, source, config.client_rate))
    }
}
