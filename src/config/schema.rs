//! Resolved configuration types.
//!
//! Everything here is built once by the resolver and never mutated.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Where the control-plane credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsSource {
    /// Kubeconfig file at the given path (current context).
    Explicit(PathBuf),
    /// Credentials discovered from the execution environment (in-cluster).
    Ambient,
}

impl fmt::Display for CredentialsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialsSource::Explicit(path) => write!(f, "kubeconfig {}", path.display()),
            CredentialsSource::Ambient => write!(f, "in-cluster config"),
        }
    }
}

/// Listen address for the debug endpoint.
///
/// The host is kept unresolved so hostnames work; it is looked up when the
/// listener binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindAddress {
    host: Option<String>,
    port: u16,
}

impl BindAddress {
    /// Every local interface, IPv6 included.
    pub fn all_interfaces(port: u16) -> Self {
        Self { host: None, port }
    }

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port,
        }
    }

    /// Host or IP literal, `None` for all interfaces.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for BindAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            None => write!(f, ":{}", self.port),
            Some(host) if host.contains(':') => write!(f, "[{host}]:{}", self.port),
            Some(host) => write!(f, "{host}:{}", self.port),
        }
    }
}

/// Sustained rate plus burst allowance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateLimit {
    /// Tokens added per second.
    pub qps: f64,
    /// Bucket capacity.
    pub burst: u32,
}

impl RateLimit {
    pub fn new(qps: f64, burst: u32) -> Self {
        Self { qps, burst }
    }
}

/// Validated runtime configuration for the whole process.
#[derive(Debug, Clone)]
pub struct RuntimeConfiguration {
    /// Credential source for the control-plane client.
    pub credentials: CredentialsSource,

    /// Discovery cache refresh interval.
    pub discovery_interval: Duration,

    /// Object cache flush/relist interval.
    pub cache_flush_interval: Duration,

    /// Debug endpoint bind address.
    pub debug_addr: BindAddress,

    /// Sync worker count for the controller subsystem.
    pub workers: usize,

    /// Control-plane client request limits.
    pub client_rate: RateLimit,

    /// Per-object event emission limits.
    pub event_rate: RateLimit,

    /// Drain deadline for the debug endpoint on shutdown.
    pub shutdown_grace: Duration,
}

impl RuntimeConfiguration {
    /// Serializable view served on the debug endpoint.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            credentials: self.credentials.to_string(),
            discovery_interval: humantime::format_duration(self.discovery_interval).to_string(),
            cache_flush_interval: humantime::format_duration(self.cache_flush_interval)
                .to_string(),
            debug_addr: self.debug_addr.to_string(),
            workers: self.workers,
            client_rate: self.client_rate,
            event_rate: self.event_rate,
            shutdown_grace: humantime::format_duration(self.shutdown_grace).to_string(),
        }
    }
}

/// JSON-friendly copy of [`RuntimeConfiguration`].
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub credentials: String,
    pub discovery_interval: String,
    pub cache_flush_interval: String,
    pub debug_addr: String,
    pub workers: usize,
    pub client_rate: RateLimit,
    pub event_rate: RateLimit,
    pub shutdown_grace: String,
}
