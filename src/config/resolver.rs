//! Resolution of raw flags into a [`RuntimeConfiguration`].

use std::path::PathBuf;

use thiserror::Error;

use crate::config::flags::Args;
use crate::config::schema::{BindAddress, CredentialsSource, RateLimit, RuntimeConfiguration};
use crate::config::validation::{validate, ValidationError};

/// Boxed error carried as the cause of a credential failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal configuration problem. The process must not continue past one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid startup parameters: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("failed to load credentials from {source_desc}: {cause}")]
    Credentials {
        source_desc: String,
        #[source]
        cause: BoxError,
    },
}

impl ConfigError {
    pub fn credentials(source: &CredentialsSource, cause: impl Into<BoxError>) -> Self {
        ConfigError::Credentials {
            source_desc: source.to_string(),
            cause: cause.into(),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse `host:port`, `[v6]:port` or the `:port` shorthand for all
/// interfaces. Hostnames are accepted and resolved at bind time.
pub fn parse_bind_address(raw: &str) -> Result<BindAddress, ValidationError> {
    let invalid = || ValidationError::InvalidBindAddress {
        value: raw.to_string(),
    };

    let (host, port) = raw.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;

    if host.is_empty() {
        return Ok(BindAddress::all_interfaces(port));
    }
    let host = match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        Some(v6) if v6.contains(':') => v6,
        Some(_) => return Err(invalid()),
        // Unbracketed IPv6 literals are ambiguous with the port separator.
        None if host.contains(':') || host.contains('[') || host.contains(']') => {
            return Err(invalid())
        }
        None => host,
    };
    if host.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    Ok(BindAddress::new(host, port))
}

/// Validate the flags and build the immutable configuration.
pub fn resolve(args: &Args) -> Result<RuntimeConfiguration, ConfigError> {
    validate(args).map_err(ConfigError::Validation)?;

    let debug_addr = parse_bind_address(&args.debug_addr)
        .map_err(|e| ConfigError::Validation(vec![e]))?;

    let credentials = if args.client_config_path.is_empty() {
        CredentialsSource::Ambient
    } else {
        CredentialsSource::Explicit(PathBuf::from(&args.client_config_path))
    };

    Ok(RuntimeConfiguration {
        credentials,
        discovery_interval: args.discovery_interval,
        cache_flush_interval: args.cache_flush_interval,
        debug_addr,
        workers: args.workers,
        client_rate: RateLimit::new(args.client_go_qps, args.client_go_burst),
        event_rate: RateLimit::new(args.events_qps, args.events_burst),
        shutdown_grace: args.shutdown_grace,
    })
}
