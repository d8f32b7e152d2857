//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (clap handles syntactic)
//! - Validate value ranges (rates > 0, bursts and workers >= 1)
//! - Check the debug bind address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Args → Result<(), Vec<ValidationError>>
//! - Runs before any client or server is constructed

use std::time::Duration;

use thiserror::Error;

use crate::config::flags::Args;
use crate::config::resolver::parse_bind_address;

/// A single semantic problem with the startup parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("--{flag} must be a finite number greater than zero, got {value}")]
    InvalidRate { flag: &'static str, value: f64 },

    #[error("--{flag} must be at least 1")]
    ZeroBurst { flag: &'static str },

    #[error("--workers must be at least 1")]
    ZeroWorkers,

    #[error("--{flag} must be greater than zero")]
    ZeroDuration { flag: &'static str },

    #[error("--debug-addr {value:?} is not a valid bind address")]
    InvalidBindAddress { value: String },
}

/// Check every parameter and collect all problems.
pub fn validate(args: &Args) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_rate(&mut errors, "client-go-qps", args.client_go_qps);
    check_rate(&mut errors, "events-qps", args.events_qps);

    if args.client_go_burst == 0 {
        errors.push(ValidationError::ZeroBurst { flag: "client-go-burst" });
    }
    if args.events_burst == 0 {
        errors.push(ValidationError::ZeroBurst { flag: "events-burst" });
    }
    if args.workers == 0 {
        errors.push(ValidationError::ZeroWorkers);
    }

    check_duration(&mut errors, "discovery-interval", args.discovery_interval);
    check_duration(&mut errors, "cache-flush-interval", args.cache_flush_interval);
    check_duration(&mut errors, "shutdown-grace", args.shutdown_grace);

    if let Err(e) = parse_bind_address(&args.debug_addr) {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rate(errors: &mut Vec<ValidationError>, flag: &'static str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(ValidationError::InvalidRate { flag, value });
    }
}

fn check_duration(errors: &mut Vec<ValidationError>, flag: &'static str, value: Duration) {
    if value.is_zero() {
        errors.push(ValidationError::ZeroDuration { flag });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate(&Args::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut args = Args::default();
        args.client_go_qps = 0.0;
        args.events_qps = f64::NAN;
        args.client_go_burst = 0;
        args.workers = 0;
        args.discovery_interval = Duration::ZERO;
        args.debug_addr = "not an address".to_string();

        let errors = validate(&args).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::ZeroWorkers));
        assert!(errors.contains(&ValidationError::ZeroBurst { flag: "client-go-burst" }));
        assert!(errors.contains(&ValidationError::ZeroDuration { flag: "discovery-interval" }));
        assert!(errors.contains(&ValidationError::InvalidBindAddress {
            value: "not an address".to_string()
        }));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let mut args = Args::default();
        args.events_qps = -1.0;

        let errors = validate(&args).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidRate { flag: "events-qps", value: -1.0 }]
        );
    }
}
