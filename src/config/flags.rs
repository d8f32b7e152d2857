//! Command-line flags.

use std::time::Duration;

use clap::Parser;

use crate::observability::logging::LogFormat;

/// Raw startup parameters as given on the command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "controller-agent")]
#[command(version, about = "Control-plane agent that runs the controller subsystem", long_about = None)]
pub struct Args {
    /// How often to refresh discovery cache to pick up newly-installed resources.
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub discovery_interval: Duration,

    /// How often to flush local caches and relist objects from the API server.
    #[arg(long, default_value = "30m", value_parser = humantime::parse_duration)]
    pub cache_flush_interval: Duration,

    /// The address to bind the debug http endpoints.
    #[arg(long, default_value = ":9999")]
    pub debug_addr: String,

    /// Path to kubeconfig file; if not specified, use in-cluster config.
    #[arg(long, default_value = "")]
    pub client_config_path: String,

    /// Number of queries per second the API client is allowed to make.
    #[arg(long, default_value_t = 5.0)]
    pub client_go_qps: f64,

    /// Allowed burst queries for the API client.
    #[arg(long, default_value_t = 10)]
    pub client_go_burst: u32,

    /// Number of sync workers to run.
    #[arg(long, default_value_t = 5)]
    pub workers: usize,

    /// Rate of events flowing per object (default: 1 event per 5 minutes).
    #[arg(long, default_value_t = 1.0 / 300.0)]
    pub events_qps: f64,

    /// Number of events allowed to send per object.
    #[arg(long, default_value_t = 25)]
    pub events_burst: u32,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// How long the debug server may take to drain on shutdown.
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub shutdown_grace: Duration,
}

impl Default for Args {
    fn default() -> Self {
        Self::parse_from(["controller-agent"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_defaults() {
        let args = Args::default();
        assert_eq!(args.discovery_interval, Duration::from_secs(30));
        assert_eq!(args.cache_flush_interval, Duration::from_secs(30 * 60));
        assert_eq!(args.debug_addr, ":9999");
        assert!(args.client_config_path.is_empty());
        assert_eq!(args.client_go_qps, 5.0);
        assert_eq!(args.client_go_burst, 10);
        assert_eq!(args.workers, 5);
        assert_eq!(args.events_qps, 1.0 / 300.0);
        assert_eq!(args.events_burst, 25);
        assert_eq!(args.log_format, LogFormat::Text);
        assert_eq!(args.shutdown_grace, Duration::from_secs(5));
    }

    #[test]
    fn test_parse_overrides() {
        let args = Args::try_parse_from([
            "controller-agent",
            "--discovery-interval",
            "1m30s",
            "--cache-flush-interval",
            "2h",
            "--debug-addr",
            "127.0.0.1:8081",
            "--client-config-path",
            "/etc/agent/kubeconfig",
            "--client-go-qps",
            "20.5",
            "--client-go-burst",
            "40",
            "--workers",
            "12",
            "--events-qps",
            "0.5",
            "--events-burst",
            "3",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.discovery_interval, Duration::from_secs(90));
        assert_eq!(args.cache_flush_interval, Duration::from_secs(7200));
        assert_eq!(args.debug_addr, "127.0.0.1:8081");
        assert_eq!(args.client_config_path, "/etc/agent/kubeconfig");
        assert_eq!(args.client_go_qps, 20.5);
        assert_eq!(args.client_go_burst, 40);
        assert_eq!(args.workers, 12);
        assert_eq!(args.events_qps, 0.5);
        assert_eq!(args.events_burst, 3);
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_malformed_duration() {
        let result = Args::try_parse_from(["controller-agent", "--discovery-interval", "soon"]);
        assert!(result.is_err());
    }
}
