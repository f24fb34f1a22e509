//! Command-line / environment configuration.

use crate::error::{BridgeError, Result};
use clap::{Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Expose a remote Colab runtime as MCP tools over stdio.
#[derive(Debug, Parser)]
#[command(name = "colab-bridge", version, about)]
pub struct Args {
    /// Colab tunnel URL to connect to at startup (same as calling `connect_to_colab`)
    #[arg(long, env = "COLAB_BRIDGE_URL")]
    pub url: Option<String>,

    /// Timeout for the liveness probe performed by `connect_to_colab`
    #[arg(
        long,
        env = "COLAB_BRIDGE_PROBE_TIMEOUT_SECS",
        default_value_t = DEFAULT_PROBE_TIMEOUT_SECS
    )]
    pub probe_timeout_secs: u64,

    /// Timeout for forwarded executions (package installs can be slow)
    #[arg(
        long,
        env = "COLAB_BRIDGE_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[arg(long, env = "COLAB_BRIDGE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (logs always go to stderr)
    #[arg(long, env = "COLAB_BRIDGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Validated runtime settings shared by the connection manager and the forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub probe_timeout: Duration,
    pub request_timeout: Duration,
    pub initial_url: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            initial_url: None,
        }
    }
}

impl TryFrom<&Args> for BridgeConfig {
    type Error = BridgeError;

    fn try_from(args: &Args) -> Result<Self> {
        if args.probe_timeout_secs == 0 {
            return Err(BridgeError::Config(
                "--probe-timeout-secs must be greater than 0".to_string(),
            ));
        }
        if args.request_timeout_secs == 0 {
            return Err(BridgeError::Config(
                "--request-timeout-secs must be greater than 0".to_string(),
            ));
        }

        let initial_url = args
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Ok(Self {
            probe_timeout: Duration::from_secs(args.probe_timeout_secs),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            initial_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Args, BridgeConfig, LogFormat};
    use clap::Parser as _;
    use std::time::Duration;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("colab-bridge").chain(argv.iter().copied()))
            .expect("args parse")
    }

    #[test]
    fn defaults_match_probe_and_request_timeouts() {
        let args = parse(&[]);
        assert_eq!(args.log_format, LogFormat::Text);
        let cfg = BridgeConfig::try_from(&args).expect("valid");
        assert_eq!(cfg, BridgeConfig::default());
        assert_eq!(cfg.probe_timeout, Duration::from_secs(10));
        assert_eq!(cfg.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let err = BridgeConfig::try_from(&parse(&["--probe-timeout-secs", "0"]))
            .expect_err("zero probe timeout");
        assert!(err.to_string().contains("--probe-timeout-secs"));

        let err = BridgeConfig::try_from(&parse(&["--request-timeout-secs", "0"]))
            .expect_err("zero request timeout");
        assert!(err.to_string().contains("--request-timeout-secs"));
    }

    #[test]
    fn blank_initial_url_is_ignored() {
        let cfg = BridgeConfig::try_from(&parse(&["--url", "   "])).expect("valid");
        assert_eq!(cfg.initial_url, None);

        let cfg = BridgeConfig::try_from(&parse(&["--url", " abc.ngrok-free.app "])).expect("valid");
        assert_eq!(cfg.initial_url.as_deref(), Some("abc.ngrok-free.app"));
    }
}
