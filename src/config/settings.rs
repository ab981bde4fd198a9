//! Configuration settings for rbln-npu-feature-discovery
//!
//! Defines CLI arguments (each with an environment fallback) and the
//! validated configuration the agent runs with.

use crate::error::{FeatureDiscoveryError, Result};
use crate::publish::DEFAULT_OUTPUT_FILE;
use clap::builder::BoolishValueParser;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Shortest accepted interval between collection cycles
pub const MIN_SLEEP_INTERVAL_SECS: u64 = 10;

/// Longest accepted interval between collection cycles
pub const MAX_SLEEP_INTERVAL_SECS: u64 = 3600;

/// rbln-npu-feature-discovery - NPU labels for node-feature-discovery
#[derive(Parser, Debug, Clone)]
#[command(name = "rbln-npu-feature-discovery")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate NPU labels for node-feature-discovery")]
#[command(long_about = r#"
Discovers Rebellions NPUs on this node and writes their presence, product,
family and driver version as node-feature-discovery local feature labels.

Device facts come from rbln-daemon when it is reachable, and from sysfs
otherwise.

Examples:
  rbln-npu-feature-discovery --oneshot --no-timestamp -o /tmp/rbln-features
  rbln-npu-feature-discovery --rbln-daemon-url 10.0.0.5:50051 --sleep-interval 30
"#)]
pub struct CliArgs {
    /// Endpoint of the rbln-daemon gRPC server
    #[arg(
        long,
        env = "RBLN_NPU_FEATURE_DISCOVERY_RBLN_DAEMON_URL",
        default_value = "127.0.0.1:50051",
        value_name = "URL"
    )]
    pub rbln_daemon_url: String,

    /// Path to output file
    #[arg(
        short = 'o',
        long,
        env = "RBLN_NPU_FEATURE_DISCOVERY_OUTPUT_FILE",
        default_value = DEFAULT_OUTPUT_FILE,
        value_name = "PATH"
    )]
    pub output_file: PathBuf,

    /// Time to sleep between labeling, in seconds (min: 10, max: 3600)
    #[arg(
        long,
        env = "RBLN_NPU_FEATURE_DISCOVERY_SLEEP_INTERVAL",
        default_value = "60",
        value_name = "SECS"
    )]
    pub sleep_interval: u64,

    /// Label once and exit
    #[arg(
        long,
        env = "RBLN_NPU_FEATURE_DISCOVERY_ONESHOT",
        value_parser = BoolishValueParser::new()
    )]
    pub oneshot: bool,

    /// Skip writing expiry timestamp to labels
    #[arg(
        long,
        env = "RBLN_NPU_FEATURE_DISCOVERY_NO_TIMESTAMP",
        value_parser = BoolishValueParser::new()
    )]
    pub no_timestamp: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        env = "RBLN_NPU_FEATURE_DISCOVERY_LOG_FORMAT",
        default_value = "json"
    )]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable text
    Text,
}

/// Validated agent configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// rbln-daemon endpoint URL, always with a scheme
    pub daemon_endpoint: String,
    /// Label file to publish
    pub output_file: PathBuf,
    /// Time between collection cycles
    pub sleep_interval: Duration,
    /// Collect once and exit
    pub oneshot: bool,
    /// Omit the expiry header
    pub no_timestamp: bool,
}

impl AgentConfig {
    /// Validate CLI arguments into a configuration
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        if !(MIN_SLEEP_INTERVAL_SECS..=MAX_SLEEP_INTERVAL_SECS).contains(&args.sleep_interval) {
            return Err(FeatureDiscoveryError::config(format!(
                "sleep-interval must be {}-{} seconds, got {}",
                MIN_SLEEP_INTERVAL_SECS, MAX_SLEEP_INTERVAL_SECS, args.sleep_interval
            )));
        }

        if args.output_file.as_os_str().is_empty() {
            return Err(FeatureDiscoveryError::config("output-file must not be empty"));
        }

        let daemon_endpoint = normalize_endpoint(&args.rbln_daemon_url)?;

        Ok(Self {
            daemon_endpoint,
            output_file: args.output_file.clone(),
            sleep_interval: Duration::from_secs(args.sleep_interval),
            oneshot: args.oneshot,
            no_timestamp: args.no_timestamp,
        })
    }
}

/// Give a bare `host:port` the `http://` scheme the gRPC channel needs
pub fn normalize_endpoint(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(FeatureDiscoveryError::config("rbln-daemon-url must not be empty"));
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else if url.contains("://") {
        Err(FeatureDiscoveryError::config(format!(
            "unsupported rbln-daemon-url scheme: {}",
            url
        )))
    } else {
        Ok(format!("http://{}", url))
    }
}
