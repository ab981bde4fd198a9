//! # rbln-npu-feature-discovery - NPU labels for Kubernetes nodes
//!
//! Discovers Rebellions NPUs on a node and publishes what it found as
//! node-feature-discovery local feature labels.
//!
//! ## Features
//!
//! - **Daemon First**: Asks rbln-daemon over gRPC for serviceable devices
//!   and the driver version
//! - **Sysfs Fallback**: Scans PCI devices and the driver's kernel
//!   attributes when the daemon cannot be used
//! - **Product Catalog**: Maps PCI device ids to product codes and families
//! - **Atomic Publishing**: Readers never observe a partially written file
//! - **Expiring Labels**: Optional expiry header so stale labels age out
//!
//! ## Quick Start
//!
//! ```no_run
//! use rbln_npu_feature_discovery::collector::Collector;
//! use rbln_npu_feature_discovery::config::{AgentConfig, CliArgs};
//! use clap::Parser;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> rbln_npu_feature_discovery::Result<()> {
//! let args = CliArgs::parse_from(["rbln-npu-feature-discovery", "--oneshot"]);
//! let config = AgentConfig::from_cli(&args)?;
//!
//! let collector = Collector::from_config(&config);
//! collector.collect_once(&CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Labels
//!
//! ```text
//! # +expiry-time=2025-01-01T13:00:00+09:00
//! rebellions.ai/npu.present=true
//! rebellions.ai/npu.count=4
//! rebellions.ai/npu.family=ATOM
//! rebellions.ai/npu.product=RBLN-CA22
//! rebellions.ai/driver-version.full=1.2.3
//! rebellions.ai/driver-version.major=1
//! rebellions.ai/driver-version.minor=2
//! rebellions.ai/driver-version.patch=3
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod collector;
pub mod config;
pub mod daemon;
pub mod device;
pub mod error;
pub mod publish;
pub mod sysfs;

// Re-export commonly used types
pub use agent::Agent;
pub use collector::{Collector, Features, Outcome};
pub use config::{AgentConfig, CliArgs};
pub use error::{FeatureDiscoveryError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use rbln_npu_feature_discovery::prelude::*;
    //! ```

    pub use crate::agent::{spawn_shutdown_listener, Agent};
    pub use crate::collector::{Attempt, Collector, Features, Outcome, Source};
    pub use crate::config::{AgentConfig, CliArgs, LogFormat};
    pub use crate::daemon::{DaemonConnector, DaemonSession, GrpcConnector};
    pub use crate::device::{Device, DeviceFamily, DeviceProduct, DriverVersion};
    pub use crate::error::{FeatureDiscoveryError, Result};
    pub use crate::publish::FilePublisher;
    pub use crate::sysfs::SysfsScanner;
}
