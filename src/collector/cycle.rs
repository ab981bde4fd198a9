//! Feature collection orchestration
//!
//! One cycle asks rbln-daemon first and reads sysfs only if the daemon
//! attempt failed. A daemon that answers with no devices, or that lists
//! devices but cannot report a version, has still answered: its result
//! is published as is.

use super::features::{Features, Outcome};
use crate::config::AgentConfig;
use crate::daemon::{DaemonConnector, GrpcConnector};
use crate::device::{DeviceProduct, DriverVersion};
use crate::error::{FeatureDiscoveryError, Result};
use crate::publish::FilePublisher;
use crate::sysfs::SysfsScanner;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Where a cycle's facts came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// rbln-daemon
    Daemon,
    /// Kernel attribute files
    Sysfs,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daemon => "daemon",
            Self::Sysfs => "sysfs",
        })
    }
}

/// Result of one successful collection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Source that answered
    pub source: Source,
    /// What it told us
    pub features: Features,
}

impl Attempt {
    /// Completeness of the collected features
    pub fn outcome(&self) -> Outcome {
        self.features.outcome()
    }
}

/// Collects RBLN features and publishes them
pub struct Collector {
    daemon: Box<dyn DaemonConnector>,
    sysfs: SysfsScanner,
    publisher: FilePublisher,
}

impl Collector {
    /// Create a collector from its three collaborators
    pub fn new(
        daemon: Box<dyn DaemonConnector>,
        sysfs: SysfsScanner,
        publisher: FilePublisher,
    ) -> Self {
        Self {
            daemon,
            sysfs,
            publisher,
        }
    }

    /// Production wiring: gRPC daemon, host sysfs, configured output file
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            Box::new(GrpcConnector::new(config.daemon_endpoint.clone())),
            SysfsScanner::default(),
            FilePublisher::new(config.output_file.clone()).with_expiry(!config.no_timestamp),
        )
    }

    /// Run one collection cycle and publish the result.
    ///
    /// Must not run concurrently with itself: overlapping cycles share
    /// the temporary file.
    pub async fn collect_once(&self, cancel: &CancellationToken) -> Result<()> {
        let attempt = self.collect(cancel).await?;

        tracing::info!(
            source = %attempt.source,
            outcome = %attempt.outcome(),
            "Collected features"
        );

        let publisher = self.publisher.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || publisher.save(&attempt.features, &cancel))
            .await
            .map_err(|e| FeatureDiscoveryError::task(format!("publish task join error: {}", e)))?
    }

    /// Run the daemon attempt and, if it fails, the sysfs attempt
    pub async fn collect(&self, cancel: &CancellationToken) -> Result<Attempt> {
        match self.attempt_daemon(cancel).await {
            Ok(attempt) => Ok(attempt),
            Err(FeatureDiscoveryError::Cancelled) => Err(FeatureDiscoveryError::Cancelled),
            Err(e) => {
                let endpoint = self.daemon.endpoint();
                if e.is_data_error() {
                    tracing::warn!(
                        "rbln-daemon at {} returned unusable data, falling back to sysfs: {}",
                        endpoint,
                        e
                    );
                } else {
                    tracing::debug!(
                        "Failed to collect features from rbln-daemon at {}, falling back to sysfs: {}",
                        endpoint,
                        e
                    );
                }

                if cancel.is_cancelled() {
                    return Err(FeatureDiscoveryError::Cancelled);
                }
                self.collect_from_sysfs().await
            }
        }
    }

    async fn attempt_daemon(&self, cancel: &CancellationToken) -> Result<Attempt> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FeatureDiscoveryError::Cancelled),
            result = self.collect_from_daemon() => result,
        }
    }

    /// The session lives only inside this future and is dropped on every
    /// exit, including when the select above abandons it.
    async fn collect_from_daemon(&self) -> Result<Attempt> {
        let mut session = self.daemon.connect().await?;
        let devices = session.serviceable_devices().await?;

        let mut features = Features::default();
        let Some(first) = devices.first() else {
            tracing::debug!("rbln-daemon reports no serviceable devices");
            return Ok(Attempt {
                source: Source::Daemon,
                features,
            });
        };

        // NOTE: assumes a node never mixes RBLN products; the first device
        // stands for all of them.
        let product = DeviceProduct::from_device_id(&first.id)?;
        features.record_devices(devices.len(), &product)?;

        match session.version(first).await {
            Ok(raw) => features.driver_version = Some(DriverVersion::parse(&raw)?),
            Err(e) => tracing::debug!("Failed to fetch driver version from daemon: {}", e),
        }

        Ok(Attempt {
            source: Source::Daemon,
            features,
        })
    }

    async fn collect_from_sysfs(&self) -> Result<Attempt> {
        let sysfs = self.sysfs.clone();
        tokio::task::spawn_blocking(move || Self::scan_sysfs(&sysfs))
            .await
            .map_err(|e| FeatureDiscoveryError::task(format!("sysfs task join error: {}", e)))?
    }

    fn scan_sysfs(sysfs: &SysfsScanner) -> Result<Attempt> {
        let devices = sysfs.discover_devices()?;

        let mut features = Features::default();
        if let Some(first) = devices.first() {
            let product = DeviceProduct::from_device_id(&first.id)?;
            features.record_devices(devices.len(), &product)?;
        }

        match sysfs.read_driver_version()? {
            Some(raw) => features.driver_version = Some(DriverVersion::parse(&raw)?),
            None => tracing::debug!("Driver version not found in sysfs"),
        }

        Ok(Attempt {
            source: Source::Sysfs,
            features,
        })
    }
}
