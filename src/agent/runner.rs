//! Collection loop
//!
//! Runs one cycle immediately, then one per interval tick until
//! cancelled. Cycles never overlap: the next tick is awaited only after
//! the previous cycle finished.

use crate::collector::Collector;
use crate::config::AgentConfig;
use crate::error::Result;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Drives a [`Collector`] according to an [`AgentConfig`]
pub struct Agent {
    config: AgentConfig,
    collector: Collector,
}

impl Agent {
    /// Create an agent
    pub fn new(config: AgentConfig, collector: Collector) -> Self {
        Self { config, collector }
    }

    /// Production wiring for `config`
    pub fn from_config(config: AgentConfig) -> Self {
        let collector = Collector::from_config(&config);
        Self::new(config, collector)
    }

    /// Run until done.
    ///
    /// In one-shot mode the single cycle's result is returned. Otherwise
    /// failed cycles are logged and the loop continues; cancellation ends
    /// it with `Ok`.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<()> {
        tracing::info!(config = ?self.config, "Starting rbln-npu-feature-discovery");

        if self.config.oneshot {
            return self.collector.collect_once(cancel).await;
        }

        if let Err(e) = self.collector.collect_once(cancel).await {
            if cancel.is_cancelled() {
                return Ok(());
            }
            tracing::error!("Initial collection failed: {}", e);
        }

        let period = self.config.sleep_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Shutting down collection loop");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.collector.collect_once(cancel).await {
                        if e.is_cancelled() {
                            continue;
                        }
                        tracing::error!("Periodic collection failed: {}", e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::{DaemonConnector, DaemonSession};
    use crate::error::FeatureDiscoveryError;
    use crate::publish::FilePublisher;
    use crate::sysfs::SysfsScanner;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Daemon that is never reachable, counting connection attempts
    struct CountingDaemon {
        connects: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DaemonConnector for CountingDaemon {
        fn endpoint(&self) -> &str {
            "fake://rbln-daemon"
        }

        async fn connect(&self) -> Result<Box<dyn DaemonSession>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Err(FeatureDiscoveryError::transport(self.endpoint(), "connection refused"))
        }
    }

    fn agent(dir: &TempDir, oneshot: bool, connects: Arc<AtomicUsize>) -> (Agent, PathBuf) {
        let pci = dir.path().join("pci");
        std::fs::create_dir_all(&pci).unwrap();
        let output = dir.path().join("rbln-features");

        let config = AgentConfig {
            daemon_endpoint: "http://127.0.0.1:50051".to_string(),
            output_file: output.clone(),
            sleep_interval: Duration::from_secs(10),
            oneshot,
            no_timestamp: true,
        };
        let collector = Collector::new(
            Box::new(CountingDaemon { connects }),
            SysfsScanner::new(pci, dir.path().join("class")),
            FilePublisher::new(&output).with_expiry(false),
        );
        (Agent::new(config, collector), output)
    }

    #[tokio::test]
    async fn test_oneshot_runs_single_cycle() {
        let dir = TempDir::new().unwrap();
        let connects = Arc::new(AtomicUsize::new(0));
        let (agent, output) = agent(&dir, true, Arc::clone(&connects));

        agent.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "rebellions.ai/npu.present=false\n"
        );
    }

    #[tokio::test]
    async fn test_oneshot_returns_cycle_error() {
        let dir = TempDir::new().unwrap();
        let connects = Arc::new(AtomicUsize::new(0));
        let (agent, _) = agent(&dir, true, connects);
        std::fs::remove_dir_all(dir.path().join("pci")).unwrap();

        assert!(agent.run(&CancellationToken::new()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_cycles_until_cancelled() {
        let dir = TempDir::new().unwrap();
        let connects = Arc::new(AtomicUsize::new(0));
        let (agent, _) = agent(&dir, false, Arc::clone(&connects));
        let agent = Arc::new(agent);
        let cancel = CancellationToken::new();

        let handle = {
            let agent = Arc::clone(&agent);
            let cancel = cancel.clone();
            tokio::spawn(async move { agent.run(&cancel).await })
        };

        // initial cycle plus ticks at 10s and 20s
        tokio::time::sleep(Duration::from_secs(25)).await;
        cancel.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(connects.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycles_do_not_stop_loop() {
        let dir = TempDir::new().unwrap();
        let connects = Arc::new(AtomicUsize::new(0));
        let (agent, _) = agent(&dir, false, Arc::clone(&connects));
        // sysfs fallback fails every cycle
        std::fs::remove_dir_all(dir.path().join("pci")).unwrap();
        let agent = Arc::new(agent);
        let cancel = CancellationToken::new();

        let handle = {
            let agent = Arc::clone(&agent);
            let cancel = cancel.clone();
            tokio::spawn(async move { agent.run(&cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(35)).await;
        cancel.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(connects.load(Ordering::SeqCst), 4);
    }
}
