//! rbln-npu-feature-discovery CLI
//!
//! Publishes RBLN NPU labels for node-feature-discovery, once or on an
//! interval until Ctrl+C or SIGTERM.

use anyhow::Context;
use clap::Parser;
use rbln_npu_feature_discovery::agent::{spawn_shutdown_listener, Agent};
use rbln_npu_feature_discovery::config::{AgentConfig, CliArgs, LogFormat};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging
    init_tracing(args.log_format);

    if let Err(e) = run(&args) {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn run(args: &CliArgs) -> anyhow::Result<()> {
    let config = AgentConfig::from_cli(args).context("invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        let cancel = CancellationToken::new();
        let listener = spawn_shutdown_listener(cancel.clone());

        let agent = Agent::from_config(config);
        let result = agent.run(&cancel).await;

        // release the listener in one-shot mode
        cancel.cancel();
        let _ = listener.await;

        result.context("feature discovery failed")
    })?;

    tracing::info!("rbln-npu-feature-discovery stopped");
    Ok(())
}
