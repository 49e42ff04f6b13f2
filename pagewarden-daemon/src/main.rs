//! pagewarden-daemon entry point.
//!
//! Parses CLI arguments, loads and validates configuration, initializes
//! tracing, and hands control to the orchestrator.

use anyhow::Result;
use clap::Parser;

use pagewarden_core::config::PagewardenConfig;
use pagewarden_daemon::cli::DaemonCli;
use pagewarden_daemon::logging;
use pagewarden_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let args = DaemonCli::parse();

    let mut config = PagewardenConfig::load(&args.config).await.map_err(|e| {
        anyhow::anyhow!("failed to load config from {}: {}", args.config.display(), e)
    })?;

    // CLI overrides take precedence over file and environment
    if let Some(log_level) = &args.log_level {
        config.general.log_level = log_level.clone();
    }
    if let Some(log_format) = &args.log_format {
        config.general.log_format = log_format.clone();
    }
    if let Some(pid_file) = &args.pid_file {
        config.general.pid_file = pid_file.clone();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if args.validate {
        println!("configuration OK: {}", args.config.display());
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "pagewarden-daemon starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config)?;
    orchestrator.run().await?;

    tracing::info!("pagewarden-daemon shut down");
    Ok(())
}
