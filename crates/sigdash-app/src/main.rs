//! sigdash - trading-signal dashboard client.
//!
//! Polls the signal engine, raises deduplicated alerts and shows the market
//! session countdown until interrupted.

use anyhow::Result;
use clap::Parser;
use sigdash_app::{AppConfig, Application};
use sigdash_sync::View;
use tracing::info;

/// Trading-signal dashboard client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SIGDASH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// View mounted at startup: dashboard, portfolio, report or optimizer
    #[arg(long, default_value = "dashboard")]
    view: View,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI arg > SIGDASH_CONFIG > config/default.toml
    let config_path = AppConfig::resolve_path(args.config);
    let config = AppConfig::load(&config_path)?;

    sigdash_telemetry::init_logging(config.telemetry.log_level.as_deref())?;
    info!("Starting sigdash v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        base_url = %config.api.base_url,
        timezone = %config.clock.timezone,
        "Configuration loaded"
    );

    let app = Application::new(config, args.view)?;
    app.run().await?;

    Ok(())
}
