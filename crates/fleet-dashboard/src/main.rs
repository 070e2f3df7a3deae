//! Fleet dashboard - Entry Point

use anyhow::Result;
use clap::Parser;
use fleet_core::StatusFilter;
use tracing::info;

/// Headless fleet tracking dashboard
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via FLEET_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Initial status filter: all, idle, en_route, delivered
    #[arg(short, long)]
    filter: Option<StatusFilter>,

    /// Fetch once, print the summary and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    fleet_ws::init_crypto();

    let args = Args::parse();

    let mut config = fleet_dashboard::AppConfig::load(args.config)?;
    if let Some(filter) = args.filter {
        config.initial_filter = filter;
    }

    fleet_telemetry::init_logging_with(&config.logging)?;

    info!("Starting fleet dashboard v{}", env!("CARGO_PKG_VERSION"));
    info!(
        api_base_url = %config.api_base_url,
        poll_interval_secs = config.poll_interval_secs,
        "Configuration loaded"
    );

    let app = fleet_dashboard::Application::new(config)?;

    if args.once {
        println!("{}", app.snapshot().await?);
        return Ok(());
    }

    app.run().await?;

    Ok(())
}
