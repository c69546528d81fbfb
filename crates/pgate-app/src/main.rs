//! Trade popup gate - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Trade popup gate
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PGATE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pgate_telemetry::init_logging()?;

    info!("Starting popup gate v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > PGATE_CONFIG env var > default path
    let config = match args.config {
        Some(path) => {
            info!(config_path = %path, "Loading configuration");
            pgate_app::AppConfig::from_file(&path)?
        }
        None => pgate_app::AppConfig::load()?,
    };
    info!(
        opener = ?config.opener.kind,
        base_url = %config.popup.base_url,
        backend_url = %config.notify.backend_url,
        "Configuration loaded"
    );

    let app = pgate_app::Application::new(config)?;
    app.run().await?;

    Ok(())
}
