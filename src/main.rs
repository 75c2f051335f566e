use anyhow::{Context, Result};
use colored::Colorize;
use nifty_pulse::app_config::{AppConfig, Mode};
use nifty_pulse::logging;
use nifty_pulse::market::config;
use nifty_pulse::market::pulse_api_server;
use nifty_pulse::market::{ConfiguredSource, MarketFeed, PulseCommands};
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // ========================================
    // CONFIGURATION - from environment
    // ========================================
    let app_config = match AppConfig::from_env().and_then(|c| c.validate().map(|_| c)) {
        Ok(app_config) => app_config,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            eprintln!("Set PULSE_MODE to control execution mode");
            eprintln!("Examples:");
            eprintln!("  PULSE_MODE=snapshot cargo run                        # One snapshot, saved to snapshot.json");
            eprintln!("  PULSE_MODE=watch PULSE_REFRESH_MS=3000 cargo run     # Refresh loop until Ctrl-C");
            eprintln!("  PULSE_MODE=server PULSE_PORT=3001 cargo run          # JSON API server");
            eprintln!("  PULSE_SOURCE=csv PULSE_DATA_DIR=./data cargo run     # Replay recorded CSV data");
            std::process::exit(1);
        }
    };

    logging::init_logging(&app_config.log_dir)?;
    app_config.print_banner();

    let source = ConfiguredSource::from_config(
        &app_config.source,
        &app_config.data_dir,
        app_config.remote_url.as_deref(),
        app_config.mock_seed,
    )
    .context("Failed to set up market data source")?;
    let feed = MarketFeed::new(source, app_config.mock_seed);

    info!(mode = %app_config.mode, source = %feed.kind(), "nifty pulse starting");

    match app_config.mode {
        Mode::Snapshot => {
            PulseCommands::run_snapshot(&feed, Path::new(config::SNAPSHOT_OUTPUT_FILE)).await?;
        }
        Mode::Watch => {
            let report =
                PulseCommands::run_watch(&feed, app_config.refresh_interval, app_config.watch_ticks).await?;
            info!(
                ticks = report.ticks,
                max_pain_changes = report.max_pain_history.len(),
                "watch finished"
            );
        }
        Mode::Server => {
            println!("{}", "=".repeat(60).blue());
            println!("{}", "Nifty Pulse API Server".green().bold());
            println!("{}", "=".repeat(60).blue());
            println!();
            pulse_api_server::start_server(app_config.port, feed).await?;
        }
    }

    Ok(())
}
