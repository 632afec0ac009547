//! Fleetwatch terminal dashboard
//!
//! Polls a sentinel hub for fleet liveness, per-server metrics, and service
//! status, and renders them as a live-refreshing terminal view.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use fleetwatch::app::App;
use fleetwatch::config::Config;

#[derive(Parser, Debug)]
#[command(name = "fleetwatch")]
#[command(about = "Terminal dashboard for fleet health monitoring", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Hub base URL (overrides config file)
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Poll interval in seconds (overrides config file)
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to a file so they never bleed into the TUI.
    let log_path = dirs::data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap())
        .join("fleetwatch")
        .join("dashboard.log");

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    match log_file {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_level(true)
                .with_writer(file)
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_level(true)
                .with_max_level(tracing::Level::ERROR)
                .init();
        }
    }

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;

    let config = Config {
        hub_url: args.url.unwrap_or(config.hub_url),
        poll_interval_secs: args.interval.unwrap_or(config.poll_interval_secs),
        ..config
    };
    config.validate()?;

    let mut app = App::new(config)?;
    app.run().await?;

    Ok(())
}
