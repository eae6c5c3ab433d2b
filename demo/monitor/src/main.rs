//! Demo Monitor Entry Point
//!
//! Connects to a FrictionalBank dashboard backend and logs every value the
//! dashboard would repaint. View names typed on stdin (`dashboard`,
//! `portfolio`, `risk`, `exposure`) switch the active view.

use anyhow::Result;
use clap::Parser;
use demo_monitor::model::Snapshot;
use demo_monitor::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

/// Live risk monitor for the FrictionalBank dashboard API
#[derive(Parser, Debug)]
#[command(name = "demo-monitor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dashboard backend base URL
    #[arg(long, env = "MONITOR_BASE_URL")]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MONITOR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Install the subscriber; `RUST_LOG` wins over `level`
fn init_tracing(level: &str) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    handle
}

/// Filter level in force until the config file has been read
fn bootstrap_level(cli: &Cli) -> &str {
    if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_deref().unwrap_or("info")
    }
}

fn load_config(cli: &Cli) -> Result<MonitorConfig> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::load_or_default(None),
    }
    .with_env_override();

    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if cli.verbose {
        config.log_level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Forward view names typed on stdin to the controller
async fn read_navigation(handle: SyncHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                match input.parse::<View>() {
                    Ok(view) => handle.navigate(view),
                    Err(e) => warn!(input, error = %e, "Unknown view"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
    debug!("Navigation input closed");
}

/// Fold render events into the dashboard view and log what changed
async fn render(mut events: mpsc::UnboundedReceiver<RenderEvent>) {
    let mut view = DashboardView::new();
    while let Some(event) = events.recv().await {
        let touched = view.apply(&event);
        for field in touched {
            if let Some(value) = view.field(field) {
                info!(field = ?field, value = %value.text, tone = ?value.tone, "Field updated");
            }
        }

        match &event {
            RenderEvent::Status(_) => info!(status = view.status_text(), "Connection status"),
            RenderEvent::Chart(update) => info!(
                action = ?update.action,
                points = update.labels.len(),
                first = update.labels.first().map(String::as_str).unwrap_or(""),
                last = update.labels.last().map(String::as_str).unwrap_or(""),
                y_axis = %update
                    .value_ticks
                    .iter()
                    .map(|tick| tick.label.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                "Exposure chart"
            ),
            RenderEvent::ActiveView { previous, active } => {
                info!(from = previous.title(), to = active.title(), "Active view")
            }
            RenderEvent::Dataset(update) => {
                if let Snapshot::Portfolio(_) = update.snapshot() {
                    for row in view.trades() {
                        debug!(
                            id = %row.id,
                            instrument = %row.instrument,
                            notional = %row.notional,
                            pv = %row.pv.text,
                            "Trade"
                        );
                    }
                }
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = init_tracing(bootstrap_level(&cli));
    let config = load_config(&cli)?;
    if std::env::var_os("RUST_LOG").is_none() {
        filter.reload(EnvFilter::new(&config.log_level))?;
    }
    info!("Demo Monitor v{}", env!("CARGO_PKG_VERSION"));

    let client = Arc::new(ApiClient::new(config.api_base()));
    match client.health().await {
        Ok(health) => info!(status = %health.status, version = %health.version, "Backend healthy"),
        Err(e) => warn!(error = %e, "Backend health check failed"),
    }

    let (app, events) = MonitorApp::new(config, client, Arc::new(TungsteniteTransport));
    tokio::spawn(read_navigation(app.handle()));
    let renderer = tokio::spawn(render(events));

    tokio::select! {
        _ = app.run() => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    renderer.abort();
    Ok(())
}
