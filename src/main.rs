// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod commands;
mod config;
mod console;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{debug, info, warn};
use radar_client::{Dashboard, DashboardEvent, HttpBackend, Theme, UiCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::commands::{parse_line, CommandError, Input, HELP};
use crate::config::{AppConfig, Overrides, ThemeStore, BACKEND_URL_ENV};
use crate::console::{ConsoleCharts, ConsoleMap};

#[derive(Parser, Debug)]
#[command(name = "radar-dashboard")]
#[command(author, version, about = "Headless live radar dashboard", long_about = None)]
struct Args {
    /// Telemetry backend base URL (overrides config and RADAR_BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Traffic-camera host base URL
    #[arg(long)]
    traffic_url: Option<String>,

    /// Maximum positions kept per aircraft trail
    #[arg(long)]
    trail_capacity: Option<usize>,

    /// Print the configuration file path and exit
    #[arg(long, default_value_t = false)]
    config_path: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.config_path {
        println!("{}", AppConfig::get_config_path()?.display());
        return Ok(());
    }

    let stored = match AppConfig::load() {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(
                "Failed to load config, using defaults; theme changes will not be saved: {}",
                e
            );
            None
        }
    };
    let overrides = Overrides {
        backend_url: args.backend_url,
        traffic_url: args.traffic_url,
        trail_capacity: args.trail_capacity,
    };
    let config = stored
        .clone()
        .unwrap_or_default()
        .with_overrides(&overrides, std::env::var(BACKEND_URL_ENV).ok().as_deref());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(config, ThemeStore::new(stored)));
    // A pending stdin read would otherwise hold the runtime open
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn run(config: AppConfig, theme_store: ThemeStore) -> Result<(), Box<dyn Error>> {
    info!(
        "Starting radar dashboard: backend {}, traffic {}",
        config.backend_url, config.traffic_url
    );

    let api = Arc::new(HttpBackend::new(
        &config.backend_url,
        &config.traffic_url,
        config.request_timeout(),
    )?);
    let mut dashboard = Dashboard::new(
        api,
        ConsoleMap::default(),
        ConsoleCharts::default(),
        config.dashboard_config(),
    );

    let cancel_token = CancellationToken::new();
    let (command_tx, command_rx) = mpsc::channel(32);

    tokio::spawn(read_commands(command_tx, cancel_token.clone()));
    tokio::spawn(observe_events(dashboard.subscribe()));
    tokio::spawn(persist_theme(dashboard.watch_theme(), theme_store));

    let signal_cancel = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            signal_cancel.cancel();
        }
    });

    dashboard.run(command_rx, cancel_token.clone()).await;
    cancel_token.cancel();

    info!(
        "Stopped after snapshot {}: {} markers, {} trail points",
        dashboard.last_sequence(),
        dashboard.map().marker_count(),
        dashboard.map().trail_point_count()
    );
    Ok(())
}

/// Forward parsed stdin lines to the dashboard until cancelled.
async fn read_commands(command_tx: mpsc::Sender<UiCommand>, cancel_token: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            () = cancel_token.cancelled() => return,
        };

        match line {
            Ok(Some(line)) => match parse_line(&line) {
                Ok(Input::Command(command)) => {
                    if command_tx.send(command).await.is_err() {
                        return;
                    }
                }
                Ok(Input::Help) => println!("{HELP}"),
                Ok(Input::Quit) => {
                    cancel_token.cancel();
                    return;
                }
                Err(CommandError::Empty) => {}
                Err(e) => warn!("{}", e),
            },
            Ok(None) => {
                // Keep the sender alive so the dashboard runs on without a terminal
                debug!("stdin closed");
                cancel_token.cancelled().await;
                return;
            }
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                cancel_token.cancelled().await;
                return;
            }
        }
    }
}

/// Save every theme change. Reads the watch channel so a burst of entity
/// events can never cause a toggle to be skipped.
async fn persist_theme(mut theme_rx: watch::Receiver<Theme>, mut store: ThemeStore) {
    while theme_rx.changed().await.is_ok() {
        let theme = *theme_rx.borrow_and_update();
        match store.save(theme) {
            Ok(true) => debug!("Saved theme preference {}", theme.as_str()),
            Ok(false) => {}
            Err(e) => warn!("Failed to save theme preference: {}", e),
        }
    }
}

/// Log dashboard events.
async fn observe_events(mut events: broadcast::Receiver<DashboardEvent>) {
    loop {
        match events.recv().await {
            Ok(DashboardEvent::ThemeChanged(theme)) => {
                debug!("Theme changed to {}", theme.as_str());
            }
            Ok(DashboardEvent::SelectionCleared(id)) => {
                info!("{} is no longer tracked, sidebar closed", id);
            }
            Ok(DashboardEvent::SnapshotApplied { sequence, count }) => {
                debug!("[telemetry] snapshot {}: {} aircraft", sequence, count);
            }
            Ok(DashboardEvent::EntityAdded(_) | DashboardEvent::EntityRemoved(_)) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event observer lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
