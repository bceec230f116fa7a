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

//! Dashboard controller.
//!
//! [`Dashboard`] owns every piece of client state and is the only place it is
//! mutated: snapshots from the [`Poller`], counter updates from the
//! [`TrafficFeed`], and [`UiCommand`]s from whatever front end drives it are
//! applied one at a time from a single task, so no locking is needed.
//!
//! Snapshots carry the sequence number stamped when their request was issued;
//! anything not newer than the last applied snapshot is discarded.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::api::DashboardApi;
use crate::charts::{ChartBackend, ChartLoader, HistoryRange};
use crate::detail::{
    lookup_project, FlightDetail, SidebarContent, FLIGHT_SIDEBAR_TITLE, PROJECT_SIDEBAR_TITLE,
};
use crate::insights::Insights;
use crate::telemetry::{Poller, PollerConfig, Snapshot};
use crate::theme::{Theme, LAYER_SWAP_DELAY};
use crate::tracker::{MapSurface, Reconciler, DEFAULT_TRAIL_CAPACITY};
use crate::traffic::{TrafficFeed, TrafficFeedConfig, TrafficPanel, TrafficStats};
use crate::ui_state::{HomeView, Modal, Sidebar, UiEffect, UiState};

/// Configuration for a [`Dashboard`].
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub poller: PollerConfig,
    pub traffic: TrafficFeedConfig,
    /// Maximum positions kept per trail.
    pub trail_capacity: usize,
    pub home: HomeView,
    /// Source set on the embedded video element while the traffic modal is open.
    pub video_stream_url: String,
    pub theme: Theme,
    /// Intraday resolution used until the user picks another.
    pub history_range: HistoryRange,
    /// Capacity of the [`DashboardEvent`] broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poller: PollerConfig::default(),
            traffic: TrafficFeedConfig::default(),
            trail_capacity: DEFAULT_TRAIL_CAPACITY,
            home: HomeView::default(),
            video_stream_url: "http://localhost:5000/video_feed".to_string(),
            theme: Theme::default(),
            history_range: HistoryRange::default(),
            event_channel_capacity: 256,
        }
    }
}

/// User interactions understood by the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    /// Marker click.
    SelectFlight(String),
    /// Project card click, by registry key.
    OpenProject(String),
    CloseSidebar,
    ToggleTactical,
    EnterTactical,
    ExitTactical,
    OpenAnalytics,
    CloseAnalytics,
    OpenTraffic,
    CloseTraffic,
    /// Click on bar `n` of the daily volume chart.
    SelectDay(usize),
    SetRange(HistoryRange),
    ToggleTheme,
}

/// Notifications about dashboard state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    SnapshotApplied { sequence: u64, count: usize },
    EntityAdded(String),
    EntityRemoved(String),
    /// The flight sidebar was closed because its aircraft left the feed.
    SelectionCleared(String),
    ThemeChanged(Theme),
}

/// Live radar dashboard state and its event loop.
pub struct Dashboard<A, M, C>
where
    C: ChartBackend,
{
    api: Arc<A>,
    map: M,
    charts: ChartLoader<C>,
    reconciler: Reconciler,
    ui: UiState,
    insights: Insights,
    traffic: TrafficPanel,
    traffic_feed: Option<TrafficFeed>,
    theme: Theme,
    last_sequence: u64,
    poller_config: PollerConfig,
    traffic_config: TrafficFeedConfig,
    event_tx: broadcast::Sender<DashboardEvent>,
    theme_tx: watch::Sender<Theme>,
}

impl<A, M, C> std::fmt::Debug for Dashboard<A, M, C>
where
    C: ChartBackend,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("reconciler", &self.reconciler)
            .field("ui", &self.ui)
            .field("theme", &self.theme)
            .field("last_sequence", &self.last_sequence)
            .finish_non_exhaustive()
    }
}

impl<A, M, C> Dashboard<A, M, C>
where
    A: DashboardApi + Send + Sync + 'static,
    M: MapSurface,
    C: ChartBackend,
{
    /// Create a dashboard and put the map in its initial state: base layer
    /// for the configured theme, interaction disabled until tactical mode.
    pub fn new(api: Arc<A>, mut map: M, chart_backend: C, config: DashboardConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);
        let (theme_tx, _) = watch::channel(config.theme);

        map.set_base_layer(Some(config.theme.tile_template()));
        map.set_interactive(false);

        Self {
            api,
            map,
            charts: ChartLoader::new(chart_backend).with_range(config.history_range),
            reconciler: Reconciler::new(config.trail_capacity),
            ui: UiState::new(config.home),
            insights: Insights::default(),
            traffic: TrafficPanel::new(config.video_stream_url),
            traffic_feed: None,
            theme: config.theme,
            last_sequence: 0,
            poller_config: config.poller,
            traffic_config: config.traffic,
            event_tx,
            theme_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.event_tx.subscribe()
    }

    /// Current theme, updated on every toggle.
    ///
    /// Unlike [`subscribe`](Self::subscribe) this never lags: a slow reader
    /// always sees the latest theme.
    pub fn watch_theme(&self) -> watch::Receiver<Theme> {
        self.theme_tx.subscribe()
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn charts(&self) -> &ChartLoader<C> {
        &self.charts
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn insights(&self) -> &Insights {
        &self.insights
    }

    pub fn traffic(&self) -> &TrafficPanel {
        &self.traffic
    }

    pub fn traffic_feed_running(&self) -> bool {
        self.traffic_feed.is_some()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Sequence number of the last applied snapshot, 0 before the first.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Content of the open sidebar, built from the latest tracked record.
    pub fn sidebar_content(&self) -> Option<SidebarContent> {
        match self.ui.sidebar()? {
            Sidebar::Flight(id) => self
                .reconciler
                .get(id)
                .map(|entity| SidebarContent::Flight(FlightDetail::from_record(&entity.record))),
            Sidebar::Project(key) => lookup_project(key).map(SidebarContent::Project),
        }
    }

    /// Apply one snapshot. Returns `false` if it was stale and discarded.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> bool {
        if snapshot.sequence <= self.last_sequence {
            debug!(
                "[telemetry] discarding stale snapshot {} (last applied {})",
                snapshot.sequence, self.last_sequence
            );
            return false;
        }
        self.last_sequence = snapshot.sequence;

        let report = self.reconciler.reconcile(&snapshot, &mut self.map);

        for id in report.removed {
            if self.ui.entity_removed(&id) {
                info!("[telemetry] {} left the feed, closing its sidebar", id);
                self.emit(DashboardEvent::SelectionCleared(id.clone()));
            }
            self.emit(DashboardEvent::EntityRemoved(id));
        }
        for id in report.added {
            self.emit(DashboardEvent::EntityAdded(id));
        }

        self.insights = Insights::from_records(&snapshot.entities);
        debug!(
            "[insights] {} aircraft ({}), avg {} at {}, top prefix {}",
            self.insights.plane_count,
            self.insights.status.as_str(),
            self.insights.altitude_display(),
            self.insights.speed_display(),
            self.insights.dominant_prefix_display()
        );
        self.emit(DashboardEvent::SnapshotApplied {
            sequence: snapshot.sequence,
            count: snapshot.len(),
        });
        true
    }

    /// Apply one traffic counter update.
    pub fn apply_traffic(&mut self, stats: TrafficStats) {
        self.traffic.apply(stats);
    }

    /// Handle one user interaction.
    pub async fn handle(&mut self, command: UiCommand) {
        debug!("[dashboard] {:?}", command);
        let sidebar_before = self.ui.sidebar().cloned();

        let effects = match command {
            UiCommand::SelectFlight(id) => match self.reconciler.resolve_id(&id) {
                Some(tracked) => {
                    let tracked = tracked.to_string();
                    self.ui.open_flight_sidebar(&tracked)
                }
                None => {
                    warn!("[dashboard] {} is not tracked, ignoring selection", id);
                    return;
                }
            },
            UiCommand::OpenProject(key) => match lookup_project(&key) {
                Some(project) => self.ui.open_project_sidebar(project.key),
                None => {
                    warn!("[dashboard] unknown project '{}'", key);
                    return;
                }
            },
            UiCommand::CloseSidebar => {
                self.ui.close_sidebar();
                Vec::new()
            }
            UiCommand::ToggleTactical => self.ui.toggle_tactical(),
            UiCommand::EnterTactical => self.ui.enter_tactical(),
            UiCommand::ExitTactical => self.ui.exit_tactical(),
            UiCommand::OpenAnalytics => self.ui.open_analytics(),
            UiCommand::CloseAnalytics => self.ui.close_analytics(),
            UiCommand::OpenTraffic => self.ui.open_traffic(),
            UiCommand::CloseTraffic => self.ui.close_traffic(),
            UiCommand::SelectDay(index) => {
                if self.ui.modal() == Some(Modal::Analytics) {
                    self.charts.select_day(self.api.as_ref(), index).await;
                } else {
                    debug!("[dashboard] analytics closed, ignoring day selection");
                }
                Vec::new()
            }
            UiCommand::SetRange(range) => {
                if self.ui.modal() == Some(Modal::Analytics) {
                    self.charts.set_range(self.api.as_ref(), range).await;
                } else {
                    debug!("[dashboard] analytics closed, ignoring range change");
                }
                Vec::new()
            }
            UiCommand::ToggleTheme => {
                self.toggle_theme().await;
                Vec::new()
            }
        };

        self.apply_effects(effects).await;

        if self.ui.sidebar() != sidebar_before.as_ref() {
            self.log_sidebar();
        }
    }

    fn log_sidebar(&self) {
        match self.sidebar_content() {
            Some(SidebarContent::Flight(detail)) => info!(
                "[dashboard] {}: {} {} {} {} | {}",
                FLIGHT_SIDEBAR_TITLE,
                detail.callsign,
                detail.route,
                detail.altitude,
                detail.ground_speed,
                detail.footer
            ),
            Some(SidebarContent::Project(project)) => {
                info!("[dashboard] {}: {}", PROJECT_SIDEBAR_TITLE, project.title);
            }
            None => debug!("[dashboard] sidebar closed"),
        }
    }

    async fn apply_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            match effect {
                UiEffect::FlyTo { center, zoom } => self.map.fly_to(center, zoom),
                UiEffect::SetMapInteractive(enabled) => self.map.set_interactive(enabled),
                UiEffect::InvalidateMapSize => self.map.invalidate_size(),
                UiEffect::LoadCharts => self.charts.load_all(self.api.as_ref()).await,
                UiEffect::StartTrafficFeed => {
                    info!("[traffic] starting counter feed");
                    self.traffic_feed = Some(TrafficFeed::spawn(
                        Arc::clone(&self.api),
                        self.traffic_config.clone(),
                    ));
                }
                UiEffect::AttachVideoStream => self.traffic.attach_stream(),
                UiEffect::DetachVideoStream => self.traffic.detach_stream(),
            }
        }
    }

    /// Swap the base layer: remove the old one, wait briefly, add the new one.
    async fn toggle_theme(&mut self) {
        let theme = self.theme.toggled();
        self.map.set_base_layer(None);
        tokio::time::sleep(LAYER_SWAP_DELAY).await;
        self.map.set_base_layer(Some(theme.tile_template()));
        self.theme = theme;
        info!("[dashboard] theme set to {}", theme.as_str());
        self.theme_tx.send_replace(theme);
        self.emit(DashboardEvent::ThemeChanged(theme));
    }

    fn emit(&self, event: DashboardEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Poll the backend and apply snapshots, traffic updates and commands
    /// until `cancel_token` fires or the command channel closes.
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<UiCommand>,
        cancel_token: CancellationToken,
    ) {
        // A new poller numbers its requests from 1 again
        self.last_sequence = 0;
        let mut poller = Poller::spawn(Arc::clone(&self.api), self.poller_config.clone());

        loop {
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    info!("[dashboard] cancelled");
                    break;
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => {
                        info!("[dashboard] command channel closed");
                        break;
                    }
                },
                snapshot = poller.recv() => match snapshot {
                    Some(snapshot) => {
                        self.apply_snapshot(snapshot);
                    }
                    None => break,
                },
                stats = next_traffic(&mut self.traffic_feed) => match stats {
                    Some(stats) => self.apply_traffic(stats),
                    None => self.traffic_feed = None,
                },
            }
        }

        poller.shutdown();
        if let Some(feed) = self.traffic_feed.take() {
            feed.shutdown();
        }
    }
}

/// Next traffic update, or pending forever while the feed is not running.
async fn next_traffic(feed: &mut Option<TrafficFeed>) -> Option<TrafficStats> {
    match feed {
        Some(feed) => feed.recv().await,
        None => std::future::pending().await,
    }
}
