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

//! Client engine for a live radar dashboard.
//!
//! This library keeps a map of live aircraft in step with a polled telemetry
//! backend and drives the auxiliary views around it. It is split into layers
//! that can be used independently or composed through [`Dashboard`]:
//!
//! - **API layer**: the [`DashboardApi`] trait and its reqwest implementation
//! - **Telemetry layer**: payload normalization and the sequence-stamped [`Poller`]
//! - **Tracker layer**: entity reconciliation, bounded trails and the [`MapSurface`] seam
//! - **UI layer**: the tactical/sidebar/modal state machine, flight detail,
//!   live insights, chart loading and the traffic-camera feed
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use radar_client::{Dashboard, DashboardConfig, HttpBackend, UiCommand};
//! # use radar_client::{ChartBackend, ChartData, ChartKind, ChartName, LatLon, MapSurface, MarkerIcon};
//! # struct NullMap;
//! # impl MapSurface for NullMap {
//! #     fn add_marker(&mut self, _: &str, _: LatLon, _: &MarkerIcon) {}
//! #     fn update_marker(&mut self, _: &str, _: LatLon, _: &MarkerIcon) {}
//! #     fn remove_marker(&mut self, _: &str) {}
//! #     fn add_trail(&mut self, _: &str, _: &[LatLon]) {}
//! #     fn update_trail(&mut self, _: &str, _: &[LatLon]) {}
//! #     fn remove_trail(&mut self, _: &str) {}
//! #     fn fly_to(&mut self, _: LatLon, _: f64) {}
//! #     fn set_interactive(&mut self, _: bool) {}
//! #     fn invalidate_size(&mut self) {}
//! #     fn set_base_layer(&mut self, _: Option<&str>) {}
//! # }
//! # struct NullCharts;
//! # impl ChartBackend for NullCharts {
//! #     type Handle = ();
//! #     fn create(&mut self, _: ChartName, _: ChartKind, _: &ChartData) {}
//! #     fn update(&mut self, _: &mut (), _: &ChartData) {}
//! # }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), radar_client::ApiError> {
//!     let api = Arc::new(HttpBackend::new(
//!         "http://localhost:8000",
//!         "http://localhost:5000",
//!         Duration::from_secs(2),
//!     )?);
//!     let mut dashboard = Dashboard::new(api, NullMap, NullCharts, DashboardConfig::default());
//!
//!     let (commands, command_rx) = tokio::sync::mpsc::channel(16);
//!     commands.send(UiCommand::ToggleTactical).await.ok();
//!     dashboard
//!         .run(command_rx, tokio_util::sync::CancellationToken::new())
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! # Using Individual Layers
//!
//! ## Tracker Layer Only
//!
//! ```
//! use radar_client::telemetry::{parse_live, Snapshot};
//! use radar_client::tracker::Reconciler;
//! # use radar_client::{LatLon, MapSurface, MarkerIcon};
//! # struct NullMap;
//! # impl MapSurface for NullMap {
//! #     fn add_marker(&mut self, _: &str, _: LatLon, _: &MarkerIcon) {}
//! #     fn update_marker(&mut self, _: &str, _: LatLon, _: &MarkerIcon) {}
//! #     fn remove_marker(&mut self, _: &str) {}
//! #     fn add_trail(&mut self, _: &str, _: &[LatLon]) {}
//! #     fn update_trail(&mut self, _: &str, _: &[LatLon]) {}
//! #     fn remove_trail(&mut self, _: &str) {}
//! #     fn fly_to(&mut self, _: LatLon, _: f64) {}
//! #     fn set_interactive(&mut self, _: bool) {}
//! #     fn invalidate_size(&mut self) {}
//! #     fn set_base_layer(&mut self, _: Option<&str>) {}
//! # }
//!
//! let payload = serde_json::json!({
//!     "aircraft": { "800C1B": { "lat": 12.95, "lon": 77.66, "altitude": 4200 } }
//! });
//! let records = parse_live(&payload).unwrap();
//!
//! let mut reconciler = Reconciler::default();
//! let report = reconciler.reconcile(&Snapshot::new(1, records), &mut NullMap);
//! assert_eq!(report.added, vec!["800C1B".to_string()]);
//! ```

pub mod api;
pub mod charts;
pub mod dashboard;
pub mod detail;
pub mod error;
pub mod insights;
pub mod telemetry;
pub mod theme;
pub mod tracker;
pub mod traffic;
pub mod ui_state;

#[cfg(test)]
mod testing;

pub use api::{CategorySeries, DashboardApi, DirectionCounts, HttpBackend, KpiSummary, ScatterPoint};
pub use charts::{ChartBackend, ChartData, ChartKind, ChartLoader, ChartName, HistoryRange};
pub use dashboard::{Dashboard, DashboardConfig, DashboardEvent, UiCommand};
pub use detail::{FlightDetail, Project, SidebarContent};
pub use error::ApiError;
pub use insights::{FeedStatus, Insights};
pub use telemetry::{LatLon, Poller, PollerConfig, Snapshot, TelemetryRecord};
pub use theme::Theme;
pub use tracker::{MapSurface, MarkerIcon, ReconcileReport, Reconciler, TrackedEntity, Trail};
pub use traffic::{TrafficFeed, TrafficFeedConfig, TrafficLog, TrafficPanel, TrafficStats};
pub use ui_state::{HomeView, Modal, Sidebar, UiEffect, UiState};
