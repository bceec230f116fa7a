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

//! In-memory fakes shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::api::{CategorySeries, DashboardApi, DirectionCounts, KpiSummary, ScatterPoint};
use crate::charts::{ChartBackend, ChartData, ChartKind, ChartName, HistoryRange};
use crate::error::ApiError;
use crate::telemetry::{LatLon, TelemetryRecord};
use crate::tracker::{MapSurface, MarkerIcon};
use crate::traffic::TrafficStats;

#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    live: Mutex<VecDeque<Result<Vec<TelemetryRecord>, ()>>>,
    traffic: Mutex<VecDeque<TrafficStats>>,
    pub(crate) kpi: Mutex<KpiSummary>,
    pub(crate) daily: Mutex<CategorySeries>,
    pub(crate) history: Mutex<CategorySeries>,
    pub(crate) altitude: Mutex<CategorySeries>,
    pub(crate) direction: Mutex<DirectionCounts>,
    pub(crate) fail_altitude: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub(crate) fn push_live(&self, result: Result<Vec<TelemetryRecord>, ()>) {
        self.live.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_traffic(&self, stats: TrafficStats) {
        self.traffic.lock().unwrap().push_back(stats);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl DashboardApi for FakeApi {
    async fn fetch_live(&self) -> Result<Vec<TelemetryRecord>, ApiError> {
        self.record("live");
        match self.live.lock().unwrap().pop_front() {
            Some(Ok(records)) => Ok(records),
            Some(Err(())) => Err(ApiError::Status(503)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_kpi(&self) -> Result<KpiSummary, ApiError> {
        self.record("kpi");
        Ok(self.kpi.lock().unwrap().clone())
    }

    async fn fetch_daily(&self) -> Result<CategorySeries, ApiError> {
        self.record("daily");
        Ok(self.daily.lock().unwrap().clone())
    }

    async fn fetch_history(
        &self,
        range: HistoryRange,
        offset: usize,
    ) -> Result<CategorySeries, ApiError> {
        self.record(format!("history:{}:{}", range.token(), offset));
        Ok(self.history.lock().unwrap().clone())
    }

    async fn fetch_altitude(&self) -> Result<CategorySeries, ApiError> {
        self.record("altitude");
        if *self.fail_altitude.lock().unwrap() {
            return Err(ApiError::Status(500));
        }
        Ok(self.altitude.lock().unwrap().clone())
    }

    async fn fetch_scatter(&self) -> Result<Vec<ScatterPoint>, ApiError> {
        self.record("scatter");
        Ok(vec![ScatterPoint { x: -40.0, y: 36000.0 }])
    }

    async fn fetch_direction(&self) -> Result<DirectionCounts, ApiError> {
        self.record("direction");
        Ok(self.direction.lock().unwrap().clone())
    }

    async fn fetch_traffic_stats(&self) -> Result<TrafficStats, ApiError> {
        self.record("traffic");
        self.traffic
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ApiError::Status(503))
    }
}

/// Map surface that keeps the resulting map state and a log of view operations.
#[derive(Debug, Default)]
pub(crate) struct RecordingMap {
    pub(crate) markers: HashMap<String, LatLon>,
    pub(crate) icons: HashMap<String, MarkerIcon>,
    pub(crate) trails: HashMap<String, Vec<LatLon>>,
    pub(crate) view_ops: Vec<String>,
    pub(crate) interactive: bool,
    pub(crate) base_layer: Option<String>,
}

impl MapSurface for RecordingMap {
    fn add_marker(&mut self, id: &str, position: LatLon, icon: &MarkerIcon) {
        assert!(
            self.markers.insert(id.to_string(), position).is_none(),
            "marker {id} added twice"
        );
        self.icons.insert(id.to_string(), icon.clone());
    }

    fn update_marker(&mut self, id: &str, position: LatLon, icon: &MarkerIcon) {
        assert!(self.markers.contains_key(id), "marker {id} updated before add");
        self.markers.insert(id.to_string(), position);
        self.icons.insert(id.to_string(), icon.clone());
    }

    fn remove_marker(&mut self, id: &str) {
        self.markers.remove(id);
        self.icons.remove(id);
    }

    fn add_trail(&mut self, id: &str, points: &[LatLon]) {
        self.trails.insert(id.to_string(), points.to_vec());
    }

    fn update_trail(&mut self, id: &str, points: &[LatLon]) {
        self.trails.insert(id.to_string(), points.to_vec());
    }

    fn remove_trail(&mut self, id: &str) {
        self.trails.remove(id);
    }

    fn fly_to(&mut self, center: LatLon, zoom: f64) {
        self.view_ops
            .push(format!("fly_to {} {} {}", center.lat, center.lon, zoom));
    }

    fn set_interactive(&mut self, enabled: bool) {
        self.interactive = enabled;
        self.view_ops.push(format!("interactive {enabled}"));
    }

    fn invalidate_size(&mut self) {
        self.view_ops.push("invalidate_size".to_string());
    }

    fn set_base_layer(&mut self, url_template: Option<&str>) {
        self.base_layer = url_template.map(str::to_string);
        self.view_ops.push(format!("base_layer {url_template:?}"));
    }
}

/// Handle recorded by [`RecordingCharts`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedChart {
    pub(crate) name: ChartName,
    pub(crate) data: ChartData,
}

/// Chart backend that keeps each chart's current dataset.
#[derive(Debug, Default)]
pub(crate) struct RecordingCharts {
    pub(crate) created: Vec<(ChartName, ChartKind)>,
    pub(crate) updates: Vec<ChartName>,
}

impl ChartBackend for RecordingCharts {
    type Handle = RecordedChart;

    fn create(&mut self, name: ChartName, kind: ChartKind, data: &ChartData) -> RecordedChart {
        assert!(
            !self.created.iter().any(|(n, _)| *n == name),
            "chart {name:?} created twice"
        );
        self.created.push((name, kind));
        RecordedChart {
            name,
            data: data.clone(),
        }
    }

    fn update(&mut self, handle: &mut RecordedChart, data: &ChartData) {
        self.updates.push(handle.name);
        handle.data = data.clone();
    }
}
