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

//! Analytics chart loading.
//!
//! Chart drawing is delegated to a [`ChartBackend`]. The [`ChartLoader`]
//! decides what to fetch and keeps one backend handle per chart: a chart is
//! created the first time its data arrives and is only ever updated in place
//! afterwards. The static charts (daily volume, altitude, scatter, direction)
//! are fetched once; the intraday volume chart is re-fetched whenever the
//! selected day or the resolution changes.

use std::collections::HashMap;
use std::fmt;

use log::{debug, info, warn};

use crate::api::{CategorySeries, DashboardApi, KpiSummary, ScatterPoint};

/// Fixed labels of the direction chart's eight sectors.
pub const DIRECTION_LABELS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Bucket resolution of the intraday volume series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HistoryRange {
    FiveMinutes,
    FifteenMinutes,
    ThreeHours,
    #[default]
    Day,
    Week,
    TwoWeeks,
    Month,
}

impl HistoryRange {
    pub const ALL: [HistoryRange; 7] = [
        HistoryRange::FiveMinutes,
        HistoryRange::FifteenMinutes,
        HistoryRange::ThreeHours,
        HistoryRange::Day,
        HistoryRange::Week,
        HistoryRange::TwoWeeks,
        HistoryRange::Month,
    ];

    /// Token sent as `range_type`.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            HistoryRange::FiveMinutes => "5m",
            HistoryRange::FifteenMinutes => "15m",
            HistoryRange::ThreeHours => "3h",
            HistoryRange::Day => "24h",
            HistoryRange::Week => "7d",
            HistoryRange::TwoWeeks => "14d",
            HistoryRange::Month => "30d",
        }
    }

    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|range| range.token().eq_ignore_ascii_case(token.trim()))
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartName {
    Daily,
    Intraday,
    Altitude,
    Scatter,
    Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Polar,
}

impl ChartName {
    #[must_use]
    pub fn kind(self) -> ChartKind {
        match self {
            ChartName::Daily | ChartName::Altitude => ChartKind::Bar,
            ChartName::Intraday => ChartKind::Line,
            ChartName::Scatter => ChartKind::Scatter,
            ChartName::Direction => ChartKind::Polar,
        }
    }
}

/// Dataset handed to the chart backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Categorical { labels: Vec<String>, data: Vec<f64> },
    Points(Vec<ScatterPoint>),
}

impl From<CategorySeries> for ChartData {
    fn from(series: CategorySeries) -> Self {
        ChartData::Categorical {
            labels: series.labels,
            data: series.data,
        }
    }
}

/// Chart drawing surface.
pub trait ChartBackend {
    type Handle;

    /// Construct a chart. Called at most once per chart name.
    fn create(&mut self, name: ChartName, kind: ChartKind, data: &ChartData) -> Self::Handle;

    /// Replace the chart's labels and data and redraw it.
    fn update(&mut self, handle: &mut Self::Handle, data: &ChartData);
}

/// An intraday fetch in flight. Applying it after a newer request was issued is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntradayRequest {
    pub generation: u64,
    pub range: HistoryRange,
    pub offset: usize,
}

/// Fetches analytics data and keeps the chart handles.
pub struct ChartLoader<B: ChartBackend> {
    backend: B,
    handles: HashMap<ChartName, B::Handle>,
    kpi: KpiSummary,
    daily_labels: Vec<String>,
    range: HistoryRange,
    offset: usize,
    generation: u64,
}

impl<B: ChartBackend> fmt::Debug for ChartLoader<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartLoader")
            .field("charts", &self.handles.keys().collect::<Vec<_>>())
            .field("kpi", &self.kpi)
            .field("range", &self.range)
            .field("offset", &self.offset)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<B: ChartBackend> ChartLoader<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            handles: HashMap::new(),
            kpi: KpiSummary::default(),
            daily_labels: Vec::new(),
            range: HistoryRange::default(),
            offset: 0,
            generation: 0,
        }
    }

    /// Start from `range` instead of the default resolution.
    #[must_use]
    pub fn with_range(mut self, range: HistoryRange) -> Self {
        self.range = range;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn handle(&self, name: ChartName) -> Option<&B::Handle> {
        self.handles.get(&name)
    }

    pub fn is_loaded(&self, name: ChartName) -> bool {
        self.handles.contains_key(&name)
    }

    pub fn kpi(&self) -> &KpiSummary {
        &self.kpi
    }

    pub fn range(&self) -> HistoryRange {
        self.range
    }

    /// Days back from today shown by the intraday chart.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn volume_title(&self) -> String {
        if self.offset == 0 {
            "Traffic Volume (Today)".to_string()
        } else {
            format!("Traffic Volume (-{} Days)", self.offset)
        }
    }

    /// Refresh the KPIs, create any chart not yet created and show today's
    /// intraday volume. A chart whose fetch fails stays absent and is retried
    /// on the next call.
    pub async fn load_all<A: DashboardApi + ?Sized>(&mut self, api: &A) {
        match api.fetch_kpi().await {
            Ok(kpi) => {
                info!(
                    "[charts] 24h: {} unique, max speed {}, max altitude {}",
                    kpi.unique_display(),
                    kpi.speed_display(),
                    kpi.altitude_display()
                );
                self.kpi = kpi;
            }
            Err(e) => warn!("[charts] KPI fetch failed: {}", e),
        }

        if !self.is_loaded(ChartName::Daily) {
            match api.fetch_daily().await {
                Ok(series) => {
                    self.daily_labels = series.labels.clone();
                    self.show(ChartName::Daily, series.into());
                }
                Err(e) => warn!("[charts] daily volume fetch failed: {}", e),
            }
        }

        if !self.is_loaded(ChartName::Altitude) {
            match api.fetch_altitude().await {
                Ok(series) => self.show(ChartName::Altitude, series.into()),
                Err(e) => warn!("[charts] altitude fetch failed: {}", e),
            }
        }

        if !self.is_loaded(ChartName::Scatter) {
            match api.fetch_scatter().await {
                Ok(points) => self.show(ChartName::Scatter, ChartData::Points(points)),
                Err(e) => warn!("[charts] scatter fetch failed: {}", e),
            }
        }

        if !self.is_loaded(ChartName::Direction) {
            match api.fetch_direction().await {
                Ok(counts) => {
                    let data = ChartData::Categorical {
                        labels: DIRECTION_LABELS.iter().map(|l| (*l).to_string()).collect(),
                        data: counts.data,
                    };
                    self.show(ChartName::Direction, data);
                }
                Err(e) => warn!("[charts] direction fetch failed: {}", e),
            }
        }

        self.offset = 0;
        self.load_intraday(api).await;
    }

    /// Drill into the day behind bar `index` of the daily chart.
    ///
    /// Bars run oldest to newest, so the last bar is today (offset 0).
    pub async fn select_day<A: DashboardApi + ?Sized>(&mut self, api: &A, index: usize) -> bool {
        let count = self.daily_labels.len();
        if index >= count {
            debug!("[charts] ignoring click on bar {} of {}", index, count);
            return false;
        }
        self.offset = count - 1 - index;
        self.load_intraday(api).await
    }

    /// Change the intraday resolution, keeping the selected day.
    pub async fn set_range<A: DashboardApi + ?Sized>(&mut self, api: &A, range: HistoryRange) -> bool {
        self.range = range;
        self.load_intraday(api).await
    }

    /// Fetch and show the intraday series for the current day and range.
    pub async fn load_intraday<A: DashboardApi + ?Sized>(&mut self, api: &A) -> bool {
        let request = self.intraday_request();
        match api.fetch_history(request.range, request.offset).await {
            Ok(series) => self.apply_intraday(request, series),
            Err(e) => {
                warn!("[charts] intraday volume fetch failed: {}", e);
                false
            }
        }
    }

    /// Start an intraday fetch, superseding any earlier one.
    pub fn intraday_request(&mut self) -> IntradayRequest {
        self.generation += 1;
        IntradayRequest {
            generation: self.generation,
            range: self.range,
            offset: self.offset,
        }
    }

    /// Show a fetched intraday series unless a newer request has been issued.
    pub fn apply_intraday(&mut self, request: IntradayRequest, series: CategorySeries) -> bool {
        if request.generation != self.generation {
            debug!(
                "[charts] discarding stale intraday response (generation {} < {})",
                request.generation, self.generation
            );
            return false;
        }
        self.show(ChartName::Intraday, series.into());
        debug!("[charts] {} at {} resolution", self.volume_title(), request.range);
        true
    }

    fn show(&mut self, name: ChartName, data: ChartData) {
        match self.handles.get_mut(&name) {
            Some(handle) => self.backend.update(handle, &data),
            None => {
                let handle = self.backend.create(name, name.kind(), &data);
                self.handles.insert(name, handle);
            }
        }
    }
}
