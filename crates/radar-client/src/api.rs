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

//! Backend REST client.
//!
//! Every endpoint the dashboard consumes is reachable through the
//! [`DashboardApi`] trait so the poll loops and the chart loader can be driven
//! by an in-memory fake in tests. [`HttpBackend`] is the reqwest implementation.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::charts::HistoryRange;
use crate::error::ApiError;
use crate::telemetry::{self, lenient_string, TelemetryRecord};
use crate::traffic::TrafficStats;

/// Labelled numeric series (`{ labels, data }`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategorySeries {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub data: Vec<f64>,
}

/// One speed-vs-temperature sample.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

/// Heading distribution over eight compass sectors.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DirectionCounts {
    #[serde(default)]
    pub data: Vec<f64>,
}

/// 24 hour summary figures.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct KpiSummary {
    #[serde(default, alias = "unique_planes_24h", deserialize_with = "lenient_string")]
    pub unique: Option<String>,
    #[serde(default, alias = "max_speed_24h", deserialize_with = "lenient_string")]
    pub speed: Option<String>,
    #[serde(default, alias = "max_alt_24h", deserialize_with = "lenient_string")]
    pub alt: Option<String>,
}

impl KpiSummary {
    fn display(value: Option<&str>) -> &str {
        match value {
            Some(v) if v != "0" => v,
            _ => "--",
        }
    }

    #[must_use]
    pub fn unique_display(&self) -> &str {
        Self::display(self.unique.as_deref())
    }

    #[must_use]
    pub fn speed_display(&self) -> &str {
        Self::display(self.speed.as_deref())
    }

    #[must_use]
    pub fn altitude_display(&self) -> &str {
        Self::display(self.alt.as_deref())
    }
}

/// Endpoints consumed by the dashboard.
pub trait DashboardApi {
    /// `GET /api/live`, normalized into position-bearing records.
    fn fetch_live(&self) -> impl Future<Output = Result<Vec<TelemetryRecord>, ApiError>> + Send;

    /// `GET /api/kpi`.
    fn fetch_kpi(&self) -> impl Future<Output = Result<KpiSummary, ApiError>> + Send;

    /// `GET /api/daily`.
    fn fetch_daily(&self) -> impl Future<Output = Result<CategorySeries, ApiError>> + Send;

    /// `GET /api/history?range_type=<token>&offset=<days>`.
    fn fetch_history(
        &self,
        range: HistoryRange,
        offset: usize,
    ) -> impl Future<Output = Result<CategorySeries, ApiError>> + Send;

    /// `GET /api/altitude`.
    fn fetch_altitude(&self) -> impl Future<Output = Result<CategorySeries, ApiError>> + Send;

    /// `GET /api/scatter`.
    fn fetch_scatter(&self) -> impl Future<Output = Result<Vec<ScatterPoint>, ApiError>> + Send;

    /// `GET /api/direction`.
    fn fetch_direction(&self) -> impl Future<Output = Result<DirectionCounts, ApiError>> + Send;

    /// `GET <traffic-host>/api/stats`.
    fn fetch_traffic_stats(&self) -> impl Future<Output = Result<TrafficStats, ApiError>> + Send;
}

/// HTTP implementation of [`DashboardApi`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    traffic_url: String,
}

impl HttpBackend {
    /// Create a backend client. `timeout` applies to every request.
    pub fn new(base_url: &str, traffic_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            traffic_url: traffic_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl DashboardApi for HttpBackend {
    async fn fetch_live(&self) -> Result<Vec<TelemetryRecord>, ApiError> {
        let payload: Value = self.get_json(&self.endpoint("/api/live")).await?;
        telemetry::parse_live(&payload)
    }

    async fn fetch_kpi(&self) -> Result<KpiSummary, ApiError> {
        self.get_json(&self.endpoint("/api/kpi")).await
    }

    async fn fetch_daily(&self) -> Result<CategorySeries, ApiError> {
        self.get_json(&self.endpoint("/api/daily")).await
    }

    async fn fetch_history(
        &self,
        range: HistoryRange,
        offset: usize,
    ) -> Result<CategorySeries, ApiError> {
        let url = self.endpoint(&format!(
            "/api/history?range_type={}&offset={}",
            range.token(),
            offset
        ));
        self.get_json(&url).await
    }

    async fn fetch_altitude(&self) -> Result<CategorySeries, ApiError> {
        self.get_json(&self.endpoint("/api/altitude")).await
    }

    async fn fetch_scatter(&self) -> Result<Vec<ScatterPoint>, ApiError> {
        self.get_json(&self.endpoint("/api/scatter")).await
    }

    async fn fetch_direction(&self) -> Result<DirectionCounts, ApiError> {
        self.get_json(&self.endpoint("/api/direction")).await
    }

    async fn fetch_traffic_stats(&self) -> Result<TrafficStats, ApiError> {
        let url = format!("{}/api/stats", self.traffic_url);
        let payload: Value = self.get_json(&url).await?;
        TrafficStats::from_value(&payload)
    }
}
