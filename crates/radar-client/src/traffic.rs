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

//! Traffic-camera counter feed.
//!
//! The traffic host reports `{ "<label>": <count>, ..., "log": "<message>" }`.
//! Numeric entries become the live breakdown grid, `total_all_time` is shown
//! separately, and `log` feeds a short newest-first message list with
//! consecutive duplicates suppressed. The feed is polled independently of the
//! telemetry poller and the embedded video stream is only attached while the
//! traffic modal is open.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::DashboardApi;
use crate::error::ApiError;

/// Maximum number of log lines kept.
pub const TRAFFIC_LOG_CAPACITY: usize = 10;

const TOTAL_ALL_TIME_KEY: &str = "total_all_time";
const LOG_KEY: &str = "log";
const STATUS_KEY: &str = "status";

/// One poll of the traffic host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficStats {
    /// Live detection counts by label, ordered by label.
    pub counts: Vec<(String, f64)>,
    pub total_all_time: Option<f64>,
    pub log: Option<String>,
    pub status: Option<String>,
}

impl TrafficStats {
    pub fn from_value(payload: &Value) -> Result<Self, ApiError> {
        let object = payload.as_object().ok_or(ApiError::Malformed("stats"))?;
        let mut stats = TrafficStats::default();

        for (key, value) in object {
            match (key.as_str(), value) {
                (LOG_KEY, Value::String(message)) => {
                    let message = message.trim();
                    if !message.is_empty() {
                        stats.log = Some(message.to_string());
                    }
                }
                (STATUS_KEY, Value::String(status)) => stats.status = Some(status.clone()),
                (TOTAL_ALL_TIME_KEY, Value::Number(n)) => stats.total_all_time = n.as_f64(),
                (_, Value::Number(n)) if key != LOG_KEY && key != STATUS_KEY => {
                    if let Some(count) = n.as_f64() {
                        stats.counts.push((key.clone(), count));
                    }
                }
                _ => {}
            }
        }

        stats.counts.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(stats)
    }
}

/// A log line with the time it was first received.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Capped, newest-first log.
#[derive(Debug, Clone)]
pub struct TrafficLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for TrafficLog {
    fn default() -> Self {
        Self::with_capacity(TRAFFIC_LOG_CAPACITY)
    }
}

impl TrafficLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a message unless it repeats the newest entry. Returns whether it was added.
    pub fn push(&mut self, message: &str) -> bool {
        if self
            .entries
            .front()
            .is_some_and(|newest| newest.message == message)
        {
            return false;
        }

        self.entries.push_front(LogEntry {
            timestamp: Utc::now(),
            message: message.to_string(),
        });
        self.entries.truncate(self.capacity);
        true
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Content of the traffic modal.
#[derive(Debug, Clone)]
pub struct TrafficPanel {
    pub breakdown: Vec<(String, f64)>,
    pub total_all_time: Option<f64>,
    pub status: Option<String>,
    pub log: TrafficLog,
    pub last_update: Option<DateTime<Utc>>,
    stream_url: String,
    stream_source: Option<String>,
}

impl TrafficPanel {
    #[must_use]
    pub fn new(stream_url: String) -> Self {
        Self {
            breakdown: Vec::new(),
            total_all_time: None,
            status: None,
            log: TrafficLog::default(),
            last_update: None,
            stream_url,
            stream_source: None,
        }
    }

    /// Replace the breakdown and append the log message, if any.
    pub fn apply(&mut self, stats: TrafficStats) {
        self.breakdown = stats.counts;
        self.total_all_time = stats.total_all_time;
        self.status = stats.status;
        if let Some(message) = stats.log {
            if self.log.push(&message) {
                info!("[traffic] {}", message);
            }
        }
        self.last_update = Some(Utc::now());
    }

    pub fn attach_stream(&mut self) {
        self.stream_source = Some(self.stream_url.clone());
    }

    pub fn detach_stream(&mut self) {
        self.stream_source = None;
    }

    /// Source currently set on the video element.
    #[must_use]
    pub fn stream_source(&self) -> Option<&str> {
        self.stream_source.as_deref()
    }
}

/// Configuration for the traffic feed poller.
#[derive(Debug, Clone)]
pub struct TrafficFeedConfig {
    pub interval: Duration,
    pub buffer_size: usize,
}

impl Default for TrafficFeedConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            buffer_size: 16,
        }
    }
}

/// Handle to the background traffic poll loop.
pub struct TrafficFeed {
    stats_rx: mpsc::Receiver<TrafficStats>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for TrafficFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficFeed")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl TrafficFeed {
    #[must_use]
    pub fn spawn<A>(api: Arc<A>, config: TrafficFeedConfig) -> Self
    where
        A: DashboardApi + Send + Sync + 'static,
    {
        let (stats_tx, stats_rx) = mpsc::channel(config.buffer_size);
        let cancel_token = CancellationToken::new();
        let task_cancel = cancel_token.clone();

        tokio::spawn(async move {
            feed_loop(api, stats_tx, task_cancel, config.interval).await;
        });

        Self {
            stats_rx,
            cancel_token,
        }
    }

    pub async fn recv(&mut self) -> Option<TrafficStats> {
        self.stats_rx.recv().await
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for TrafficFeed {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn feed_loop<A>(
    api: Arc<A>,
    stats_tx: mpsc::Sender<TrafficStats>,
    cancel_token: CancellationToken,
    interval: Duration,
) where
    A: DashboardApi + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("[traffic] polling every {} ms", interval.as_millis());

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = cancel_token.cancelled() => {
                info!("[traffic] feed cancelled");
                return;
            }
        }

        let result = tokio::select! {
            result = api.fetch_traffic_stats() => result,
            () = cancel_token.cancelled() => return,
        };

        match result {
            Ok(stats) => {
                if stats_tx.send(stats).await.is_err() {
                    return;
                }
            }
            Err(e) => debug!("[traffic] poll failed, keeping last counts: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;
    use serde_json::json;

    #[test]
    fn test_stats_exclude_log_and_status_from_breakdown() {
        let stats = TrafficStats::from_value(&json!({
            "CAR": 4,
            "BUS": 1,
            "total_all_time": 1520,
            "status": "Online",
            "log": "Truck detected"
        }))
        .unwrap();

        assert_eq!(
            stats.counts,
            vec![("BUS".to_string(), 1.0), ("CAR".to_string(), 4.0)]
        );
        assert_eq!(stats.total_all_time, Some(1520.0));
        assert_eq!(stats.log.as_deref(), Some("Truck detected"));
        assert_eq!(stats.status.as_deref(), Some("Online"));
    }

    #[test]
    fn test_stats_must_be_an_object() {
        assert!(TrafficStats::from_value(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_log_suppresses_consecutive_duplicates() {
        let mut log = TrafficLog::default();
        assert!(log.push("Car detected"));
        assert!(!log.push("Car detected"));
        assert!(log.push("Bus detected"));
        assert!(log.push("Car detected"));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_log_is_capped_newest_first() {
        let mut log = TrafficLog::default();
        for i in 0..25 {
            log.push(&format!("event {i}"));
        }

        assert_eq!(log.len(), TRAFFIC_LOG_CAPACITY);
        let messages: Vec<_> = log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages.first(), Some(&"event 24"));
        assert_eq!(messages.last(), Some(&"event 15"));
    }

    #[test]
    fn test_panel_stream_source_follows_attach_and_detach() {
        let mut panel = TrafficPanel::new("http://localhost:8000/video_feed".to_string());
        assert_eq!(panel.stream_source(), None);
        panel.attach_stream();
        assert_eq!(panel.stream_source(), Some("http://localhost:8000/video_feed"));
        panel.detach_stream();
        assert_eq!(panel.stream_source(), None);
    }

    #[test]
    fn test_panel_apply_repeated_log_once() {
        let mut panel = TrafficPanel::new(String::new());
        for _ in 0..3 {
            panel.apply(TrafficStats {
                counts: vec![("CAR".to_string(), 2.0)],
                log: Some("Car detected".to_string()),
                ..Default::default()
            });
        }
        assert_eq!(panel.log.len(), 1);
        assert_eq!(panel.breakdown, vec![("CAR".to_string(), 2.0)]);
    }

    #[tokio::test]
    async fn test_feed_skips_failures() {
        let api = Arc::new(FakeApi::default());
        let mut feed = TrafficFeed::spawn(
            Arc::clone(&api),
            TrafficFeedConfig {
                interval: Duration::from_millis(5),
                ..Default::default()
            },
        );

        // No stats queued yet: the first polls fail and are skipped
        tokio::time::sleep(Duration::from_millis(20)).await;
        api.push_traffic(TrafficStats {
            log: Some("Car detected".to_string()),
            ..Default::default()
        });

        let stats = feed.recv().await.unwrap();
        assert_eq!(stats.log.as_deref(), Some("Car detected"));
        assert!(api.call_count("traffic") >= 2);
    }
}
