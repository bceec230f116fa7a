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

//! Application configuration management.
//!
//! Settings are persisted as TOML through `confy`. Every field has a serde
//! default so older or hand-edited files keep loading as fields are added.

use std::time::Duration;

use radar_client::charts::HistoryRange;
use radar_client::telemetry::{LatLon, PollerConfig};
use radar_client::theme::Theme;
use radar_client::traffic::TrafficFeedConfig;
use radar_client::ui_state::HomeView;
use radar_client::DashboardConfig;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "radar-dashboard";
const CONFIG_NAME: &str = "config";

/// Environment variable that overrides the configured backend URL.
pub const BACKEND_URL_ENV: &str = "RADAR_BACKEND_URL";

/// Command-line values layered over the stored configuration for one run.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub traffic_url: Option<String>,
    pub trail_capacity: Option<usize>,
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Base URL of the telemetry and analytics backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Base URL of the traffic-camera host
    #[serde(default = "default_traffic_url")]
    pub traffic_url: String,

    /// Video stream embedded in the traffic modal
    #[serde(default = "default_video_stream_url")]
    pub video_stream_url: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_traffic_poll_interval_ms")]
    pub traffic_poll_interval_ms: u64,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Maximum positions kept per aircraft trail
    #[serde(default = "default_trail_capacity")]
    pub trail_capacity: usize,

    /// Home view center as [lat, lon]
    #[serde(default = "default_center")]
    pub default_center: [f64; 2],

    #[serde(default = "default_zoom")]
    pub default_zoom: f64,

    /// Intraday chart resolution shown when analytics first opens
    #[serde(default = "default_history_range")]
    pub history_range: String,

    /// Stored theme preference ("dark" or "light")
    #[serde(default)]
    pub theme: Option<String>,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_traffic_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_video_stream_url() -> String {
    "http://localhost:5000/video_feed".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_traffic_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    2000
}

fn default_trail_capacity() -> usize {
    90
}

fn default_center() -> [f64; 2] {
    [12.98, 77.6]
}

fn default_zoom() -> f64 {
    8.4
}

fn default_history_range() -> String {
    HistoryRange::default().token().to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            backend_url: default_backend_url(),
            traffic_url: default_traffic_url(),
            video_stream_url: default_video_stream_url(),
            poll_interval_ms: default_poll_interval_ms(),
            traffic_poll_interval_ms: default_traffic_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            trail_capacity: default_trail_capacity(),
            default_center: default_center(),
            default_zoom: default_zoom(),
            history_range: default_history_range(),
            theme: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Resolve the backend URL: a non-empty environment override wins over the config file.
    pub fn resolve_backend_url(&self, env_value: Option<&str>) -> String {
        env_value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(|| self.backend_url.clone(), str::to_string)
    }

    /// Effective configuration for this run. Command-line values beat the
    /// environment, which beats the file. `self` is left untouched so the
    /// overrides never reach disk.
    pub fn with_overrides(&self, overrides: &Overrides, env_backend: Option<&str>) -> Self {
        let mut effective = self.clone();
        effective.backend_url = match &overrides.backend_url {
            Some(url) => url.clone(),
            None => self.resolve_backend_url(env_backend),
        };
        if let Some(url) = &overrides.traffic_url {
            effective.traffic_url.clone_from(url);
        }
        if let Some(capacity) = overrides.trail_capacity {
            effective.trail_capacity = capacity;
        }
        effective
    }

    /// Theme from the stored preference, dark when unset or unrecognized.
    pub fn theme(&self) -> Theme {
        Theme::resolve(self.theme.as_deref())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = Some(theme.as_str().to_string());
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Library configuration for the dashboard controller.
    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            poller: PollerConfig {
                interval: Duration::from_millis(self.poll_interval_ms.max(1)),
                ..Default::default()
            },
            traffic: TrafficFeedConfig {
                interval: Duration::from_millis(self.traffic_poll_interval_ms.max(1)),
                ..Default::default()
            },
            trail_capacity: self.trail_capacity.max(1),
            home: HomeView {
                center: LatLon::new(self.default_center[0], self.default_center[1]),
                zoom: self.default_zoom,
            },
            video_stream_url: self.video_stream_url.clone(),
            theme: self.theme(),
            history_range: self.history_range(),
            ..Default::default()
        }
    }

    /// Initial intraday resolution, falling back to the default for unknown tokens.
    pub fn history_range(&self) -> HistoryRange {
        HistoryRange::from_token(&self.history_range).unwrap_or_default()
    }
}

/// Persists theme changes into the configuration as it was loaded from disk.
///
/// Holds nothing when loading failed, so a default configuration never
/// overwrites a file that could not be parsed.
#[derive(Debug)]
pub struct ThemeStore {
    stored: Option<AppConfig>,
}

impl ThemeStore {
    pub fn new(stored: Option<AppConfig>) -> Self {
        Self { stored }
    }

    /// Record `theme` on the stored configuration and return what should be written.
    pub fn apply(&mut self, theme: Theme) -> Option<&AppConfig> {
        let config = self.stored.as_mut()?;
        config.set_theme(theme);
        Some(config)
    }

    /// Write `theme` to disk. Returns `Ok(false)` when saving is disabled.
    pub fn save(&mut self, theme: Theme) -> Result<bool, confy::ConfyError> {
        match self.apply(theme) {
            Some(config) => config.save().map(|()| true),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "trail_capacity": 30 }"#).unwrap();
        assert_eq!(config.trail_capacity, 30);
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.default_center, [12.98, 77.6]);
        assert_eq!(config.theme, None);
    }

    #[test]
    fn test_env_override_takes_precedence() {
        let config = AppConfig::default();
        assert_eq!(
            config.resolve_backend_url(Some("http://radar.local:8000")),
            "http://radar.local:8000"
        );
        assert_eq!(config.resolve_backend_url(Some("  ")), "http://localhost:8000");
        assert_eq!(config.resolve_backend_url(None), "http://localhost:8000");
    }

    #[test]
    fn test_overrides_precedence() {
        let stored = AppConfig {
            backend_url: "http://file:8000".to_string(),
            ..Default::default()
        };

        let effective = stored.with_overrides(&Overrides::default(), Some("http://env:8000"));
        assert_eq!(effective.backend_url, "http://env:8000");

        let overrides = Overrides {
            backend_url: Some("http://cli:8000".to_string()),
            traffic_url: Some("http://camera:5000".to_string()),
            trail_capacity: Some(5),
        };
        let effective = stored.with_overrides(&overrides, Some("http://env:8000"));
        assert_eq!(effective.backend_url, "http://cli:8000");
        assert_eq!(effective.traffic_url, "http://camera:5000");
        assert_eq!(effective.trail_capacity, 5);

        let effective = stored.with_overrides(&Overrides::default(), None);
        assert_eq!(effective, stored);
    }

    #[test]
    fn test_theme_store_keeps_overrides_off_disk() {
        let stored = AppConfig::default();
        let overrides = Overrides {
            traffic_url: Some("http://camera:5000".to_string()),
            trail_capacity: Some(5),
            ..Default::default()
        };
        let effective = stored.with_overrides(&overrides, Some("http://env:8000"));
        assert_eq!(effective.trail_capacity, 5);

        let mut store = ThemeStore::new(Some(stored));
        let written = store.apply(Theme::Light).unwrap();

        assert_eq!(written.theme.as_deref(), Some("light"));
        assert_eq!(written.traffic_url, "http://localhost:5000");
        assert_eq!(written.backend_url, "http://localhost:8000");
        assert_eq!(written.trail_capacity, 90);
    }

    #[test]
    fn test_theme_store_disabled_after_failed_load() {
        let mut store = ThemeStore::new(None);
        assert!(store.apply(Theme::Light).is_none());
        assert!(!store.save(Theme::Light).unwrap());
    }

    #[test]
    fn test_theme_preference() {
        let mut config = AppConfig::default();
        assert_eq!(config.theme(), Theme::Dark);

        config.theme = Some("LIGHT".to_string());
        assert_eq!(config.theme(), Theme::Light);

        config.theme = Some("sepia".to_string());
        assert_eq!(config.theme(), Theme::Dark);

        config.set_theme(Theme::Light);
        assert_eq!(config.theme.as_deref(), Some("light"));
    }

    #[test]
    fn test_dashboard_config_mapping() {
        let config = AppConfig {
            poll_interval_ms: 500,
            trail_capacity: 0,
            default_center: [51.5, -0.12],
            ..Default::default()
        };
        let dashboard = config.dashboard_config();

        assert_eq!(dashboard.poller.interval, Duration::from_millis(500));
        assert_eq!(dashboard.traffic.interval, Duration::from_millis(1000));
        assert_eq!(dashboard.trail_capacity, 1);
        assert_eq!(dashboard.home.center, LatLon::new(51.5, -0.12));
        assert!((dashboard.home.zoom - 8.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_history_range_falls_back() {
        let mut config = AppConfig::default();
        assert_eq!(config.history_range(), HistoryRange::Day);
        config.history_range = "15m".to_string();
        assert_eq!(config.history_range(), HistoryRange::FifteenMinutes);
        config.history_range = "1y".to_string();
        assert_eq!(config.history_range(), HistoryRange::Day);
    }
}
