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

//! Console implementations of the map and chart surfaces.
//!
//! The dashboard engine only talks to the map and chart libraries through
//! [`MapSurface`] and [`ChartBackend`]. These implementations keep the
//! minimal state needed to report what a renderer would show and log every
//! operation instead of drawing it.

use std::collections::HashMap;

use log::{debug, info};
use radar_client::charts::{ChartBackend, ChartData, ChartKind, ChartName};
use radar_client::telemetry::LatLon;
use radar_client::tracker::{MapSurface, MarkerIcon};

/// Map surface that logs marker, trail and view changes.
#[derive(Debug, Default)]
pub struct ConsoleMap {
    markers: HashMap<String, LatLon>,
    trail_points: HashMap<String, usize>,
    interactive: bool,
}

impl ConsoleMap {
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn trail_point_count(&self) -> usize {
        self.trail_points.values().sum()
    }
}

impl MapSurface for ConsoleMap {
    fn add_marker(&mut self, id: &str, position: LatLon, icon: &MarkerIcon) {
        debug!(
            "[map] + {} {} ({:.4}, {:.4}) hdg {:.0} {}",
            id, icon.flight, position.lat, position.lon, icon.rotation, icon.data
        );
        self.markers.insert(id.to_string(), position);
    }

    fn update_marker(&mut self, id: &str, position: LatLon, icon: &MarkerIcon) {
        debug!(
            "[map] ~ {} ({:.4}, {:.4}) {}",
            id, position.lat, position.lon, icon.data
        );
        self.markers.insert(id.to_string(), position);
    }

    fn remove_marker(&mut self, id: &str) {
        debug!("[map] - {}", id);
        self.markers.remove(id);
    }

    fn add_trail(&mut self, id: &str, points: &[LatLon]) {
        self.trail_points.insert(id.to_string(), points.len());
    }

    fn update_trail(&mut self, id: &str, points: &[LatLon]) {
        self.trail_points.insert(id.to_string(), points.len());
    }

    fn remove_trail(&mut self, id: &str) {
        self.trail_points.remove(id);
    }

    fn fly_to(&mut self, center: LatLon, zoom: f64) {
        info!("[map] fly to ({}, {}) zoom {}", center.lat, center.lon, zoom);
    }

    fn set_interactive(&mut self, enabled: bool) {
        if self.interactive != enabled {
            info!("[map] interaction {}", if enabled { "enabled" } else { "disabled" });
        }
        self.interactive = enabled;
    }

    fn invalidate_size(&mut self) {
        debug!("[map] size invalidated");
    }

    fn set_base_layer(&mut self, url_template: Option<&str>) {
        match url_template {
            Some(template) => info!("[map] base layer {}", template),
            None => debug!("[map] base layer removed"),
        }
    }
}

/// Chart handle: the chart's identity plus its current dataset size.
#[derive(Debug)]
pub struct ConsoleChart {
    name: ChartName,
    kind: ChartKind,
    points: usize,
}

/// Chart backend that logs a one-line summary of each dataset.
#[derive(Debug, Default)]
pub struct ConsoleCharts {
    drawn: usize,
}

impl ConsoleCharts {
    fn summarize(data: &ChartData) -> (usize, String) {
        match data {
            ChartData::Categorical { labels, data } => {
                let peak = labels
                    .iter()
                    .zip(data)
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map_or_else(String::new, |(label, value)| format!(", peak {value} at {label}"));
                (data.len(), peak)
            }
            ChartData::Points(points) => (points.len(), String::new()),
        }
    }

    fn draw(&mut self, chart: &mut ConsoleChart, data: &ChartData) {
        let (points, peak) = Self::summarize(data);
        chart.points = points;
        self.drawn += 1;
        info!(
            "[charts] {:?} ({:?}): {} points{}",
            chart.name, chart.kind, chart.points, peak
        );
    }
}

impl ChartBackend for ConsoleCharts {
    type Handle = ConsoleChart;

    fn create(&mut self, name: ChartName, kind: ChartKind, data: &ChartData) -> ConsoleChart {
        let mut chart = ConsoleChart {
            name,
            kind,
            points: 0,
        };
        self.draw(&mut chart, data);
        chart
    }

    fn update(&mut self, handle: &mut ConsoleChart, data: &ChartData) {
        self.draw(handle, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_tracks_markers_and_trails() {
        let mut map = ConsoleMap::default();
        let icon = MarkerIcon {
            rotation: 90.0,
            flight: "AI101".to_string(),
            route: "BLR-DEL".to_string(),
            data: "FL350 | 450kt".to_string(),
            tooltip: "AI101 A320".to_string(),
        };

        map.add_marker("800C1B", LatLon::new(12.9, 77.6), &icon);
        map.add_trail("800C1B", &[LatLon::new(12.9, 77.6)]);
        map.update_trail("800C1B", &[LatLon::new(12.9, 77.6), LatLon::new(13.0, 77.7)]);
        assert_eq!(map.marker_count(), 1);
        assert_eq!(map.trail_point_count(), 2);

        map.remove_marker("800C1B");
        map.remove_trail("800C1B");
        assert_eq!(map.marker_count(), 0);
        assert_eq!(map.trail_point_count(), 0);
    }

    #[test]
    fn test_charts_update_handle_in_place() {
        let mut charts = ConsoleCharts::default();
        let mut handle = charts.create(
            ChartName::Altitude,
            ChartKind::Bar,
            &ChartData::Categorical {
                labels: vec!["0-10k".to_string()],
                data: vec![4.0],
            },
        );
        charts.update(
            &mut handle,
            &ChartData::Categorical {
                labels: vec!["0-10k".to_string(), "10-20k".to_string()],
                data: vec![4.0, 9.0],
            },
        );

        assert_eq!(handle.points, 2);
        assert_eq!(charts.drawn, 2);
    }
}
