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

//! Tracked-entity state and map reconciliation.
//!
//! The [`Reconciler`] diffs each snapshot against the set of aircraft it
//! already tracks and drives a [`MapSurface`] accordingly: new aircraft get a
//! marker and a single-point trail, known aircraft have their trail extended
//! and marker moved, and aircraft missing from the snapshot are removed.
//! Marker labels are derived purely from the latest record.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use log::debug;

use crate::telemetry::{LatLon, Snapshot, TelemetryRecord};

/// Default number of past positions kept per aircraft.
pub const DEFAULT_TRAIL_CAPACITY: usize = 90;

/// Placeholder for fields the feed did not report.
pub const NOT_AVAILABLE: &str = "N/A";

/// Bounded FIFO of past positions.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<LatLon>,
    capacity: usize,
}

impl Trail {
    /// Create an empty trail. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a position, evicting the oldest one past capacity.
    pub fn push(&mut self, point: LatLon) {
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-first iterator over the trail.
    pub fn iter(&self) -> impl Iterator<Item = &LatLon> {
        self.points.iter()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<LatLon> {
        self.points.iter().copied().collect()
    }
}

/// One aircraft currently on the map.
#[derive(Debug, Clone)]
pub struct TrackedEntity {
    /// Latest record received for this aircraft.
    pub record: TelemetryRecord,
    pub trail: Trail,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl TrackedEntity {
    fn new(record: TelemetryRecord, trail_capacity: usize) -> Self {
        let mut trail = Trail::new(trail_capacity);
        trail.push(record.position);
        let now = Utc::now();

        Self {
            record,
            trail,
            first_seen: now,
            last_updated: now,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.record.hex
    }
}

/// Visual label for a marker, derived from the latest record.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcon {
    /// Icon rotation in degrees.
    pub rotation: f64,
    pub flight: String,
    pub route: String,
    /// Altitude band and speed, e.g. `FL350 | 450kt`.
    pub data: String,
    /// Hover text: display name and aircraft type.
    pub tooltip: String,
}

impl MarkerIcon {
    #[must_use]
    pub fn for_record(record: &TelemetryRecord) -> Self {
        let name = record.display_name();
        let tooltip = match record.aircraft_type.as_deref() {
            Some(kind) => format!("{name} {kind}"),
            None => name.to_string(),
        };

        Self {
            rotation: record.heading.unwrap_or(0.0),
            flight: name.to_string(),
            route: record
                .route
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            data: format!(
                "{} | {}",
                flight_level(record.altitude),
                speed_badge(record.ground_speed)
            ),
            tooltip,
        }
    }
}

/// Altitude band in hundreds of feet, e.g. `FL350`.
#[must_use]
#[allow(clippy::cast_possible_truncation, reason = "altitudes are far below i64 range")]
pub fn flight_level(altitude: Option<f64>) -> String {
    match altitude {
        Some(alt) => format!("FL{}", (alt / 100.0).round() as i64),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation, reason = "ground speeds are far below i64 range")]
fn speed_badge(speed: Option<f64>) -> String {
    match speed {
        Some(s) => format!("{}kt", s.round() as i64),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Map operations the reconciler and mode controller need.
///
/// Implemented by whatever renders the map; the engine never touches tiles
/// or drawing directly.
pub trait MapSurface {
    fn add_marker(&mut self, id: &str, position: LatLon, icon: &MarkerIcon);
    fn update_marker(&mut self, id: &str, position: LatLon, icon: &MarkerIcon);
    fn remove_marker(&mut self, id: &str);

    fn add_trail(&mut self, id: &str, points: &[LatLon]);
    fn update_trail(&mut self, id: &str, points: &[LatLon]);
    fn remove_trail(&mut self, id: &str);

    /// Animate the view to a center and zoom.
    fn fly_to(&mut self, center: LatLon, zoom: f64);
    /// Enable or disable drag and scroll-wheel zoom.
    fn set_interactive(&mut self, enabled: bool);
    /// Recompute the map size after a layout change.
    fn invalidate_size(&mut self);
    /// Replace the base tile layer; `None` removes it.
    fn set_base_layer(&mut self, url_template: Option<&str>);
}

/// What changed during one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

/// Keeps the tracked-entity set and the map in step with the latest snapshot.
pub struct Reconciler {
    entities: HashMap<String, TrackedEntity>,
    trail_capacity: usize,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("entity_count", &self.entities.len())
            .field("trail_capacity", &self.trail_capacity)
            .finish()
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_CAPACITY)
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(trail_capacity: usize) -> Self {
        Self {
            entities: HashMap::new(),
            trail_capacity,
        }
    }

    /// Apply a snapshot: create, update, and remove entities and their map objects.
    pub fn reconcile<M>(&mut self, snapshot: &Snapshot, map: &mut M) -> ReconcileReport
    where
        M: MapSurface + ?Sized,
    {
        let mut report = ReconcileReport::default();
        let mut seen = HashSet::with_capacity(snapshot.len());

        for record in &snapshot.entities {
            seen.insert(record.hex.as_str());
            let icon = MarkerIcon::for_record(record);

            if let Some(entity) = self.entities.get_mut(&record.hex) {
                entity.trail.push(record.position);
                entity.record = record.clone();
                entity.last_updated = Utc::now();

                map.update_marker(&record.hex, record.position, &icon);
                map.update_trail(&record.hex, &entity.trail.to_vec());
                report.updated.push(record.hex.clone());
            } else {
                let entity = TrackedEntity::new(record.clone(), self.trail_capacity);

                map.add_marker(&record.hex, record.position, &icon);
                map.add_trail(&record.hex, &entity.trail.to_vec());
                self.entities.insert(record.hex.clone(), entity);
                report.added.push(record.hex.clone());
            }
        }

        let removed: Vec<String> = self
            .entities
            .keys()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();

        for id in removed {
            self.entities.remove(&id);
            map.remove_marker(&id);
            map.remove_trail(&id);
            report.removed.push(id);
        }

        debug!(
            "[tracker] snapshot {}: {} added, {} updated, {} removed",
            snapshot.sequence,
            report.added.len(),
            report.updated.len(),
            report.removed.len()
        );

        report
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TrackedEntity> {
        self.entities.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Tracked id matching `id` ignoring ASCII case.
    #[must_use]
    pub fn resolve_id(&self, id: &str) -> Option<&str> {
        if let Some((tracked, _)) = self.entities.get_key_value(id) {
            return Some(tracked);
        }
        self.entities
            .keys()
            .find(|tracked| tracked.eq_ignore_ascii_case(id))
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn trail_capacity(&self) -> usize {
        self.trail_capacity
    }
}
