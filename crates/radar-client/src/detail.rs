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

//! Sidebar view models.
//!
//! Flight details are rebuilt from the latest record on every poll cycle;
//! project details come from a fixed registry and never change.

use crate::telemetry::TelemetryRecord;
use crate::tracker::NOT_AVAILABLE;

pub const FLIGHT_SIDEBAR_TITLE: &str = "LIVE FLIGHT TELEMETRY";
pub const PROJECT_SIDEBAR_TITLE: &str = "PROJECT ARCHITECTURE";

fn value(v: Option<f64>, unit: &str) -> String {
    v.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v}{unit}"))
}

fn text(v: Option<&str>) -> String {
    v.unwrap_or(NOT_AVAILABLE).to_string()
}

/// Rendered content of the flight-detail sidebar.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightDetail {
    pub hex: String,
    pub callsign: String,
    pub registration: String,
    pub route: String,
    pub aircraft_type: String,
    pub altitude: String,
    pub ground_speed: String,
    pub heading: String,
    pub vertical_rate: String,
    pub latitude: String,
    pub longitude: String,
    pub squawk: String,
    pub wind_speed: String,
    pub air_temperature: String,
    pub barometer: String,
    pub footer: String,
}

impl FlightDetail {
    #[must_use]
    pub fn from_record(record: &TelemetryRecord) -> Self {
        Self {
            hex: record.hex.clone(),
            callsign: text(record.flight_identifier()),
            registration: text(record.registration.as_deref()),
            route: text(record.route.as_deref()),
            aircraft_type: text(record.aircraft_type.as_deref()),
            altitude: value(record.altitude, " ft"),
            ground_speed: value(record.ground_speed, " kts"),
            heading: value(record.heading, "°"),
            vertical_rate: value(record.vertical_rate, " fpm"),
            latitude: value(Some(record.position.lat), ""),
            longitude: value(Some(record.position.lon), ""),
            squawk: text(record.squawk.as_deref()),
            wind_speed: value(record.ambient.wind_speed, " kts"),
            air_temperature: value(record.ambient.temperature, "°C"),
            barometer: value(record.ambient.barometer, " hPa"),
            footer: format!(
                "HEX: {} | MSG AGE: {}s",
                record.hex,
                record.message_age.unwrap_or(0.0)
            ),
        }
    }
}

/// Static description of a showcased project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub key: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
    pub specs: &'static [(&'static str, &'static str)],
    pub link: Option<&'static str>,
}

pub static PROJECTS: &[Project] = &[
    Project {
        key: "adsb",
        title: "RF & IoT Sensor Networks",
        subtitle: "Station ID: CustardLev | Bengaluru",
        description: "Distributed ADS-B receiver network feeding live telemetry into the dashboard.",
        specs: &[("Host", "Raspberry Pi 2B"), ("Radio", "RTL-SDR V3")],
        link: Some("https://planes.custardlev.uk"),
    },
    Project {
        key: "telemetry",
        title: "Enterprise Telemetry Pipeline",
        subtitle: "Data Engineering",
        description: "Centralized pipeline orchestrating ingest and aggregation jobs.",
        specs: &[("Orchestrator", "Airflow")],
        link: None,
    },
    Project {
        key: "cloud",
        title: "Private Cloud Cluster",
        subtitle: "Homelab",
        description: "Proxmox cluster running Kubernetes workloads.",
        specs: &[("Orchestrator", "K3s")],
        link: None,
    },
];

/// Look up a project by key.
#[must_use]
pub fn lookup_project(key: &str) -> Option<&'static Project> {
    PROJECTS.iter().find(|p| p.key == key)
}

/// Whatever the sidebar currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarContent {
    Flight(FlightDetail),
    Project(&'static Project),
}

impl SidebarContent {
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            SidebarContent::Flight(_) => FLIGHT_SIDEBAR_TITLE,
            SidebarContent::Project(_) => PROJECT_SIDEBAR_TITLE,
        }
    }

    /// External link shown in the sidebar footer, if any.
    #[must_use]
    pub fn link(&self) -> Option<&'static str> {
        match self {
            SidebarContent::Flight(_) => None,
            SidebarContent::Project(project) => project.link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::record;

    #[test]
    fn test_missing_fields_render_placeholder() {
        let detail = FlightDetail::from_record(&record("ABC123", 12.9, 77.6));
        assert_eq!(detail.callsign, "N/A");
        assert_eq!(detail.registration, "N/A");
        assert_eq!(detail.altitude, "N/A");
        assert_eq!(detail.barometer, "N/A");
        assert_eq!(detail.latitude, "12.9");
        assert_eq!(detail.footer, "HEX: ABC123 | MSG AGE: 0s");
    }

    #[test]
    fn test_present_fields_carry_units() {
        let mut r = record("ABC123", 12.9, 77.6);
        r.flight_number = Some("AI101".to_string());
        r.callsign = Some("AIC101".to_string());
        r.altitude = Some(35000.0);
        r.ground_speed = Some(450.0);
        r.heading = Some(90.5);
        r.ambient.temperature = Some(-42.0);
        r.message_age = Some(1.5);

        let detail = FlightDetail::from_record(&r);
        assert_eq!(detail.callsign, "AI101");
        assert_eq!(detail.altitude, "35000 ft");
        assert_eq!(detail.ground_speed, "450 kts");
        assert_eq!(detail.heading, "90.5°");
        assert_eq!(detail.air_temperature, "-42°C");
        assert_eq!(detail.footer, "HEX: ABC123 | MSG AGE: 1.5s");
    }

    #[test]
    fn test_project_registry() {
        let adsb = lookup_project("adsb").unwrap();
        assert_eq!(adsb.link, Some("https://planes.custardlev.uk"));
        assert_eq!(SidebarContent::Project(adsb).title(), "PROJECT ARCHITECTURE");
        assert!(lookup_project("cloud").unwrap().link.is_none());
        assert!(lookup_project("unknown").is_none());
    }
}
