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

//! Live telemetry normalization.
//!
//! The backend reports `{ "aircraft": { "<hex>": { ... } } }`. Each record is
//! decoded leniently: numeric fields accept numbers or numeric strings, and a
//! value that cannot be read is treated as absent rather than failing the
//! whole snapshot. Records without a usable latitude and longitude are dropped.

pub mod poller;

pub use poller::{Poller, PollerConfig};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ApiError;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Environmental readings reported alongside a position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ambient {
    /// Outside air temperature in degrees Celsius.
    pub temperature: Option<f64>,
    /// Wind speed in knots.
    pub wind_speed: Option<f64>,
    /// Barometric pressure in hPa.
    pub barometer: Option<f64>,
}

/// One aircraft as reported by a single live snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Hex identifier, the stable key for the aircraft.
    pub hex: String,
    pub position: LatLon,
    /// Track angle in degrees (0-360, north = 0).
    pub heading: Option<f64>,
    /// Ground speed in knots.
    pub ground_speed: Option<f64>,
    /// Altitude in feet.
    pub altitude: Option<f64>,
    /// Vertical rate in feet per minute.
    pub vertical_rate: Option<f64>,
    pub squawk: Option<String>,
    pub callsign: Option<String>,
    pub flight_number: Option<String>,
    pub registration: Option<String>,
    pub route: Option<String>,
    pub aircraft_type: Option<String>,
    pub ambient: Ambient,
    /// Seconds since the receiver last heard from the aircraft.
    pub message_age: Option<f64>,
}

impl TelemetryRecord {
    /// Flight number if known, otherwise the callsign.
    #[must_use]
    pub fn flight_identifier(&self) -> Option<&str> {
        self.flight_number.as_deref().or(self.callsign.as_deref())
    }

    /// Name shown on the map: flight identifier, falling back to the hex id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.flight_identifier().unwrap_or(&self.hex)
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default, deserialize_with = "lenient_f64")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    heading: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    vert_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    squawk: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    callsign: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    flightno: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    reg: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    route: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    aircraft_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    oat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    barometer: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    age: Option<f64>,
}

impl RawRecord {
    fn into_record(self, hex: String) -> Option<TelemetryRecord> {
        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            return None;
        };

        Some(TelemetryRecord {
            hex,
            position: LatLon::new(lat, lon),
            heading: self.heading,
            ground_speed: self.speed,
            altitude: self.altitude,
            vertical_rate: self.vert_rate,
            squawk: self.squawk,
            callsign: self.callsign,
            flight_number: self.flightno,
            registration: self.reg,
            route: self.route,
            aircraft_type: self.aircraft_type,
            ambient: Ambient {
                temperature: self.oat,
                wind_speed: self.wind_speed,
                barometer: self.barometer,
            },
            message_age: self.age,
        })
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Decode a `/api/live` payload into position-bearing records ordered by hex id.
pub fn parse_live(payload: &Value) -> Result<Vec<TelemetryRecord>, ApiError> {
    let aircraft = payload
        .get("aircraft")
        .and_then(Value::as_object)
        .ok_or(ApiError::Malformed("aircraft"))?;

    // BTreeMap gives a stable, id-ordered snapshot regardless of payload order
    let mut records = BTreeMap::new();
    for (hex, raw) in aircraft {
        match RawRecord::deserialize(raw) {
            Ok(raw) => {
                if let Some(record) = raw.into_record(hex.clone()) {
                    records.insert(hex.clone(), record);
                }
            }
            Err(e) => debug!("[telemetry] skipping unreadable record {}: {}", hex, e),
        }
    }

    Ok(records.into_values().collect())
}

/// The full set of tracked aircraft reported at one poll instant.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Monotonic sequence number assigned when the request was issued.
    pub sequence: u64,
    pub received_at: DateTime<Utc>,
    pub entities: Vec<TelemetryRecord>,
}

impl Snapshot {
    #[must_use]
    pub fn new(sequence: u64, entities: Vec<TelemetryRecord>) -> Self {
        Self {
            sequence,
            received_at: Utc::now(),
            entities,
        }
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
    pub fn get(&self, hex: &str) -> Option<&TelemetryRecord> {
        self.entities.iter().find(|e| e.hex == hex)
    }
}

#[cfg(test)]
pub(crate) fn record(hex: &str, lat: f64, lon: f64) -> TelemetryRecord {
    TelemetryRecord {
        hex: hex.to_string(),
        position: LatLon::new(lat, lon),
        heading: None,
        ground_speed: None,
        altitude: None,
        vertical_rate: None,
        squawk: None,
        callsign: None,
        flight_number: None,
        registration: None,
        route: None,
        aircraft_type: None,
        ambient: Ambient::default(),
        message_age: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_live_drops_records_without_position() {
        let payload = json!({
            "aircraft": {
                "ABC123": { "lat": 12.9, "lon": 77.6, "altitude": 35000, "speed": 450 },
                "DEF456": { "lat": 13.1 },
                "0A0B0C": { "lon": 77.0, "callsign": "IGO303" }
            }
        });

        let records = parse_live(&payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hex, "ABC123");
        assert_eq!(records[0].position, LatLon::new(12.9, 77.6));
        assert_eq!(records[0].altitude, Some(35000.0));
        assert_eq!(records[0].ground_speed, Some(450.0));
    }

    #[test]
    fn test_parse_live_is_lenient_about_field_types() {
        let payload = json!({
            "aircraft": {
                "800ABC": {
                    "lat": "12.5",
                    "lon": 77.25,
                    "altitude": "ground",
                    "squawk": 7000,
                    "callsign": "  AIC101 ",
                    "reg": "",
                    "type": "A320",
                    "oat": -41.5
                }
            }
        });

        let records = parse_live(&payload).unwrap();
        let record = &records[0];
        assert_eq!(record.position.lat, 12.5);
        assert_eq!(record.altitude, None);
        assert_eq!(record.squawk.as_deref(), Some("7000"));
        assert_eq!(record.callsign.as_deref(), Some("AIC101"));
        assert_eq!(record.registration, None);
        assert_eq!(record.aircraft_type.as_deref(), Some("A320"));
        assert_eq!(record.ambient.temperature, Some(-41.5));
    }

    #[test]
    fn test_parse_live_orders_by_hex() {
        let payload = json!({
            "aircraft": {
                "C00003": { "lat": 1.0, "lon": 1.0 },
                "A00001": { "lat": 1.0, "lon": 1.0 },
                "B00002": { "lat": 1.0, "lon": 1.0 }
            }
        });

        let hexes: Vec<_> = parse_live(&payload)
            .unwrap()
            .into_iter()
            .map(|r| r.hex)
            .collect();
        assert_eq!(hexes, ["A00001", "B00002", "C00003"]);
    }

    #[test]
    fn test_parse_live_without_aircraft_is_malformed() {
        let err = parse_live(&json!({ "now": 1 })).unwrap_err();
        assert!(matches!(err, ApiError::Malformed("aircraft")));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut r = record("ABC123", 0.0, 0.0);
        assert_eq!(r.display_name(), "ABC123");
        r.callsign = Some("AIC101".to_string());
        assert_eq!(r.display_name(), "AIC101");
        r.flight_number = Some("AI101".to_string());
        assert_eq!(r.display_name(), "AI101");
    }
}
