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

//! Live summary statistics derived from the current snapshot.
//!
//! Nothing here is persisted; every figure is recomputed from scratch each
//! poll cycle. Degenerate inputs fall back to placeholders instead of failing.
//! The message rate and bandwidth are synthetic display figures scaled from
//! the aircraft count, not measurements.

use crate::telemetry::TelemetryRecord;

/// Synthetic messages per second attributed to each tracked aircraft.
pub const SYNTHETIC_MESSAGES_PER_AIRCRAFT: f64 = 1.8;
/// Synthetic kilobytes carried by each message.
pub const SYNTHETIC_KB_PER_MESSAGE: f64 = 0.12;
/// Shown when no aircraft reports a usable callsign prefix.
pub const NO_PREFIX_PLACEHOLDER: &str = "N/A";

const PREFIX_LEN: usize = 3;

/// Feed health as shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Online,
    Waiting,
}

impl FeedStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedStatus::Online => "ONLINE",
            FeedStatus::Waiting => "WAITING",
        }
    }
}

/// Estimated, not measured, network figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticRates {
    pub messages_per_sec: f64,
    pub bandwidth_kb_per_sec: f64,
}

impl SyntheticRates {
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "aircraft counts are small")]
    pub fn for_count(plane_count: usize) -> Self {
        let messages_per_sec = plane_count as f64 * SYNTHETIC_MESSAGES_PER_AIRCRAFT;
        Self {
            messages_per_sec,
            bandwidth_kb_per_sec: messages_per_sec * SYNTHETIC_KB_PER_MESSAGE,
        }
    }
}

/// Summary of one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub plane_count: usize,
    pub status: FeedStatus,
    /// Mean altitude in feet over aircraft reporting a positive altitude.
    pub average_altitude: f64,
    /// Mean of integer ground speeds in knots over aircraft reporting a positive speed.
    pub average_speed: f64,
    /// Most common three-letter airline prefix.
    pub dominant_prefix: Option<String>,
    pub synthetic: SyntheticRates,
}

impl Default for Insights {
    fn default() -> Self {
        Self::from_records(&[])
    }
}

impl Insights {
    #[must_use]
    pub fn from_records(records: &[TelemetryRecord]) -> Self {
        let plane_count = records.len();

        Self {
            plane_count,
            status: if plane_count > 0 {
                FeedStatus::Online
            } else {
                FeedStatus::Waiting
            },
            average_altitude: positive_mean(records.iter().filter_map(|r| r.altitude)),
            average_speed: positive_mean(
                records
                    .iter()
                    .filter_map(|r| r.ground_speed)
                    .map(f64::trunc),
            ),
            dominant_prefix: dominant_prefix(records),
            synthetic: SyntheticRates::for_count(plane_count),
        }
    }

    #[must_use]
    pub fn dominant_prefix_display(&self) -> &str {
        self.dominant_prefix.as_deref().unwrap_or(NO_PREFIX_PLACEHOLDER)
    }

    #[must_use]
    pub fn altitude_display(&self) -> String {
        format!("{:.0} ft", self.average_altitude.round())
    }

    #[must_use]
    pub fn speed_display(&self) -> String {
        format!("{:.0} kts", self.average_speed.round())
    }

    #[must_use]
    pub fn message_rate_display(&self) -> String {
        format!("{:.1} msg/s", self.synthetic.messages_per_sec)
    }

    #[must_use]
    pub fn bandwidth_display(&self) -> String {
        format!("{:.2} KB/s", self.synthetic.bandwidth_kb_per_sec)
    }
}

#[allow(clippy::cast_precision_loss, reason = "sample counts are small")]
fn positive_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| *v > 0.0)
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn callsign_prefix(identifier: &str) -> Option<String> {
    let prefix: String = identifier.chars().take(PREFIX_LEN).collect();
    (prefix.chars().count() == PREFIX_LEN && prefix.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| prefix.to_ascii_uppercase())
}

/// Most frequent prefix; ties go to the prefix seen first.
fn dominant_prefix(records: &[TelemetryRecord]) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for prefix in records
        .iter()
        .filter_map(TelemetryRecord::flight_identifier)
        .filter_map(callsign_prefix)
    {
        match counts.iter_mut().find(|(p, _)| *p == prefix) {
            Some((_, count)) => *count += 1,
            None => counts.push((prefix, 1)),
        }
    }

    let mut best: Option<(String, usize)> = None;
    for (prefix, count) in counts {
        if best.as_ref().map_or(true, |(_, top)| count > *top) {
            best = Some((prefix, count));
        }
    }
    best.map(|(prefix, _)| prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::record;

    fn with_callsign(hex: &str, callsign: &str) -> TelemetryRecord {
        let mut r = record(hex, 12.9, 77.6);
        r.callsign = Some(callsign.to_string());
        r
    }

    #[test]
    fn test_single_aircraft_snapshot() {
        let mut r = record("ABC123", 12.9, 77.6);
        r.altitude = Some(35000.0);
        r.ground_speed = Some(450.0);

        let insights = Insights::from_records(&[r]);
        assert_eq!(insights.plane_count, 1);
        assert_eq!(insights.status.as_str(), "ONLINE");
        assert_eq!(insights.average_altitude, 35000.0);
        assert_eq!(insights.average_speed, 450.0);
    }

    #[test]
    fn test_empty_snapshot_uses_placeholders() {
        let insights = Insights::from_records(&[]);
        assert_eq!(insights.plane_count, 0);
        assert_eq!(insights.status, FeedStatus::Waiting);
        assert_eq!(insights.average_altitude, 0.0);
        assert_eq!(insights.average_speed, 0.0);
        assert!(!insights.average_speed.is_nan());
        assert_eq!(insights.dominant_prefix_display(), "N/A");
        assert_eq!(insights.message_rate_display(), "0.0 msg/s");
    }

    #[test]
    fn test_averages_skip_missing_and_non_positive_values() {
        let mut a = record("A", 0.0, 0.0);
        a.altitude = Some(30000.0);
        a.ground_speed = Some(400.9);
        let mut b = record("B", 0.0, 0.0);
        b.altitude = Some(0.0);
        b.ground_speed = Some(501.2);
        let c = record("C", 0.0, 0.0);

        let insights = Insights::from_records(&[a, b, c]);
        assert_eq!(insights.average_altitude, 30000.0);
        // 400 and 501 after integer coercion
        assert_eq!(insights.average_speed, 450.5);
    }

    #[test]
    fn test_dominant_prefix() {
        let records = [
            with_callsign("1", "AIC101"),
            with_callsign("2", "AIC202"),
            with_callsign("3", "IGO303"),
        ];
        assert_eq!(
            Insights::from_records(&records).dominant_prefix.as_deref(),
            Some("AIC")
        );
    }

    #[test]
    fn test_dominant_prefix_tie_goes_to_first_seen() {
        let records = [with_callsign("1", "IGO303"), with_callsign("2", "AIC101")];
        assert_eq!(
            Insights::from_records(&records).dominant_prefix.as_deref(),
            Some("IGO")
        );
    }

    #[test]
    fn test_dominant_prefix_ignores_non_alphabetic_prefixes() {
        let records = [with_callsign("1", "VT-ABC"), with_callsign("2", "6E1"), with_callsign("3", "AI")];
        assert_eq!(Insights::from_records(&records).dominant_prefix, None);
    }

    #[test]
    fn test_synthetic_rates_scale_with_count() {
        let rates = SyntheticRates::for_count(10);
        assert!((rates.messages_per_sec - 18.0).abs() < 1e-9);
        assert!((rates.bandwidth_kb_per_sec - 2.16).abs() < 1e-9);
    }
}
