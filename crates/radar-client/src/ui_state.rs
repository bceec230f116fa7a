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

//! UI mode state machine.
//!
//! Tracks tactical mode, the detail sidebar, and the modal overlay as one
//! value so that coupling rules are enforced in one place:
//!
//! - tactical mode and an open sidebar are mutually exclusive
//! - at most one modal is open at a time
//! - modal state is independent of sidebar state
//!
//! Transitions do not touch the map or the network. They return the
//! [`UiEffect`]s the caller must carry out. Re-applying a transition that is
//! already in effect is a no-op and returns no effects.

use crate::telemetry::LatLon;

pub const ENTER_TACTICAL_LABEL: &str = "ENTER TACTICAL MODE";
pub const EXIT_TACTICAL_LABEL: &str = "EXIT TACTICAL MODE";

/// Which detail sidebar is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sidebar {
    /// Live flight details for a tracked hex id.
    Flight(String),
    /// Static project details by registry key.
    Project(&'static str),
}

/// Which modal overlay is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Analytics,
    Traffic,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEffect {
    FlyTo { center: LatLon, zoom: f64 },
    SetMapInteractive(bool),
    InvalidateMapSize,
    /// Fetch or refresh the analytics charts.
    LoadCharts,
    /// Start the traffic-counter poll loop. Emitted once per session.
    StartTrafficFeed,
    /// Point the embedded video element at the stream.
    AttachVideoStream,
    /// Clear the embedded video source so the stream stops downloading.
    DetachVideoStream,
}

/// Map view restored when leaving tactical mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomeView {
    pub center: LatLon,
    pub zoom: f64,
}

impl Default for HomeView {
    fn default() -> Self {
        Self {
            center: LatLon::new(12.98, 77.6),
            zoom: 8.4,
        }
    }
}

/// Process-wide UI state.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    tactical: bool,
    sidebar: Option<Sidebar>,
    modal: Option<Modal>,
    scroll_locked: bool,
    traffic_feed_started: bool,
    home: HomeView,
}

impl UiState {
    #[must_use]
    pub fn new(home: HomeView) -> Self {
        Self {
            home,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn tactical_active(&self) -> bool {
        self.tactical
    }

    #[must_use]
    pub fn sidebar(&self) -> Option<&Sidebar> {
        self.sidebar.as_ref()
    }

    /// Hex id shown in the flight sidebar, if it is open.
    #[must_use]
    pub fn selected_entity(&self) -> Option<&str> {
        match &self.sidebar {
            Some(Sidebar::Flight(id)) => Some(id.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn modal(&self) -> Option<Modal> {
        self.modal
    }

    #[must_use]
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    #[must_use]
    pub fn home(&self) -> HomeView {
        self.home
    }

    #[must_use]
    pub fn tactical_button_label(&self) -> &'static str {
        if self.tactical {
            EXIT_TACTICAL_LABEL
        } else {
            ENTER_TACTICAL_LABEL
        }
    }

    /// Expand the map to the full viewport. Closes any open sidebar.
    pub fn enter_tactical(&mut self) -> Vec<UiEffect> {
        if self.tactical {
            return Vec::new();
        }

        self.close_sidebar();
        self.tactical = true;

        vec![
            UiEffect::InvalidateMapSize,
            UiEffect::SetMapInteractive(true),
            UiEffect::FlyTo {
                center: self.home.center,
                zoom: self.home.zoom,
            },
        ]
    }

    /// Leave tactical mode and fly back to the home view.
    pub fn exit_tactical(&mut self) -> Vec<UiEffect> {
        if !self.tactical {
            return Vec::new();
        }

        self.tactical = false;

        vec![
            UiEffect::SetMapInteractive(false),
            UiEffect::FlyTo {
                center: self.home.center,
                zoom: self.home.zoom,
            },
        ]
    }

    pub fn toggle_tactical(&mut self) -> Vec<UiEffect> {
        if self.tactical {
            self.exit_tactical()
        } else {
            self.enter_tactical()
        }
    }

    /// Open the flight sidebar for `id`, forcing tactical mode off.
    pub fn open_flight_sidebar(&mut self, id: &str) -> Vec<UiEffect> {
        self.open_sidebar(Sidebar::Flight(id.to_string()))
    }

    /// Open the project sidebar for a registry key, forcing tactical mode off.
    pub fn open_project_sidebar(&mut self, key: &'static str) -> Vec<UiEffect> {
        self.open_sidebar(Sidebar::Project(key))
    }

    fn open_sidebar(&mut self, sidebar: Sidebar) -> Vec<UiEffect> {
        let effects = self.exit_tactical();
        self.scroll_locked = true;
        self.sidebar = Some(sidebar);
        effects
    }

    /// Close the sidebar and unlock page scroll.
    pub fn close_sidebar(&mut self) {
        self.sidebar = None;
        self.scroll_locked = false;
    }

    /// Close the flight sidebar if it shows `id`. Returns whether it did.
    pub fn entity_removed(&mut self, id: &str) -> bool {
        if self.selected_entity() == Some(id) {
            self.close_sidebar();
            true
        } else {
            false
        }
    }

    pub fn open_analytics(&mut self) -> Vec<UiEffect> {
        if self.modal == Some(Modal::Analytics) {
            return Vec::new();
        }

        let mut effects = self.close_modal();
        self.modal = Some(Modal::Analytics);
        effects.push(UiEffect::LoadCharts);
        effects
    }

    pub fn close_analytics(&mut self) -> Vec<UiEffect> {
        if self.modal == Some(Modal::Analytics) {
            self.close_modal()
        } else {
            Vec::new()
        }
    }

    pub fn open_traffic(&mut self) -> Vec<UiEffect> {
        if self.modal == Some(Modal::Traffic) {
            return Vec::new();
        }

        let mut effects = self.close_modal();
        self.modal = Some(Modal::Traffic);

        if !self.traffic_feed_started {
            self.traffic_feed_started = true;
            effects.push(UiEffect::StartTrafficFeed);
        }
        effects.push(UiEffect::AttachVideoStream);
        effects
    }

    pub fn close_traffic(&mut self) -> Vec<UiEffect> {
        if self.modal == Some(Modal::Traffic) {
            self.close_modal()
        } else {
            Vec::new()
        }
    }

    fn close_modal(&mut self) -> Vec<UiEffect> {
        match self.modal.take() {
            Some(Modal::Traffic) => vec![UiEffect::DetachVideoStream],
            Some(Modal::Analytics) | None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exclusive(state: &UiState) {
        assert!(
            !(state.tactical_active() && state.sidebar().is_some()),
            "tactical mode and sidebar open at the same time"
        );
    }

    #[test]
    fn test_flight_sidebar_forces_tactical_off() {
        let mut state = UiState::default();
        state.enter_tactical();
        assert!(state.tactical_active());

        let effects = state.open_flight_sidebar("ABC123");
        assert!(!state.tactical_active());
        assert!(effects.contains(&UiEffect::SetMapInteractive(false)));
        assert_eq!(state.selected_entity(), Some("ABC123"));
        assert!(state.scroll_locked());
        assert_exclusive(&state);
    }

    #[test]
    fn test_tactical_closes_open_sidebar() {
        let mut state = UiState::default();
        state.open_flight_sidebar("ABC123");

        let effects = state.enter_tactical();
        assert!(state.tactical_active());
        assert_eq!(state.selected_entity(), None);
        assert!(!state.scroll_locked());
        assert!(effects.contains(&UiEffect::SetMapInteractive(true)));
        assert_exclusive(&state);
    }

    #[test]
    fn test_project_sidebar_also_exits_tactical() {
        let mut state = UiState::default();
        state.enter_tactical();
        state.open_project_sidebar("adsb");
        assert!(!state.tactical_active());
        assert_eq!(state.sidebar(), Some(&Sidebar::Project("adsb")));
        assert_eq!(state.selected_entity(), None);
    }

    #[test]
    fn test_exit_tactical_flies_home() {
        let mut state = UiState::default();
        state.enter_tactical();
        let effects = state.exit_tactical();
        assert_eq!(
            effects.last(),
            Some(&UiEffect::FlyTo {
                center: LatLon::new(12.98, 77.6),
                zoom: 8.4
            })
        );
        assert_eq!(state.tactical_button_label(), ENTER_TACTICAL_LABEL);
    }

    #[test]
    fn test_repeated_transitions_are_noops() {
        let mut state = UiState::default();
        state.close_sidebar();
        state.close_sidebar();
        assert!(state.exit_tactical().is_empty());
        assert!(state.close_analytics().is_empty());
        assert!(state.close_traffic().is_empty());

        assert!(!state.enter_tactical().is_empty());
        assert!(state.enter_tactical().is_empty());
        assert_eq!(state.tactical_button_label(), EXIT_TACTICAL_LABEL);
    }

    #[test]
    fn test_entity_removed_only_clears_matching_selection() {
        let mut state = UiState::default();
        state.open_flight_sidebar("ABC123");
        assert!(!state.entity_removed("DEF456"));
        assert_eq!(state.selected_entity(), Some("ABC123"));
        assert!(state.entity_removed("ABC123"));
        assert_eq!(state.selected_entity(), None);
    }

    #[test]
    fn test_modals_are_exclusive_and_independent_of_sidebar() {
        let mut state = UiState::default();
        state.open_flight_sidebar("ABC123");

        assert_eq!(state.open_analytics(), vec![UiEffect::LoadCharts]);
        assert_eq!(state.modal(), Some(Modal::Analytics));

        let effects = state.open_traffic();
        assert_eq!(state.modal(), Some(Modal::Traffic));
        assert!(effects.contains(&UiEffect::AttachVideoStream));
        assert_eq!(state.selected_entity(), Some("ABC123"));

        assert_eq!(
            state.open_analytics(),
            vec![UiEffect::DetachVideoStream, UiEffect::LoadCharts]
        );
    }

    #[test]
    fn test_traffic_feed_starts_once() {
        let mut state = UiState::default();
        assert_eq!(
            state.open_traffic(),
            vec![UiEffect::StartTrafficFeed, UiEffect::AttachVideoStream]
        );
        assert_eq!(state.close_traffic(), vec![UiEffect::DetachVideoStream]);
        assert_eq!(state.open_traffic(), vec![UiEffect::AttachVideoStream]);
    }
}
