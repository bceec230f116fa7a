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

//! Theme preference and base-map tile sources.

use std::time::Duration;

/// Carto dark basemap, `{s}` is the a-d subdomain.
pub const DARK_TILE_TEMPLATE: &str = "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png";
/// Carto light basemap.
pub const LIGHT_TILE_TEMPLATE: &str =
    "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png";

/// Pause between removing the old base layer and installing the new one.
pub const LAYER_SWAP_DELAY: Duration = Duration::from_millis(10);

/// Dashboard colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Parse a stored preference. Unrecognized values yield `None`.
    #[must_use]
    pub fn from_stored(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    /// Resolve an optional stored preference, falling back to the default.
    #[must_use]
    pub fn resolve(stored: Option<&str>) -> Self {
        stored.and_then(Self::from_stored).unwrap_or_default()
    }

    /// Value written to the preference store.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    #[must_use]
    pub fn tile_template(&self) -> &'static str {
        match self {
            Theme::Dark => DARK_TILE_TEMPLATE,
            Theme::Light => LIGHT_TILE_TEMPLATE,
        }
    }

    /// Concrete URL for one tile, load-balanced across subdomains a-d.
    #[must_use]
    pub fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        let subdomain = ['a', 'b', 'c', 'd'][((x + y) % 4) as usize];

        self.tile_template()
            .replace("{s}", &subdomain.to_string())
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}
