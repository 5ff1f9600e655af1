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

//! Radar frame metadata fetching.
//!
//! Retrieves the RainViewer `weather-maps.json` document and turns its
//! `radar.past` list into a [`FrameSet`]. A failed fetch is logged and leaves
//! the previously loaded frames in place; it is never retried.

use std::time::Duration;

use log::{error, info};
use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::frames::{FrameDescriptor, FrameSet, TileOptions};
use crate::state::SharedRadarState;

/// Public RainViewer metadata endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.rainviewer.com/public/weather-maps.json";

/// Errors that can occur while fetching frame metadata.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed frame metadata: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct WeatherMaps {
    radar: RadarSection,
}

#[derive(Debug, Deserialize)]
struct RadarSection {
    past: Vec<FrameDescriptor>,
}

/// Parse a `weather-maps.json` body into a frame set.
pub fn parse_frames(body: &[u8], options: &TileOptions) -> Result<FrameSet, FetchError> {
    let maps: WeatherMaps = serde_json::from_slice(body)?;
    Ok(FrameSet::from_descriptors(maps.radar.past, options))
}

/// Configuration for the frame fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Metadata endpoint URL.
    pub endpoint: String,
    /// Tile options applied to every frame.
    pub tiles: TileOptions,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            tiles: TileOptions::default(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// HTTP client for the radar metadata endpoint.
#[derive(Debug, Clone)]
pub struct FrameFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl FrameFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch the current list of past radar frames.
    pub async fn fetch(&self) -> Result<FrameSet, FetchError> {
        let response = self.client.get(&self.config.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_frames(&body, &self.config.tiles)
    }
}

/// Store a fetch result. Failures are logged and leave the state untouched.
///
/// Returns `true` if new frames were stored.
pub fn apply_fetch_result(result: Result<FrameSet, FetchError>, state: &SharedRadarState) -> bool {
    match result {
        Ok(frames) => {
            info!("Loaded {} radar frames", frames.len());
            state.replace_frames(frames);
            true
        }
        Err(e) => {
            error!("Failed to load radar frames: {}", e);
            false
        }
    }
}

/// Fetch frames once and store them.
pub async fn load_frames(fetcher: &FrameFetcher, state: &SharedRadarState) -> bool {
    apply_fetch_result(fetcher.fetch().await, state)
}

/// Start the one-shot startup fetch in the background.
pub fn spawn_initial_fetch(fetcher: FrameFetcher, state: SharedRadarState) -> JoinHandle<bool> {
    tokio::spawn(async move { load_frames(&fetcher, &state).await })
}
