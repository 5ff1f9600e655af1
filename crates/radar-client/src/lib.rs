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

//! Animated rain radar for map overlays.
//!
//! This library fetches time-stamped radar frames and cycles their
//! visibility while the radar overlay is shown on a host map. It is split
//! into layers that can be used independently:
//!
//! - **Frames**: the ordered [`FrameSet`] produced by one metadata fetch
//! - **Fetch**: the [`FrameFetcher`] for the RainViewer metadata endpoint
//! - **Scheduler**: the per-tick [`Animation`] and the timer-driven
//!   [`AnimationScheduler`]
//! - **Overlay**: the [`RadarOverlay`] lifecycle controller reacting to
//!   [`MapEvent`]s from the host map
//!
//! All mutable radar data sits in one [`SharedRadarState`] handle that is
//! passed to each layer explicitly.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use radar_client::{
//!     spawn_initial_fetch, AnimationConfig, AnimationScheduler, FetchConfig, FrameFetcher,
//!     LayerGroup, MapEvent, OverlayId, OverlayProbe, RadarOverlay, SharedRadarState,
//! };
//!
//! struct AlwaysShown;
//!
//! impl OverlayProbe for AlwaysShown {
//!     fn is_active(&self, _overlay: &OverlayId) -> bool {
//!         true
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = SharedRadarState::new();
//!     let fetcher = FrameFetcher::new(FetchConfig::default()).unwrap();
//!     spawn_initial_fetch(fetcher, state.clone());
//!
//!     let radar = OverlayId::new("radar");
//!     let scheduler = AnimationScheduler::new(
//!         state.clone(),
//!         Arc::new(AlwaysShown),
//!         radar.clone(),
//!         AnimationConfig::default(),
//!     );
//!     let mut overlay = RadarOverlay::new(scheduler, state, LayerGroup::new());
//!
//!     overlay.handle_event(&MapEvent::OverlayAdded(radar.clone()));
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!     overlay.handle_event(&MapEvent::OverlayRemoved(radar));
//! }
//! ```

pub mod fetch;
pub mod frames;
pub mod overlay;
pub mod scheduler;
pub mod state;

pub use fetch::{
    apply_fetch_result, load_frames, parse_frames, spawn_initial_fetch, FetchConfig, FetchError,
    FrameFetcher,
};
pub use frames::{FrameDescriptor, FrameSet, RadarFrame, TileOptions};
pub use overlay::{
    LayerGroup, MapEvent, OverlayId, OverlayProbe, OverlayState, RadarOverlay, RenderGroup,
};
pub use scheduler::{Animation, AnimationConfig, AnimationScheduler};
pub use state::{RadarState, SharedRadarState};
