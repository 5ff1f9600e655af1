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

//! Radar animation scheduling.
//!
//! [`Animation`] is the pure per-tick state machine: hide every frame, show
//! the current one if the overlay is active, advance with wrap-around.
//! [`AnimationScheduler`] drives it from a single tokio interval task that
//! can be started and stopped any number of times.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::frames::FrameSet;
use crate::overlay::{OverlayId, OverlayProbe};
use crate::state::SharedRadarState;

/// Default time between ticks.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(500);

/// Default opacity of the visible frame.
pub const DEFAULT_DISPLAY_OPACITY: f32 = 0.7;

/// Animation position over a frame set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Animation {
    index: usize,
}

impl Animation {
    /// Index the next tick will show.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Keep the index inside `[0, len)` after the frame set changed size.
    pub fn wrap_to(&mut self, len: usize) {
        self.index = if len == 0 { 0 } else { self.index % len };
    }

    /// Run one tick over `frames`.
    ///
    /// An empty frame set makes the tick a no-op. Returns the index made
    /// visible, which is `None` when the overlay is inactive.
    pub fn tick(
        &mut self,
        frames: &mut FrameSet,
        overlay_active: bool,
        display_opacity: f32,
    ) -> Option<usize> {
        let len = frames.len();
        if len == 0 {
            return None;
        }
        self.wrap_to(len);

        frames.hide_all();
        let current = self.index;
        let shown = overlay_active.then(|| {
            frames.set_opacity(current, display_opacity);
            current
        });

        self.index = (current + 1) % len;
        shown
    }
}

/// Timing and display settings for the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    /// Time between ticks.
    pub frame_interval: Duration,
    /// Opacity applied to the visible frame.
    pub display_opacity: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            display_opacity: DEFAULT_DISPLAY_OPACITY,
        }
    }
}

struct Timer {
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

/// Drives [`Animation`] ticks on a fixed interval.
///
/// At most one timer task exists at a time. `start` and `stop` must be
/// called from within a tokio runtime.
pub struct AnimationScheduler {
    state: SharedRadarState,
    probe: Arc<dyn OverlayProbe>,
    overlay: OverlayId,
    config: AnimationConfig,
    timer: Option<Timer>,
}

impl std::fmt::Debug for AnimationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationScheduler")
            .field("overlay", &self.overlay)
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl AnimationScheduler {
    /// Create a stopped scheduler for `overlay`.
    ///
    /// `probe` answers whether the overlay is currently shown on the map.
    #[must_use]
    pub fn new(
        state: SharedRadarState,
        probe: Arc<dyn OverlayProbe>,
        overlay: OverlayId,
        config: AnimationConfig,
    ) -> Self {
        Self {
            state,
            probe,
            overlay,
            config,
            timer: None,
        }
    }

    #[must_use]
    pub fn overlay(&self) -> &OverlayId {
        &self.overlay
    }

    #[must_use]
    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Start the animation from the first frame.
    ///
    /// A running timer is cancelled first, so there is never more than one.
    pub fn start(&mut self) {
        self.stop();
        self.state.lock().reset_animation();

        let cancel_token = CancellationToken::new();
        let task = tokio::spawn(run_timer(
            self.state.clone(),
            Arc::clone(&self.probe),
            self.overlay.clone(),
            self.config.clone(),
            cancel_token.clone(),
        ));

        info!(
            "Radar animation started for '{}' ({} ms per frame)",
            self.overlay,
            self.config.frame_interval.as_millis()
        );
        self.timer = Some(Timer { cancel_token, task });
    }

    /// Stop the animation. No tick runs after this returns.
    pub fn stop(&mut self) {
        let Some(timer) = self.timer.take() else {
            return;
        };

        // Cancelling under the state lock orders us against any tick in flight.
        let guard = self.state.lock();
        timer.cancel_token.cancel();
        drop(guard);
        timer.task.abort();

        info!("Radar animation stopped for '{}'", self.overlay);
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel_token.cancel();
            timer.task.abort();
        }
    }
}

async fn run_timer(
    state: SharedRadarState,
    probe: Arc<dyn OverlayProbe>,
    overlay: OverlayId,
    config: AnimationConfig,
    cancel_token: CancellationToken,
) {
    let period = config.frame_interval;
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            () = cancel_token.cancelled() => return,
        }

        let overlay_active = probe.is_active(&overlay);
        if !tick_once(&state, &cancel_token, overlay_active, config.display_opacity) {
            return;
        }
    }
}

/// Apply one tick unless the timer was cancelled. Returns `false` once cancelled.
fn tick_once(
    state: &SharedRadarState,
    cancel_token: &CancellationToken,
    overlay_active: bool,
    display_opacity: f32,
) -> bool {
    let mut state = state.lock();
    if cancel_token.is_cancelled() {
        return false;
    }
    if let Some(index) = state.tick(overlay_active, display_opacity) {
        debug!("Radar frame {} visible", index);
    }
    true
}
