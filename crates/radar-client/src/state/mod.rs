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

//! Shared radar state.
//!
//! The frame set and the animation position live behind a single mutex.
//! The fetcher replaces the frame set, the scheduler's ticks mutate frame
//! opacity, and the overlay controller reads frames to attach them. Keeping
//! all three behind one lock is what lets `stop()` guarantee that no tick
//! lands after it returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::frames::FrameSet;
use crate::scheduler::Animation;

/// Frame set plus animation position.
#[derive(Debug, Default)]
pub struct RadarState {
    frames: FrameSet,
    animation: Animation,
}

impl RadarState {
    #[must_use]
    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    /// Index of the frame the next tick will show.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.animation.index()
    }

    /// Replace the frame set wholesale with a new fetch result.
    pub fn replace_frames(&mut self, frames: FrameSet) {
        self.frames = frames;
        self.animation.wrap_to(self.frames.len());
    }

    /// Advance the animation by one tick.
    ///
    /// Returns the index that was made visible, if any.
    pub fn tick(&mut self, overlay_active: bool, display_opacity: f32) -> Option<usize> {
        self.animation
            .tick(&mut self.frames, overlay_active, display_opacity)
    }

    pub(crate) fn reset_animation(&mut self) {
        self.animation.reset();
    }
}

/// Cloneable handle to the radar state.
#[derive(Debug, Clone, Default)]
pub struct SharedRadarState {
    inner: Arc<Mutex<RadarState>>,
}

impl SharedRadarState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state. A poisoned lock is recovered; ticks never leave the
    /// state half-written.
    pub fn lock(&self) -> MutexGuard<'_, RadarState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn replace_frames(&self, frames: FrameSet) {
        self.lock().replace_frames(frames);
    }

    /// Copy of the current frame set.
    #[must_use]
    pub fn frames(&self) -> FrameSet {
        self.lock().frames().clone()
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.lock().frames().len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.lock().current_index()
    }
}
