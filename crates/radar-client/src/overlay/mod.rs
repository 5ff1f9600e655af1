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

//! Radar overlay lifecycle.
//!
//! The host map announces overlays being toggled through [`MapEvent`]s.
//! [`RadarOverlay`] filters those to the radar overlay and moves between
//! [`OverlayState::Inactive`] and [`OverlayState::Active`]: on activation it
//! attaches every frame to the overlay's render group and starts the
//! scheduler, on deactivation it stops the scheduler and clears the group.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::frames::RadarFrame;
use crate::scheduler::AnimationScheduler;
use crate::state::SharedRadarState;

/// Identity of an overlay layer group on the host map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(String);

impl OverlayId {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Overlay toggle events emitted by the host map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    /// An overlay was switched on.
    OverlayAdded(OverlayId),
    /// An overlay was switched off.
    OverlayRemoved(OverlayId),
}

impl MapEvent {
    #[must_use]
    pub fn overlay(&self) -> &OverlayId {
        match self {
            Self::OverlayAdded(id) | Self::OverlayRemoved(id) => id,
        }
    }
}

/// Answers whether an overlay is currently displayed on the host map.
pub trait OverlayProbe: Send + Sync {
    fn is_active(&self, overlay: &OverlayId) -> bool;
}

/// The map's container for the layers of one overlay.
pub trait RenderGroup: Send {
    /// Attach a frame. Attaching the same frame twice keeps one copy.
    fn attach(&mut self, frame: &RadarFrame);

    /// Detach everything.
    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render group keyed by frame timestamp, stacked oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerGroup {
    layers: BTreeMap<i64, String>,
}

impl LayerGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, timestamp: i64) -> bool {
        self.layers.contains_key(&timestamp)
    }

    /// Attached layers as `(z-index, tile template)` in stacking order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.layers.iter().map(|(z, template)| (*z, template.as_str()))
    }
}

impl RenderGroup for LayerGroup {
    fn attach(&mut self, frame: &RadarFrame) {
        self.layers
            .insert(frame.timestamp(), frame.tile_template().to_string());
    }

    fn clear(&mut self) {
        self.layers.clear();
    }

    fn len(&self) -> usize {
        self.layers.len()
    }
}

/// Lifecycle state of the radar overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlayState {
    #[default]
    Inactive,
    Active,
}

/// Reacts to the radar overlay being toggled on the host map.
#[derive(Debug)]
pub struct RadarOverlay<G> {
    state: OverlayState,
    radar: SharedRadarState,
    scheduler: AnimationScheduler,
    group: G,
}

impl<G: RenderGroup> RadarOverlay<G> {
    /// Create an inactive controller for the scheduler's overlay.
    #[must_use]
    pub fn new(scheduler: AnimationScheduler, radar: SharedRadarState, group: G) -> Self {
        Self {
            state: OverlayState::Inactive,
            radar,
            scheduler,
            group,
        }
    }

    #[must_use]
    pub fn overlay(&self) -> &OverlayId {
        self.scheduler.overlay()
    }

    #[must_use]
    pub fn state(&self) -> OverlayState {
        self.state
    }

    #[must_use]
    pub fn group(&self) -> &G {
        &self.group
    }

    #[must_use]
    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    /// Apply one map event. Returns `true` if it concerned this overlay.
    pub fn handle_event(&mut self, event: &MapEvent) -> bool {
        if event.overlay() != self.scheduler.overlay() {
            return false;
        }

        match event {
            MapEvent::OverlayAdded(_) => self.on_added(),
            MapEvent::OverlayRemoved(_) => self.on_removed(),
        }
        true
    }

    fn on_added(&mut self) {
        let attached = self.attach_frames();

        if self.state == OverlayState::Active {
            debug!(
                "Duplicate add for '{}', {} frames attached, animation left running",
                self.overlay(),
                attached
            );
            return;
        }

        self.scheduler.start();
        self.state = OverlayState::Active;
        info!("Radar overlay '{}' active with {} frames", self.overlay(), attached);
    }

    fn on_removed(&mut self) {
        if self.state == OverlayState::Inactive {
            debug!("Ignoring remove for inactive overlay '{}'", self.overlay());
            return;
        }

        self.scheduler.stop();
        self.group.clear();
        self.state = OverlayState::Inactive;
        info!("Radar overlay '{}' inactive", self.overlay());
    }

    fn attach_frames(&mut self) -> usize {
        let radar = self.radar.lock();
        for frame in radar.frames() {
            self.group.attach(frame);
        }
        self.group.len()
    }

    /// Process events until the channel closes or `cancel_token` fires.
    ///
    /// The scheduler is stopped on exit and the controller handed back.
    pub async fn run(
        mut self,
        mut events: broadcast::Receiver<MapEvent>,
        cancel_token: CancellationToken,
    ) -> Self {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => {
                        self.handle_event(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Overlay controller lagged, {} map events skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
                () = cancel_token.cancelled() => break,
            }
        }

        self.scheduler.stop();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{FrameDescriptor, FrameSet, TileOptions};
    use crate::scheduler::{AnimationConfig, DEFAULT_FRAME_INTERVAL};
    use std::collections::HashSet;
    use std::sync::{Arc, RwLock};
    use std::time::Duration;

    /// Minimal host map: a set of active overlays.
    #[derive(Default)]
    struct TestMap(RwLock<HashSet<OverlayId>>);

    impl TestMap {
        fn set(&self, id: &OverlayId, active: bool) {
            let mut layers = self.0.write().unwrap();
            if active {
                layers.insert(id.clone());
            } else {
                layers.remove(id);
            }
        }
    }

    impl OverlayProbe for TestMap {
        fn is_active(&self, overlay: &OverlayId) -> bool {
            self.0.read().unwrap().contains(overlay)
        }
    }

    fn radar_id() -> OverlayId {
        OverlayId::new("radar")
    }

    fn frames(times: &[i64]) -> FrameSet {
        FrameSet::from_descriptors(
            times.iter().map(|&time| FrameDescriptor {
                time,
                path: format!("/v2/radar/{time}"),
            }),
            &TileOptions::default(),
        )
    }

    fn controller(radar: &SharedRadarState, map: &Arc<TestMap>) -> RadarOverlay<LayerGroup> {
        let scheduler = AnimationScheduler::new(
            radar.clone(),
            map.clone(),
            radar_id(),
            AnimationConfig::default(),
        );
        RadarOverlay::new(scheduler, radar.clone(), LayerGroup::new())
    }

    async fn next_tick() {
        tokio::time::sleep(DEFAULT_FRAME_INTERVAL + Duration::from_millis(1)).await;
    }

    #[test]
    fn test_layer_group_attach_is_idempotent() {
        let set = frames(&[300, 100, 200]);
        let mut group = LayerGroup::new();
        for frame in &set {
            group.attach(frame);
        }
        for frame in &set {
            group.attach(frame);
        }
        assert_eq!(group.len(), 3);
        let order: Vec<i64> = group.iter().map(|(z, _)| z).collect();
        assert_eq!(order, vec![100, 200, 300]);

        group.clear();
        assert!(group.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_overlays_ignored() {
        let radar = SharedRadarState::new();
        radar.replace_frames(frames(&[100, 200]));
        let map = Arc::new(TestMap::default());
        let mut overlay = controller(&radar, &map);

        assert!(!overlay.handle_event(&MapEvent::OverlayAdded(OverlayId::new("wind"))));
        assert_eq!(overlay.state(), OverlayState::Inactive);
        assert!(overlay.group().is_empty());
        assert!(!overlay.scheduler().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_attaches_and_animates() {
        let radar = SharedRadarState::new();
        radar.replace_frames(frames(&[100, 200, 300]));
        let map = Arc::new(TestMap::default());
        let mut overlay = controller(&radar, &map);

        map.set(&radar_id(), true);
        assert!(overlay.handle_event(&MapEvent::OverlayAdded(radar_id())));
        assert_eq!(overlay.state(), OverlayState::Active);
        assert_eq!(overlay.group().len(), 3);
        assert!(overlay.scheduler().is_running());

        next_tick().await;
        assert_eq!(radar.frames().visible_index(), Some(0));
        next_tick().await;
        assert_eq!(radar.frames().visible_index(), Some(1));

        map.set(&radar_id(), false);
        overlay.handle_event(&MapEvent::OverlayRemoved(radar_id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_stops_and_clears() {
        let radar = SharedRadarState::new();
        radar.replace_frames(frames(&[100, 200, 300]));
        let map = Arc::new(TestMap::default());
        let mut overlay = controller(&radar, &map);

        map.set(&radar_id(), true);
        overlay.handle_event(&MapEvent::OverlayAdded(radar_id()));
        next_tick().await;

        map.set(&radar_id(), false);
        overlay.handle_event(&MapEvent::OverlayRemoved(radar_id()));
        assert_eq!(overlay.state(), OverlayState::Inactive);
        assert!(!overlay.scheduler().is_running());
        assert!(overlay.group().is_empty());

        let index = radar.current_index();
        let snapshot = radar.frames();
        for _ in 0..4 {
            next_tick().await;
        }
        assert_eq!(radar.current_index(), index);
        assert_eq!(radar.frames(), snapshot);
        // Frame data survives deactivation.
        assert_eq!(radar.frame_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_frames_still_activates() {
        let radar = SharedRadarState::new();
        let map = Arc::new(TestMap::default());
        let mut overlay = controller(&radar, &map);

        map.set(&radar_id(), true);
        overlay.handle_event(&MapEvent::OverlayAdded(radar_id()));
        assert_eq!(overlay.state(), OverlayState::Active);
        assert!(overlay.scheduler().is_running());
        assert!(overlay.group().is_empty());

        for _ in 0..3 {
            next_tick().await;
        }
        assert!(radar.frames().is_empty());
        assert_eq!(radar.current_index(), 0);

        overlay.handle_event(&MapEvent::OverlayRemoved(radar_id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_add_keeps_single_copy_and_timer() {
        let radar = SharedRadarState::new();
        radar.replace_frames(frames(&[100, 200, 300, 400]));
        let map = Arc::new(TestMap::default());
        let mut overlay = controller(&radar, &map);

        map.set(&radar_id(), true);
        overlay.handle_event(&MapEvent::OverlayAdded(radar_id()));
        next_tick().await;
        overlay.handle_event(&MapEvent::OverlayAdded(radar_id()));

        assert_eq!(overlay.group().len(), 4);
        // The running cycle was not restarted.
        assert_eq!(radar.current_index(), 1);
        next_tick().await;
        assert_eq!(radar.current_index(), 2);

        overlay.handle_event(&MapEvent::OverlayRemoved(radar_id()));
        overlay.handle_event(&MapEvent::OverlayRemoved(radar_id()));
        assert_eq!(overlay.state(), OverlayState::Inactive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_processes_events_in_order() {
        let radar = SharedRadarState::new();
        radar.replace_frames(frames(&[100, 200]));
        let map = Arc::new(TestMap::default());
        let overlay = controller(&radar, &map);

        let (tx, rx) = broadcast::channel(16);
        let cancel_token = CancellationToken::new();
        let task = tokio::spawn(overlay.run(rx, cancel_token.clone()));

        map.set(&radar_id(), true);
        tx.send(MapEvent::OverlayAdded(radar_id())).unwrap();
        next_tick().await;
        assert_eq!(radar.frames().visible_index(), Some(0));

        map.set(&radar_id(), false);
        tx.send(MapEvent::OverlayRemoved(radar_id())).unwrap();
        tx.send(MapEvent::OverlayAdded(OverlayId::new("clouds"))).unwrap();
        tokio::task::yield_now().await;

        cancel_token.cancel();
        let overlay = task.await.unwrap();
        assert_eq!(overlay.state(), OverlayState::Inactive);
        assert!(overlay.group().is_empty());
        assert!(!overlay.scheduler().is_running());
    }
}
