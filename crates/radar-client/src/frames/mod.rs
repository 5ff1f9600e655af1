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

//! Radar frames and the ordered frame set produced by one fetch.
//!
//! A frame is a single time-stamped radar snapshot, rendered as a tile layer
//! whose opacity is driven by the animation scheduler. Frames are kept in
//! arrival order, which is ascending timestamp for the RainViewer feed.

use serde::Deserialize;

/// Default tile host for RainViewer radar tiles.
pub const DEFAULT_TILE_HOST: &str = "https://tilecache.rainviewer.com";

/// One entry of the upstream `radar.past` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrameDescriptor {
    /// Epoch seconds of the snapshot.
    pub time: i64,
    /// Path segment, e.g. `/v2/radar/1700000000`.
    pub path: String,
}

/// Rendering options baked into each frame's tile template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileOptions {
    /// Tile host, without a trailing slash.
    pub host: String,
    /// Tile edge length in pixels (256 or 512).
    pub tile_size: u32,
    /// RainViewer color scheme number.
    pub color_scheme: u8,
    /// Smooth the radar image.
    pub smooth: bool,
    /// Render snow in a separate color.
    pub snow: bool,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_TILE_HOST.to_string(),
            tile_size: 256,
            color_scheme: 2,
            smooth: true,
            snow: true,
        }
    }
}

impl TileOptions {
    /// Build the `{z}/{x}/{y}` URL template for a frame path.
    #[must_use]
    pub fn template_for(&self, path: &str) -> String {
        format!(
            "{}{}/{}/{{z}}/{{x}}/{{y}}/{}/{}_{}.png",
            self.host.trim_end_matches('/'),
            path,
            self.tile_size,
            self.color_scheme,
            u8::from(self.smooth),
            u8::from(self.snow)
        )
    }
}

/// A single radar snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarFrame {
    path: String,
    timestamp: i64,
    tile_template: String,
    opacity: f32,
}

impl RadarFrame {
    /// Create a hidden frame from an upstream descriptor.
    #[must_use]
    pub fn new(descriptor: FrameDescriptor, options: &TileOptions) -> Self {
        let tile_template = options.template_for(&descriptor.path);
        Self {
            path: descriptor.path,
            timestamp: descriptor.time,
            tile_template,
            opacity: 0.0,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Snapshot time, also used as the frame's stacking order.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[must_use]
    pub fn tile_template(&self) -> &str {
        &self.tile_template
    }

    /// Resolve the template for a concrete tile.
    #[must_use]
    pub fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        self.tile_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }

    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set the frame opacity, clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Ordered frames from a single successful fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSet {
    frames: Vec<RadarFrame>,
}

impl FrameSet {
    /// An empty set, used before the first fetch completes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from descriptors, preserving their order.
    pub fn from_descriptors<I>(descriptors: I, options: &TileOptions) -> Self
    where
        I: IntoIterator<Item = FrameDescriptor>,
    {
        Self {
            frames: descriptors
                .into_iter()
                .map(|d| RadarFrame::new(d, options))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RadarFrame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RadarFrame> {
        self.frames.iter()
    }

    /// Hide every frame.
    pub fn hide_all(&mut self) {
        for frame in &mut self.frames {
            frame.set_opacity(0.0);
        }
    }

    /// Set one frame's opacity. Returns `false` if the index is out of range.
    pub fn set_opacity(&mut self, index: usize, opacity: f32) -> bool {
        match self.frames.get_mut(index) {
            Some(frame) => {
                frame.set_opacity(opacity);
                true
            }
            None => false,
        }
    }

    /// Number of frames with non-zero opacity.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_visible()).count()
    }

    /// Index of the first visible frame, if any.
    #[must_use]
    pub fn visible_index(&self) -> Option<usize> {
        self.frames.iter().position(RadarFrame::is_visible)
    }
}

impl<'a> IntoIterator for &'a FrameSet {
    type Item = &'a RadarFrame;
    type IntoIter = std::slice::Iter<'a, RadarFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
