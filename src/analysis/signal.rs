//! Inbound signal types.
//!
//! The marker detector reports every marker it sees in a frame. The rep
//! detector only ever receives the one reading it tracks, or nothing.
//! `MarkerFrame::signal_for` is the lookup that sits between the two.

use serde::{Deserialize, Serialize};

/// A single scalar reading for one cycle.
///
/// In the marker pipeline this is the vertical pixel coordinate of the
/// tracked marker's centre, so larger values mean lower positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedSignal {
    pub value: f64,
}

impl TrackedSignal {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl From<f64> for TrackedSignal {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// One detected marker in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservation {
    pub id: u32,
    /// Pixel centre as `[x, y]`.
    pub center: [f64; 2],
}

impl MarkerObservation {
    pub fn new(id: u32, x: f64, y: f64) -> Self {
        Self { id, center: [x, y] }
    }

    pub fn y(&self) -> f64 {
        self.center[1]
    }
}

/// All markers detected in one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerFrame {
    #[serde(default)]
    pub markers: Vec<MarkerObservation>,
}

impl MarkerFrame {
    pub fn new(markers: Vec<MarkerObservation>) -> Self {
        Self { markers }
    }

    /// Frame in which nothing was detected.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reading for `id`, or `None` when the marker was not seen.
    ///
    /// If a detector reports the same id twice, the last observation wins.
    pub fn signal_for(&self, id: u32) -> Option<TrackedSignal> {
        self.markers
            .iter()
            .rfind(|marker| marker.id == id)
            .map(|marker| TrackedSignal::new(marker.y()))
    }

    /// Ids visible in this frame, each once, in first-seen order.
    pub fn visible_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = Vec::with_capacity(self.markers.len());
        for marker in &self.markers {
            if !ids.contains(&marker.id) {
                ids.push(marker.id);
            }
        }
        ids
    }
}
