//! Telemetry event types describing session activity exposed to CLI
//! reports and subscribers.

use serde::{Deserialize, Serialize};

use crate::analysis::Phase;

/// Session metric events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    PhaseChanged {
        from: Phase,
        to: Phase,
        frame_index: u64,
    },
    RepCompleted {
        repetition_count: u32,
        frame_index: u64,
        depth: f64,
    },
    /// First frame of a run without the tracked marker.
    SignalLost {
        frame_index: u64,
    },
    SignalRecovered {
        frame_index: u64,
        missing_frames: u32,
    },
    ThresholdsTuned {
        top_threshold: f64,
        bottom_threshold: f64,
    },
    SessionPaused {
        frame_index: u64,
    },
    SessionResumed {
        frame_index: u64,
    },
    SessionReset {
        frame_index: u64,
        previous_count: u32,
    },
}
