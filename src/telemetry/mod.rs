//! Session telemetry collector.
//!
//! The collector keeps a bounded history of [`MetricEvent`]s for snapshots
//! and fans every event out over a broadcast channel for live subscribers.
//! It is owned by a single session; there is no process-wide hub.

use std::collections::VecDeque;

use tokio::sync::broadcast;

pub mod events;

pub use events::MetricEvent;

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of metrics.
#[derive(Debug)]
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: VecDeque<MetricEvent>,
    history_capacity: usize,
    total_events: u64,
    dropped_history: u64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
            total_events: 0,
            dropped_history: 0,
        }
    }

    pub fn publish(&mut self, event: MetricEvent) {
        self.total_events += 1;
        if self.history_capacity == 0 {
            self.dropped_history += 1;
        } else {
            if self.history.len() == self.history_capacity {
                self.history.pop_front();
                self.dropped_history += 1;
            }
            self.history.push_back(event.clone());
        }

        // No subscribers is not an error
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            recent: self.history.iter().cloned().collect(),
            total_events: self.total_events,
            dropped_events: self.dropped_history,
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 128)
    }
}
