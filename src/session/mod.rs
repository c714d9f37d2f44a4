// Session controller - drives one RepDetector from a stream of marker frames
//
// The session is the live control loop around the detector:
// - pause/resume (frames are still counted but not analysed while paused)
// - reset of the rep count
// - validated live threshold tuning
// - rep events broadcast to alerting collaborators (sound, UI flash)
// - telemetry and a text readout for presentation
//
// Everything is driven synchronously from the caller's frame loop; the
// broadcast channels only fan results out.

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::analysis::{MarkerFrame, RepDetector, UpdateResult};
use crate::config::AppConfig;
use crate::error::{log_config_error, ConfigError};
use crate::telemetry::{MetricEvent, TelemetryCollector, TelemetrySnapshot};

pub mod readout;

pub use readout::SessionReadout;

/// A completed repetition, published once per Low -> High transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepEvent {
    pub repetition_count: u32,
    pub frame_index: u64,
    /// Frame time derived from the configured fps
    pub timestamp_ms: u64,
    /// Reading on the completing frame
    pub depth: f64,
}

/// Live repetition counting session
#[derive(Debug)]
pub struct RepSession {
    tracked_marker_id: u32,
    fps: u32,
    detector: RepDetector,
    running: bool,
    next_frame_index: u64,
    missing_streak: u32,
    readout: SessionReadout,
    rep_tx: broadcast::Sender<RepEvent>,
    telemetry: TelemetryCollector,
}

impl RepSession {
    /// Create a running session from a validated configuration
    ///
    /// # Errors
    /// Returns `ConfigError` if the detector thresholds/debounce or the
    /// session frame rate are invalid.
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let detector = RepDetector::new(config.tracking.detector.clone())?;
        let (rep_tx, _) = broadcast::channel(config.session.event_buffer.max(1));

        tracing::info!(
            tracked_marker_id = config.tracking.tracked_marker_id,
            top_threshold = config.tracking.detector.top_threshold,
            bottom_threshold = config.tracking.detector.bottom_threshold,
            min_frames_below = config.tracking.detector.min_frames_below,
            "[RepSession] created"
        );

        Ok(Self {
            tracked_marker_id: config.tracking.tracked_marker_id,
            fps: config.session.fps,
            detector,
            running: true,
            next_frame_index: 0,
            missing_streak: 0,
            readout: SessionReadout::default(),
            rep_tx,
            telemetry: TelemetryCollector::new(
                config.session.telemetry_buffer,
                config.session.telemetry_history,
            ),
        })
    }

    /// Process one frame from the signal source
    ///
    /// # Returns
    /// * `Some(UpdateResult)` - the detector ran on this frame
    /// * `None` - the session is paused; detector state is untouched
    pub fn process_frame(&mut self, frame: &MarkerFrame) -> Option<UpdateResult> {
        let frame_index = self.next_frame_index;
        self.next_frame_index += 1;

        if !self.running {
            return None;
        }

        let signal = frame.signal_for(self.tracked_marker_id);
        self.track_signal_presence(signal.is_some(), frame_index);

        let previous_phase = self.detector.phase();
        let result = self.detector.update(signal);

        if result.phase != previous_phase {
            self.telemetry.publish(MetricEvent::PhaseChanged {
                from: previous_phase,
                to: result.phase,
                frame_index,
            });
        }

        if let (true, Some(depth)) = (result.event_fired, result.depth) {
            let event = RepEvent {
                repetition_count: result.repetition_count,
                frame_index,
                timestamp_ms: frame_index * 1000 / u64::from(self.fps),
                depth,
            };
            tracing::info!(
                repetition_count = event.repetition_count,
                frame_index,
                depth,
                "[RepSession] repetition completed"
            );
            self.telemetry.publish(MetricEvent::RepCompleted {
                repetition_count: event.repetition_count,
                frame_index,
                depth,
            });
            // Alerting is best effort; no subscriber is fine
            let _ = self.rep_tx.send(event);
        }

        self.readout.apply(&result, &frame.visible_ids());
        Some(result)
    }

    fn track_signal_presence(&mut self, present: bool, frame_index: u64) {
        match (present, self.missing_streak) {
            (false, 0) => {
                tracing::debug!(frame_index, "[RepSession] tracked marker lost");
                self.telemetry.publish(MetricEvent::SignalLost { frame_index });
                self.missing_streak = 1;
            }
            (false, _) => self.missing_streak = self.missing_streak.saturating_add(1),
            (true, 0) => {}
            (true, missing_frames) => {
                tracing::debug!(
                    frame_index,
                    missing_frames,
                    "[RepSession] tracked marker recovered"
                );
                self.telemetry.publish(MetricEvent::SignalRecovered {
                    frame_index,
                    missing_frames,
                });
                self.missing_streak = 0;
            }
        }
    }

    pub fn pause(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.readout.mark_paused();
        tracing::info!(frame_index = self.next_frame_index, "[RepSession] paused");
        self.telemetry.publish(MetricEvent::SessionPaused {
            frame_index: self.next_frame_index,
        });
    }

    pub fn resume(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        tracing::info!(frame_index = self.next_frame_index, "[RepSession] resumed");
        self.telemetry.publish(MetricEvent::SessionResumed {
            frame_index: self.next_frame_index,
        });
    }

    /// Flip between running and paused, returning the new running state
    pub fn toggle_running(&mut self) -> bool {
        if self.running {
            self.pause();
        } else {
            self.resume();
        }
        self.running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Clear the rep count and return the detector to `High`
    pub fn reset(&mut self) {
        let previous_count = self.detector.repetition_count();
        self.detector.reset();
        self.readout = SessionReadout::default();
        if !self.running {
            self.readout.mark_paused();
        }
        tracing::info!(previous_count, "[RepSession] reset");
        self.telemetry.publish(MetricEvent::SessionReset {
            frame_index: self.next_frame_index,
            previous_count,
        });
    }

    /// Replace both thresholds; on error the previous values stay active
    pub fn tune_thresholds(&mut self, top: f64, bottom: f64) -> Result<(), ConfigError> {
        if let Err(err) = self.detector.set_thresholds(top, bottom) {
            log_config_error(&err, "RepSession::tune_thresholds");
            return Err(err);
        }
        tracing::info!(top, bottom, "[RepSession] thresholds tuned");
        self.telemetry.publish(MetricEvent::ThresholdsTuned {
            top_threshold: top,
            bottom_threshold: bottom,
        });
        Ok(())
    }

    pub fn set_top_threshold(&mut self, top: f64) -> Result<(), ConfigError> {
        let bottom = self.detector.config().bottom_threshold;
        self.tune_thresholds(top, bottom)
    }

    pub fn set_bottom_threshold(&mut self, bottom: f64) -> Result<(), ConfigError> {
        let top = self.detector.config().top_threshold;
        self.tune_thresholds(top, bottom)
    }

    pub fn set_min_frames_below(&mut self, frames: u32) -> Result<(), ConfigError> {
        self.detector.set_min_frames_below(frames).map_err(|err| {
            log_config_error(&err, "RepSession::set_min_frames_below");
            err
        })
    }

    /// Whether absent frames report the marker as missing or ignored
    pub fn set_require_signal(&mut self, require: bool) {
        self.detector.set_require_signal(require);
        tracing::info!(require, "[RepSession] require_signal changed");
    }

    /// Receiver for rep events (e.g. to trigger a sound)
    pub fn subscribe_reps(&self) -> broadcast::Receiver<RepEvent> {
        self.rep_tx.subscribe()
    }

    /// Async stream of rep events; lagged items are skipped
    pub fn rep_stream(&self) -> impl Stream<Item = RepEvent> {
        BroadcastStream::new(self.rep_tx.subscribe()).filter_map(|item| item.ok())
    }

    pub fn subscribe_telemetry(&self) -> broadcast::Receiver<MetricEvent> {
        self.telemetry.subscribe()
    }

    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    pub fn readout(&self) -> &SessionReadout {
        &self.readout
    }

    pub fn detector(&self) -> &RepDetector {
        &self.detector
    }

    pub fn repetition_count(&self) -> u32 {
        self.detector.repetition_count()
    }

    pub fn tracked_marker_id(&self) -> u32 {
        self.tracked_marker_id
    }

    /// Number of frames offered so far, including paused ones
    pub fn frames_seen(&self) -> u64 {
        self.next_frame_index
    }
}
