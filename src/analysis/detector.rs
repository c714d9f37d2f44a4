// RepDetector - debounced hysteresis state machine for repetition counting
//
// Converts one optional scalar reading per frame into a phase, a cumulative
// repetition count and a per-frame event flag.
//
// Zones (image coordinates, larger value = lower position):
// - value <= top_threshold     -> high zone (standing)
// - value >= bottom_threshold  -> low zone (deep enough)
//
// Only the High -> Low edge is debounced. The Low -> High edge fires on the
// first qualifying frame and is the edge that counts the repetition.

use serde::{Deserialize, Serialize};

use crate::analysis::signal::TrackedSignal;
use crate::analysis::status::{DetectorStatus, Phase};
use crate::error::ConfigError;

/// Detector tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Value at or below which the tracked point is in the high zone
    pub top_threshold: f64,
    /// Value at or above which the tracked point is in the low zone
    pub bottom_threshold: f64,
    /// Consecutive low-zone frames required before entering `Low`
    pub min_frames_below: u32,
    /// Whether a missing reading is reported as missing or as ignored
    pub require_signal: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            top_threshold: 200.0,
            bottom_threshold: 350.0,
            min_frames_below: 2,
            require_signal: true,
        }
    }
}

impl DetectorConfig {
    /// Validate the two-zone model
    ///
    /// # Returns
    /// * `Ok(())` - thresholds are finite, ordered, and debounce is at least 1
    /// * `Err(ConfigError)` - first violated rule
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_frames_below < 1 {
            return Err(ConfigError::InvalidDebounce {
                value: self.min_frames_below,
            });
        }
        validate_thresholds(self.top_threshold, self.bottom_threshold)
    }
}

fn validate_thresholds(top: f64, bottom: f64) -> Result<(), ConfigError> {
    if !top.is_finite() {
        return Err(ConfigError::NonFiniteThreshold {
            name: "top_threshold",
            value: top,
        });
    }
    if !bottom.is_finite() {
        return Err(ConfigError::NonFiniteThreshold {
            name: "bottom_threshold",
            value: bottom,
        });
    }
    if bottom <= top {
        return Err(ConfigError::InvertedThresholds { top, bottom });
    }
    Ok(())
}

/// Mutable detector memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetectorState {
    pub phase: Phase,
    pub repetition_count: u32,
    /// Consecutive low-zone frames seen while in `High`
    pub debounce_counter: u32,
}

/// Result emitted for every frame, including frames without a reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub repetition_count: u32,
    /// True only on the frame that completes a repetition
    pub event_fired: bool,
    /// Echo of the input reading, `None` when absent
    pub depth: Option<f64>,
    pub phase: Phase,
    pub status: DetectorStatus,
    /// UI-facing text for `status`; never parsed
    pub status_text: String,
}

/// Repetition detector
///
/// Owns its configuration and state exclusively. All mutation goes through
/// `&mut self`, so tuning calls are serialized with `update()` by the borrow
/// checker rather than by a lock.
#[derive(Debug, Clone)]
pub struct RepDetector {
    config: DetectorConfig,
    state: DetectorState,
}

impl RepDetector {
    /// Create a detector in the initial `High` state
    ///
    /// # Errors
    /// Returns `ConfigError` if `min_frames_below` is 0 or the thresholds are
    /// non-finite or not strictly ordered (`bottom > top`).
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: DetectorState::default(),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn repetition_count(&self) -> u32 {
        self.state.repetition_count
    }

    /// Process one frame
    ///
    /// Total over its input: an absent reading or any float (NaN included)
    /// yields a result. NaN fails both zone comparisons.
    pub fn update(&mut self, signal: Option<TrackedSignal>) -> UpdateResult {
        let Some(signal) = signal else {
            let status = if self.config.require_signal {
                DetectorStatus::SignalMissing
            } else {
                DetectorStatus::SignalIgnored
            };
            return self.result(false, None, status);
        };

        let value = signal.value;
        let (event_fired, status) = match self.state.phase {
            Phase::High => {
                if value >= self.config.bottom_threshold {
                    self.state.debounce_counter += 1;
                } else {
                    self.state.debounce_counter = 0;
                }

                if self.state.debounce_counter >= self.config.min_frames_below {
                    self.state.phase = Phase::Low;
                    self.state.debounce_counter = 0;
                    tracing::debug!(
                        depth = value,
                        bottom_threshold = self.config.bottom_threshold,
                        "[RepDetector] high -> low"
                    );
                    (false, DetectorStatus::ReachedDepth)
                } else {
                    (false, DetectorStatus::Descending)
                }
            }
            Phase::Low => {
                if value <= self.config.top_threshold {
                    self.state.phase = Phase::High;
                    self.state.repetition_count += 1;
                    tracing::debug!(
                        depth = value,
                        repetition_count = self.state.repetition_count,
                        "[RepDetector] low -> high"
                    );
                    (true, DetectorStatus::RepCompleted)
                } else {
                    (false, DetectorStatus::Ascending)
                }
            }
        };

        self.result(event_fired, Some(value), status)
    }

    /// Return to `High` with counters cleared; configuration is kept
    pub fn reset(&mut self) {
        self.state = DetectorState::default();
    }

    /// Replace both thresholds at once
    ///
    /// Use this when moving both zones so that an intermediate
    /// (top, bottom) pair never has to be valid on its own.
    pub fn set_thresholds(&mut self, top: f64, bottom: f64) -> Result<(), ConfigError> {
        validate_thresholds(top, bottom)?;
        self.config.top_threshold = top;
        self.config.bottom_threshold = bottom;
        Ok(())
    }

    pub fn set_top_threshold(&mut self, top: f64) -> Result<(), ConfigError> {
        self.set_thresholds(top, self.config.bottom_threshold)
    }

    pub fn set_bottom_threshold(&mut self, bottom: f64) -> Result<(), ConfigError> {
        self.set_thresholds(self.config.top_threshold, bottom)
    }

    /// Change the debounce length
    ///
    /// Progress already accumulated in `debounce_counter` is kept; a shorter
    /// length takes effect on the next low-zone frame.
    pub fn set_min_frames_below(&mut self, frames: u32) -> Result<(), ConfigError> {
        if frames < 1 {
            return Err(ConfigError::InvalidDebounce { value: frames });
        }
        self.config.min_frames_below = frames;
        Ok(())
    }

    pub fn set_require_signal(&mut self, require: bool) {
        self.config.require_signal = require;
    }

    fn result(
        &self,
        event_fired: bool,
        depth: Option<f64>,
        status: DetectorStatus,
    ) -> UpdateResult {
        UpdateResult {
            repetition_count: self.state.repetition_count,
            event_fired,
            depth,
            phase: self.state.phase,
            status,
            status_text: status.display_text().to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
