// Phase and status types for the repetition detector
//
// Phase is the detector's qualitative zone. DetectorStatus is the typed
// reason behind each result's human-readable status text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative zone of the tracked signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Reference/start zone (standing)
    #[default]
    High,
    /// Target/turnaround zone (at depth)
    Low,
}

impl Phase {
    /// Get the label used in readouts and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::High => "high",
            Phase::Low => "low",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single detector cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorStatus {
    /// No reading this cycle and one was required
    SignalMissing,
    /// No reading this cycle and the detector was told to tolerate it
    SignalIgnored,
    /// In `High`, debounce for the descent not yet satisfied
    Descending,
    /// Transitioned `High -> Low` this cycle
    ReachedDepth,
    /// In `Low`, waiting for the signal to return to the top zone
    Ascending,
    /// Transitioned `Low -> High` this cycle and counted a repetition
    RepCompleted,
}

impl DetectorStatus {
    /// Get human-readable status text
    pub fn display_text(&self) -> &'static str {
        match self {
            DetectorStatus::SignalMissing => "tracked marker not detected",
            DetectorStatus::SignalIgnored => "no marker (ignored)",
            DetectorStatus::Descending => "above / descending",
            DetectorStatus::ReachedDepth => "reached depth",
            DetectorStatus::Ascending => "below / ascending",
            DetectorStatus::RepCompleted => "repetition completed",
        }
    }

    /// Whether this status reports an absent reading
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DetectorStatus::SignalMissing | DetectorStatus::SignalIgnored
        )
    }
}

impl fmt::Display for DetectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_default_is_high() {
        assert_eq!(Phase::default(), Phase::High);
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::High.to_string(), "high");
        assert_eq!(Phase::Low.to_string(), "low");
    }

    #[test]
    fn test_unavailable_statuses_are_distinct() {
        let all = [
            DetectorStatus::SignalMissing,
            DetectorStatus::SignalIgnored,
            DetectorStatus::Descending,
            DetectorStatus::ReachedDepth,
            DetectorStatus::Ascending,
            DetectorStatus::RepCompleted,
        ];
        let unavailable: Vec<_> = all.iter().filter(|s| s.is_unavailable()).collect();
        assert_eq!(unavailable.len(), 2);

        for status in all.iter().filter(|s| !s.is_unavailable()) {
            assert_ne!(
                status.display_text(),
                DetectorStatus::SignalMissing.display_text()
            );
            assert_ne!(
                status.display_text(),
                DetectorStatus::SignalIgnored.display_text()
            );
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&DetectorStatus::ReachedDepth).unwrap();
        assert_eq!(json, "\"reached_depth\"");
    }
}
