// Text readout for presentation collaborators
//
// Mirrors the three labels and the frame overlay of the live view so a
// front end can render them without knowing detector internals.

use serde::{Deserialize, Serialize};

use crate::analysis::UpdateResult;

/// Label shown in place of a value before the first processed frame
const PLACEHOLDER: &str = "-";

/// Overlay text while the session is paused
pub const PAUSED_OVERLAY: &str = "PAUSED";

/// Human-readable labels for the current session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReadout {
    /// "Reps: N"
    pub reps_label: String,
    /// "State: high|low|-"
    pub state_label: String,
    /// "Status: <status text>|-"
    pub status_label: String,
    /// "IDs: [..]" while running, "PAUSED" while paused
    pub overlay_label: String,
}

impl Default for SessionReadout {
    fn default() -> Self {
        Self {
            reps_label: "Reps: 0".to_string(),
            state_label: format!("State: {}", PLACEHOLDER),
            status_label: format!("Status: {}", PLACEHOLDER),
            overlay_label: String::new(),
        }
    }
}

impl SessionReadout {
    /// Refresh all labels from a processed frame
    pub fn apply(&mut self, result: &UpdateResult, visible_ids: &[u32]) {
        self.reps_label = format!("Reps: {}", result.repetition_count);
        self.state_label = format!("State: {}", result.phase);
        self.status_label = format!("Status: {}", result.status_text);
        self.overlay_label = format!("IDs: {:?}", visible_ids);
    }

    /// Keep the last labels but mark the view as paused
    pub fn mark_paused(&mut self) {
        self.overlay_label = PAUSED_OVERLAY.to_string();
    }
}
