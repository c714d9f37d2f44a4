// Rep Tracker Core - repetition counting from a tracked marker's position
// Debounced hysteresis detection over one optional reading per video frame

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod session;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{
    DetectorConfig, DetectorState, DetectorStatus, MarkerFrame, MarkerObservation, Phase,
    RepDetector, TrackedSignal, UpdateResult,
};
pub use config::AppConfig;
pub use error::{ConfigError, ErrorCode};
pub use session::{RepEvent, RepSession, SessionReadout};
