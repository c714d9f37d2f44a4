// Analysis module - per-frame repetition detection
//
// Pipeline: MarkerFrame -> signal_for(tracked id) -> RepDetector::update()
// -> UpdateResult for presentation and alerting.

pub mod detector;
pub mod signal;
pub mod status;

pub use detector::{DetectorConfig, DetectorState, RepDetector, UpdateResult};
pub use signal::{MarkerFrame, MarkerObservation, TrackedSignal};
pub use status::{DetectorStatus, Phase};
