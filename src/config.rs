//! Configuration management for tracking and session parameters
//!
//! This module provides runtime configuration loading from JSON files so
//! thresholds can be recalibrated for a new camera position without
//! recompiling. Missing or malformed files fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::DetectorConfig;
use crate::error::ConfigError;

/// Environment variable that overrides the default config path
pub const CONFIG_PATH_ENV: &str = "REP_TRACKER_CONFIG";

/// Config path used when [`CONFIG_PATH_ENV`] is unset
pub const DEFAULT_CONFIG_PATH: &str = "config/rep_tracker.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Which marker drives the detector and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Marker id used as the depth proxy (e.g. the hip marker)
    #[serde(default)]
    pub tracked_marker_id: u32,
    #[serde(flatten)]
    pub detector: DetectorConfig,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tracked_marker_id: 0,
            detector: DetectorConfig::default(),
        }
    }
}

/// Session loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Frame rate of the signal source, used to timestamp rep events
    pub fps: u32,
    /// Capacity of the rep event broadcast channel
    pub event_buffer: usize,
    /// Number of telemetry events retained for snapshots
    pub telemetry_history: usize,
    /// Capacity of the telemetry broadcast channel
    pub telemetry_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            event_buffer: 64,
            telemetry_history: 128,
            telemetry_buffer: 256,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::InvalidFrameRate { fps: self.fps });
        }
        Ok(())
    }
}

impl AppConfig {
    /// Validate detector and session settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracking.detector.validate()?;
        self.session.validate()
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or its
    /// JSON is invalid. Values are not validated here; call
    /// [`AppConfig::validate`] before building a session.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load from `$REP_TRACKER_CONFIG`, or the default path
    pub fn load() -> Self {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::load_from_file(path),
            _ => Self::load_from_file(DEFAULT_CONFIG_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tracking.tracked_marker_id, 0);
        assert_eq!(config.tracking.detector.top_threshold, 200.0);
        assert_eq!(config.tracking.detector.bottom_threshold, 350.0);
        assert_eq!(config.tracking.detector.min_frames_below, 2);
        assert!(config.tracking.detector.require_signal);
        assert_eq!(config.session.fps, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_detector_fields_are_flattened() {
        let json = r#"{
            "tracking": {
                "tracked_marker_id": 4,
                "top_threshold": 180.0,
                "bottom_threshold": 410.0
            }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tracking.tracked_marker_id, 4);
        assert_eq!(config.tracking.detector.top_threshold, 180.0);
        assert_eq!(config.tracking.detector.bottom_threshold, 410.0);
        assert_eq!(config.tracking.detector.min_frames_below, 2);
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_fps() {
        let mut config = AppConfig::default();
        config.session.fps = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidFrameRate { fps: 0 })
        );
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = AppConfig::default();
        config.tracking.detector.top_threshold = 500.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedThresholds { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/rep_tracker.json");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_invalid_json_uses_defaults() {
        let path = std::env::temp_dir().join(format!(
            "rep-tracker-invalid-{}.json",
            std::process::id()
        ));
        fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load_from_file(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_from_file_reads_values() {
        let path = std::env::temp_dir().join(format!(
            "rep-tracker-valid-{}.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"{"tracking":{"tracked_marker_id":2,"min_frames_below":3},"session":{"fps":60}}"#,
        )
        .unwrap();
        let config = AppConfig::load_from_file(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config.tracking.tracked_marker_id, 2);
        assert_eq!(config.tracking.detector.min_frames_below, 3);
        assert_eq!(config.session.fps, 60);
        assert_eq!(config.session.event_buffer, 64);
    }
}
