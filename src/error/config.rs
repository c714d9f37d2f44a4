// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Single source of truth for the numeric codes reported by [`ConfigError`].
///
/// Error code range: 1001-1004
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// Debounce length below one frame
    pub const INVALID_DEBOUNCE: i32 = 1001;

    /// Bottom threshold not strictly greater than top threshold
    pub const INVERTED_THRESHOLDS: i32 = 1002;

    /// Threshold is NaN or infinite
    pub const NON_FINITE_THRESHOLD: i32 = 1003;

    /// Session frame rate is zero
    pub const INVALID_FRAME_RATE: i32 = 1004;
}

/// Log a configuration error with structured context
///
/// `context` names the operation that rejected the value.
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!("{}", config_error_log_line(err, context));
}

fn config_error_log_line(err: &ConfigError, context: &str) -> String {
    format!(
        "Config error in {}: code={}, message={}",
        context,
        err.code(),
        err.message()
    )
}

/// Configuration errors
///
/// Raised when a detector or session configuration is constructed or tuned
/// with values under which the two-zone model is not well defined.
///
/// Error code range: 1001-1004
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `min_frames_below` must be at least 1
    InvalidDebounce { value: u32 },

    /// `bottom_threshold` must be strictly greater than `top_threshold`
    InvertedThresholds { top: f64, bottom: f64 },

    /// Thresholds must be finite numbers
    NonFiniteThreshold { name: &'static str, value: f64 },

    /// Session frame rate must be greater than zero
    InvalidFrameRate { fps: u32 },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::InvalidDebounce { .. } => ConfigErrorCodes::INVALID_DEBOUNCE,
            ConfigError::InvertedThresholds { .. } => ConfigErrorCodes::INVERTED_THRESHOLDS,
            ConfigError::NonFiniteThreshold { .. } => ConfigErrorCodes::NON_FINITE_THRESHOLD,
            ConfigError::InvalidFrameRate { .. } => ConfigErrorCodes::INVALID_FRAME_RATE,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::InvalidDebounce { value } => {
                format!("min_frames_below must be at least 1 (got {})", value)
            }
            ConfigError::InvertedThresholds { top, bottom } => {
                format!(
                    "bottom_threshold ({}) must be greater than top_threshold ({})",
                    bottom, top
                )
            }
            ConfigError::NonFiniteThreshold { name, value } => {
                format!("{} must be a finite number (got {})", name, value)
            }
            ConfigError::InvalidFrameRate { fps } => {
                format!("fps must be greater than 0 (got {})", fps)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
