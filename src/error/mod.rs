// Error types for the rep tracker
//
// This module defines the configuration error type shared by the detector,
// the session controller and the config loader, with numeric error codes
// suitable for reporting through CLI output and telemetry.

mod config;

pub use config::{log_config_error, ConfigError, ConfigErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so callers can report failures consistently
/// without matching on every variant.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
