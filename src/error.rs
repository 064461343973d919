//! Error types at the boundaries of the automation core.
//!
//! Each collaborator reports its own failure kind so the controller can apply
//! the right policy: capture and recognition failures are reported and
//! retried on the next tick, input failures stop the action cycle, config
//! failures block start, and privilege failures degrade to a warning.

use thiserror::Error;

/// The capture surface could not be read.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture surface unavailable: {0}")]
    Unavailable(String),
    #[error("captured frame was empty")]
    EmptyFrame,
}

/// The text-recognition engine is missing or failed.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("text recognition engine not initialized")]
    Unavailable,
    #[error("text recognition failed: {0}")]
    Engine(String),
    #[error("could not capture region for recognition: {0}")]
    Capture(#[from] CaptureError),
}

/// A synthetic input event could not be delivered.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input injection rejected: {0}")]
    Rejected(String),
    #[error("cursor position unavailable: {0}")]
    CursorUnavailable(String),
}

/// A configuration value is missing or unusable.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing value for {key}")]
    Missing { key: &'static str },
    #[error("{key} must be a number, got {value:?}")]
    NotNumeric { key: &'static str, value: String },
    #[error("{key} is out of range: {reason}")]
    OutOfRange { key: &'static str, reason: String },
    #[error("{name} region has zero width or height or lies outside screen coordinates")]
    EmptyRegion { name: &'static str },
    #[error("invalid tuning section: {0}")]
    Tuning(String),
}

/// Shutdown was requested without elevated privileges.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("administrator rights are required to shut down the computer")]
pub struct PrivilegeError;

/// The power-control collaborator could not shut the machine down.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
    #[error("shutdown request failed: {0}")]
    Failed(String),
}
