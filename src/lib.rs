//! Screen-driven mining automation.
//!
//! Watches a mining indicator pixel, compresses ore through the context
//! menu on a fixed interval, docks once mining stops and finally powers the
//! machine off. Screen capture, input injection, text recognition and power
//! control are traits in [`platform`]; the host supplies implementations.

pub mod automation;
pub mod capture;
pub mod clock;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod motion;
pub mod ocr;
pub mod paths;
pub mod platform;

#[cfg(test)]
mod testing;

pub use automation::{AutomationController, AutomationState, ControlCommand, ControlHandle};
pub use error::{CaptureError, ConfigError, InputError, PrivilegeError, RecognitionError};
