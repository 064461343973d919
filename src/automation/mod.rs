//! Mining automation: the state machine and everything it schedules.
//!
//! This module provides:
//! - The action cycle that compresses ore through the context menu
//! - Mining-state monitoring from a single indicator pixel
//! - The docking procedure and shutdown escalation
//! - The controller that owns the state machine and the task scheduler

pub mod config;
pub mod cycle;
pub mod docking;
pub mod monitor;
pub mod runner;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod status;

pub use config::{
    AutomationConfig, ConfigKey, ConfigSource, DelayRange, JsonConfigSource, MenuGeometry,
    RegionSpec, Tuning,
};
pub use cycle::{CycleOutcome, run_action_cycle};
pub use docking::{
    DockOutcome, DockingMode, DockingProgress, DockingResult, DockingSequencer, DockingSettings,
    DockingStep,
};
pub use monitor::{MiningState, MiningStateMonitor, MiningTick, SampleWindow};
pub use runner::{AutomationController, ControlCommand, ControlHandle, control_channel};
pub use scheduler::{Cadence, Scheduler, Task};
pub use session::Session;
pub use state::AutomationState;
pub use status::{StatusLevel, StatusMessage, StatusReporter, drain, status_channel};
