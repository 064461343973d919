//! Automation state machine.
//!
//! A run goes Idle → Running → MiningActive, and on a detected stall
//! MiningStopped → Docking → ShutdownPending. Stop, failures and an
//! unelevated shutdown all return to Idle.

/// Automation state machine states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AutomationState {
    /// Not running (initial state)
    #[default]
    Idle,
    /// Started, no mining sample evaluated yet
    Running,
    /// Mining indicator is changing
    MiningActive,
    /// Mining indicator stalled, docking about to start
    MiningStopped,
    /// Docking procedure in flight
    Docking,
    /// Shutdown was requested
    ShutdownPending,
}

impl std::fmt::Display for AutomationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutomationState::Idle => write!(f, "Idle"),
            AutomationState::Running => write!(f, "Running"),
            AutomationState::MiningActive => write!(f, "Mining active"),
            AutomationState::MiningStopped => write!(f, "Mining stopped"),
            AutomationState::Docking => write!(f, "Docking"),
            AutomationState::ShutdownPending => write!(f, "Shutdown pending"),
        }
    }
}

impl AutomationState {
    /// Whether the user's start is in effect.
    pub fn is_running(&self) -> bool {
        !matches!(self, AutomationState::Idle | AutomationState::ShutdownPending)
    }

    /// States in which the action and mining-check cycles do work.
    pub fn is_cycling(&self) -> bool {
        matches!(self, AutomationState::Running | AutomationState::MiningActive)
    }

    /// Checks a transition against the state machine.
    ///
    /// Staying in the same state is always allowed.
    pub fn can_transition_to(&self, next: AutomationState) -> bool {
        use AutomationState::*;

        if *self == next {
            return true;
        }
        match self {
            Idle => matches!(next, Running),
            Running => matches!(next, MiningActive | MiningStopped | Idle | ShutdownPending),
            MiningActive => matches!(next, MiningStopped | Idle | ShutdownPending),
            MiningStopped => matches!(next, Docking | Idle | ShutdownPending),
            Docking => matches!(next, Running | Idle | ShutdownPending),
            ShutdownPending => false,
        }
    }
}
