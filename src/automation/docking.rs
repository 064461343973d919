//! Docking procedure.
//!
//! Retreat, wait, click the dock button, and optionally wait again to see
//! whether the screen changed. The waits are one-shot scheduler tasks, so
//! the sequencer is resumed step by step rather than blocking the control
//! thread for a minute.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::automation::config::DelayRange;
use crate::automation::scheduler::{Scheduler, Task};
use crate::automation::session::Session;
use crate::capture::ColorSample;
use crate::geometry::{ScreenPoint, ScreenRegion};
use crate::platform::KeyCommand;

/// Resumption points of an in-flight procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DockingStep {
    ClickDock,
    Verify,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockingMode {
    /// Compare the verification pixel before and after docking.
    #[default]
    Verified,
    /// Click the dock button and resume automation.
    ClickOnly,
}

/// Docking settings, loaded from the `tuning.docking` config section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockingSettings {
    pub mode: DockingMode,
    /// Wait between the retreat command and the dock click.
    pub delay: DelayRange,
    /// Wait between the dock click and verification.
    pub verification_delay_ms: u64,
}

impl Default for DockingSettings {
    fn default() -> Self {
        Self {
            mode: DockingMode::Verified,
            delay: DelayRange::new(15_000, 30_000),
            verification_delay_ms: 60_000,
        }
    }
}

impl DockingSettings {
    pub fn verification_delay(&self) -> Duration {
        Duration::from_millis(self.verification_delay_ms)
    }
}

/// Verification pixel before and after the procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DockOutcome {
    pub pre_color: ColorSample,
    pub post_color: ColorSample,
    docked: bool,
}

impl DockOutcome {
    /// Docked iff the colors differ, beyond `tolerance` when one is given.
    pub fn compare(pre_color: ColorSample, post_color: ColorSample, tolerance: Option<u8>) -> Self {
        let unchanged = match tolerance {
            Some(tolerance) => pre_color.matches_within(&post_color, tolerance),
            None => pre_color == post_color,
        };
        Self {
            pre_color,
            post_color,
            docked: !unchanged,
        }
    }

    pub fn is_success(&self) -> bool {
        self.docked
    }
}

/// How a finished procedure ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DockingResult {
    Docked(DockOutcome),
    /// The screen did not change after the dock click.
    Unconfirmed(DockOutcome),
    /// Dock button clicked without verification.
    ClickedUnverified,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DockingProgress {
    /// A procedure was already running; nothing was done.
    AlreadyInFlight,
    /// The next step is scheduled after this delay.
    Waiting(Duration),
    Finished(DockingResult),
}

/// Runs one docking procedure at a time.
#[derive(Debug)]
pub struct DockingSequencer {
    settings: DockingSettings,
    dock_button: ScreenRegion,
    verification_point: ScreenPoint,
    tolerance: Option<u8>,
    in_flight: bool,
    pre_color: Option<ColorSample>,
}

impl DockingSequencer {
    pub fn new(
        settings: DockingSettings,
        dock_button: ScreenRegion,
        verification_point: ScreenPoint,
        tolerance: Option<u8>,
    ) -> Self {
        Self {
            settings,
            dock_button,
            verification_point,
            tolerance,
            in_flight: false,
            pre_color: None,
        }
    }

    pub fn mode(&self) -> DockingMode {
        self.settings.mode
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Starts the procedure: halts the mining check, retreats and schedules
    /// the dock click.
    pub fn begin(
        &mut self,
        session: &mut Session<'_>,
        scheduler: &mut Scheduler,
    ) -> Result<DockingProgress> {
        if self.in_flight {
            tracing::debug!("Docking already in flight");
            return Ok(DockingProgress::AlreadyInFlight);
        }
        self.in_flight = true;

        if self.settings.mode == DockingMode::Verified {
            let color = session
                .sample(self.verification_point)
                .context("Failed to record pre-docking color")?;
            tracing::debug!(%color, point = %self.verification_point, "Pre-docking color");
            self.pre_color = Some(color);
        }

        scheduler.stop_periodic(Task::MiningCheck);
        session
            .send_keys(KeyCommand::Retreat)
            .context("Failed to send retreat command")?;

        let delay = self.settings.delay.sample(session.rng());
        session
            .status()
            .info(format!("Waiting {} seconds before docking...", delay.as_secs()));
        scheduler.schedule_once(
            Task::Docking(DockingStep::ClickDock),
            session.now(),
            delay,
        );
        Ok(DockingProgress::Waiting(delay))
    }

    /// Continues the procedure at `step`.
    pub fn resume(
        &mut self,
        step: DockingStep,
        session: &mut Session<'_>,
        scheduler: &mut Scheduler,
    ) -> Result<DockingProgress> {
        if !self.in_flight {
            return Err(anyhow!("no docking procedure in flight"));
        }
        match step {
            DockingStep::ClickDock => self.click_dock(session, scheduler),
            DockingStep::Verify => self.verify(session),
        }
    }

    fn click_dock(
        &mut self,
        session: &mut Session<'_>,
        scheduler: &mut Scheduler,
    ) -> Result<DockingProgress> {
        let target = session.random_point_in(self.dock_button);
        session
            .move_to(target)
            .context("Failed to move to dock button")?;
        session
            .click_primary()
            .context("Failed to click dock button")?;
        session.status().info("Docking initiated");

        match self.settings.mode {
            DockingMode::ClickOnly => {
                self.abandon();
                Ok(DockingProgress::Finished(DockingResult::ClickedUnverified))
            }
            DockingMode::Verified => {
                let delay = self.settings.verification_delay();
                session.status().info("Waiting for docking verification...");
                scheduler.schedule_once(Task::Docking(DockingStep::Verify), session.now(), delay);
                Ok(DockingProgress::Waiting(delay))
            }
        }
    }

    fn verify(&mut self, session: &mut Session<'_>) -> Result<DockingProgress> {
        let pre_color = self
            .pre_color
            .ok_or_else(|| anyhow!("pre-docking color was never recorded"))?;
        let post_color = session
            .sample(self.verification_point)
            .context("Failed to sample verification color")?;
        self.abandon();

        let outcome = DockOutcome::compare(pre_color, post_color, self.tolerance);
        tracing::info!(
            pre = %pre_color,
            post = %post_color,
            docked = outcome.is_success(),
            "Docking verification"
        );
        let result = if outcome.is_success() {
            DockingResult::Docked(outcome)
        } else {
            DockingResult::Unconfirmed(outcome)
        };
        Ok(DockingProgress::Finished(result))
    }

    /// Clears the in-flight guard.
    pub fn abandon(&mut self) {
        self.in_flight = false;
        self.pre_color = None;
    }
}
