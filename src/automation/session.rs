//! Borrowed view of everything a task needs to touch the desktop.

use rand::rngs::StdRng;
use std::time::Duration;

use crate::automation::config::DelayRange;
use crate::automation::status::StatusReporter;
use crate::capture::{ColorSample, sample_pixel};
use crate::clock::Clock;
use crate::error::{CaptureError, InputError};
use crate::geometry::{ScreenPoint, ScreenRegion};
use crate::motion::{TrajectoryParams, move_pointer};
use crate::ocr::{OcrGate, OcrSettings};
use crate::platform::{Desktop, KeyCommand};

/// Desktop access for the duration of one task.
pub struct Session<'a> {
    desktop: &'a Desktop,
    clock: &'a dyn Clock,
    rng: &'a mut StdRng,
    status: &'a StatusReporter,
    pacing: DelayRange,
    motion: TrajectoryParams,
}

impl<'a> Session<'a> {
    pub fn new(
        desktop: &'a Desktop,
        clock: &'a dyn Clock,
        rng: &'a mut StdRng,
        status: &'a StatusReporter,
        pacing: DelayRange,
        motion: TrajectoryParams,
    ) -> Self {
        Self {
            desktop,
            clock,
            rng,
            status,
            pacing,
            motion,
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn status(&self) -> &StatusReporter {
        self.status
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut *self.rng
    }

    /// Sleeps for a random step pause.
    pub fn pause(&mut self) {
        let delay = self.pacing.sample(&mut *self.rng);
        self.clock.sleep(delay);
    }

    /// Moves the cursor to `target` along a generated trajectory.
    pub fn move_to(&mut self, target: ScreenPoint) -> Result<(), InputError> {
        move_pointer(
            self.desktop.input.as_ref(),
            self.clock,
            &self.motion,
            &mut *self.rng,
            target,
        )
    }

    pub fn click_primary(&self) -> Result<(), InputError> {
        self.desktop.input.primary_click()
    }

    pub fn click_secondary(&self) -> Result<(), InputError> {
        self.desktop.input.secondary_click()
    }

    pub fn send_keys(&self, command: KeyCommand) -> Result<(), InputError> {
        tracing::debug!(chord = command.chord(), "Sending keys");
        self.desktop.input.send_key_command(command)
    }

    pub fn cursor_position(&self) -> Result<ScreenPoint, InputError> {
        self.desktop.input.cursor_position()
    }

    pub fn sample(&self, point: ScreenPoint) -> Result<ColorSample, CaptureError> {
        sample_pixel(self.desktop.capture.as_ref(), point)
    }

    pub fn random_point_in(&mut self, region: ScreenRegion) -> ScreenPoint {
        region.random_point(&mut *self.rng)
    }

    pub fn gate(&self, settings: OcrSettings) -> OcrGate<'_> {
        OcrGate::new(
            self.desktop.capture.as_ref(),
            self.desktop.recognizer.as_deref(),
            settings,
        )
    }
}
