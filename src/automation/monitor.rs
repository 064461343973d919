//! Mining activity detection.
//!
//! The mining module's indicator pixel flickers while a laser cycles. When
//! the last N samples are all the same color the module has stopped.

use std::collections::VecDeque;

use crate::capture::{ColorSample, sample_pixel};
use crate::error::CaptureError;
use crate::geometry::ScreenPoint;
use crate::platform::ScreenCapture;

/// Fixed-capacity window of the most recent color samples.
#[derive(Clone, Debug)]
pub struct SampleWindow {
    samples: VecDeque<ColorSample>,
    capacity: usize,
    tolerance: Option<u8>,
}

impl SampleWindow {
    /// A window compared by exact equality. Capacity is at least one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            tolerance: None,
        }
    }

    /// A window whose samples count as equal within a per-channel tolerance.
    pub fn with_tolerance(capacity: usize, tolerance: Option<u8>) -> Self {
        Self {
            tolerance,
            ..Self::new(capacity)
        }
    }

    /// Appends a sample, evicting the oldest one when full.
    pub fn push(&mut self, sample: ColorSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<ColorSample> {
        self.samples.back().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    fn same(&self, a: &ColorSample, b: &ColorSample) -> bool {
        match self.tolerance {
            Some(tolerance) => a.matches_within(b, tolerance),
            None => a == b,
        }
    }

    /// True iff the window is full and every pair of samples is equal.
    pub fn is_stalled(&self) -> bool {
        if !self.is_full() {
            return false;
        }
        self.samples.iter().enumerate().all(|(i, a)| {
            self.samples
                .iter()
                .skip(i + 1)
                .all(|b| self.same(a, b))
        })
    }
}

/// Whether the mining module is still working.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MiningState {
    #[default]
    Active,
    Stopped,
}

/// What one evaluation of the indicator concluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MiningTick {
    /// The indicator is still changing.
    Active(ColorSample),
    /// The indicator just stalled; reported once per episode.
    Stalled(ColorSample),
    /// Already stopped on an earlier tick.
    Stopped(ColorSample),
}

impl MiningTick {
    pub fn color(&self) -> ColorSample {
        match *self {
            MiningTick::Active(c) | MiningTick::Stalled(c) | MiningTick::Stopped(c) => c,
        }
    }
}

/// Watches the indicator pixel and latches the stop.
#[derive(Clone, Debug)]
pub struct MiningStateMonitor {
    point: ScreenPoint,
    window: SampleWindow,
    state: MiningState,
}

impl MiningStateMonitor {
    pub fn new(point: ScreenPoint, window: SampleWindow) -> Self {
        Self {
            point,
            window,
            state: MiningState::Active,
        }
    }

    pub fn state(&self) -> MiningState {
        self.state
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Samples the indicator and evaluates the window.
    pub fn tick(&mut self, capture: &dyn ScreenCapture) -> Result<MiningTick, CaptureError> {
        let color = sample_pixel(capture, self.point)?;
        Ok(self.record(color))
    }

    /// Feeds one sample taken elsewhere.
    pub fn record(&mut self, color: ColorSample) -> MiningTick {
        self.window.push(color);

        if self.state == MiningState::Stopped {
            return MiningTick::Stopped(color);
        }
        if self.window.is_stalled() {
            self.state = MiningState::Stopped;
            return MiningTick::Stalled(color);
        }
        MiningTick::Active(color)
    }

    /// Back to Active with an empty window.
    pub fn reset(&mut self) {
        self.state = MiningState::Active;
        self.window.clear();
    }
}
