//! Single-pixel sampling.

use image::Rgba;

use crate::error::CaptureError;
use crate::geometry::{ScreenPoint, ScreenRegion};
use crate::platform::ScreenCapture;

/// The color of one pixel, compared exactly channel by channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColorSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorSample {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Mean of the three channels.
    pub fn luminance(&self) -> u8 {
        ((self.r as u16 + self.g as u16 + self.b as u16) / 3) as u8
    }

    /// True if no channel differs by more than `tolerance`.
    pub fn matches_within(&self, other: &ColorSample, tolerance: u8) -> bool {
        self.r.abs_diff(other.r) <= tolerance
            && self.g.abs_diff(other.g) <= tolerance
            && self.b.abs_diff(other.b) <= tolerance
    }
}

impl From<Rgba<u8>> for ColorSample {
    fn from(pixel: Rgba<u8>) -> Self {
        Self::new(pixel[0], pixel[1], pixel[2])
    }
}

impl std::fmt::Display for ColorSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Reads the color at `point` by capturing a 1x1 region.
///
/// No retry here; callers decide what a failed read means.
pub fn sample_pixel(
    capture: &dyn ScreenCapture,
    point: ScreenPoint,
) -> Result<ColorSample, CaptureError> {
    let frame = capture.capture(ScreenRegion::pixel(point))?;
    frame
        .get_pixel_checked(0, 0)
        .map(|pixel| ColorSample::from(*pixel))
        .ok_or(CaptureError::EmptyFrame)
}
