//! Screen sensing built on the host's capture capability.
//!
//! This module provides:
//! - Single-pixel sampling (`sample_pixel`)
//! - The color value type used by the mining monitor (`ColorSample`)

pub mod pixel;

pub use pixel::{ColorSample, sample_pixel};
