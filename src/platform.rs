//! Capabilities the automation core consumes but never implements.
//!
//! Hosts provide concrete screen capture, input injection, text recognition
//! and power control. Everything is called from the single control thread,
//! so the traits take `&self` and carry no `Send` bound.

use image::{GrayImage, RgbaImage};

use crate::error::{CaptureError, InputError, RecognitionError, ShutdownError};
use crate::geometry::{ScreenPoint, ScreenRegion};

/// Reads pixels from the screen.
pub trait ScreenCapture {
    /// Captures `region` as an RGBA buffer of exactly its size.
    ///
    /// Must support 1x1 regions, which is how single pixels are sampled.
    fn capture(&self, region: ScreenRegion) -> Result<RgbaImage, CaptureError>;
}

/// Keyboard shortcuts sent to the target application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCommand {
    /// Ctrl+A
    SelectAll,
    /// Shift+R, orders the ship to return to its dock.
    Retreat,
}

impl KeyCommand {
    /// The chord in `SendKeys` notation (`^` = Ctrl, `+` = Shift).
    pub fn chord(&self) -> &'static str {
        match self {
            KeyCommand::SelectAll => "^a",
            KeyCommand::Retreat => "+R",
        }
    }
}

/// Injects synthetic pointer and keyboard events.
pub trait InputInjector {
    fn cursor_position(&self) -> Result<ScreenPoint, InputError>;
    fn move_cursor_to(&self, point: ScreenPoint) -> Result<(), InputError>;
    fn primary_click(&self) -> Result<(), InputError>;
    fn secondary_click(&self) -> Result<(), InputError>;
    fn send_key_command(&self, command: KeyCommand) -> Result<(), InputError>;
}

/// Turns a binarized image into text.
pub trait TextRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<String, RecognitionError>;
}

/// Powers the machine off.
pub trait PowerControl {
    /// Whether the process holds the privileges needed to shut down.
    fn is_elevated(&self) -> bool;
    fn request_shutdown(&self) -> Result<(), ShutdownError>;
}

/// The collaborators one automation run drives.
///
/// The recognizer is optional: without one the OCR gate applies its
/// failure policy on every check.
pub struct Desktop {
    pub capture: Box<dyn ScreenCapture>,
    pub input: Box<dyn InputInjector>,
    pub recognizer: Option<Box<dyn TextRecognizer>>,
    pub power: Box<dyn PowerControl>,
}
