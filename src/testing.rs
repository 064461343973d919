//! Scripted collaborators for unit tests.
//!
//! Every fake is a cheap `Rc` handle: one clone goes into a [`Desktop`],
//! the test keeps another to script behavior and inspect what happened.

use image::{GrayImage, Rgba, RgbaImage};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::capture::ColorSample;
use crate::error::{CaptureError, InputError, PrivilegeError, RecognitionError, ShutdownError};
use crate::geometry::{ScreenPoint, ScreenRegion};
use crate::platform::{
    Desktop, InputInjector, KeyCommand, PowerControl, ScreenCapture, TextRecognizer,
};

#[derive(Default)]
struct ScreenInner {
    base: ColorSample,
    scripts: HashMap<ScreenPoint, VecDeque<ColorSample>>,
    fail: bool,
    captured: Vec<ScreenRegion>,
}

/// A screen whose single pixels follow per-point scripts.
#[derive(Clone, Default)]
pub struct FakeScreen {
    inner: Rc<RefCell<ScreenInner>>,
}

impl FakeScreen {
    pub fn new(base: ColorSample) -> Self {
        let screen = Self::default();
        screen.inner.borrow_mut().base = base;
        screen
    }

    /// Queues colors returned by successive samples of `point`.
    pub fn script(&self, point: ScreenPoint, colors: impl IntoIterator<Item = ColorSample>) {
        self.inner
            .borrow_mut()
            .scripts
            .entry(point)
            .or_default()
            .extend(colors);
    }

    /// Color returned once a point's script runs out.
    pub fn set_base(&self, color: ColorSample) {
        self.inner.borrow_mut().base = color;
    }

    pub fn fail_captures(&self, fail: bool) {
        self.inner.borrow_mut().fail = fail;
    }

    pub fn captured_regions(&self) -> Vec<ScreenRegion> {
        self.inner.borrow().captured.clone()
    }
}

impl ScreenCapture for FakeScreen {
    fn capture(&self, region: ScreenRegion) -> Result<RgbaImage, CaptureError> {
        let mut inner = self.inner.borrow_mut();
        inner.captured.push(region);
        if inner.fail {
            return Err(CaptureError::Unavailable("display disconnected".to_string()));
        }

        let base = inner.base;
        let color = if region.width() == 1 && region.height() == 1 {
            inner
                .scripts
                .get_mut(&region.origin())
                .and_then(|queue| queue.pop_front())
                .unwrap_or(base)
        } else {
            base
        };

        Ok(RgbaImage::from_pixel(
            region.width(),
            region.height(),
            Rgba([color.r, color.g, color.b, 255]),
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Move(ScreenPoint),
    PrimaryClick,
    SecondaryClick,
    Keys(KeyCommand),
}

#[derive(Default)]
struct InputInner {
    cursor: ScreenPoint,
    events: Vec<InputEvent>,
    fail_after: Option<usize>,
}

/// Records injected input and tracks the cursor.
#[derive(Clone, Default)]
pub struct FakeInput {
    inner: Rc<RefCell<InputInner>>,
}

impl FakeInput {
    pub fn at(cursor: ScreenPoint) -> Self {
        let input = Self::default();
        input.inner.borrow_mut().cursor = cursor;
        input
    }

    /// Rejects every event after the first `count` have been delivered.
    pub fn fail_after(&self, count: usize) {
        self.inner.borrow_mut().fail_after = Some(count);
    }

    pub fn cursor(&self) -> ScreenPoint {
        self.inner.borrow().cursor
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.inner.borrow().events.clone()
    }

    pub fn count(&self, event: InputEvent) -> usize {
        self.inner
            .borrow()
            .events
            .iter()
            .filter(|e| **e == event)
            .count()
    }

    fn record(&self, event: InputEvent) -> Result<(), InputError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_after.is_some_and(|limit| inner.events.len() >= limit) {
            return Err(InputError::Rejected("injection blocked".to_string()));
        }
        if let InputEvent::Move(point) = event {
            inner.cursor = point;
        }
        inner.events.push(event);
        Ok(())
    }
}

impl InputInjector for FakeInput {
    fn cursor_position(&self) -> Result<ScreenPoint, InputError> {
        Ok(self.cursor())
    }

    fn move_cursor_to(&self, point: ScreenPoint) -> Result<(), InputError> {
        self.record(InputEvent::Move(point))
    }

    fn primary_click(&self) -> Result<(), InputError> {
        self.record(InputEvent::PrimaryClick)
    }

    fn secondary_click(&self) -> Result<(), InputError> {
        self.record(InputEvent::SecondaryClick)
    }

    fn send_key_command(&self, command: KeyCommand) -> Result<(), InputError> {
        self.record(InputEvent::Keys(command))
    }
}

#[derive(Default)]
struct RecognizerInner {
    responses: VecDeque<Result<String, RecognitionError>>,
    fallback: String,
    calls: usize,
    last_size: Option<(u32, u32)>,
}

/// Returns queued texts or errors, then a fixed fallback text.
#[derive(Clone, Default)]
pub struct FakeRecognizer {
    inner: Rc<RefCell<RecognizerInner>>,
}

impl FakeRecognizer {
    pub fn reading(fallback: &str) -> Self {
        let recognizer = Self::default();
        recognizer.inner.borrow_mut().fallback = fallback.to_string();
        recognizer
    }

    pub fn push(&self, response: Result<String, RecognitionError>) {
        self.inner.borrow_mut().responses.push_back(response);
    }

    pub fn set_fallback(&self, text: &str) {
        self.inner.borrow_mut().fallback = text.to_string();
    }

    pub fn calls(&self) -> usize {
        self.inner.borrow().calls
    }

    pub fn last_image_size(&self) -> Option<(u32, u32)> {
        self.inner.borrow().last_size
    }
}

impl TextRecognizer for FakeRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<String, RecognitionError> {
        let mut inner = self.inner.borrow_mut();
        inner.calls += 1;
        inner.last_size = Some(image.dimensions());
        match inner.responses.pop_front() {
            Some(response) => response,
            None => Ok(inner.fallback.clone()),
        }
    }
}

#[derive(Default)]
struct PowerInner {
    elevated: bool,
    fail: bool,
    denied: bool,
    requests: usize,
}

/// Counts shutdown requests instead of powering anything off.
#[derive(Clone, Default)]
pub struct FakePower {
    inner: Rc<RefCell<PowerInner>>,
}

impl FakePower {
    pub fn elevated() -> Self {
        let power = Self::default();
        power.inner.borrow_mut().elevated = true;
        power
    }

    pub fn unprivileged() -> Self {
        Self::default()
    }

    pub fn fail_requests(&self) {
        self.inner.borrow_mut().fail = true;
    }

    /// Reports elevated but refuses the request for lack of rights.
    pub fn deny_requests(&self) {
        self.inner.borrow_mut().denied = true;
    }

    pub fn shutdown_requests(&self) -> usize {
        self.inner.borrow().requests
    }
}

impl PowerControl for FakePower {
    fn is_elevated(&self) -> bool {
        self.inner.borrow().elevated
    }

    fn request_shutdown(&self) -> Result<(), ShutdownError> {
        let mut inner = self.inner.borrow_mut();
        if inner.denied {
            return Err(PrivilegeError.into());
        }
        if inner.fail {
            return Err(ShutdownError::Failed("shutdown.exe exited with 1".to_string()));
        }
        inner.requests += 1;
        Ok(())
    }
}

/// One set of fakes wired into a [`Desktop`].
#[derive(Clone)]
pub struct Fakes {
    pub screen: FakeScreen,
    pub input: FakeInput,
    pub recognizer: FakeRecognizer,
    pub power: FakePower,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            screen: FakeScreen::new(ColorSample::new(20, 20, 20)),
            input: FakeInput::at(ScreenPoint::new(960, 540)),
            recognizer: FakeRecognizer::reading("Compress"),
            power: FakePower::elevated(),
        }
    }

    pub fn desktop(&self) -> Desktop {
        Desktop {
            capture: Box::new(self.screen.clone()),
            input: Box::new(self.input.clone()),
            recognizer: Some(Box::new(self.recognizer.clone())),
            power: Box::new(self.power.clone()),
        }
    }
}
