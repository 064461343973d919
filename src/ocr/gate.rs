//! OCR confirmation before risky clicks.
//!
//! The gate captures a screen region, binarizes it and asks the recognizer
//! whether an expected label is in it. What a recognition failure means is
//! an explicit [`RecognitionFailurePolicy`], not a side effect of error
//! handling.

use serde::{Deserialize, Serialize};

use crate::automation::status::StatusReporter;
use crate::error::RecognitionError;
use crate::geometry::ScreenRegion;
use crate::ocr::preprocess::{DEFAULT_BINARIZE_THRESHOLD, binarize_luminance};
use crate::platform::{ScreenCapture, TextRecognizer};

/// Decision the gate returns when recognition itself fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionFailurePolicy {
    /// Treat the label as visible and let the cycle continue.
    #[default]
    FailOpen,
    /// Treat the label as absent.
    FailClosed,
}

impl RecognitionFailurePolicy {
    pub fn decision(&self) -> bool {
        matches!(self, RecognitionFailurePolicy::FailOpen)
    }
}

/// OCR settings, loaded from the `tuning.ocr` config section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// When false the action cycle clicks the menu item unchecked.
    pub enabled: bool,
    pub threshold: u8,
    /// Extra pixels captured left and right of the region.
    pub margin_x: u32,
    /// Extra pixels captured above and below the region.
    pub margin_y: u32,
    pub on_failure: RecognitionFailurePolicy,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_BINARIZE_THRESHOLD,
            margin_x: 10,
            margin_y: 2,
            on_failure: RecognitionFailurePolicy::FailOpen,
        }
    }
}

/// Case-insensitive substring test.
pub fn contains_label(text: &str, label: &str) -> bool {
    text.to_lowercase().contains(&label.to_lowercase())
}

pub struct OcrGate<'a> {
    capture: &'a dyn ScreenCapture,
    recognizer: Option<&'a dyn TextRecognizer>,
    settings: OcrSettings,
}

impl<'a> OcrGate<'a> {
    pub fn new(
        capture: &'a dyn ScreenCapture,
        recognizer: Option<&'a dyn TextRecognizer>,
        settings: OcrSettings,
    ) -> Self {
        Self {
            capture,
            recognizer,
            settings,
        }
    }

    /// Captures `region` plus margins and returns the recognized text.
    pub fn read_region(&self, region: ScreenRegion) -> Result<String, RecognitionError> {
        let recognizer = self.recognizer.ok_or(RecognitionError::Unavailable)?;
        let expanded = region
            .expand(self.settings.margin_x, self.settings.margin_y)
            .unwrap_or(region);
        let frame = self.capture.capture(expanded)?;
        let binary = binarize_luminance(&frame, self.settings.threshold);
        recognizer.recognize(&binary)
    }

    /// Whether `label` appears in `region`, without applying the failure policy.
    pub fn check(&self, region: ScreenRegion, label: &str) -> Result<bool, RecognitionError> {
        let text = self.read_region(region)?;
        tracing::debug!(text = %text.trim(), "OCR output");
        Ok(contains_label(&text, label))
    }

    /// Whether `label` appears in `region`; failures are reported and
    /// resolved by the configured policy.
    pub fn is_label_visible(
        &self,
        region: ScreenRegion,
        label: &str,
        status: &StatusReporter,
    ) -> bool {
        match self.check(region, label) {
            Ok(found) => found,
            Err(e) => {
                let decision = self.settings.on_failure.decision();
                status.warn(format!(
                    "OCR error: {} (treating \"{}\" as {})",
                    e,
                    label,
                    if decision { "visible" } else { "absent" }
                ));
                decision
            }
        }
    }
}
