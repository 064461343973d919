use image::GrayImage;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{TesseractPaths, locate_tesseract};
use crate::error::RecognitionError;
use crate::platform::TextRecognizer;

/// Tesseract driven through its command-line interface.
///
/// Holds the located executable for the lifetime of the automation; each
/// recognition writes the image to a temporary PNG and reads stdout.
pub struct TesseractEngine {
    paths: TesseractPaths,
    language: String,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths) -> Self {
        Self {
            paths,
            language: "eng".to_string(),
        }
    }

    /// Locates an installed Tesseract and wraps it.
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self::new(locate_tesseract()?))
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn paths(&self) -> &TesseractPaths {
        &self.paths
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&self, image: &GrayImage) -> Result<String, RecognitionError> {
        let temp_input = NamedTempFile::with_suffix(".png")
            .map_err(|e| RecognitionError::Engine(format!("temp file: {}", e)))?;
        image
            .save(temp_input.path())
            .map_err(|e| RecognitionError::Engine(format!("writing input image: {}", e)))?;

        let mut command = Command::new(&self.paths.executable);
        command.arg(temp_input.path()).arg("stdout");
        if let Some(tessdata) = &self.paths.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        // A context-menu entry is a single line of text
        command.arg("-l").arg(&self.language).arg("--psm").arg("7");

        let output = command.output().map_err(|e| {
            tracing::warn!(
                executable = %self.paths.executable.display(),
                "failed to launch Tesseract: {}",
                e
            );
            RecognitionError::Unavailable
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Engine(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
