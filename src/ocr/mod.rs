pub mod engine;
pub mod gate;
pub mod preprocess;
pub mod setup;

pub use engine::TesseractEngine;
pub use gate::{OcrGate, OcrSettings, RecognitionFailurePolicy, contains_label};
pub use preprocess::binarize_luminance;
pub use setup::{TesseractPaths, locate_tesseract};
