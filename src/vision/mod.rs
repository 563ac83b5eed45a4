//! Vision/OCR Layer
//!
//! Defines the boundary between the extraction pipeline and whatever OCR
//! engine produced the text detections. The pipeline never runs a model
//! itself; it consumes [`Detection`]s from an injected [`OcrEngine`].

pub mod dump;

use image::DynamicImage;
use thiserror::Error;

pub use dump::DetectionDump;

/// A point in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One OCR engine output unit: a recognized string plus the bounding
/// quadrilateral it was read from.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Recognized text content
    pub text: String,
    /// Corner points of the bounding quadrilateral, top-left first
    pub quad: [Point; 4],
    /// Recognition confidence (0.0 - 1.0), when the engine reports one
    pub confidence: Option<f32>,
}

impl Detection {
    /// Top-left corner of the bounding quadrilateral.
    pub fn top_left(&self) -> Point {
        self.quad[0]
    }
}

/// Errors raised at the OCR boundary.
///
/// Everything below this boundary (missing fields, noisy text) is absorbed
/// by the parser's defaults and never surfaces as an error.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Recognition on the supplied image failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
    /// A detection dump file could not be read.
    #[error("failed to read detection dump")]
    DumpIo(#[from] std::io::Error),
    /// A detection dump file did not match the expected shape.
    #[error("malformed detection dump: {0}")]
    DumpFormat(String),
}

/// Text recognition backend.
///
/// Implementations own their model state; the extractor only borrows the
/// engine for the duration of one image, so callers decide how long a
/// (potentially expensive to load) engine lives.
pub trait OcrEngine {
    /// Human-readable backend name for logging.
    fn name(&self) -> &str;

    /// Run text recognition on a decoded image and return the detections
    /// in no particular order.
    fn read_text(&self, image: &DynamicImage) -> Result<Vec<Detection>, OcrError>;
}
