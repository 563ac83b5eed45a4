//! Detection dump backend
//!
//! Loads OCR detections that were saved to a JSON file by an external
//! engine run. The dump format mirrors what detection-style OCR engines
//! emit per detection: four corner points, the recognized text, and an
//! optional confidence score.

use std::path::Path;

use image::DynamicImage;
use serde::Deserialize;
use tracing::debug;

use super::{Detection, OcrEngine, OcrError, Point};

/// One detection as stored on disk.
#[derive(Debug, Deserialize)]
struct RawDetection {
    /// Corner points `[[x, y]; 4]`, top-left first
    #[serde(rename = "box")]
    quad: Vec<[f32; 2]>,
    text: String,
    #[serde(default)]
    confidence: Option<f32>,
}

impl TryFrom<RawDetection> for Detection {
    type Error = OcrError;

    fn try_from(raw: RawDetection) -> Result<Self, OcrError> {
        let quad: [[f32; 2]; 4] = raw.quad.try_into().map_err(|points: Vec<[f32; 2]>| {
            OcrError::DumpFormat(format!(
                "detection {:?} has {} corner points, expected 4",
                raw.text,
                points.len()
            ))
        })?;

        Ok(Detection {
            text: raw.text,
            quad: quad.map(|[x, y]| Point { x, y }),
            confidence: raw.confidence,
        })
    }
}

/// An [`OcrEngine`] backed by a saved detection dump instead of a live
/// model. Positions are in the pixel space of the image the dump was
/// produced from, so the image handed to [`OcrEngine::read_text`] is only
/// used as an opaque token here.
#[derive(Debug)]
pub struct DetectionDump {
    detections: Vec<Detection>,
}

impl DetectionDump {
    /// Load a dump from a JSON file.
    pub fn load(path: &Path) -> Result<Self, OcrError> {
        let content = std::fs::read_to_string(path)?;
        let raw: Vec<RawDetection> = serde_json::from_str(&content)
            .map_err(|e| OcrError::DumpFormat(e.to_string()))?;

        let detections = raw
            .into_iter()
            .map(Detection::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!("loaded {} detections from {:?}", detections.len(), path);

        Ok(Self { detections })
    }
}

impl OcrEngine for DetectionDump {
    fn name(&self) -> &str {
        "detection-dump"
    }

    fn read_text(&self, _image: &DynamicImage) -> Result<Vec<Detection>, OcrError> {
        Ok(self.detections.clone())
    }
}
