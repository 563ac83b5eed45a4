//! Extraction pipeline
//!
//! Single entry point the presentation layer calls: detections in,
//! formatted driver blocks plus a count out. Holds no state across calls;
//! one extractor can serve any number of images, and separate calls are
//! safe to run from separate threads.

use anyhow::Result;
use image::DynamicImage;
use tracing::{debug, info};

use crate::analysis::{group_into_rows, render_record, RecordParser};
use crate::config::ExtractorConfig;
use crate::vision::{Detection, OcrEngine, OcrError};

/// Result of one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// All driver blocks concatenated, blank-line separated
    pub text: String,
    /// Number of drivers identified (zero is a valid, empty outcome)
    pub driver_count: usize,
}

/// The detections-to-records pipeline, configured once per run.
pub struct ScheduleExtractor {
    parser: RecordParser,
    y_tolerance: f32,
    origin_tag: String,
}

impl ScheduleExtractor {
    /// Build an extractor from the given configuration.
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            parser: RecordParser::new(&config.parsing)?,
            y_tolerance: config.grouping.y_tolerance,
            origin_tag: config.output.origin_tag.clone(),
        })
    }

    /// Run the injected OCR engine on an image and process its detections.
    ///
    /// Engine failure is the only error that propagates; every per-row
    /// problem downstream is absorbed by field defaults.
    pub fn extract(
        &self,
        engine: &dyn OcrEngine,
        image: &DynamicImage,
    ) -> Result<Extraction, OcrError> {
        let detections = engine.read_text(image)?;
        info!(
            "{} returned {} detections",
            engine.name(),
            detections.len()
        );
        Ok(self.process(&detections))
    }

    /// Core pipeline: detections -> rows -> records -> formatted text.
    pub fn process(&self, detections: &[Detection]) -> Extraction {
        let rows = group_into_rows(detections, self.y_tolerance);

        let mut text = String::new();
        let mut driver_count = 0;
        for row in &rows {
            if let Some(record) = self.parser.parse_row(row) {
                text.push_str(&render_record(&record, &self.origin_tag));
                driver_count += 1;
            }
        }

        debug!(
            "parsed {} driver records out of {} rows",
            driver_count,
            rows.len()
        );

        Extraction { text, driver_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::Point;

    fn extractor() -> ScheduleExtractor {
        ScheduleExtractor::new(&ExtractorConfig::default()).unwrap()
    }

    fn det(text: &str, x: f32, y: f32) -> Detection {
        Detection {
            text: text.to_string(),
            quad: [
                Point { x, y },
                Point { x: x + 80.0, y },
                Point { x: x + 80.0, y: y + 18.0 },
                Point { x, y: y + 18.0 },
            ],
            confidence: None,
        }
    }

    /// Failing OCR engine test double.
    struct BrokenOcr;

    impl OcrEngine for BrokenOcr {
        fn name(&self) -> &str {
            "broken"
        }

        fn read_text(&self, _image: &DynamicImage) -> Result<Vec<Detection>, OcrError> {
            Err(OcrError::Recognition("model exploded".to_string()))
        }
    }

    #[test]
    fn test_empty_detections_yield_empty_extraction() {
        let result = extractor().process(&[]);
        assert_eq!(result.text, "");
        assert_eq!(result.driver_count, 0);
    }

    #[test]
    fn test_end_to_end_schedule() {
        // Header row, two driver rows, one noise row scattered out of order.
        let detections = vec![
            det("12345678901", 500.0, 108.0),
            det("ORIGEM", 10.0, 12.0),
            det("MARIA SOUZA", 10.0, 205.0),
            det("SAÍDA", 200.0, 10.0),
            det("JOAO DA SILVA", 10.0, 100.0),
            det("SP 2", 250.0, 103.0),
            det("ABC-1234", 380.0, 98.0),
            det("RJ", 250.0, 200.0),
            det("BRA2E19", 380.0, 202.0),
            det("XYZ9876", 500.0, 198.0),
            det("---", 10.0, 300.0),
        ];

        let result = extractor().process(&detections);
        assert_eq!(result.driver_count, 2);

        let blocks: Vec<&str> = result.text.trim_end().split("\n\n").collect();
        assert_eq!(blocks.len(), 2);

        // Row order is preserved top to bottom.
        assert!(blocks[0].contains("MOT: JOAO DA"));
        assert!(blocks[0].contains("TRUCK:ABC-1234"));
        assert!(blocks[0].contains("SP 2"));
        assert!(blocks[0].contains("CPF:12345678901"));

        assert!(blocks[1].contains("MOT: MARIA SOUZA"));
        assert!(blocks[1].contains("CAVALO:BRA-2E19"));
        assert!(blocks[1].contains("CARRETA:XYZ-9876"));
        assert!(blocks[1].contains("RJ 1"));
    }

    #[test]
    fn test_blocks_are_blank_line_separated() {
        let detections = vec![
            det("JOAO SILVA", 10.0, 100.0),
            det("ABC1234", 300.0, 100.0),
            det("MARIA SOUZA", 10.0, 200.0),
            det("DEF5678", 300.0, 200.0),
        ];

        let result = extractor().process(&detections);
        assert_eq!(result.driver_count, 2);
        assert!(result.text.contains("\n\nFSJ\n"));
        assert!(result.text.ends_with("\n\n"));
    }

    #[test]
    fn test_ocr_failure_propagates() {
        let image = DynamicImage::new_rgb8(1, 1);
        let err = extractor().extract(&BrokenOcr, &image).unwrap_err();
        assert!(matches!(err, OcrError::Recognition(_)));
    }

    #[test]
    fn test_extract_runs_the_engine_detections() {
        let image = DynamicImage::new_rgb8(1, 1);

        struct OneRow;
        impl OcrEngine for OneRow {
            fn name(&self) -> &str {
                "one-row"
            }
            fn read_text(&self, _image: &DynamicImage) -> Result<Vec<Detection>, OcrError> {
                Ok(vec![det("JOAO SILVA", 0.0, 0.0), det("ABC1234", 200.0, 2.0)])
            }
        }

        let result = extractor().extract(&OneRow, &image).unwrap();
        assert_eq!(result.driver_count, 1);
        assert!(result.text.contains("MOT: JOAO SILVA"));
    }
}
