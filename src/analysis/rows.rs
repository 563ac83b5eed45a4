//! Row reconstruction
//!
//! OCR engines return detections in no useful order. This module rebuilds
//! the logical table lines by clustering detections on their top-left
//! y-coordinate, then ordering each line's tokens left to right.

use tracing::debug;

use crate::vision::Detection;

/// Default vertical tolerance, in pixels, for two detections to count as
/// the same table line.
pub const DEFAULT_Y_TOLERANCE: f32 = 20.0;

/// A reconstructed logical table line: detections judged to lie on the
/// same horizontal row, ordered left to right.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub detections: Vec<Detection>,
}

impl Row {
    /// The row's tokens joined with single spaces, in reading order.
    pub fn joined_text(&self) -> String {
        self.detections
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Cluster detections into table rows by vertical proximity.
///
/// Greedy single-pass clustering over the y-sorted detections: each row is
/// anchored on the y of the *first* detection assigned to it, not a running
/// mean. The anchor choice decides ties for detections near a row boundary
/// and must stay as-is. Rows come back top to bottom, each sorted by
/// ascending x.
pub fn group_into_rows(detections: &[Detection], y_tolerance: f32) -> Vec<Row> {
    if detections.is_empty() {
        return Vec::new();
    }

    let mut sorted = detections.to_vec();
    sorted.sort_by(|a, b| a.top_left().y.total_cmp(&b.top_left().y));

    let mut rows: Vec<Row> = Vec::new();
    let mut current: Vec<Detection> = Vec::new();
    let mut reference_y = 0.0_f32;

    for detection in sorted {
        let y = detection.top_left().y;
        if current.is_empty() {
            reference_y = y;
            current.push(detection);
        } else if (y - reference_y).abs() <= y_tolerance {
            current.push(detection);
        } else {
            rows.push(close_row(current));
            reference_y = y;
            current = vec![detection];
        }
    }
    rows.push(close_row(current));

    debug!(
        "grouped {} detections into {} rows (y tolerance {})",
        detections.len(),
        rows.len(),
        y_tolerance
    );

    rows
}

/// Seal a row: order its tokens into left-to-right reading order.
fn close_row(mut detections: Vec<Detection>) -> Row {
    detections.sort_by(|a, b| a.top_left().x.total_cmp(&b.top_left().x));
    Row { detections }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::Point;

    fn det(text: &str, x: f32, y: f32) -> Detection {
        Detection {
            text: text.to_string(),
            quad: [
                Point { x, y },
                Point { x: x + 50.0, y },
                Point { x: x + 50.0, y: y + 18.0 },
                Point { x, y: y + 18.0 },
            ],
            confidence: None,
        }
    }

    #[test]
    fn test_empty_input_yields_no_rows() {
        assert!(group_into_rows(&[], DEFAULT_Y_TOLERANCE).is_empty());
    }

    #[test]
    fn test_groups_by_vertical_proximity() {
        let detections = vec![
            det("b", 200.0, 12.0),
            det("c", 100.0, 60.0),
            det("a", 50.0, 10.0),
            det("d", 300.0, 65.0),
        ];

        let rows = group_into_rows(&detections, DEFAULT_Y_TOLERANCE);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].joined_text(), "a b");
        assert_eq!(rows[1].joined_text(), "c d");
    }

    #[test]
    fn test_every_detection_lands_in_exactly_one_row() {
        let detections: Vec<Detection> = (0..40)
            .map(|i| det(&format!("t{i}"), (i % 7) as f32 * 90.0, (i / 7) as f32 * 55.0))
            .collect();

        let rows = group_into_rows(&detections, DEFAULT_Y_TOLERANCE);
        let total: usize = rows.iter().map(|r| r.detections.len()).sum();
        assert_eq!(total, detections.len());

        let mut seen: Vec<&str> = rows
            .iter()
            .flat_map(|r| r.detections.iter().map(|d| d.text.as_str()))
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), detections.len());
    }

    #[test]
    fn test_rows_are_sorted_left_to_right() {
        let detections = vec![
            det("right", 400.0, 20.0),
            det("left", 10.0, 25.0),
            det("middle", 200.0, 15.0),
        ];

        let rows = group_into_rows(&detections, DEFAULT_Y_TOLERANCE);
        assert_eq!(rows.len(), 1);

        let xs: Vec<f32> = rows[0]
            .detections
            .iter()
            .map(|d| d.top_left().x)
            .collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(rows[0].joined_text(), "left middle right");
    }

    #[test]
    fn test_anchor_is_first_detection_not_running_mean() {
        // y = 0, 18, 36: with tolerance 20 and the anchor fixed at y = 0,
        // the third detection (|36 - 0| > 20) starts a new row even though
        // it is within tolerance of the second.
        let detections = vec![det("a", 0.0, 0.0), det("b", 50.0, 18.0), det("c", 100.0, 36.0)];

        let rows = group_into_rows(&detections, 20.0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].joined_text(), "a b");
        assert_eq!(rows[1].joined_text(), "c");
    }

    #[test]
    fn test_custom_tolerance_merges_wider_bands() {
        let detections = vec![det("a", 0.0, 0.0), det("b", 50.0, 30.0)];

        assert_eq!(group_into_rows(&detections, 20.0).len(), 2);
        assert_eq!(group_into_rows(&detections, 40.0).len(), 1);
    }
}
