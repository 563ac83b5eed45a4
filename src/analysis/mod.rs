//! Analysis Layer
//!
//! Everything between raw OCR detections and the final text output:
//! - row reconstruction (spatial clustering of detections)
//! - record parsing (field extraction heuristics per row)
//! - record rendering (the fixed-order driver block)

pub mod parser;
pub mod render;
pub mod rows;

pub use parser::RecordParser;
pub use render::render_record;
pub use rows::group_into_rows;
