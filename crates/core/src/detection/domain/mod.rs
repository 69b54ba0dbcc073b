pub mod annotator;
pub mod violation_detector;
