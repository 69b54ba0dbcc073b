use crate::shared::bbox::BBox;
use crate::shared::frame::Frame;
use crate::violations::class::ViolationClass;

/// One violation instance found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class: ViolationClass,
    pub confidence: f32,
    pub bbox: BBox,
}

/// Domain interface for violation detection.
///
/// Implementations return only detections at or above the caller's
/// confidence threshold, with classes from the configured table; a clean
/// frame yields an empty list, not an error. Implementations may be
/// stateful (e.g. frame-skip caching), hence `&mut self`.
pub trait ViolationDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
