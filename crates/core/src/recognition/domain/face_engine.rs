use crate::shared::bbox::BBox;
use crate::shared::frame::Frame;

/// A face found in a frame, together with its identity embedding.
#[derive(Clone, Debug)]
pub struct FaceDetection {
    pub bbox: BBox,
    /// L2-normalized embedding vector.
    pub embedding: Vec<f32>,
}

/// Finds faces in a frame and computes an identity embedding for each.
///
/// Implementations may be stateful (e.g. hold inference sessions),
/// hence `&mut self`.
pub trait FaceEngine: Send {
    fn detect_faces(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>>;
}
