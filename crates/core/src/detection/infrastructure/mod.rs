pub mod onnx_violation_detector;
pub mod skip_frame_detector;
