pub const FACE_DETECT_MODEL_NAME: &str = "yolov8n-face.onnx";
pub const FACE_DETECT_MODEL_URL: &str =
    "https://github.com/vigil-vision/models/releases/download/v0.1.0/yolov8n-face.onnx";

pub const FACE_EMBED_MODEL_NAME: &str = "w600k_r50.onnx";
pub const FACE_EMBED_MODEL_URL: &str =
    "https://github.com/vigil-vision/models/releases/download/v0.1.0/w600k_r50.onnx";

/// Minimum detection confidence kept by default.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// IoU threshold for non-maximum suppression.
pub const DEFAULT_IOU: f32 = 0.45;

/// Maximum gap (seconds) between same-class detections folded into one event.
pub const DEFAULT_WINDOW_SECONDS: f64 = 2.0;

/// Fallback capture geometry when a source reports none.
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;
pub const DEFAULT_FPS: f64 = 60.0;

pub const REPORTS_DIR: &str = "reports";
pub const FACES_SUBDIR: &str = "faces";

/// Extensions routed to the still-image reader instead of the demuxer.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
