use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// One-line summary for progress output and logs.
    pub fn describe(&self) -> String {
        format!(
            "{}x{} @ {:.2} fps, {} frames, codec {}",
            self.width, self.height, self.fps, self.total_frames, self.codec
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let meta = VideoMetadata {
            width: 640,
            height: 480,
            fps: 60.0,
            total_frames: 3600,
            codec: "mpeg4".to_string(),
            source_path: Some(PathBuf::from("/tmp/classroom.mp4")),
        };
        assert_eq!(meta.width, 640);
        assert_eq!(meta.height, 480);
        assert_eq!(meta.fps, 60.0);
        assert_eq!(meta.total_frames, 3600);
        assert_eq!(meta.codec, "mpeg4");
        assert_eq!(meta.source_path, Some(PathBuf::from("/tmp/classroom.mp4")));
    }

    #[test]
    fn test_describe() {
        let meta = VideoMetadata {
            width: 1280,
            height: 720,
            fps: 29.97,
            total_frames: 450,
            codec: "h264".to_string(),
            source_path: None,
        };
        assert_eq!(meta.describe(), "1280x720 @ 29.97 fps, 450 frames, codec h264");
    }

    #[test]
    fn test_image_metadata() {
        // Still images are represented as single-frame video with fps=0
        let meta = VideoMetadata {
            width: 800,
            height: 600,
            fps: 0.0,
            total_frames: 1,
            codec: "png".to_string(),
            source_path: None,
        };
        assert_eq!(meta.total_frames, 1);
        assert_eq!(meta.fps, 0.0);
    }
}
