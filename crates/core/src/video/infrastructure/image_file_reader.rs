use std::path::Path;
use std::time::Duration;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Adapts a still image to the [`VideoReader`] interface.
///
/// The image counts as a one-frame video with `fps = 0` and
/// `total_frames = 1`, so photos flow through the same monitoring path
/// as videos.
pub struct ImageFileReader {
    metadata: VideoMetadata,
    frame: Option<Frame>,
}

impl ImageFileReader {
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let frame = load_frame(path)?;
        let metadata = VideoMetadata {
            width: frame.width(),
            height: frame.height(),
            fps: 0.0,
            total_frames: 1,
            codec: "image".to_string(),
            source_path: Some(path.to_path_buf()),
        };
        Ok(Self {
            metadata,
            frame: Some(frame),
        })
    }
}

impl VideoReader for ImageFileReader {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        Ok(self.frame.take())
    }
}

/// Loads a still image as a single RGB frame (index 0, timestamp zero).
pub fn load_frame(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, 0, Duration::ZERO))
}
