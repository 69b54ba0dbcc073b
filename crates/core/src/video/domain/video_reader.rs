use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Pull-based source of decoded frames.
///
/// Opening the source happens at construction time, so a reader that
/// exists always has metadata, and `Ok(None)` from `next_frame` always
/// means the stream is exhausted, never that the open failed.
/// Implementations release their capture handle on drop.
pub trait VideoReader: Send {
    fn metadata(&self) -> &VideoMetadata;

    /// Decodes and returns the next frame in presentation order.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
}
