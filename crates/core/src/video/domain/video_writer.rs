use crate::shared::frame::Frame;

/// Abstracts video encoding so the monitoring path can write annotated
/// output without depending on a specific codec library.
pub trait VideoWriter: Send {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes the encoder and finalizes the container. Idempotent;
    /// writing after `finish` is an error.
    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
