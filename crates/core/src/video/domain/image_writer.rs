use std::path::Path;

/// Writes a tightly packed RGB buffer to an image file.
pub trait ImageWriter: Send {
    /// The format follows the file extension; parent directories are
    /// created as needed.
    fn write(
        &self,
        path: &Path,
        rgb_data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
