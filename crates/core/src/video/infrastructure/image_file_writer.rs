use std::path::Path;

use crate::video::domain::image_writer::ImageWriter;

/// Writes RGB buffers to image files using the `image` crate.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        rgb_data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = image::RgbImage::from_raw(width, height, rgb_data.to_vec())
            .ok_or("buffer does not match the given dimensions")?;
        img.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            data.extend_from_slice(&rgb);
        }
        data
    }

    #[test]
    fn test_write_creates_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faces").join("crop.jpg");
        let data = solid_rgb(40, 40, [128, 64, 32]);

        ImageFileWriter::new().write(&path, &data, 40, 40).unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_roundtrip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let data = solid_rgb(50, 50, [50, 100, 200]);

        ImageFileWriter::new().write(&path, &data, 50, 50).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (50, 50));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_mismatched_buffer_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let data = vec![0u8; 10];

        assert!(ImageFileWriter::new().write(&path, &data, 50, 50).is_err());
    }
}
