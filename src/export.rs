use std::path::Path;

use egui::ColorImage;
use image::{ImageFormat, RgbaImage};
use tracing::info;

use crate::error::ExportError;

/// Writes a viewport screenshot as PNG.
pub fn save_snapshot(image: &ColorImage, path: &Path) -> Result<(), ExportError> {
    let [width, height] = image.size;
    let bytes: Vec<u8> = image.pixels.iter().flat_map(|c| c.to_array()).collect();
    let buffer = RgbaImage::from_raw(width as u32, height as u32, bytes)
        .filter(|buffer| buffer.width() > 0 && buffer.height() > 0)
        .ok_or(ExportError::EmptyImage)?;
    buffer.save_with_format(path, ImageFormat::Png)?;
    info!(path = %path.display(), width, height, "snapshot exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Color32;

    #[test]
    fn writes_png_with_screenshot_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let shot = ColorImage::new([4, 3], Color32::from_rgb(16, 185, 129));
        save_snapshot(&shot, &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn empty_screenshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let shot = ColorImage::new([0, 0], Color32::BLACK);
        assert!(matches!(
            save_snapshot(&shot, &dir.path().join("empty.png")),
            Err(ExportError::EmptyImage)
        ));
    }
}
