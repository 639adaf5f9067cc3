//! Image Acquisition Layer
//!
//! Loads card photos from files or in-memory bytes into RGBA frames.
//! Frames always carry the native capture resolution; zone geometry
//! downstream is computed against these dimensions, never against
//! whatever size the image happened to be displayed at.

pub mod frame;

pub use frame::CapturedFrame;

use std::path::Path;

use tracing::debug;

use crate::error::ScanError;

/// Load a card photo from a file path
pub fn load_frame(path: &Path) -> Result<CapturedFrame, ScanError> {
    let img = image::open(path)?.into_rgba8();
    let (width, height) = img.dimensions();
    debug!("Loaded {:?}: {}x{}", path, width, height);
    Ok(CapturedFrame::from_rgba_image(img))
}

/// Decode a card photo from raw encoded bytes (PNG, JPEG, ...)
pub fn frame_from_bytes(bytes: &[u8]) -> Result<CapturedFrame, ScanError> {
    let img = image::load_from_memory(bytes)?.into_rgba8();
    let (width, height) = img.dimensions();
    debug!("Decoded in-memory image: {}x{}", width, height);
    Ok(CapturedFrame::from_rgba_image(img))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_frame_missing_file() {
        let result = load_frame(Path::new("/nonexistent/card.png"));
        assert!(matches!(result, Err(ScanError::Acquisition(_))));
    }

    #[test]
    fn test_frame_from_bytes_rejects_garbage() {
        let result = frame_from_bytes(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(result, Err(ScanError::Acquisition(_))));
    }

    #[test]
    fn test_frame_from_bytes_decodes_png() {
        // Encode a tiny image, then decode it back through the acquisition path
        let img = image::RgbaImage::from_pixel(4, 6, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();

        let frame = frame_from_bytes(&bytes).unwrap();
        assert_eq!(frame.dimensions(), (4, 6));
    }
}
