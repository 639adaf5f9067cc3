//! Frame data structures for captured card images

use image::RgbaImage;

/// A captured frame holding the raw bitmap of a card photo
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels (native resolution, not display resolution)
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl CapturedFrame {
    /// Create a new captured frame from raw RGBA data
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// View the frame as an `image` buffer for geometric transforms
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Build a frame from an `image` buffer
    pub fn from_rgba_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_image_round_trip() {
        let data = vec![
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 0, 255, 255, // blue
            128, 128, 128, 255, // gray
        ];
        let frame = CapturedFrame::new(data.clone(), 2, 2);
        let img = frame.to_rgba_image().unwrap();
        let back = CapturedFrame::from_rgba_image(img);
        assert_eq!(back.dimensions(), (2, 2));
        assert_eq!(back.data, data);
    }

    #[test]
    fn test_mismatched_buffer_is_rejected() {
        let frame = CapturedFrame::new(vec![0; 4], 2, 2);
        assert!(frame.to_rgba_image().is_none());
    }
}
