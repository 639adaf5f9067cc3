//! Zone cropping and brightness binarization
//!
//! One-pass, deterministic transforms that prepare a card region for the
//! OCR engine: crop a fractional zone out of the native-resolution frame,
//! then force every pixel to pure black or white against a brightness
//! cutoff. Binarization is idempotent; re-applying it to an already
//! binarized image changes nothing.

use tracing::debug;

use crate::capture::CapturedFrame;
use crate::vision::RecognitionZone;

/// Crop a fractional zone out of a frame.
///
/// Coordinates are resolved against the frame's native resolution and
/// clamped to its extent; out-of-bounds geometry shrinks the crop rather
/// than erroring.
pub fn crop_zone(frame: &CapturedFrame, zone: &RecognitionZone) -> CapturedFrame {
    let (img_w, img_h) = frame.dimensions();

    let x = ((zone.rect.x.max(0.0) * img_w as f32) as u32).min(img_w);
    let y = ((zone.rect.y.max(0.0) * img_h as f32) as u32).min(img_h);
    let width = ((zone.rect.width.max(0.0) * img_w as f32) as u32).min(img_w - x);
    let height = ((zone.rect.height.max(0.0) * img_h as f32) as u32).min(img_h - y);

    let mut region = Vec::with_capacity((width * height * 4) as usize);
    for row in y..(y + height) {
        let start = ((row * img_w + x) * 4) as usize;
        let end = start + (width * 4) as usize;
        if end <= frame.data.len() {
            region.extend_from_slice(&frame.data[start..end]);
        }
    }

    debug!(
        "Cropped zone {:?} -> {}x{} at ({}, {})",
        zone.rect, width, height, x, y
    );

    CapturedFrame::new(region, width, height)
}

/// Binarize RGBA data in place against a brightness cutoff.
///
/// Each pixel's luminance (0.299 R + 0.587 G + 0.114 B) is compared to the
/// threshold; at or above becomes pure white, below becomes pure black.
/// Alpha is unchanged.
pub fn binarize(data: &mut [u8], threshold: u8) {
    for chunk in data.chunks_exact_mut(4) {
        let luma = 0.299 * chunk[0] as f32 + 0.587 * chunk[1] as f32 + 0.114 * chunk[2] as f32;
        let value = if luma >= threshold as f32 { 255 } else { 0 };
        chunk[0] = value;
        chunk[1] = value;
        chunk[2] = value;
    }
}

/// Crop a zone and binarize it with the zone's threshold
pub fn prepare_zone(frame: &CapturedFrame, zone: &RecognitionZone) -> CapturedFrame {
    let mut region = crop_zone(frame, zone);
    binarize(&mut region.data, zone.threshold);
    region
}
