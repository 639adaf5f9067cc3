//! Optional perspective correction
//!
//! An alternative pre-processing stage behind the same contract as fixed
//! zone cropping: frame in, frame out. Detects the bright card
//! quadrilateral against a darker background and warps it to a
//! fronto-parallel frame. When no plausible quad is found the original
//! frame is returned untouched, so enabling this stage can never make a
//! scan worse than the fixed-zone path.

use image::Rgba;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::debug;

use crate::capture::CapturedFrame;

/// Sampling stride used while hunting for card corners
const SAMPLE_STEP: u32 = 4;

/// A detected quad must cover at least this share of the frame
const MIN_AREA_RATIO: f32 = 0.20;

/// ...and at most this share (otherwise the card already fills the photo
/// and warping would only add resampling blur)
const MAX_AREA_RATIO: f32 = 0.90;

/// Apply perspective correction when enabled, otherwise pass the frame
/// through unchanged.
pub fn apply(frame: &CapturedFrame, enabled: bool, threshold: u8) -> CapturedFrame {
    if !enabled {
        return frame.clone();
    }
    match correct(frame, threshold) {
        Some(corrected) => corrected,
        None => {
            debug!("No plausible card boundary found; using original frame");
            frame.clone()
        }
    }
}

/// Detect the card boundary and warp it upright.
///
/// Corner detection uses the classic extreme-point heuristic over bright
/// pixels: minimal x+y is the top-left corner, maximal x+y bottom-right,
/// maximal x-y top-right, minimal x-y bottom-left.
pub fn correct(frame: &CapturedFrame, threshold: u8) -> Option<CapturedFrame> {
    let corners = find_card_corners(frame, threshold)?;
    let [tl, tr, br, bl] = corners;

    let area = quad_area(&corners);
    let frame_area = (frame.width * frame.height) as f32;
    let ratio = area / frame_area;
    if !(MIN_AREA_RATIO..=MAX_AREA_RATIO).contains(&ratio) {
        debug!("Card quad covers {:.0}% of frame; skipping warp", ratio * 100.0);
        return None;
    }

    // Output dimensions from the average edge lengths of the quad
    let out_w = ((distance(tl, tr) + distance(bl, br)) / 2.0).round() as u32;
    let out_h = ((distance(tl, bl) + distance(tr, br)) / 2.0).round() as u32;
    if out_w < 16 || out_h < 16 {
        return None;
    }

    let projection = Projection::from_control_points(
        corners,
        [
            (0.0, 0.0),
            (out_w as f32, 0.0),
            (out_w as f32, out_h as f32),
            (0.0, out_h as f32),
        ],
    )?;

    let src = frame.to_rgba_image()?;
    let mut out = image::RgbaImage::new(out_w, out_h);
    warp_into(
        &src,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 255]),
        &mut out,
    );

    debug!(
        "Perspective corrected {}x{} -> {}x{}",
        frame.width, frame.height, out_w, out_h
    );

    Some(CapturedFrame::from_rgba_image(out))
}

/// Find the four corners of the bright card region, ordered
/// [top-left, top-right, bottom-right, bottom-left].
fn find_card_corners(frame: &CapturedFrame, threshold: u8) -> Option<[(f32, f32); 4]> {
    let mut tl: Option<(u32, u32, i64)> = None; // min x+y
    let mut br: Option<(u32, u32, i64)> = None; // max x+y
    let mut tr: Option<(u32, u32, i64)> = None; // max x-y
    let mut bl: Option<(u32, u32, i64)> = None; // min x-y
    let mut bright = 0u64;

    let mut y = 0;
    while y < frame.height {
        let mut x = 0;
        while x < frame.width {
            let idx = ((y * frame.width + x) * 4) as usize;
            let luma = 0.299 * frame.data[idx] as f32
                + 0.587 * frame.data[idx + 1] as f32
                + 0.114 * frame.data[idx + 2] as f32;
            if luma >= threshold as f32 {
                bright += 1;
                let sum = x as i64 + y as i64;
                let diff = x as i64 - y as i64;
                if tl.map_or(true, |(_, _, v)| sum < v) {
                    tl = Some((x, y, sum));
                }
                if br.map_or(true, |(_, _, v)| sum > v) {
                    br = Some((x, y, sum));
                }
                if tr.map_or(true, |(_, _, v)| diff > v) {
                    tr = Some((x, y, diff));
                }
                if bl.map_or(true, |(_, _, v)| diff < v) {
                    bl = Some((x, y, diff));
                }
            }
            x += SAMPLE_STEP;
        }
        y += SAMPLE_STEP;
    }

    // Too few bright samples means there is no card-sized region to find
    let sampled = ((frame.width / SAMPLE_STEP).max(1) * (frame.height / SAMPLE_STEP).max(1)) as u64;
    if bright < sampled / 20 {
        return None;
    }

    let (tl, tr, br, bl) = (tl?, tr?, br?, bl?);
    let corners = [
        (tl.0 as f32, tl.1 as f32),
        (tr.0 as f32, tr.1 as f32),
        (br.0 as f32, br.1 as f32),
        (bl.0 as f32, bl.1 as f32),
    ];

    // Degenerate quads (corners collapsing together) are not a card
    let min_edge = (frame.width.min(frame.height) as f32) * 0.1;
    for i in 0..4 {
        if distance(corners[i], corners[(i + 1) % 4]) < min_edge {
            return None;
        }
    }

    Some(corners)
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Shoelace area of a quad
fn quad_area(corners: &[(f32, f32); 4]) -> f32 {
    let mut sum = 0.0;
    for i in 0..4 {
        let (x0, y0) = corners[i];
        let (x1, y1) = corners[(i + 1) % 4];
        sum += x0 * y1 - x1 * y0;
    }
    (sum / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A dark frame with a bright axis-aligned rectangle in the middle
    fn frame_with_card(w: u32, h: u32, card_x: u32, card_y: u32, card_w: u32, card_h: u32) -> CapturedFrame {
        let mut data = vec![0u8; (w * h * 4) as usize];
        for chunk in data.chunks_exact_mut(4) {
            chunk[3] = 255;
        }
        for y in card_y..(card_y + card_h) {
            for x in card_x..(card_x + card_w) {
                let idx = ((y * w + x) * 4) as usize;
                data[idx] = 230;
                data[idx + 1] = 230;
                data[idx + 2] = 230;
            }
        }
        CapturedFrame::new(data, w, h)
    }

    #[test]
    fn test_detects_centered_card() {
        let frame = frame_with_card(200, 280, 40, 40, 120, 200);
        let corrected = correct(&frame, 140).expect("card should be detected");
        // Output roughly matches the card's size, not the frame's
        assert!(corrected.width >= 100 && corrected.width <= 140);
        assert!(corrected.height >= 180 && corrected.height <= 220);
    }

    #[test]
    fn test_disabled_passes_frame_through() {
        let frame = frame_with_card(100, 100, 20, 20, 60, 60);
        let out = apply(&frame, false, 140);
        assert_eq!(out.data, frame.data);
    }

    #[test]
    fn test_all_dark_frame_falls_back() {
        let frame = frame_with_card(100, 100, 0, 0, 0, 0);
        assert!(correct(&frame, 140).is_none());
        // apply() still returns a usable frame
        let out = apply(&frame, true, 140);
        assert_eq!(out.dimensions(), frame.dimensions());
    }

    #[test]
    fn test_full_bright_frame_falls_back() {
        // Card already fills the photo; warping would only resample
        let frame = frame_with_card(100, 100, 0, 0, 100, 100);
        assert!(correct(&frame, 140).is_none());
    }

    #[test]
    fn test_quad_area() {
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!((quad_area(&square) - 100.0).abs() < f32::EPSILON);
    }
}
