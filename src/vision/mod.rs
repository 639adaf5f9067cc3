//! Vision/OCR Layer
//!
//! Turns a captured card photo into recognized text: fixed-zone cropping,
//! brightness binarization, optional perspective correction, and the OCR
//! engine adapter.

pub mod models;
pub mod ocr;
pub mod perspective;
pub mod preprocess;

pub use models::{ModelKind, ModelManager};
pub use ocr::{Recognize, TextExtractor};

use serde::{Deserialize, Serialize};

/// A rectangle in fractional coordinates (0.0-1.0) of the native capture
/// resolution. Fractions keep zone geometry correct under arbitrary
/// camera resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ZoneRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The name/title band across the top of a card
    pub const fn title_band() -> Self {
        Self::new(0.04, 0.03, 0.75, 0.10)
    }

    /// The left-aligned collector-info band along the bottom of a card
    pub const fn collector_band() -> Self {
        Self::new(0.0, 0.88, 0.45, 0.12)
    }

    /// The whole frame
    pub const fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// A rectangular sub-region of a captured bitmap plus the binarization
/// threshold to apply to it. Transient; recomputed per scan attempt.
#[derive(Debug, Clone, Copy)]
pub struct RecognitionZone {
    pub rect: ZoneRect,
    pub threshold: u8,
}

impl RecognitionZone {
    pub fn new(rect: ZoneRect, threshold: u8) -> Self {
        Self { rect, threshold }
    }
}

/// Free-form text recognized from one zone
#[derive(Debug, Clone)]
pub struct RecognizedText {
    /// Text exactly as the OCR engine produced it
    pub text: String,
    /// Confidence on a 0-100 scale, when the backend reports one
    pub confidence: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bands_stay_in_unit_square() {
        for rect in [
            ZoneRect::title_band(),
            ZoneRect::collector_band(),
            ZoneRect::full(),
        ] {
            assert!(rect.x >= 0.0 && rect.x + rect.width <= 1.0);
            assert!(rect.y >= 0.0 && rect.y + rect.height <= 1.0);
        }
    }

    #[test]
    fn test_bands_cover_identifying_regions() {
        // Title band sits in the top ~15%, collector band in the bottom ~15%
        assert!(ZoneRect::title_band().y + ZoneRect::title_band().height <= 0.15);
        assert!(ZoneRect::collector_band().y >= 0.85);
        // Collector info is left-aligned
        assert_eq!(ZoneRect::collector_band().x, 0.0);
    }
}
