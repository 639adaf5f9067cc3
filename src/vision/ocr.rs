//! OCR engine adapter
//!
//! Wraps the ocrs engine behind a uniform `recognize(bitmap) -> text`
//! interface. The engine loads its detection and recognition models once
//! at construction (the expensive part) and is reused across every zone
//! of every scan; dropping the extractor releases the models.

use anyhow::{Context, Result};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::Path;
use tracing::debug;

use crate::capture::CapturedFrame;
use crate::error::ScanError;
use crate::vision::models::ModelKind;
use crate::vision::RecognizedText;

/// Recognition seam the pipeline drives; implemented by [`TextExtractor`]
/// and by in-memory stubs in tests.
pub trait Recognize: Send + Sync {
    /// Recognize text in a (pre-processed) bitmap region
    fn recognize(&self, frame: &CapturedFrame) -> Result<RecognizedText>;
}

/// Text extractor backed by the ocrs engine
pub struct TextExtractor {
    engine: OcrEngine,
}

impl Recognize for TextExtractor {
    fn recognize(&self, frame: &CapturedFrame) -> Result<RecognizedText> {
        TextExtractor::recognize(self, frame)
    }
}

impl TextExtractor {
    /// Load models from the given directory and initialize the engine.
    ///
    /// Initialization failure (models missing because they could not be
    /// fetched, or corrupt on disk) is fatal for the session; callers
    /// surface it as a "scanner unavailable" state rather than retrying.
    pub fn new(models_dir: &Path) -> Result<Self, ScanError> {
        Self::init(models_dir).map_err(ScanError::ExtractorUnavailable)
    }

    fn init(models_dir: &Path) -> Result<Self> {
        let detection_path = models_dir.join(ModelKind::Detection.filename());
        let recognition_path = models_dir.join(ModelKind::Recognition.filename());

        debug!("Loading OCR detection model from {:?}", detection_path);
        let detection_model = Model::load_file(&detection_path)
            .with_context(|| format!("Failed to load detection model from {:?}", detection_path))?;

        debug!("Loading OCR recognition model from {:?}", recognition_path);
        let recognition_model = Model::load_file(&recognition_path).with_context(|| {
            format!("Failed to load recognition model from {:?}", recognition_path)
        })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .context("Failed to create OCR engine")?;

        debug!("OCR engine initialized");
        Ok(Self { engine })
    }

    /// Recognize text in a frame.
    ///
    /// Returns the recognized lines joined top-to-bottom, exactly as the
    /// engine produced them; cleaning happens downstream. The ocrs
    /// backend does not report a usable confidence score, so confidence
    /// is `None`.
    pub fn recognize(&self, frame: &CapturedFrame) -> Result<RecognizedText> {
        if frame.data.is_empty() || frame.width == 0 || frame.height == 0 {
            return Ok(RecognizedText {
                text: String::new(),
                confidence: None,
            });
        }

        // ocrs expects tightly packed RGB
        let rgb = rgba_to_rgb(&frame.data);
        let img_source = ImageSource::from_bytes(&rgb, (frame.width, frame.height))
            .context("Failed to create image source")?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .context("Failed to prepare OCR input")?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .context("Failed to detect words")?;
        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);
        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .context("Failed to recognize text")?;

        let mut lines = Vec::new();
        for line in line_texts.iter().flatten() {
            let text = line.to_string();
            if !text.trim().is_empty() {
                lines.push(text);
            }
        }

        debug!(
            "Recognized {} text lines in {}x{} region",
            lines.len(),
            frame.width,
            frame.height
        );

        Ok(RecognizedText {
            text: lines.join("\n"),
            confidence: None,
        })
    }
}

/// Drop the alpha channel from RGBA data
fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for chunk in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }
    rgb
}
