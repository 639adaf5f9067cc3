//! Error taxonomy for the scan pipeline
//!
//! Remote-call failures are converted at their call sites into either a
//! cascade fallback or one of these user-facing variants; nothing bubbles
//! up as an unhandled fault.

use thiserror::Error;

use crate::lookup::LookupError;
use crate::translate::TranslationError;

/// Top-level scan pipeline error
#[derive(Debug, Error)]
pub enum ScanError {
    /// The source image could not be loaded or decoded
    #[error("failed to acquire image: {0}")]
    Acquisition(#[from] image::ImageError),

    /// The OCR engine could not be initialized (missing or corrupt models)
    #[error("scanner unavailable: {0}")]
    ExtractorUnavailable(anyhow::Error),

    /// No usable text was extracted from the capture
    #[error("no usable text recognized; improve lighting, focus, or framing and rescan")]
    RecognitionQuality,

    /// Every lookup strategy in the cascade was exhausted
    #[error("card not recognized; improve lighting, focus, or framing and rescan")]
    CardNotRecognized,

    /// A scan or translate action is already in flight
    #[error("another scan is already in progress")]
    Busy,

    /// Translate was invoked with no resolved card, or the card carries
    /// no rules text
    #[error("no rules text available to translate")]
    NothingToTranslate,

    /// The translate action failed; the displayed record is unchanged
    #[error(transparent)]
    Translation(#[from] TranslationError),
}

impl ScanError {
    /// True for errors the user can recover from by simply retrying
    /// (better photo, different card). Extractor failures are fatal for
    /// the session until the underlying cause is resolved.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ScanError::ExtractorUnavailable(_))
    }
}

impl From<LookupError> for ScanError {
    /// A lookup failure that escapes the cascade means every strategy was
    /// tried; by then it is indistinguishable from "card not recognized".
    fn from(_: LookupError) -> Self {
        ScanError::CardNotRecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ScanError::RecognitionQuality.is_recoverable());
        assert!(ScanError::CardNotRecognized.is_recoverable());
        assert!(ScanError::Busy.is_recoverable());
        assert!(
            !ScanError::ExtractorUnavailable(anyhow::anyhow!("models missing")).is_recoverable()
        );
    }

    #[test]
    fn test_lookup_error_converts_to_not_recognized() {
        let err: ScanError = LookupError::NotFound.into();
        assert!(matches!(err, ScanError::CardNotRecognized));
    }
}
