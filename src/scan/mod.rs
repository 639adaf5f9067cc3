//! Scan Pipeline
//!
//! Orchestrates one scan end-to-end: optional perspective correction,
//! zone cropping and binarization, OCR, field extraction, and the
//! disambiguation cascade against the card catalog. Exactly one scan is
//! in flight at a time; the session's busy flag rejects re-entry.
//!
//! The cascade is a linear state machine with no backtracking:
//! Set+Number (when the collector band yielded a key) falls through to
//! Name on any failure, Name tries ranked candidates in order, and the
//! first success enters Localization.

pub mod session;

pub use session::ScanSession;

use parking_lot::Mutex;
use tracing::{debug, debug_span, warn};

use crate::analysis::{self, ScanAttempt};
use crate::capture::CapturedFrame;
use crate::config::{AppConfig, ScanSettings};
use crate::error::ScanError;
use crate::lookup::{CardRecord, Catalog};
use crate::translate::Translate;
use crate::vision::ocr::Recognize;
use crate::vision::{perspective, preprocess, RecognitionZone, ZoneRect};

/// The capture-identify-translate pipeline.
///
/// Owns the OCR engine (the one expensive, session-scoped resource),
/// the catalog and translator clients, and the session state for one
/// scan-to-result cycle.
pub struct ScanPipeline<R, C, T>
where
    R: Recognize,
    C: Catalog,
    T: Translate,
{
    recognizer: R,
    catalog: C,
    translator: T,
    settings: ScanSettings,
    source_lang: String,
    target_lang: String,
    session: Mutex<ScanSession>,
}

impl<R, C, T> ScanPipeline<R, C, T>
where
    R: Recognize,
    C: Catalog,
    T: Translate,
{
    pub fn new(recognizer: R, catalog: C, translator: T, config: &AppConfig) -> Self {
        Self {
            recognizer,
            catalog,
            translator,
            settings: config.scan.clone(),
            source_lang: config.translation.source_lang.clone(),
            target_lang: config.translation.target_lang.clone(),
            session: Mutex::new(ScanSession::new()),
        }
    }

    /// Run one full scan: recognize, resolve, localize.
    ///
    /// Rejects re-entry while another scan or translate is outstanding.
    /// On success the resolved record is stored in the session and
    /// returned; on failure the session keeps the user-facing message.
    pub async fn scan(&self, frame: &CapturedFrame) -> Result<CardRecord, ScanError> {
        self.session.lock().begin_scan()?;

        let result = async {
            let attempt = self.recognize_attempt(frame)?;
            self.resolve(&attempt).await
        }
        .await;

        let mut session = self.session.lock();
        match &result {
            Ok(record) => session.finish(record.clone()),
            Err(err) => session.fail(err.to_string()),
        }
        result
    }

    /// Recognize text zones and extract candidates for the cascade.
    ///
    /// Runs the configured number of passes; passes beyond the first
    /// re-binarize at thresholds stepped around the base value and merge
    /// their candidates (near-duplicates suppressed, first-seen order
    /// kept). OCR failures on individual zones degrade to an emptier
    /// attempt rather than aborting the scan.
    pub fn recognize_attempt(&self, frame: &CapturedFrame) -> Result<ScanAttempt, ScanError> {
        let frame = perspective::apply(
            frame,
            self.settings.perspective_correction,
            self.settings.threshold,
        );

        let mut attempt = ScanAttempt::new();
        let span = debug_span!("scan", attempt = %attempt.id);
        let _enter = span.enter();

        for pass in 0..self.settings.passes.max(1) {
            let threshold = pass_threshold(self.settings.threshold, pass);
            debug!("Recognition pass {} at threshold {}", pass, threshold);

            if self.settings.full_frame {
                self.recognize_full_frame(&frame, threshold, &mut attempt);
            } else {
                self.recognize_bands(&frame, threshold, &mut attempt);
            }
        }

        debug!(
            "Attempt: collector={:?}, {} candidate(s)",
            attempt.collector,
            attempt.candidates.len()
        );
        Ok(attempt)
    }

    fn recognize_bands(&self, frame: &CapturedFrame, threshold: u8, attempt: &mut ScanAttempt) {
        let title_zone = RecognitionZone::new(self.settings.title_zone, threshold);
        match self.recognize_zone(frame, &title_zone) {
            Ok(text) => analysis::merge_candidates(
                &mut attempt.candidates,
                analysis::candidate_lines(&text, self.settings.candidate_min_len),
            ),
            Err(err) => debug!("Title band recognition failed: {err:#}"),
        }

        if attempt.collector.is_none() {
            let collector_zone = RecognitionZone::new(self.settings.collector_zone, threshold);
            match self.recognize_zone(frame, &collector_zone) {
                Ok(text) => attempt.collector = analysis::extract_collector_info(&text),
                Err(err) => debug!("Collector band recognition failed: {err:#}"),
            }
        }
    }

    fn recognize_full_frame(&self, frame: &CapturedFrame, threshold: u8, attempt: &mut ScanAttempt) {
        let zone = RecognitionZone::new(ZoneRect::full(), threshold);
        match self.recognize_zone(frame, &zone) {
            Ok(text) => {
                if attempt.collector.is_none() {
                    attempt.collector = analysis::extract_collector_info(&text);
                }
                analysis::merge_candidates(
                    &mut attempt.candidates,
                    analysis::candidate_lines(&text, self.settings.candidate_min_len),
                );
            }
            Err(err) => debug!("Full-frame recognition failed: {err:#}"),
        }
    }

    fn recognize_zone(
        &self,
        frame: &CapturedFrame,
        zone: &RecognitionZone,
    ) -> anyhow::Result<String> {
        let prepared = preprocess::prepare_zone(frame, zone);
        let recognized = self.recognizer.recognize(&prepared)?;
        Ok(recognized.text)
    }

    /// Run the disambiguation cascade over an attempt's candidates.
    ///
    /// Earliest successful strategy wins; there is no scoring across
    /// multiple possible matches and no backtracking once a state
    /// succeeds.
    pub async fn resolve(&self, attempt: &ScanAttempt) -> Result<CardRecord, ScanError> {
        // Nothing usable was extracted: tell the user to retake the
        // photo without spending a catalog call
        if attempt.is_empty() {
            return Err(ScanError::RecognitionQuality);
        }

        // Set+Number state
        if let Some(collector) = &attempt.collector {
            debug!(
                "Cascade: exact lookup {} {}",
                collector.set_code, collector.collector_number
            );
            match self
                .catalog
                .card_by_set_number(&collector.set_code, &collector.collector_number)
                .await
            {
                Ok(record) => return Ok(self.localize(record).await),
                // Compatibility fallback, not an error: the raw name
                // candidates get their turn
                Err(err) => debug!("Exact lookup failed ({err}); falling back to name search"),
            }
        }

        // Name state
        for candidate in &attempt.candidates {
            let refined = match self.catalog.autocomplete(candidate).await {
                Ok(suggestions) => match suggestions.into_iter().next() {
                    Some(top) => {
                        debug!("Autocomplete refined {:?} -> {:?}", candidate, top);
                        top
                    }
                    None => candidate.clone(),
                },
                Err(err) => {
                    debug!("Autocomplete failed for {:?} ({err}); using raw candidate", candidate);
                    candidate.clone()
                }
            };

            match self.catalog.card_by_fuzzy_name(&refined).await {
                Ok(record) => return Ok(self.localize(record).await),
                Err(err) => debug!("Fuzzy lookup failed for {:?}: {err}", refined),
            }
        }

        Err(ScanError::CardNotRecognized)
    }

    /// Localization state: swap in a printing in the target language.
    ///
    /// The first hit replaces the resolved record wholesale; a miss or a
    /// failed search silently keeps the original-language record.
    async fn localize(&self, record: CardRecord) -> CardRecord {
        if record.language_tag == self.target_lang {
            return record;
        }

        match self
            .catalog
            .localized_printings(&record.canonical_name, &self.target_lang)
            .await
        {
            Ok(printings) => match printings.into_iter().next() {
                Some(localized) => {
                    debug!(
                        "Replaced {:?} with {} printing",
                        localized.canonical_name, self.target_lang
                    );
                    localized
                }
                None => {
                    debug!(
                        "No {} printing of {:?}; keeping original",
                        self.target_lang, record.canonical_name
                    );
                    record
                }
            },
            Err(err) => {
                warn!("Localized search failed ({err}); keeping original record");
                record
            }
        }
    }

    /// Translate the displayed record's rules text and attach the result.
    ///
    /// Explicit user action only; never triggered by the scan itself.
    /// Idempotent: every invocation overwrites any prior translation. A
    /// failure leaves the record untouched.
    pub async fn translate(&self) -> Result<CardRecord, ScanError> {
        let source_text = {
            let mut session = self.session.lock();
            session.begin_translate()?;
            match session.record().and_then(|r| r.translation_source_text()) {
                Some(text) => text.to_string(),
                None => {
                    session.fail(ScanError::NothingToTranslate.to_string());
                    return Err(ScanError::NothingToTranslate);
                }
            }
        };

        let result = self
            .translator
            .translate(&source_text, &self.source_lang, &self.target_lang)
            .await;

        let mut session = self.session.lock();
        match result {
            Ok(translated) => match session.record().cloned() {
                Some(mut record) => {
                    record.translated_text = Some(translated);
                    session.finish(record.clone());
                    Ok(record)
                }
                // The record was dismissed while the request was in
                // flight; there is nothing to attach the translation to
                None => {
                    session.fail(ScanError::NothingToTranslate.to_string());
                    Err(ScanError::NothingToTranslate)
                }
            },
            Err(err) => {
                let err: ScanError = err.into();
                session.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// The currently displayed record, if any
    pub fn current_record(&self) -> Option<CardRecord> {
        self.session.lock().record().cloned()
    }

    /// Last user-facing error message, if the previous action failed
    pub fn last_error(&self) -> Option<String> {
        self.session.lock().last_error().map(String::from)
    }

    /// Dismiss the displayed result, destroying the record
    pub fn dismiss(&self) {
        self.session.lock().dismiss();
    }
}

/// Threshold for the given pass: the base value first, then steps of 20
/// alternating below and above it
fn pass_threshold(base: u8, pass: u32) -> u8 {
    if pass == 0 {
        return base;
    }
    let step = 20 * ((pass as i32 + 1) / 2);
    let value = if pass % 2 == 1 {
        base as i32 - step
    } else {
        base as i32 + step
    };
    value.clamp(1, 254) as u8
}
