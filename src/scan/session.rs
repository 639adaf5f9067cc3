//! Session-scoped scan state
//!
//! One explicit value object holds what the original kept in ambient
//! mutable UI fields: the busy flag that blocks re-entrant scan/translate
//! actions, the last user-facing error, and the currently displayed
//! record. State changes only through the discrete transitions below.

use crate::error::ScanError;
use crate::lookup::CardRecord;

/// Mutable state for one scan-to-result cycle
#[derive(Debug, Default)]
pub struct ScanSession {
    /// An action (scan or translate) is in flight; a flag, not a queue
    busy: bool,
    /// Last user-facing error message, ephemeral
    last_error: Option<String>,
    /// Currently displayed record, if a scan resolved one
    record: Option<CardRecord>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an action is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Last user-facing error, if the previous action failed
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The currently displayed record
    pub fn record(&self) -> Option<&CardRecord> {
        self.record.as_ref()
    }

    /// Enter a scan: rejects re-entry, then starts a fresh record.
    /// Any previously attached translation dies with the old record.
    pub(crate) fn begin_scan(&mut self) -> Result<(), ScanError> {
        if self.busy {
            return Err(ScanError::Busy);
        }
        self.busy = true;
        self.record = None;
        self.last_error = None;
        Ok(())
    }

    /// Enter a translate action: rejects re-entry, keeps the record
    pub(crate) fn begin_translate(&mut self) -> Result<(), ScanError> {
        if self.busy {
            return Err(ScanError::Busy);
        }
        self.busy = true;
        self.last_error = None;
        Ok(())
    }

    /// Complete an action with a (new or updated) record
    pub(crate) fn finish(&mut self, record: CardRecord) {
        self.busy = false;
        self.record = Some(record);
    }

    /// Complete an action with a user-facing error. The record is left
    /// as-is: a failed translation does not disturb the displayed card.
    pub(crate) fn fail(&mut self, message: String) {
        self.busy = false;
        self.last_error = Some(message);
    }

    /// Dismiss the displayed result
    pub fn dismiss(&mut self) {
        self.record = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> CardRecord {
        serde_json::from_str(&format!(r#"{{"name": "{}", "lang": "en"}}"#, name)).unwrap()
    }

    #[test]
    fn test_begin_scan_rejects_reentry() {
        let mut session = ScanSession::new();
        session.begin_scan().unwrap();
        assert!(matches!(session.begin_scan(), Err(ScanError::Busy)));
        assert!(matches!(session.begin_translate(), Err(ScanError::Busy)));
    }

    #[test]
    fn test_new_scan_clears_previous_record() {
        let mut session = ScanSession::new();
        session.begin_scan().unwrap();
        session.finish(record("Opt"));
        assert!(session.record().is_some());

        session.begin_scan().unwrap();
        assert!(session.record().is_none(), "a new scan starts a fresh record");
    }

    #[test]
    fn test_translate_keeps_record_on_failure() {
        let mut session = ScanSession::new();
        session.begin_scan().unwrap();
        session.finish(record("Opt"));

        session.begin_translate().unwrap();
        session.fail("translation failed".to_string());

        assert_eq!(session.record().unwrap().canonical_name, "Opt");
        assert_eq!(session.last_error(), Some("translation failed"));
        assert!(!session.is_busy());
    }

    #[test]
    fn test_dismiss_destroys_record() {
        let mut session = ScanSession::new();
        session.begin_scan().unwrap();
        session.finish(record("Opt"));
        session.dismiss();
        assert!(session.record().is_none());
    }
}
