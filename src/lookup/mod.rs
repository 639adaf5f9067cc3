//! Card Lookup Layer
//!
//! Read-only, unauthenticated catalog queries: exact card by
//! set+collector number, fuzzy card by name, name autocomplete, and the
//! localized-printing search. Any non-success status or malformed body is
//! a lookup failure; nothing here retries automatically.

pub mod client;
pub mod record;

pub use client::CatalogClient;
pub use record::CardRecord;

use async_trait::async_trait;
use thiserror::Error;

/// Catalog lookup failure
#[derive(Debug, Error)]
pub enum LookupError {
    /// The catalog has no card for this key
    #[error("card not found in catalog")]
    NotFound,

    /// The request exceeded its deadline
    #[error("catalog request timed out")]
    Timeout,

    /// Transport-level failure
    #[error("catalog request failed: {0}")]
    Http(reqwest::Error),

    /// The catalog answered with a non-success status
    #[error("catalog returned status {0}")]
    Status(reqwest::StatusCode),

    /// The body did not parse as the expected shape
    #[error("malformed catalog response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupError::Timeout
        } else {
            LookupError::Http(err)
        }
    }
}

/// The catalog operations the disambiguation cascade needs.
///
/// The HTTP client implements this for the real catalog; tests drive the
/// cascade with in-memory fakes.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Exact lookup by (set code, collector number)
    async fn card_by_set_number(
        &self,
        set_code: &str,
        collector_number: &str,
    ) -> Result<CardRecord, LookupError>;

    /// Fuzzy lookup by (possibly OCR-mangled) card name
    async fn card_by_fuzzy_name(&self, name: &str) -> Result<CardRecord, LookupError>;

    /// Name suggestions for a raw candidate string
    async fn autocomplete(&self, query: &str) -> Result<Vec<String>, LookupError>;

    /// Printings of the exact canonical name in the given language.
    /// An empty result is a localization miss, not an error.
    async fn localized_printings(
        &self,
        canonical_name: &str,
        language_tag: &str,
    ) -> Result<Vec<CardRecord>, LookupError>;
}
