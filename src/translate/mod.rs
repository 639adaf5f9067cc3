//! Translation Layer
//!
//! A single-endpoint machine translation client. The response body is a
//! nested array whose first element holds translated segments; the first
//! field of each segment, concatenated in order, forms the translated
//! text. There is no fallback provider: a failure here is recoverable and
//! isolated to the translate action.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Translation failure; the displayed card record stays unchanged
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The request exceeded its deadline
    #[error("translation request timed out")]
    Timeout,

    /// Transport-level failure
    #[error("translation request failed: {0}")]
    Http(reqwest::Error),

    /// The service answered with a non-success status
    #[error("translation service returned status {0}")]
    Status(reqwest::StatusCode),

    /// The nested-array body did not have the expected shape
    #[error("malformed translation response")]
    Malformed,
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranslationError::Timeout
        } else {
            TranslationError::Http(err)
        }
    }
}

/// The translation operation the pipeline needs; tests use an in-memory
/// fake, the binary uses [`HttpTranslator`].
#[async_trait]
pub trait Translate: Send + Sync {
    /// Translate a text blob between two fixed language codes
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslationError>;
}

/// Client for a gtx-style translation endpoint
pub struct HttpTranslator {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTranslator {
    /// Create a translator with an explicit per-request deadline
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Translate for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslationError> {
        debug!(
            "Translating {} chars {} -> {}",
            text.chars().count(),
            source_lang,
            target_lang
        );

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status(status));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|_| TranslationError::Malformed)?;

        concat_segments(&body).ok_or(TranslationError::Malformed)
    }
}

/// Concatenate the translated segments out of the nested-array response:
/// the first element is an array of segments, each segment's first field
/// is a translated chunk.
pub fn concat_segments(body: &serde_json::Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let mut out = String::new();
    for segment in segments {
        if let Some(chunk) = segment.get(0).and_then(|v| v.as_str()) {
            out.push_str(chunk);
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_concat_segments_joins_in_order() {
        let body = json!([
            [
                ["Raio causa 3 pontos de dano ", "Lightning Bolt deals 3 damage ", null],
                ["a qualquer alvo.", "to any target.", null]
            ],
            null,
            "en"
        ]);
        assert_eq!(
            concat_segments(&body).as_deref(),
            Some("Raio causa 3 pontos de dano a qualquer alvo.")
        );
    }

    #[test]
    fn test_concat_segments_skips_non_string_entries() {
        let body = json!([[["Olá", "Hello", null], [null, null], ["!", "!", null]]]);
        assert_eq!(concat_segments(&body).as_deref(), Some("Olá!"));
    }

    #[test]
    fn test_concat_segments_rejects_malformed_bodies() {
        assert!(concat_segments(&json!({"error": "nope"})).is_none());
        assert!(concat_segments(&json!([])).is_none());
        assert!(concat_segments(&json!([[]])).is_none());
        assert!(concat_segments(&json!("just a string")).is_none());
    }
}
