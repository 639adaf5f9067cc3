//! HTTP catalog client

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::lookup::{CardRecord, Catalog, LookupError};

/// Client for a Scryfall-style card catalog API
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

/// List envelope used by the autocomplete and search endpoints
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

impl CatalogClient {
    /// Create a client with an explicit per-request deadline.
    ///
    /// The deadline bounds every call this client makes; a hung request
    /// surfaces as `LookupError::Timeout` instead of holding the scan
    /// busy flag forever.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_card(&self, url: &str, query: &[(&str, &str)]) -> Result<CardRecord, LookupError> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound);
        }
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        response
            .json::<CardRecord>()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn card_by_set_number(
        &self,
        set_code: &str,
        collector_number: &str,
    ) -> Result<CardRecord, LookupError> {
        let url = format!(
            "{}/cards/{}/{}",
            self.base_url,
            set_code.to_lowercase(),
            collector_number
        );
        debug!("Exact lookup: {}", url);
        self.get_card(&url, &[]).await
    }

    async fn card_by_fuzzy_name(&self, name: &str) -> Result<CardRecord, LookupError> {
        let url = format!("{}/cards/named", self.base_url);
        debug!("Fuzzy lookup for {:?}", name);
        self.get_card(&url, &[("fuzzy", name)]).await
    }

    async fn autocomplete(&self, query: &str) -> Result<Vec<String>, LookupError> {
        let url = format!("{}/cards/autocomplete", self.base_url);
        let response = self.http.get(&url).query(&[("q", query)]).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let list: ListResponse<String> = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        debug!("Autocomplete {:?} -> {} suggestions", query, list.data.len());
        Ok(list.data)
    }

    async fn localized_printings(
        &self,
        canonical_name: &str,
        language_tag: &str,
    ) -> Result<Vec<CardRecord>, LookupError> {
        let url = format!("{}/cards/search", self.base_url);
        // Exact-name match restricted to printings in the target language
        let query = format!("!\"{}\" lang:{}", canonical_name, language_tag);
        debug!("Localized search: {}", query);

        let response = self
            .http
            .get(&url)
            .query(&[("q", query.as_str()), ("unique", "prints")])
            .send()
            .await?;
        let status = response.status();

        // The search endpoint reports "no printings" as 404; that is a
        // localization miss, not a failure
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let list: ListResponse<CardRecord> = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;
        Ok(list.data)
    }
}
