//! # HTTP Fetcher
//!
//! [`Fetcher`] backed by an extraction service reachable over HTTP. The
//! service performs the page interaction (form submission, rendering) and
//! answers `GET {scrape_url}?identifier=<digits>` with a flat JSON object of
//! label -> text pairs.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{FetchError, FetchedFields, Fetcher};
use crate::error::{ScrapeError, ScrapeResult};

/// Configuration for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Extraction endpoint, e.g. `http://extractor:3000/extract`
    pub scrape_url: String,
    /// Per-request timeout enforced by the HTTP client
    pub request_timeout: Duration,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            scrape_url: "http://localhost:3000/extract".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

pub struct HttpFetcher {
    client: Client,
    scrape_url: Url,
    config: HttpFetcherConfig,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("scrape_url", &self.scrape_url.as_str())
            .field("request_timeout", &self.config.request_timeout)
            .finish()
    }
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> ScrapeResult<Self> {
        let scrape_url = Url::parse(&config.scrape_url).map_err(|e| {
            ScrapeError::Configuration(format!(
                "Invalid scrape URL '{}': {}",
                config.scrape_url, e
            ))
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(format!("scrape-worker/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ScrapeError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            scrape_url,
            config,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, identifier: &str) -> Result<FetchedFields, FetchError> {
        debug!(identifier = %identifier, url = %self.scrape_url, "Requesting extraction");

        let response = self
            .client
            .get(self.scrape_url.clone())
            .query(&[("identifier", identifier)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.config.request_timeout)
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::Empty(identifier.to_string()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(identifier = %identifier, status = %status, "Extraction request failed");
            return Err(FetchError::Failed(format!("{} - {}", status, error_text)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(format!("Failed to parse response: {}", e)))?;

        fields_from_json(body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Flatten the extraction response into trimmed label -> text pairs
///
/// Strings, numbers and booleans are kept; nulls, empty strings and nested
/// values carry no field text and are skipped.
pub(crate) fn fields_from_json(body: Value) -> Result<FetchedFields, FetchError> {
    let Value::Object(map) = body else {
        return Err(FetchError::Parse("response is not a JSON object".to_string()));
    };

    let mut fields = FetchedFields::new();
    for (label, value) in map {
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        let label = label.trim();
        if !label.is_empty() && !text.is_empty() {
            fields.insert(label.to_string(), text);
        }
    }
    Ok(fields)
}
