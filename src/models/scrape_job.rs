//! # Scrape Job Message
//!
//! The envelope producers publish and workers consume. Construction from a
//! raw identifier sanitizes and validates; parsing a dequeued payload only
//! checks the contract shape, since producers already sanitized it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{cache_keys, jobs};
use crate::error::{InvalidMessageFormat, ValidationError};
use crate::validation::{normalize_identifier, validate_digits};

/// Producer-side lifecycle label carried on the queue
///
/// Producers always emit `Queued`; the worker never rewrites the message,
/// progress lives in the cache record instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    Queued,
    Processing,
    Done,
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            QueueStatus::Queued => "QUEUED",
            QueueStatus::Processing => "PROCESSING",
            QueueStatus::Done => "DONE",
        };
        f.write_str(label)
    }
}

/// Job message for a single scrape request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJobMessage {
    job: String,
    status: QueueStatus,
    identifier: String,
}

impl ScrapeJobMessage {
    /// Build a queued job from caller input such as `00.022.244/0001-75`
    pub fn new(raw_identifier: &str) -> Result<Self, ValidationError> {
        let identifier = normalize_identifier(raw_identifier)?;
        Ok(Self {
            job: jobs::SCRAPE.to_string(),
            status: QueueStatus::Queued,
            identifier,
        })
    }

    /// Parse a dequeued JSON payload
    ///
    /// Requires the `job`, `status` and `identifier` fields and the scrape
    /// discriminator. The identifier is taken as-is.
    pub fn from_payload(payload: Value) -> Result<Self, InvalidMessageFormat> {
        let object = payload
            .as_object()
            .ok_or_else(|| InvalidMessageFormat::new("payload is not a JSON object"))?;

        for field in ["job", "status", "identifier"] {
            if !object.contains_key(field) {
                return Err(InvalidMessageFormat::new(format!(
                    "missing field `{field}`"
                )));
            }
        }

        let message: Self = serde_json::from_value(payload)
            .map_err(|e| InvalidMessageFormat::new(e.to_string()))?;

        if message.job != jobs::SCRAPE {
            return Err(InvalidMessageFormat::new(format!(
                "unsupported job type `{}`",
                message.job
            )));
        }

        Ok(message)
    }

    /// Check the message is publishable: scrape discriminator and a canonical identifier
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.job != jobs::SCRAPE {
            return Err(ValidationError::new(
                "job",
                format!("expected `{}`, got `{}`", jobs::SCRAPE, self.job),
            ));
        }
        validate_digits(
            &self.identifier,
            "identifier",
            crate::constants::IDENTIFIER_LENGTH,
        )
    }

    /// Canonical JSON form used on the wire
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "job": self.job,
            "status": self.status,
            "identifier": self.identifier,
        })
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn status(&self) -> QueueStatus {
        self.status
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Key of the status record tracking this job
    pub fn cache_key(&self) -> String {
        cache_keys::scrape_job(&self.identifier)
    }
}
