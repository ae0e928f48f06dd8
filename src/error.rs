//! # Error Types
//!
//! Crate-level error taxonomy. Each subsystem owns a `thiserror` enum
//! (`MessagingError`, `CacheError`, `FetchError`); the contract errors that
//! cross subsystem boundaries live here together with [`ScrapeError`], which
//! wraps them all for callers that drive the whole pipeline.

use thiserror::Error;

use crate::cache::CacheError;
use crate::fetch::FetchError;
use crate::messaging::MessagingError;

/// A job could not be constructed from caller input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation error: {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A dequeued payload does not match the job message contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid message format: {reason}")]
pub struct InvalidMessageFormat {
    pub reason: String,
}

impl InvalidMessageFormat {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidMessage(#[from] InvalidMessageFormat),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<config::ConfigError> for ScrapeError {
    fn from(err: config::ConfigError) -> Self {
        ScrapeError::Configuration(err.to_string())
    }
}

pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;
