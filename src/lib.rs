#![allow(clippy::doc_markdown)] // Allow technical terms like RabbitMQ, JSON in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Scrape Worker
//!
//! Asynchronous job-queue pipeline for "fetch this external record" requests.
//!
//! ## Overview
//!
//! Producers validate an identifier and publish a job onto a durable queue.
//! A worker consumes jobs one at a time, runs a long, failure-prone fetch,
//! and tracks each job's progress in a cache record keyed by identifier.
//! Callers poll that record for the outcome.
//!
//! ```text
//! JobSubmitter::submit -> QueueClient::publish -> durable queue
//!   -> QueueClient::consume_forever -> ScrapeWorker::process
//!   -> Fetcher::fetch -> CacheClient::set("scrape_job:<id>")
//! ```
//!
//! ## Module Organization
//!
//! - [`models`] - Job message contract and cache record
//! - [`messaging`] - Queue client trait, RabbitMQ and in-memory providers
//! - [`cache`] - Cache service trait, Redis and Moka providers, JSON client
//! - [`fetch`] - Fetch capability and the HTTP extraction client
//! - [`worker`] - Job-processing state machine
//! - [`services`] - Producer-side job submission
//! - [`resilience`] - Publish circuit breaker and reconnect state machine
//! - [`config`] - Layered configuration loading
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scrape_worker::cache::MokaCacheService;
//! use scrape_worker::fetch::{HttpFetcher, HttpFetcherConfig};
//! use scrape_worker::messaging::InMemoryQueueClient;
//! use scrape_worker::worker::{ScrapeWorker, WorkerSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new(HttpFetcherConfig::default())?;
//! let worker = ScrapeWorker::new(
//!     InMemoryQueueClient::new("scrape_jobs"),
//!     MokaCacheService::default(),
//!     fetcher,
//!     WorkerSettings::default(),
//! );
//!
//! worker.start_worker().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod resilience;
pub mod services;
pub mod validation;
pub mod worker;

pub use cache::{CacheClient, CacheService};
pub use config::WorkerConfig;
pub use error::{InvalidMessageFormat, ScrapeError, ScrapeResult, ValidationError};
pub use fetch::{FetchError, FetchedFields, Fetcher};
pub use messaging::{HandlerOutcome, MessageHandler, MessagingError, QueueClient};
pub use models::{CacheRecord, JobState, QueueStatus, ScrapeJobMessage};
pub use services::JobSubmitter;
pub use worker::{ScrapeWorker, WorkerSettings};
