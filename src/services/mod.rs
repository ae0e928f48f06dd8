//! # Services
//!
//! Producer-facing entry points built on the queue and cache clients.

pub mod job_submitter;

pub use job_submitter::JobSubmitter;
