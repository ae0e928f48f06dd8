//! # Cache Module
//!
//! Status record persistence. [`CacheService`] backends store raw strings
//! under a key with an optional TTL; [`CacheClient`] adds JSON encoding.
//!
//! Providers:
//! - [`RedisCacheService`] - shared Redis instance, lazily connected
//! - [`MokaCacheService`] - in-process cache with per-entry expiry

pub mod client;
pub mod errors;
pub mod providers;
pub mod traits;

pub use client::CacheClient;
pub use errors::{CacheError, CacheResult};
pub use providers::{MokaCacheService, RedisCacheService};
pub use traits::CacheService;
