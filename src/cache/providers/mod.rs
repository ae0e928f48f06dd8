//! Cache provider implementations

mod moka;
mod redis;

pub use self::moka::MokaCacheService;
pub use self::redis::RedisCacheService;
