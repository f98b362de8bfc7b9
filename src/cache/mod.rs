//! Photofeed cache layer.
//!
//! A thin byte-level contract (`CacheStore`) with two backends, the in-process
//! `LocalStore` and the Redis store in `infra::cache`, plus `CacheClient`, which adds
//! typed JSON payloads, bounded round trips and the never-fail policy.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! url = "redis://127.0.0.1:6379"   # omit to use the in-process store
//! timeout_ms = 50
//! user_ttl_seconds = 300
//! feed_ttl_seconds = 60
//! profile_ttl_seconds = 60
//! ```

mod client;
mod codec;
mod config;
mod keys;
mod store;

pub use client::CacheClient;
pub use codec::{CacheLookup, decode, encode};
pub use config::CacheConfig;
pub(crate) use config::{
    DEFAULT_CANDIDATE_LIMIT, DEFAULT_FEED_TTL_SECS, DEFAULT_LOCAL_CAPACITY, DEFAULT_PAGE_SIZE,
    DEFAULT_PROFILE_TTL_SECS, DEFAULT_TIMEOUT_MS, DEFAULT_USER_TTL_SECS,
};
pub use keys::CacheKey;
pub use store::{CacheError, CacheStore, LocalStore};
