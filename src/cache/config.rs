//! Cache configuration.
//!
//! TTLs, the cache round-trip bound and the feed page shape, resolved from `[cache]` settings.

use std::num::NonZeroUsize;
use std::time::Duration;

// Default values for cache configuration, also the fallbacks of the `[cache]` settings.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 50;
pub(crate) const DEFAULT_LOCAL_CAPACITY: usize = 10_000;
pub(crate) const DEFAULT_USER_TTL_SECS: u64 = 300;
pub(crate) const DEFAULT_FEED_TTL_SECS: u64 = 60;
pub(crate) const DEFAULT_PROFILE_TTL_SECS: u64 = 60;
pub(crate) const DEFAULT_PAGE_SIZE: usize = 20;
pub(crate) const DEFAULT_CANDIDATE_LIMIT: u32 = 40;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Upper bound on any single cache round trip.
    pub timeout: Duration,
    /// Maximum entries held by the in-process store.
    pub local_capacity: usize,
    pub user_ttl: Duration,
    pub feed_ttl: Duration,
    pub profile_ttl: Duration,
    /// Maximum hydrated posts returned by one assembly.
    pub page_size: usize,
    /// Rows fetched as assembly candidates for feed and profile pages.
    pub candidate_limit: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            local_capacity: DEFAULT_LOCAL_CAPACITY,
            user_ttl: Duration::from_secs(DEFAULT_USER_TTL_SECS),
            feed_ttl: Duration::from_secs(DEFAULT_FEED_TTL_SECS),
            profile_ttl: Duration::from_secs(DEFAULT_PROFILE_TTL_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            timeout: settings.timeout,
            local_capacity: settings.local_capacity.get(),
            user_ttl: settings.user_ttl,
            feed_ttl: settings.feed_ttl,
            profile_ttl: settings.profile_ttl,
            page_size: settings.page_size.get(),
            candidate_limit: settings.candidate_limit.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the local capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn local_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.local_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
