//! Best-effort typed access to a `CacheStore`.
//!
//! Every operation is bounded by the configured timeout. Read failures and undecodable
//! payloads degrade to a lookup miss; write and delete failures are logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::codec::{self, CacheLookup};
use super::keys::CacheKey;
use super::store::{CacheError, CacheStore};

const TARGET: &str = "photofeed::cache";

#[derive(Clone)]
pub struct CacheClient {
    store: Arc<dyn CacheStore>,
    timeout: Duration,
}

impl CacheClient {
    pub fn new(store: Arc<dyn CacheStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> CacheLookup<T> {
        let rendered = key.to_string();
        let payload = match self.bounded(self.store.get(&rendered)).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                counter!("photofeed_cache_miss_total", "kind" => key.kind()).increment(1);
                return CacheLookup::Miss;
            }
            Err(err) => {
                counter!("photofeed_cache_error_total", "op" => "get").increment(1);
                warn!(target: TARGET, key = %rendered, op = "get", error = %err, "cache read failed, treating as miss");
                return CacheLookup::Miss;
            }
        };

        match codec::decode(&payload) {
            Ok(value) => {
                counter!("photofeed_cache_hit_total", "kind" => key.kind()).increment(1);
                CacheLookup::Hit(value)
            }
            Err(err) => {
                counter!("photofeed_cache_corrupt_total", "kind" => key.kind()).increment(1);
                warn!(target: TARGET, key = %rendered, error = %err, "cache payload could not be decoded");
                CacheLookup::Corrupt
            }
        }
    }

    pub async fn store<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let rendered = key.to_string();
        let result = match codec::encode(value) {
            Ok(payload) => self.bounded(self.store.set(&rendered, payload, ttl)).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => debug!(target: TARGET, key = %rendered, ttl_secs = ttl.as_secs(), "cache entry stored"),
            Err(err) => {
                counter!("photofeed_cache_error_total", "op" => "set").increment(1);
                warn!(target: TARGET, key = %rendered, op = "set", error = %err, "cache write dropped");
            }
        }
    }

    pub async fn evict(&self, key: &CacheKey) {
        let rendered = key.to_string();
        match self.bounded(self.store.delete(&rendered)).await {
            Ok(()) => {
                counter!("photofeed_cache_invalidate_total", "kind" => key.kind()).increment(1);
                debug!(target: TARGET, key = %rendered, "cache entry evicted");
            }
            Err(err) => {
                counter!("photofeed_cache_error_total", "op" => "delete").increment(1);
                warn!(target: TARGET, key = %rendered, op = "delete", error = %err, "cache delete dropped");
            }
        }
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        match timeout(self.timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }
}
