//! Redis-backed `CacheStore`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::{Config as PoolConfig, Pool, Runtime, redis::AsyncCommands};

use crate::cache::{CacheError, CacheStore};

use super::error::InfraError;

/// Network cache shared with every other process pointed at the same Redis.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Builds the connection pool; no connection is opened until first use.
    pub fn connect(url: &str) -> Result<Self, InfraError> {
        let pool = PoolConfig::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|err| InfraError::cache(format!("failed to create Redis pool: {err}")))?;
        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool.get().await.map_err(CacheError::unavailable)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(CacheError::unavailable)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        // Redis rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        let () = conn
            .set_ex(key, value.as_ref(), seconds)
            .await
            .map_err(CacheError::unavailable)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: i64 = conn.del(key).await.map_err(CacheError::unavailable)?;
        Ok(())
    }
}
