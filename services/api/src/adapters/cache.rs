//! services/api/src/adapters/cache.rs
//!
//! The Redis adapter implementing the `CacheService` port. The connection is
//! created once at startup and injected wherever the cache is needed.

use async_trait::async_trait;
use coursehub_core::ports::{CacheService, PortError, PortResult};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::time::Duration;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

fn unexpected(e: redis::RedisError) -> PortError {
    PortError::Unexpected(format!("redis: {e}"))
}

impl RedisCache {
    /// Opens a managed, auto-reconnecting connection to `url`.
    pub async fn connect(url: &str) -> PortResult<Self> {
        let client = redis::Client::open(url).map_err(unexpected)?;
        let conn = ConnectionManager::new(client).await.map_err(unexpected)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key).await.map_err(unexpected)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> PortResult<()> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                .await
                .map_err(unexpected),
            None => conn.set::<_, _, ()>(key, value).await.map_err(unexpected),
        }
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(unexpected)
    }
}
