use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{CacheError, CacheStore};

/// Remote store shared across processes. The connection manager is created
/// on first use so an unreachable Redis degrades requests (via
/// `CacheError`) instead of failing startup; it reconnects on its own
/// afterwards.
pub struct RedisStore {
    client: redis::Client,
    manager: Mutex<Option<ConnectionManager>>,
}

impl RedisStore {
    pub fn new(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            manager: Mutex::new(None),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let mut guard = self.manager.lock().await;
        if let Some(manager) = guard.as_ref() {
            return Ok(manager.clone());
        }
        let manager = ConnectionManager::new(self.client.clone())
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        *guard = Some(manager.clone());
        Ok(manager)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs())
                .await
                .map_err(|e| CacheError::Backend(e.to_string())),
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(|e| CacheError::Backend(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_malformed_url() {
        assert!(RedisStore::new("not-a-redis-url").is_err());
        assert!(RedisStore::new("redis://localhost:6379").is_ok());
    }
}
