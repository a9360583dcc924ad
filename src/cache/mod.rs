pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::datasource::{DataRepository, DataSourceError, QueryParams, RowSet};

/// Cache failures are recovered locally: logged, then the request falls
/// back to a direct fetch. They never reach the client.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache entry could not be decoded: {0}")]
    Corrupt(String),
}

/// Pluggable key-value store holding serialized row sets.
///
/// `ttl = None` means the entry never expires (CACHE_TIMEOUT_SECONDS=0).
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;
}

/// TTL cache wrapped around the data repository.
///
/// The cache is a performance optimization, never a correctness
/// dependency: any store failure degrades to a direct fetch.
pub struct CachedRepository {
    repository: DataRepository,
    store: Arc<dyn CacheStore>,
    ttl: Option<Duration>,
}

impl CachedRepository {
    pub fn new(
        repository: DataRepository,
        store: Arc<dyn CacheStore>,
        cache_timeout_seconds: u64,
    ) -> Self {
        Self {
            repository,
            store,
            ttl: (cache_timeout_seconds > 0).then(|| Duration::from_secs(cache_timeout_seconds)),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.repository.source_name()
    }

    /// Return a fresh cached row set for these parameters, or fetch,
    /// cache, and return. Data-source failures are surfaced as-is and do
    /// not populate the cache.
    pub async fn get_or_fetch(&self, params: &QueryParams) -> Result<RowSet, DataSourceError> {
        let key = params.cache_key();

        match self.lookup(&key).await {
            Ok(Some(rows)) => {
                tracing::debug!(%key, "cache hit");
                return Ok(rows);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(%key, error = %err, "cache lookup failed, fetching directly");
            }
        }

        let rows = self.repository.fetch(params).await?;

        if let Err(err) = self.store_rows(&key, &rows).await {
            tracing::warn!(%key, error = %err, "failed to populate cache");
        }

        Ok(rows)
    }

    async fn lookup(&self, key: &str) -> Result<Option<RowSet>, CacheError> {
        match self.store.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CacheError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    async fn store_rows(&self, key: &str, rows: &RowSet) -> Result<(), CacheError> {
        let raw = serde_json::to_string(rows).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        self.store.put(key, raw, self.ttl).await
    }
}
