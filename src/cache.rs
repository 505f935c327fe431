//! Persistent TTL cache for station downloads, processed datasets and trained models

use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

use crate::PredictorError;

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

/// Handle to an on-disk keyspace. Clones share the same store.
#[derive(Clone)]
pub struct PersistentCache {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

impl PersistentCache {
    /// Open (or create) the cache database under `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = fjall::Database::builder(path).open().map_err(|e| {
            PredictorError::cache(format!(
                "Failed to open cache database at {}: {e}",
                path.display()
            ))
        })?;
        let items = db
            .keyspace("cache", fjall::KeyspaceCreateOptions::default)
            .map_err(|e| PredictorError::cache(format!("Failed to open cache keyspace: {e}")))?;
        Ok(PersistentCache { store: items })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = postcard::from_bytes(&bytes).map_err(|e| {
            PredictorError::cache(format!("Cached entry '{key}' could not be decoded: {e}"))
        })?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        if now < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

impl Debug for PersistentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache
            .put("station", vec![1.5_f64, 2.5], Duration::from_secs(60))
            .await
            .unwrap();

        let value: Option<Vec<f64>> = cache.get("station").await.unwrap();
        assert_eq!(value, Some(vec![1.5, 2.5]));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        let value: Option<String> = cache.get("nope").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache
            .put("stale", "value".to_string(), Duration::ZERO)
            .await
            .unwrap();

        let value: Option<String> = cache.get("stale").await.unwrap();
        assert!(value.is_none());
        assert!(get_from_store(cache.store.clone(), b"stale".to_vec()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache
            .put("model", 7_u32, Duration::from_secs(60))
            .await
            .unwrap();
        cache.remove("model").await.unwrap();

        let value: Option<u32> = cache.get("model").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_cache_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache
            .put("model", 1_u8, Duration::from_secs(60))
            .await
            .unwrap();

        let err = cache.get::<String>("model").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PredictorError>(),
            Some(PredictorError::Cache { .. })
        ));
    }

    #[test]
    fn test_open_on_a_file_is_a_cache_error() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let err = PersistentCache::open(file.path()).unwrap_err();
        let err = err.downcast_ref::<PredictorError>().unwrap();
        assert!(err.user_message().contains("Cache operation failed"));
    }
}
