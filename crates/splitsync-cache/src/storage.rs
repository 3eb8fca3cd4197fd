//! In-memory cache storage
//!
//! Buckets live behind one `RwLock`; the lock is never held across an
//! `.await`, so every trait method is effectively synchronous.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use splitsync_net::Response;

use crate::{CacheError, CacheStore, RequestKey};

/// A single bucket
#[derive(Debug, Default)]
struct Cache {
    entries: HashMap<RequestKey, Response>,
    size: usize,
}

impl Cache {
    fn put(&mut self, key: RequestKey, response: Response) {
        self.size += entry_size(&key, &response);
        if let Some(old) = self.entries.insert(key.clone(), response) {
            self.size = self.size.saturating_sub(entry_size(&key, &old));
        }
    }
}

fn entry_size(key: &RequestKey, response: &Response) -> usize {
    let headers: usize = response
        .headers
        .iter()
        .map(|(k, v)| k.len() + v.len())
        .sum();
    key.url.len() + headers + response.body.len()
}

/// Storage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub buckets: usize,
    pub entries: usize,
    pub size_bytes: usize,
    /// Entry lookups (`match_in` and `match_any`)
    pub lookups: u64,
    pub hits: u64,
    /// Successful writes
    pub puts: u64,
}

impl StorageStats {
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }
}

/// In-memory [`CacheStore`]
///
/// Bucket names are kept sorted. An optional quota bounds the total size of
/// all buckets; a put that would exceed it fails with
/// [`CacheError::QuotaExceeded`] and leaves the store unchanged.
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: RwLock<BTreeMap<String, Cache>>,
    quota: Option<usize>,
    lookups: AtomicU64,
    hits: AtomicU64,
    puts: AtomicU64,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage bounded to `bytes` across all buckets.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    pub fn stats(&self) -> StorageStats {
        let (buckets, entries, size_bytes) = match self.caches.read() {
            Ok(caches) => (
                caches.len(),
                caches.values().map(|c| c.entries.len()).sum(),
                caches.values().map(|c| c.size).sum(),
            ),
            Err(_) => (0, 0, 0),
        };
        StorageStats {
            buckets,
            entries,
            size_bytes,
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
        }
    }

    /// Number of entries in `bucket`.
    pub fn bucket_len(&self, bucket: &str) -> Result<usize, CacheError> {
        self.read()?
            .get(bucket)
            .map(|c| c.entries.len())
            .ok_or_else(|| CacheError::NotFound(bucket.to_string()))
    }

    /// Whether `bucket` exists.
    pub fn has(&self, bucket: &str) -> Result<bool, CacheError> {
        Ok(self.read()?.contains_key(bucket))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Cache>>, CacheError> {
        self.caches.read().map_err(|_| CacheError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Cache>>, CacheError> {
        self.caches.write().map_err(|_| CacheError::Poisoned)
    }

    fn record_lookup(&self, hit: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl CacheStore for CacheStorage {
    async fn open(&self, bucket: &str) -> Result<(), CacheError> {
        self.write()?.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.read()?.keys().cloned().collect())
    }

    async fn delete(&self, bucket: &str) -> Result<bool, CacheError> {
        Ok(self.write()?.remove(bucket).is_some())
    }

    async fn match_in(&self, bucket: &str, key: &RequestKey) -> Result<Option<Response>, CacheError> {
        let found = self
            .read()?
            .get(bucket)
            .and_then(|c| c.entries.get(key))
            .cloned();
        self.record_lookup(found.is_some());
        Ok(found)
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, CacheError> {
        let found = self
            .read()?
            .values()
            .find_map(|c| c.entries.get(key))
            .cloned();
        self.record_lookup(found.is_some());
        Ok(found)
    }

    async fn put(&self, bucket: &str, key: RequestKey, response: Response) -> Result<(), CacheError> {
        let mut caches = self.write()?;

        if let Some(quota) = self.quota {
            let total: usize = caches.values().map(|c| c.size).sum();
            let replaced = caches
                .get(bucket)
                .and_then(|c| c.entries.get(&key))
                .map(|old| entry_size(&key, old))
                .unwrap_or(0);
            let needed = entry_size(&key, &response);
            let available = quota.saturating_sub(total - replaced);
            if needed > available {
                return Err(CacheError::QuotaExceeded {
                    bucket: bucket.to_string(),
                    needed,
                    available,
                });
            }
        }

        caches.entry(bucket.to_string()).or_default().put(key, response);
        self.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitsync_net::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse("https://splitsync.app").unwrap().join(path).unwrap())
    }

    #[test]
    fn test_open_creates_bucket() {
        smol::block_on(async {
            let storage = CacheStorage::new();
            storage.open("splitsync-v2").await.unwrap();

            assert!(storage.has("splitsync-v2").unwrap());
            assert_eq!(storage.keys().await.unwrap(), vec!["splitsync-v2".to_string()]);
            assert_eq!(storage.bucket_len("splitsync-v2").unwrap(), 0);
        });
    }

    #[test]
    fn test_put_overwrites_same_identity() {
        smol::block_on(async {
            let storage = CacheStorage::new();
            storage.put("v1", key("/app.js"), Response::new(200, "old")).await.unwrap();
            storage.put("v1", key("/app.js"), Response::new(200, "new")).await.unwrap();

            assert_eq!(storage.bucket_len("v1").unwrap(), 1);
            let hit = storage.match_in("v1", &key("/app.js")).await.unwrap().unwrap();
            assert_eq!(hit.body, b"new");
            assert_eq!(storage.stats().size_bytes, entry_size(&key("/app.js"), &hit));
        });
    }

    #[test]
    fn test_quota_rejects_oversized_put() {
        smol::block_on(async {
            let storage = CacheStorage::with_quota(64);
            let err = storage
                .put("v1", key("/big.png"), Response::new(200, vec![0u8; 128]))
                .await
                .unwrap_err();

            assert!(matches!(err, CacheError::QuotaExceeded { .. }));
            assert_eq!(storage.stats().entries, 0);
            assert_eq!(storage.stats().puts, 0);
        });
    }

    #[test]
    fn test_stats_track_lookups() {
        smol::block_on(async {
            let storage = CacheStorage::new();
            storage.put("v1", key("/a.css"), Response::new(200, "a")).await.unwrap();

            assert!(storage.match_in("v1", &key("/a.css")).await.unwrap().is_some());
            assert!(storage.match_in("v1", &key("/b.css")).await.unwrap().is_none());

            let stats = storage.stats();
            assert_eq!(stats.lookups, 2);
            assert_eq!(stats.hits, 1);
            assert_eq!(stats.hit_rate(), 0.5);
        });
    }

    #[test]
    fn test_bucket_len_missing() {
        let storage = CacheStorage::new();
        assert!(matches!(storage.bucket_len("nope"), Err(CacheError::NotFound(_))));
    }
}
