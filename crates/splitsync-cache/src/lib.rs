//! SplitSync Cache Store
//!
//! Request → response entries partitioned into named buckets. A bucket name
//! carries its generation (`splitsync-v2`, `splitsync-static-v2`), so
//! dropping a generation is dropping a bucket.
//!
//! The worker only talks to the [`CacheStore`] trait; [`CacheStorage`] is
//! the in-process implementation.

mod key;
mod storage;

use std::future::Future;

use splitsync_net::Response;

pub use key::RequestKey;
pub use storage::{CacheStorage, StorageStats};

/// Bucketed cache store.
///
/// Single-key `put`/`match_in` are atomic; nothing spans more than one key.
pub trait CacheStore: Send + Sync {
    /// Open a bucket, creating it if absent.
    fn open(&self, bucket: &str) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Names of every bucket in the store.
    fn keys(&self) -> impl Future<Output = Result<Vec<String>, CacheError>> + Send;

    /// Delete a whole bucket. `Ok(false)` if it did not exist.
    fn delete(&self, bucket: &str) -> impl Future<Output = Result<bool, CacheError>> + Send;

    /// Look up `key` in one bucket. A missing bucket is a miss.
    fn match_in(
        &self,
        bucket: &str,
        key: &RequestKey,
    ) -> impl Future<Output = Result<Option<Response>, CacheError>> + Send;

    /// Look up `key` in every bucket.
    fn match_any(
        &self,
        key: &RequestKey,
    ) -> impl Future<Output = Result<Option<Response>, CacheError>> + Send;

    /// Store `response` under `key`, replacing any previous entry.
    fn put(
        &self,
        bucket: &str,
        key: RequestKey,
        response: Response,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// Cache store errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("quota exceeded writing to {bucket}: need {needed} bytes, {available} available")]
    QuotaExceeded {
        bucket: String,
        needed: usize,
        available: usize,
    },

    #[error("cache bucket not found: {0}")]
    NotFound(String),

    #[error("cache storage lock poisoned")]
    Poisoned,
}
