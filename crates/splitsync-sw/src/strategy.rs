//! Fetch Strategy Engine
//!
//! Every strategy except [`StrategyEngine::network_only`] always yields a
//! response; network failures are absorbed by the fallback chain.
//!
//! Cache reads prefer the strategy's own bucket and then search every
//! bucket, so pre-cached entries in the main bucket still serve requests
//! routed to the static bucket. Writes only ever go to the strategy's bucket.

use std::sync::Arc;

use splitsync_cache::{CacheStore, RequestKey};
use splitsync_net::{Fetcher, NetError, Request, Response};

use crate::WorkerConfig;

/// Body of the 503 for a static asset that is neither cached nor reachable.
pub const ASSET_OFFLINE_BODY: &str = "Asset not available offline";
/// Body of the 503 for any other request that is neither cached nor reachable.
pub const NOT_AVAILABLE_OFFLINE_BODY: &str = "Not available offline";
/// Last-resort navigation document.
pub const OFFLINE_HTML: &str = "<h1>You are offline</h1>";

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    /// The request's own cache entry
    Cache,
    /// Cached app shell standing in for an unknown path
    AppShell,
    OfflinePage,
    Synthesized,
}

/// A response and its source
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source }
    }

    pub fn network(response: Response) -> Self {
        Self::new(response, ResponseSource::Network)
    }
}

/// Runs the caching strategies against one store and one network
pub struct StrategyEngine<S, F> {
    config: Arc<WorkerConfig>,
    store: Arc<S>,
    fetcher: Arc<F>,
}

impl<S: CacheStore, F: Fetcher> StrategyEngine<S, F> {
    pub fn new(config: Arc<WorkerConfig>, store: Arc<S>, fetcher: Arc<F>) -> Self {
        Self {
            config,
            store,
            fetcher,
        }
    }

    /// Serve from the cache (`bucket` first, main bucket if `None`, then any
    /// other bucket), else fetch and store into `bucket`.
    pub async fn cache_first(&self, request: &Request, bucket: Option<&str>) -> Served {
        let bucket = bucket.unwrap_or(self.config.main_cache.as_str());
        let key = RequestKey::from(request);

        if let Some(cached) = self.lookup(bucket, &key).await {
            return Served::new(cached, ResponseSource::Cache);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.store_copy(bucket, key, &response).await;
                }
                Served::network(response)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "asset unreachable");
                Served::new(Response::new(503, ASSET_OFFLINE_BODY), ResponseSource::Synthesized)
            }
        }
    }

    /// Fetch and store, else serve the last good copy.
    pub async fn network_first(&self, request: &Request) -> Served {
        let bucket = self.config.runtime_bucket();
        let key = RequestKey::from(request);

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.store_copy(bucket, key, &response).await;
                }
                Served::network(response)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "network failed, trying cache");
                match self.lookup(bucket, &key).await {
                    Some(cached) => Served::new(cached, ResponseSource::Cache),
                    None => Served::new(
                        Response::new(503, NOT_AVAILABLE_OFFLINE_BODY),
                        ResponseSource::Synthesized,
                    ),
                }
            }
        }
    }

    /// Network-first for page loads. Offline, falls back through the cached
    /// page, the app shell, the offline page and finally [`OFFLINE_HTML`].
    pub async fn network_first_with_offline_fallback(&self, request: &Request) -> Served {
        let bucket = self.config.main_cache.as_str();
        let key = RequestKey::from(request);

        let err = match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.store_copy(bucket, key, &response).await;
                }
                return Served::network(response);
            }
            Err(err) => err,
        };
        tracing::debug!(url = %request.url, error = %err, "offline navigation");

        if let Some(cached) = self.lookup(bucket, &key).await {
            return Served::new(cached, ResponseSource::Cache);
        }
        if let Some(shell) = self.lookup_path(bucket, &self.config.app_shell).await {
            return Served::new(shell, ResponseSource::AppShell);
        }
        if let Some(page) = self.lookup_path(bucket, &self.config.offline_page).await {
            return Served::new(page, ResponseSource::OfflinePage);
        }
        Served::new(
            Response::new(200, OFFLINE_HTML).with_header("Content-Type", "text/html"),
            ResponseSource::Synthesized,
        )
    }

    /// Straight to the network; nothing is read from or written to a cache.
    pub async fn network_only(&self, request: &Request) -> Result<Response, NetError> {
        self.fetcher.fetch(request).await
    }

    /// Cache read: `bucket` first, then every bucket. Store errors count as
    /// a miss.
    async fn lookup(&self, bucket: &str, key: &RequestKey) -> Option<Response> {
        match self.store.match_in(bucket, key).await {
            Ok(Some(found)) => {
                tracing::debug!(bucket, %key, "cache hit");
                return Some(found);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(bucket, %key, error = %err, "cache read failed"),
        }

        match self.store.match_any(key).await {
            Ok(found) => {
                tracing::debug!(%key, hit = found.is_some(), "cross-bucket lookup");
                found
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "cache read failed");
                None
            }
        }
    }

    async fn lookup_path(&self, bucket: &str, path: &str) -> Option<Response> {
        let url = match self.config.resolve(path) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(path, error = %err, "cannot resolve fallback path");
                return None;
            }
        };
        self.lookup(bucket, &RequestKey::get(&url)).await
    }

    /// Store a copy of `response`; write failures are logged and skipped.
    async fn store_copy(&self, bucket: &str, key: RequestKey, response: &Response) {
        if let Err(err) = self.store.put(bucket, key, response.clone()).await {
            tracing::warn!(bucket, error = %err, "skipping cache write");
        }
    }
}
