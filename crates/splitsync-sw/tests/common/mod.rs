//! Shared test doubles: a scripted network and a store that can be told to fail.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use splitsync_cache::{CacheError, CacheStorage, CacheStore, RequestKey};
use splitsync_net::{Fetcher, NetError, Request, Response, Url};
use splitsync_sw::{ServiceWorker, WorkerConfig};

pub const ORIGIN: &str = "https://splitsync.app";

pub fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn config() -> WorkerConfig {
    WorkerConfig::default().with_origin(ORIGIN)
}

pub fn versioned(version: u32) -> WorkerConfig {
    WorkerConfig::versioned("splitsync", version).with_origin(ORIGIN)
}

pub fn html(body: &str) -> Response {
    Response::new(200, body).with_header("Content-Type", "text/html")
}

/// Route table keyed by full URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl MockNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, path: &str, response: Response) {
        self.routes
            .lock()
            .unwrap()
            .insert(url(path).to_string(), response);
    }

    /// Serve every default manifest entry.
    pub fn route_manifest(&self) {
        self.route("/", html("<div id=root></div>"));
        self.route("/index.html", html("<div id=root></div>"));
        self.route("/offline.html", html("<h1>SplitSync is offline</h1>"));
        self.route("/manifest.json", Response::new(200, "{}"));
        self.route("/icon-192.png", Response::new(200, vec![0x89, 0x50]));
        self.route("/icon-512.png", Response::new(200, vec![0x89, 0x50]));
    }

    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(NetError::Network("offline".into()));
        }
        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(404, "Not Found")))
    }
}

/// [`CacheStorage`] with switchable failures.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: CacheStorage,
    pub fail_open: AtomicBool,
    pub fail_keys: AtomicBool,
    pub fail_puts: AtomicBool,
    pub fail_delete_of: Mutex<Option<String>>,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl CacheStore for FlakyStore {
    async fn open(&self, bucket: &str) -> Result<(), CacheError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(CacheError::Poisoned);
        }
        self.inner.open(bucket).await
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        if self.fail_keys.load(Ordering::SeqCst) {
            return Err(CacheError::Poisoned);
        }
        self.inner.keys().await
    }

    async fn delete(&self, bucket: &str) -> Result<bool, CacheError> {
        let failing = self.fail_delete_of.lock().unwrap().clone();
        if failing.as_deref() == Some(bucket) {
            return Err(CacheError::NotFound(bucket.to_string()));
        }
        self.inner.delete(bucket).await
    }

    async fn match_in(&self, bucket: &str, key: &RequestKey) -> Result<Option<Response>, CacheError> {
        self.inner.match_in(bucket, key).await
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, CacheError> {
        self.inner.match_any(key).await
    }

    async fn put(&self, bucket: &str, key: RequestKey, response: Response) -> Result<(), CacheError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(CacheError::QuotaExceeded {
                bucket: bucket.to_string(),
                needed: response.body.len(),
                available: 0,
            });
        }
        self.inner.put(bucket, key, response).await
    }
}

pub fn worker<S: CacheStore>(
    config: WorkerConfig,
    store: &Arc<S>,
    net: &Arc<MockNetwork>,
) -> ServiceWorker<S, MockNetwork> {
    ServiceWorker::new(config, store.clone(), net.clone()).unwrap()
}
