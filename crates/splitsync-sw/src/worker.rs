//! Service Worker
//!
//! Event surface of one worker version: install, activate and fetch.

use std::future::Future;
use std::sync::Arc;

use splitsync_cache::CacheStore;
use splitsync_net::{Fetcher, NetError, Request};

use crate::{
    ActivateReport, Classifier, InstallReport, LifecycleManager, RequestClass, Served,
    StrategyEngine, WorkerConfig, WorkerError, WorkerState,
};

/// Fetch event delivered by the host
#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub request: Request,
}

impl FetchEvent {
    pub fn new(request: Request) -> Self {
        Self { request }
    }
}

/// Events the host delivers to a worker
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(FetchEvent),
}

/// What handling an event produced
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    /// Fetch declined; the host performs its default network handling
    Passthrough,
    Responded(Served),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    NetworkOnly,
    CacheFirst,
    NavigationFallback,
    NetworkFirst,
}

impl Route {
    fn for_class(class: RequestClass) -> Option<Self> {
        match class {
            RequestClass::Ignored => None,
            RequestClass::Api => Some(Route::NetworkOnly),
            RequestClass::StaticAsset => Some(Route::CacheFirst),
            RequestClass::Navigation => Some(Route::NavigationFallback),
            RequestClass::Other => Some(Route::NetworkFirst),
        }
    }
}

/// One deployed worker version
pub struct ServiceWorker<S, F> {
    config: Arc<WorkerConfig>,
    classifier: Classifier,
    lifecycle: LifecycleManager<S, F>,
    strategies: StrategyEngine<S, F>,
}

impl<S: CacheStore, F: Fetcher> ServiceWorker<S, F> {
    pub fn new(config: WorkerConfig, store: Arc<S>, fetcher: Arc<F>) -> Result<Self, WorkerError> {
        config.validate()?;
        let config = Arc::new(config);

        Ok(Self {
            classifier: Classifier::from_config(&config),
            lifecycle: LifecycleManager::new(config.clone(), store.clone(), fetcher.clone()),
            strategies: StrategyEngine::new(config.clone(), store, fetcher),
            config,
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    pub fn classify(&self, request: &Request) -> RequestClass {
        self.classifier.classify(request)
    }

    pub fn strategies(&self) -> &StrategyEngine<S, F> {
        &self.strategies
    }

    pub async fn install(&self) -> Result<InstallReport, WorkerError> {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<ActivateReport, WorkerError> {
        self.lifecycle.activate().await
    }

    pub fn retire(&self) {
        self.lifecycle.retire();
    }

    /// Fetch hook.
    ///
    /// Classification happens before this returns: `None` declines the
    /// request, `Some` is the response the host must wait for. Only API
    /// requests can resolve to an error, which is the network's own.
    pub fn on_fetch(
        &self,
        event: FetchEvent,
    ) -> Option<impl Future<Output = Result<Served, NetError>> + Send + '_> {
        let class = self.classify(&event.request);
        tracing::debug!(url = %event.request.url, %class, "fetch");
        let route = Route::for_class(class)?;
        let request = event.request;

        Some(async move {
            match route {
                Route::NetworkOnly => self.strategies.network_only(&request).await.map(Served::network),
                Route::CacheFirst => Ok(self
                    .strategies
                    .cache_first(&request, Some(self.config.static_cache.as_str()))
                    .await),
                Route::NavigationFallback => Ok(self
                    .strategies
                    .network_first_with_offline_fallback(&request)
                    .await),
                Route::NetworkFirst => Ok(self.strategies.network_first(&request).await),
            }
        })
    }

    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        match event {
            WorkerEvent::Install => self.install().await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(fetch) => match self.on_fetch(fetch) {
                Some(pending) => Ok(EventOutcome::Responded(pending.await?)),
                None => Ok(EventOutcome::Passthrough),
            },
        }
    }
}
