//! Registration host
//!
//! Tracks the installing, waiting and active worker versions of one scope
//! and moves a new version through install and activate.

use std::future::Future;
use std::sync::Arc;

use splitsync_cache::CacheStore;
use splitsync_net::{Fetcher, NetError};

use crate::{ActivateReport, FetchEvent, InstallReport, Served, ServiceWorker, WorkerError};

/// What a call to [`Registration::register`] did
#[derive(Debug, Clone)]
pub struct RegistrationUpdate {
    pub install: InstallReport,
    /// `None` when the new worker is left waiting
    pub activate: Option<ActivateReport>,
}

/// Worker registration for a scope
pub struct Registration<S, F> {
    scope: String,
    waiting: Option<Arc<ServiceWorker<S, F>>>,
    active: Option<Arc<ServiceWorker<S, F>>>,
    clients_claimed: bool,
}

impl<S: CacheStore, F: Fetcher> Registration<S, F> {
    pub fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            waiting: None,
            active: None,
            clients_claimed: false,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn active(&self) -> Option<&Arc<ServiceWorker<S, F>>> {
        self.active.as_ref()
    }

    pub fn waiting(&self) -> Option<&Arc<ServiceWorker<S, F>>> {
        self.waiting.as_ref()
    }

    /// Whether open clients are routed through the active worker.
    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed
    }

    /// Install `worker`; activate it at once if it asks to skip waiting.
    ///
    /// A worker that fails to install is dropped and the current active
    /// worker keeps serving.
    pub async fn register(&mut self, worker: ServiceWorker<S, F>) -> Result<RegistrationUpdate, WorkerError> {
        let worker = Arc::new(worker);
        let install = worker.install().await?;

        if let Some(previous) = self.waiting.replace(worker) {
            previous.retire();
        }

        let activate = if install.skip_waiting {
            self.activate_waiting().await?
        } else {
            tracing::info!(scope = %self.scope, "new worker waiting");
            None
        };

        Ok(RegistrationUpdate { install, activate })
    }

    /// Promote the waiting worker, retiring the one it replaces.
    pub async fn activate_waiting(&mut self) -> Result<Option<ActivateReport>, WorkerError> {
        let Some(worker) = self.waiting.take() else {
            return Ok(None);
        };

        let report = match worker.activate().await {
            Ok(report) => report,
            Err(err) => {
                worker.retire();
                return Err(err);
            }
        };

        if let Some(previous) = self.active.replace(worker) {
            previous.retire();
        }
        // Clients stay controlled once claimed.
        if report.claim_clients {
            self.clients_claimed = true;
        }
        tracing::info!(scope = %self.scope, claimed = self.clients_claimed, "worker active");
        Ok(Some(report))
    }

    /// Route a fetch through the active worker.
    ///
    /// `None` means the host handles the request itself: out of scope, no
    /// active worker, or declined by the worker.
    pub fn fetch(
        &self,
        event: FetchEvent,
    ) -> Option<impl Future<Output = Result<Served, NetError>> + Send + '_> {
        if !event.request.url.as_str().starts_with(&self.scope) {
            return None;
        }
        self.active.as_ref()?.on_fetch(event)
    }
}
