//! Cache Lifecycle Manager
//!
//! ## Lifecycle
//! 1. **Install**: open the main bucket and pre-cache the manifest
//! 2. **Activate**: delete every bucket that is not a live tag
//! 3. **Redundant**: superseded by a newer worker, or install failed

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use splitsync_cache::{CacheStore, RequestKey};
use splitsync_net::{Fetcher, NetError, Request};

use crate::{WorkerConfig, WorkerError};

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// A manifest URL that could not be pre-cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheFailure {
    pub url: String,
    pub reason: String,
}

/// Result of the install step
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<PrecacheFailure>,
    /// Host should activate without waiting for the previous worker
    pub skip_waiting: bool,
}

/// Result of the activate step
#[derive(Debug, Clone, Default)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub retained: Vec<String>,
    /// Stale buckets whose deletion failed
    pub failed: Vec<String>,
    /// Host should route already-open clients through this worker
    pub claim_clients: bool,
}

/// Owns the bucket generations of one worker version
pub struct LifecycleManager<S, F> {
    config: Arc<WorkerConfig>,
    store: Arc<S>,
    fetcher: Arc<F>,
    state: Mutex<WorkerState>,
}

impl<S: CacheStore, F: Fetcher> LifecycleManager<S, F> {
    pub fn new(config: Arc<WorkerConfig>, store: Arc<S>, fetcher: Arc<F>) -> Self {
        Self {
            config,
            store,
            fetcher,
            state: Mutex::new(WorkerState::Parsed),
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: WorkerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), WorkerError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return Err(WorkerError::InvalidState {
                expected: from,
                actual: *state,
            });
        }
        *state = to;
        Ok(())
    }

    /// Pre-cache the manifest into the main bucket.
    ///
    /// Individual URLs may fail without failing the install; only a main
    /// bucket that cannot be opened does.
    pub async fn install(&self) -> Result<InstallReport, WorkerError> {
        self.transition(WorkerState::Parsed, WorkerState::Installing)?;
        let bucket = self.config.main_cache.as_str();
        tracing::info!(bucket, "installing worker");

        if let Err(err) = self.store.open(bucket).await {
            tracing::error!(bucket, error = %err, "cannot open main cache");
            self.set_state(WorkerState::Redundant);
            return Err(err.into());
        }

        let mut report = InstallReport::default();
        for url in self.config.precache.iter() {
            match self.precache_one(bucket, url).await {
                Ok(()) => report.cached.push(url.to_string()),
                Err(err) => {
                    tracing::warn!(url, error = %err, "pre-cache failed");
                    report.failed.push(PrecacheFailure {
                        url: url.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        report.skip_waiting = self.config.skip_waiting;

        self.set_state(WorkerState::Installed);
        tracing::info!(
            cached = report.cached.len(),
            failed = report.failed.len(),
            "worker installed"
        );
        Ok(report)
    }

    async fn precache_one(&self, bucket: &str, url: &str) -> Result<(), WorkerError> {
        let request = Request::get(self.config.resolve(url)?);
        let response = self.fetcher.fetch(&request).await?;
        if !response.ok() {
            return Err(NetError::HttpError {
                status: response.status,
            }
            .into());
        }
        self.store.put(bucket, RequestKey::from(&request), response).await?;
        Ok(())
    }

    /// Delete every bucket that is not a live tag of this worker.
    ///
    /// Listing or deletion failures are logged and skipped.
    pub async fn activate(&self) -> Result<ActivateReport, WorkerError> {
        self.transition(WorkerState::Installed, WorkerState::Activating)?;
        let live = self.config.live_buckets();

        let names = match self.store.keys().await {
            Ok(names) => names,
            Err(err) => {
                tracing::warn!(error = %err, "cannot list caches, skipping cleanup");
                Vec::new()
            }
        };

        let mut report = ActivateReport::default();
        for name in names {
            if live.contains(&name.as_str()) {
                report.retained.push(name);
                continue;
            }
            tracing::info!(bucket = %name, "deleting old cache");
            match self.store.delete(&name).await {
                Ok(_) => report.deleted.push(name),
                Err(err) => {
                    tracing::warn!(bucket = %name, error = %err, "failed to delete old cache");
                    report.failed.push(name);
                }
            }
        }
        report.claim_clients = self.config.claim_clients;

        self.set_state(WorkerState::Activated);
        tracing::info!(deleted = report.deleted.len(), "worker activated");
        Ok(report)
    }

    /// Mark the worker superseded.
    pub fn retire(&self) {
        self.set_state(WorkerState::Redundant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(WorkerState::Activated.to_string(), "activated");
        assert_eq!(WorkerState::Redundant.to_string(), "redundant");
    }

    #[test]
    fn test_invalid_state_message() {
        let err = WorkerError::InvalidState {
            expected: WorkerState::Installed,
            actual: WorkerState::Parsed,
        };
        assert_eq!(err.to_string(), "worker is parsed, expected installed");
    }
}
