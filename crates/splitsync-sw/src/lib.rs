//! SplitSync offline worker
//!
//! Request routing and caching policy for the SplitSync web client.
//!
//! - [`Classifier`] sorts each request into a [`RequestClass`]
//! - [`LifecycleManager`] pre-caches the app shell on install and drops
//!   stale bucket generations on activate
//! - [`StrategyEngine`] runs cache-first, network-first and
//!   network-first-with-offline-fallback
//! - [`ServiceWorker`] binds them to install / activate / fetch events, and
//!   [`Registration`] drives worker versions for one scope
//!
//! # Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use splitsync_cache::CacheStorage;
//! use splitsync_net::ResourceLoader;
//! use splitsync_sw::{ServiceWorker, WorkerConfig};
//!
//! let worker = ServiceWorker::new(
//!     WorkerConfig::default(),
//!     Arc::new(CacheStorage::new()),
//!     Arc::new(ResourceLoader::new()?),
//! )?;
//! worker.install().await?;
//! worker.activate().await?;
//! ```

mod classify;
mod config;
mod error;
mod host;
mod lifecycle;
mod manifest;
mod strategy;
pub mod telemetry;
mod worker;

pub use classify::{Classifier, Predicate, RequestClass, Rule};
pub use config::WorkerConfig;
pub use error::{ConfigError, WorkerError};
pub use host::{Registration, RegistrationUpdate};
pub use lifecycle::{ActivateReport, InstallReport, LifecycleManager, PrecacheFailure, WorkerState};
pub use manifest::PrecacheManifest;
pub use strategy::{
    ASSET_OFFLINE_BODY, NOT_AVAILABLE_OFFLINE_BODY, OFFLINE_HTML, ResponseSource, Served,
    StrategyEngine,
};
pub use worker::{EventOutcome, FetchEvent, ServiceWorker, WorkerEvent};

/// Worker version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
