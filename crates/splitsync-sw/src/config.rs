//! Worker Configuration
//!
//! Deploy-time settings: the origin the worker serves, the bucket tags of
//! the current generation, the precache manifest and the routing prefixes.
//! Every component receives its config explicitly.

use std::path::Path;

use serde::Deserialize;
use splitsync_net::Url;

use crate::{ConfigError, PrecacheManifest};

/// Worker configuration options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Origin the worker is scoped to; manifest paths resolve against it
    pub origin: String,

    /// Main bucket tag (app shell, offline page, navigations)
    pub main_cache: String,

    /// Static asset bucket tag
    pub static_cache: String,

    /// Bucket for plain network-first responses. `None` shares the main bucket.
    pub runtime_cache: Option<String>,

    pub precache: PrecacheManifest,

    /// Requests under this prefix always go to the network
    pub api_prefix: String,

    pub static_prefix: String,

    /// File extensions served cache-first, without the dot
    pub static_extensions: Vec<String>,

    /// Document served for unknown paths while offline
    pub app_shell: String,

    pub offline_page: String,

    /// Ask the host to activate right after install
    pub skip_waiting: bool,

    /// Ask the host to hand open clients to the worker right after activate
    pub claim_clients: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            main_cache: "splitsync-v2".to_string(),
            static_cache: "splitsync-static-v2".to_string(),
            runtime_cache: None,
            precache: PrecacheManifest::default(),
            api_prefix: "/api/".to_string(),
            static_prefix: "/static/".to_string(),
            static_extensions: [
                "js", "css", "png", "jpg", "jpeg", "svg", "gif", "woff", "woff2", "ttf", "ico",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            app_shell: "/index.html".to_string(),
            offline_page: "/offline.html".to_string(),
            skip_waiting: true,
            claim_clients: true,
        }
    }
}

impl WorkerConfig {
    /// Default config with bucket tags `{prefix}-v{version}` and
    /// `{prefix}-static-v{version}`.
    pub fn versioned(prefix: &str, version: u32) -> Self {
        Self {
            main_cache: format!("{prefix}-v{version}"),
            static_cache: format!("{prefix}-static-v{version}"),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    pub fn with_runtime_cache(mut self, bucket: &str) -> Self {
        self.runtime_cache = Some(bucket.to_string());
        self
    }

    pub fn with_precache(mut self, manifest: PrecacheManifest) -> Self {
        self.precache = manifest;
        self
    }

    /// Check that the origin is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = self.origin_url()?;
        match origin.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidOrigin {
                origin: self.origin.clone(),
                reason: format!("unsupported scheme {other}"),
            }),
        }
    }

    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|e| ConfigError::InvalidOrigin {
            origin: self.origin.clone(),
            reason: e.to_string(),
        })
    }

    /// Resolve a manifest or fallback path against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        self.origin_url()?
            .join(path)
            .map_err(|e| ConfigError::InvalidPath {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Bucket used by plain network-first.
    pub fn runtime_bucket(&self) -> &str {
        self.runtime_cache.as_deref().unwrap_or(&self.main_cache)
    }

    /// Bucket tags of the current generation; everything else is stale.
    pub fn live_buckets(&self) -> Vec<&str> {
        let mut live = vec![self.main_cache.as_str(), self.static_cache.as_str()];
        if let Some(runtime) = self.runtime_cache.as_deref() {
            if !live.contains(&runtime) {
                live.push(runtime);
            }
        }
        live
    }
}
