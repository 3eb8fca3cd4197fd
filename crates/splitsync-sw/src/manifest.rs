//! Precache manifest

use serde::Deserialize;

/// Ordered list of URLs fetched and stored when the worker installs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct PrecacheManifest(Vec<String>);

impl PrecacheManifest {
    pub fn new<I, T>(urls: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(urls.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for PrecacheManifest {
    /// App shell, offline page, web manifest and icons.
    fn default() -> Self {
        Self::new([
            "/",
            "/index.html",
            "/offline.html",
            "/manifest.json",
            "/icon-192.png",
            "/icon-512.png",
        ])
    }
}
