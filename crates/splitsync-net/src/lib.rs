//! SplitSync Networking
//!
//! Request/response model shared by the offline worker, the [`Fetcher`]
//! seam it talks to the network through, and [`ResourceLoader`], the
//! production fetcher backed by an HTTP client.

mod loader;
mod request;
mod response;

use std::future::Future;

pub use loader::{LoaderConfig, ResourceLoader};
pub use request::{Method, Request, RequestMode};
pub use response::Response;
pub use url::Url;

/// Something that can carry a request to the network.
///
/// A rejected fetch (`Err`) means the network could not be reached at all.
/// An HTTP error status is still an `Ok` response; check [`Response::ok`].
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response, NetError>> + Send;
}

/// Network error
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),
}
