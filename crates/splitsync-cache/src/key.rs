//! Request identity

use std::fmt;

use splitsync_net::{Method, Request, Url};

/// Identity of a cache entry: method plus full URL (query included,
/// fragment dropped).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: Method,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method,
            url: url.into(),
        }
    }

    /// Key for a plain `GET` of `url`.
    pub fn get(url: &Url) -> Self {
        Self::new(Method::Get, url)
    }
}

impl From<&Request> for RequestKey {
    fn from(request: &Request) -> Self {
        Self::new(request.method, &request.url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
