//! Resource Loader
//!
//! Production [`Fetcher`]: a blocking reqwest client whose calls run on
//! smol's blocking thread pool so fetch futures never stall the executor.

use std::time::Duration;

use crate::{Fetcher, Method, NetError, Request, Response};

/// Loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// User agent string
    pub user_agent: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max redirects to follow (0 = disable)
    pub max_redirects: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("SplitSync-Worker/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_redirects: 10,
        }
    }
}

/// Load resources from network
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    client: reqwest::blocking::Client,
}

impl ResourceLoader {
    pub fn new() -> Result<Self, NetError> {
        Self::with_config(LoaderConfig::default())
    }

    pub fn with_config(config: LoaderConfig) -> Result<Self, NetError> {
        let redirects = if config.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(config.max_redirects)
        };

        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(redirects)
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetcher for ResourceLoader {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        tracing::debug!(method = %request.method, url = %request.url, "network fetch");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url.clone());
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        smol::unblock(move || {
            let response = builder
                .send()
                .map_err(|e| NetError::Network(e.to_string()))?;

            let status = response.status();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .bytes()
                .map_err(|e| NetError::Network(e.to_string()))?
                .to_vec();

            Ok(Response {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                headers,
                body,
            })
        })
        .await
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Patch => reqwest::Method::PATCH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest_method(Method::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest_method(Method::Patch), reqwest::Method::PATCH);
    }

    #[test]
    fn test_loader_builds_with_defaults() {
        assert!(ResourceLoader::new().is_ok());
    }

    #[test]
    fn test_unreachable_host_rejects() {
        let loader = ResourceLoader::with_config(LoaderConfig {
            connect_timeout: Duration::from_millis(200),
            request_timeout: Duration::from_millis(500),
            ..LoaderConfig::default()
        })
        .unwrap();
        // Port 9 on loopback is the discard service; nothing listens there in CI.
        let req = Request::parse(Method::Get, "http://127.0.0.1:9/index.html").unwrap();

        let result = smol::block_on(loader.fetch(&req));
        assert!(matches!(result, Err(NetError::Network(_))));
    }
}
