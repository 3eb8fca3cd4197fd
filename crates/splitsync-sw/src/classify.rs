//! Request Classifier
//!
//! An ordered rule list; the first rule whose predicate matches decides the
//! class. Order is part of the contract: `/api/report.png` is [`RequestClass::Api`].

use std::fmt;

use splitsync_net::{Method, Request};

use crate::WorkerConfig;

/// Routing class of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    /// Not intercepted; the host handles it as if no worker existed
    Ignored,
    /// Upstream REST API, network only
    Api,
    /// Cache-first from the static bucket
    StaticAsset,
    /// Network-first with offline fallbacks
    Navigation,
    /// Network-first
    Other,
}

impl RequestClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::Ignored => "ignored",
            RequestClass::Api => "api",
            RequestClass::StaticAsset => "static-asset",
            RequestClass::Navigation => "navigation",
            RequestClass::Other => "other",
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Rule predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Method other than GET, or a scheme other than http/https
    NotInterceptable,
    PathPrefix(String),
    /// Extension of the last path segment, case-sensitive
    Extension(Vec<String>),
    Navigate,
    AnyOf(Vec<Predicate>),
    Always,
}

impl Predicate {
    pub fn matches(&self, request: &Request) -> bool {
        match self {
            Predicate::NotInterceptable => {
                request.method != Method::Get
                    || !matches!(request.url.scheme(), "http" | "https")
            }
            Predicate::PathPrefix(prefix) => request.path().starts_with(prefix.as_str()),
            Predicate::Extension(allowed) => path_extension(request.path())
                .is_some_and(|ext| allowed.iter().any(|a| a == ext)),
            Predicate::Navigate => request.is_navigation(),
            Predicate::AnyOf(predicates) => predicates.iter().any(|p| p.matches(request)),
            Predicate::Always => true,
        }
    }
}

/// Text after the last `.` of the path, if it does not cross a `/`.
fn path_extension(path: &str) -> Option<&str> {
    let (_, ext) = path.rsplit_once('.')?;
    (!ext.is_empty() && !ext.contains('/')).then_some(ext)
}

/// A (predicate, class) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub predicate: Predicate,
    pub class: RequestClass,
}

impl Rule {
    pub fn new(predicate: Predicate, class: RequestClass) -> Self {
        Self { predicate, class }
    }
}

/// Ordered request classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    /// ignored → api → static-asset → navigation → other
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::with_rules(vec![
            Rule::new(Predicate::NotInterceptable, RequestClass::Ignored),
            Rule::new(Predicate::PathPrefix(config.api_prefix.clone()), RequestClass::Api),
            Rule::new(
                Predicate::AnyOf(vec![
                    Predicate::PathPrefix(config.static_prefix.clone()),
                    Predicate::Extension(config.static_extensions.clone()),
                ]),
                RequestClass::StaticAsset,
            ),
            Rule::new(Predicate::Navigate, RequestClass::Navigation),
            Rule::new(Predicate::Always, RequestClass::Other),
        ])
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Falls through to [`RequestClass::Other`] when no rule matches.
    pub fn classify(&self, request: &Request) -> RequestClass {
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(request))
            .map(|rule| rule.class)
            .unwrap_or(RequestClass::Other)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&WorkerConfig::default())
    }
}
