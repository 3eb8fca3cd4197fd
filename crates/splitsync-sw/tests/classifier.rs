//! Request classification precedence and coverage.

mod common;

use common::{config, url};
use splitsync_net::{Method, Request, RequestMode};
use splitsync_sw::{Classifier, Predicate, RequestClass, Rule};

fn classify(request: &Request) -> RequestClass {
    Classifier::from_config(&config()).classify(request)
}

// ============================================================================
// IGNORED
// ============================================================================

#[test]
fn test_non_get_methods_are_ignored() {
    for method in [Method::Post, Method::Put, Method::Delete, Method::Patch, Method::Head, Method::Options] {
        for path in ["/api/expenses", "/static/js/main.js", "/groups/7"] {
            let req = Request::new(method, url(path));
            assert_eq!(classify(&req), RequestClass::Ignored, "{method} {path}");
        }
    }
}

#[test]
fn test_non_http_schemes_are_ignored() {
    let req = Request::parse(Method::Get, "chrome-extension://abcdef/content.js").unwrap();
    assert_eq!(classify(&req), RequestClass::Ignored);

    let req = Request::parse(Method::Get, "data:text/plain,hello").unwrap();
    assert_eq!(classify(&req), RequestClass::Ignored);
}

#[test]
fn test_plain_http_is_interceptable() {
    let req = Request::parse(Method::Get, "http://localhost:3000/groups").unwrap();
    assert_eq!(classify(&req), RequestClass::Other);
}

// ============================================================================
// API
// ============================================================================

#[test]
fn test_api_prefix() {
    assert_eq!(classify(&Request::get(url("/api/groups"))), RequestClass::Api);
    assert_eq!(classify(&Request::get(url("/api/groups/3/balances?currency=EUR"))), RequestClass::Api);
}

#[test]
fn test_api_wins_over_static_extension() {
    assert_eq!(classify(&Request::get(url("/api/report.png"))), RequestClass::Api);
    assert_eq!(classify(&Request::get(url("/api/static/x.css"))), RequestClass::Api);
}

#[test]
fn test_api_wins_over_navigation() {
    let req = Request::navigate(url("/api/export"));
    assert_eq!(classify(&req), RequestClass::Api);
}

#[test]
fn test_api_without_trailing_slash_is_not_api() {
    assert_eq!(classify(&Request::get(url("/api"))), RequestClass::Other);
    assert_eq!(classify(&Request::get(url("/apiary"))), RequestClass::Other);
}

// ============================================================================
// STATIC ASSETS
// ============================================================================

#[test]
fn test_static_extensions() {
    for ext in ["js", "css", "png", "jpg", "jpeg", "svg", "gif", "woff", "woff2", "ttf", "ico"] {
        let req = Request::get(url(&format!("/assets/file.{ext}")));
        assert_eq!(classify(&req), RequestClass::StaticAsset, "{ext}");
    }
}

#[test]
fn test_static_prefix_without_extension() {
    assert_eq!(classify(&Request::get(url("/static/media/logo"))), RequestClass::StaticAsset);
}

#[test]
fn test_query_does_not_hide_extension() {
    assert_eq!(classify(&Request::get(url("/main.css?v=12"))), RequestClass::StaticAsset);
}

#[test]
fn test_unlisted_extensions_are_not_static() {
    assert_eq!(classify(&Request::get(url("/manifest.json"))), RequestClass::Other);
    assert_eq!(classify(&Request::get(url("/favicon.webp"))), RequestClass::Other);
}

#[test]
fn test_static_wins_over_navigation() {
    let req = Request::navigate(url("/icon-512.png"));
    assert_eq!(classify(&req), RequestClass::StaticAsset);
}

// ============================================================================
// NAVIGATION AND FALLTHROUGH
// ============================================================================

#[test]
fn test_navigation() {
    assert_eq!(classify(&Request::navigate(url("/groups/42"))), RequestClass::Navigation);
    assert_eq!(classify(&Request::navigate(url("/"))), RequestClass::Navigation);
}

#[test]
fn test_sub_resource_falls_through() {
    for mode in [RequestMode::SameOrigin, RequestMode::Cors, RequestMode::NoCors] {
        let req = Request::get(url("/groups/42")).with_mode(mode);
        assert_eq!(classify(&req), RequestClass::Other);
    }
}

// ============================================================================
// RULE LIST
// ============================================================================

#[test]
fn test_custom_prefixes_from_config() {
    let mut cfg = config();
    cfg.api_prefix = "/v2/".into();
    cfg.static_prefix = "/assets/".into();
    let classifier = Classifier::from_config(&cfg);

    assert_eq!(classifier.classify(&Request::get(url("/v2/groups"))), RequestClass::Api);
    assert_eq!(classifier.classify(&Request::get(url("/assets/blob"))), RequestClass::StaticAsset);
    assert_eq!(classifier.classify(&Request::get(url("/api/groups"))), RequestClass::Other);
}

#[test]
fn test_first_matching_rule_wins() {
    let classifier = Classifier::with_rules(vec![
        Rule::new(Predicate::Extension(vec!["png".into()]), RequestClass::StaticAsset),
        Rule::new(Predicate::PathPrefix("/api/".into()), RequestClass::Api),
    ]);

    assert_eq!(
        classifier.classify(&Request::get(url("/api/report.png"))),
        RequestClass::StaticAsset
    );
}
