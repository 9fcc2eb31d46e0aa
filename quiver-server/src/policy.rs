//! Request interception policy
//!
//! The page shell and the question data must stay fresh, so they try the
//! network before the cache; every other same-origin asset is served from
//! the cache and only fetched on a miss. Cross-origin and non-GET traffic
//! is forwarded untouched.

use axum::http::{Method, Uri};
use tracing::{debug, warn};

use crate::core::{CacheStore, CachedResponse, QuiverError, Result};
use crate::upstream::UpstreamClient;

/// Lower-cased path suffixes that always try the network first
const NETWORK_FIRST_SUFFIXES: &[&str] = &["/index.html", "/questions.json"];

/// How an intercepted request is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Live fetch first, cache fallback: page shell and question data
    NetworkFirst,
    /// Cached copy first, live fetch on miss: all other same-origin assets
    CacheFirst,
    /// Forwarded verbatim, never cached: cross-origin and non-GET traffic
    Passthrough,
}

/// Classify one intercepted request. Path matching is case-insensitive;
/// cache keys keep the original casing.
pub fn classify(method: &Method, uri: &Uri, upstream: &UpstreamClient) -> Route {
    if *method != Method::GET {
        return Route::Passthrough;
    }
    if !upstream.same_origin(uri) {
        return Route::Passthrough;
    }

    let path = uri.path().to_lowercase();
    if path == "/" || NETWORK_FIRST_SUFFIXES.iter().any(|s| path.ends_with(s)) {
        Route::NetworkFirst
    } else {
        Route::CacheFirst
    }
}

/// Live fetch with cache bypass; the store is only consulted when the
/// origin is unreachable.
pub async fn network_first(
    store: &CacheStore,
    upstream: &UpstreamClient,
    key: &str,
) -> Result<CachedResponse> {
    match upstream.fetch_no_store(key).await {
        Ok(fresh) => {
            // The response is served regardless of whether the write lands
            if let Err(e) = store.put(key, &fresh).await {
                warn!("failed to cache {}: {}", key, e);
            }
            Ok(fresh)
        }
        Err(err) => {
            debug!("live fetch for {} failed ({}), trying cache", key, err);
            match store.match_entry(key).await? {
                Some(cached) => Ok(cached),
                None => Err(QuiverError::Offline(key.to_string())),
            }
        }
    }
}

/// Cached copy wins outright; a miss triggers a live fetch whose failure
/// propagates to the caller.
pub async fn cache_first(
    store: &CacheStore,
    upstream: &UpstreamClient,
    key: &str,
) -> Result<CachedResponse> {
    if let Some(cached) = store.match_entry(key).await? {
        return Ok(cached);
    }

    let fresh = upstream.fetch(key).await?;
    if let Err(e) = store.put(key, &fresh).await {
        warn!("failed to cache {}: {}", key, e);
    }
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream() -> UpstreamClient {
        UpstreamClient::new("http://127.0.0.1:8080", 5).unwrap()
    }

    fn route(method: Method, uri: &str) -> Route {
        classify(&method, &uri.parse().unwrap(), &upstream())
    }

    #[test]
    fn root_and_shell_and_questions_are_network_first() {
        assert_eq!(route(Method::GET, "/"), Route::NetworkFirst);
        assert_eq!(route(Method::GET, "/index.html"), Route::NetworkFirst);
        assert_eq!(route(Method::GET, "/questions.json"), Route::NetworkFirst);
    }

    #[test]
    fn suffix_match_covers_nested_paths_and_queries() {
        assert_eq!(route(Method::GET, "/app/index.html"), Route::NetworkFirst);
        assert_eq!(route(Method::GET, "/questions.json?v=3"), Route::NetworkFirst);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(route(Method::GET, "/INDEX.HTML"), Route::NetworkFirst);
        assert_eq!(route(Method::GET, "/Questions.JSON"), Route::NetworkFirst);
    }

    #[test]
    fn other_assets_are_cache_first() {
        assert_eq!(route(Method::GET, "/style.css"), Route::CacheFirst);
        assert_eq!(route(Method::GET, "/img/logo.png"), Route::CacheFirst);
        assert_eq!(route(Method::GET, "/questions.json.bak"), Route::CacheFirst);
        assert_eq!(route(Method::GET, "/indexxindex.html5"), Route::CacheFirst);
    }

    #[test]
    fn absolute_form_same_origin_still_classified() {
        assert_eq!(
            route(Method::GET, "http://127.0.0.1:8080/index.html"),
            Route::NetworkFirst
        );
        assert_eq!(
            route(Method::GET, "http://127.0.0.1:8080/app.js"),
            Route::CacheFirst
        );
    }

    #[test]
    fn cross_origin_is_passthrough() {
        assert_eq!(
            route(Method::GET, "http://other.example/index.html"),
            Route::Passthrough
        );
        assert_eq!(
            route(Method::GET, "https://127.0.0.1:8080/index.html"),
            Route::Passthrough
        );
    }

    #[test]
    fn non_get_is_passthrough() {
        assert_eq!(route(Method::POST, "/index.html"), Route::Passthrough);
        assert_eq!(route(Method::HEAD, "/style.css"), Route::Passthrough);
    }
}
