use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::core::{CacheStore, CachedResponse, QuiverError};
use crate::policy::{self, Route};
use crate::upstream::UpstreamClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CacheStore>,
    pub upstream: Arc<UpstreamClient>,
}

/// Gateway health plus store statistics
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.store.stats();
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "store": {
            "name": state.store.version(),
            "entries": stats.entries,
            "hits": stats.hits,
            "misses": stats.misses,
            "hit_rate": stats.hit_rate(),
        },
    }))
}

/// Fallback handler: every non-admin request lands here and is dispatched
/// through the interception policy.
pub async fn intercept(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, QuiverError> {
    let (parts, body) = request.into_parts();

    let cached = match policy::classify(&parts.method, &parts.uri, &state.upstream) {
        Route::NetworkFirst => {
            let key = cache_key(&parts.uri);
            debug!("network-first {}", key);
            policy::network_first(&state.store, &state.upstream, &key).await?
        }
        Route::CacheFirst => {
            let key = cache_key(&parts.uri);
            debug!("cache-first {}", key);
            policy::cache_first(&state.store, &state.upstream, &key).await?
        }
        Route::Passthrough => {
            let url = state.upstream.absolute_url(&parts.uri);
            debug!("passthrough {} {}", parts.method, url);
            let bytes = to_bytes(body, usize::MAX)
                .await
                .map_err(|e| QuiverError::Internal(e.to_string()))?;
            state
                .upstream
                .forward(parts.method, &url, parts.headers, bytes.to_vec())
                .await?
        }
    };

    Ok(render(cached))
}

/// Cache keys preserve the request exactly as issued: path plus query,
/// original casing
fn cache_key(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

fn render(cached: CachedResponse) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::OK);
    let mut response = (status, Body::from(cached.body)).into_response();
    for (name, value) in &cached.headers {
        if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), HeaderValue::from_str(value)) {
            response.headers_mut().append(name, value);
        }
    }
    response
}
