use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};

/// Create the Axum router: one reserved admin route, everything else is
/// intercepted by the policy dispatcher. The admin path is prefixed so it
/// cannot shadow an origin asset.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/-/health", get(handlers::health))
        .fallback(handlers::intercept)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
