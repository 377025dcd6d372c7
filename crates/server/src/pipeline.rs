//! Ordered composition of the request stages around route dispatch.
//!
//! Outermost first:
//!
//! 1. HTTP trace spans
//! 2. request id
//! 3. request logging
//! 4. CORS and compression
//! 5. API key authentication
//! 6. cancellation scope
//! 7. fault translation
//! 8. route dispatch, 404 fallback included
//!
//! `Router::layer` wraps whatever was added before it, so the calls below
//! run innermost stage first.

use crate::middleware::{
    api_key_auth, log_requests, request_cancellation, request_id, translate_faults,
};
use crate::state::AppState;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Wrap `routes` (fallback already set) in the full pipeline and bind state.
pub fn apply(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let router = routes
        .layer(from_fn_with_state(state.clone(), translate_faults))
        .layer(from_fn(request_cancellation))
        .layer(from_fn_with_state(state.clone(), api_key_auth));

    let router = if state.config.enable_compression {
        router.layer(CompressionLayer::new())
    } else {
        router
    };

    router
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
