//! API route handlers
//!
//! - `health`: liveness and Prometheus metrics
//! - `entities`: generic CRUD handlers mounted once per collection

pub mod entities;
pub mod health;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info (GET /).
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "docapi",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "collections": entities::COLLECTIONS,
        "endpoints": [
            "/api/v1/{collection}",
            "/api/v1/{collection}/count",
            "/api/v1/{collection}/{id}",
            "/api/v1/{collection}/key/{key}",
            "/health",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
