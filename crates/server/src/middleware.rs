//! Request pipeline stages.
//!
//! Each stage is an axum `from_fn` middleware receiving an explicit [`Next`]
//! for the rest of the chain. [`crate::pipeline::apply`] fixes their order.

use crate::error::{Fault, FaultKind, ServerError};
use crate::state::AppState;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use docapi::LogLevel;
use futures::FutureExt;
use std::any::Any;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use store::CancelToken;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// API key authentication.
///
/// Missing, non-UTF-8 or unknown keys are rejected here and nothing after
/// this stage runs for the request.
pub async fn api_key_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let authorized = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| state.is_valid_api_key(key));

    if !authorized {
        metrics::counter!("docapi_auth_rejections_total").increment(1);
        tracing::debug!(uri = %request.uri(), "rejected request without a valid API key");
        return Err(ServerError::Authentication);
    }

    Ok(next.run(request).await)
}

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Request id as seen by later stages.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Logging middleware
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

/// Per-request cancellation scope.
///
/// Puts a [`CancelToken`] in the request extensions for handlers to pass to
/// the store. If the request future is dropped before finishing (client
/// disconnect), the token fires and pending store calls give up.
pub async fn request_cancellation(mut request: Request, next: Next) -> Response {
    let token = CancelToken::new();
    request.extensions_mut().insert(token.clone());

    let guard = token.drop_guard();
    let response = next.run(request).await;
    guard.disarm();
    response
}

/// Fault translation.
///
/// Runs the rest of the chain and turns every fault into an error response:
/// handler errors arrive as responses marked with a [`Fault`], panics are
/// caught here. Each fault except cancellation is written to the log
/// collection at `Error` before the response goes out. A failing log write
/// is reported through tracing and the response is still returned.
pub async fn translate_faults(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let err = ServerError::Internal(format!(
                "handler panicked: {}",
                panic_message(&*payload)
            ));
            let mut response = err.into_response();
            if let Some(fault) = response.extensions_mut().get_mut::<Fault>() {
                fault.kind = FaultKind::Panic;
            }
            response
        }
    };

    let Some(fault) = response.extensions_mut().remove::<Fault>() else {
        return response;
    };

    if fault.is_cancelled() {
        tracing::debug!(method = %method, path = %path, "request cancelled");
        return response;
    }

    metrics::counter!("docapi_faults_total").increment(1);
    let message = format!("{method} {path}: {}", fault.description);
    tracing::warn!(kind = ?fault.kind, "{message}");

    if let Err(err) = state.services.logger.log(LogLevel::Error, message).await {
        metrics::counter!("docapi_log_write_failures_total").increment(1);
        tracing::error!(error = %err, "failed to persist fault log entry");
    }

    response
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// The request's cancel token. Outside the pipeline (unit tests, direct
/// handler calls) a fresh token that never fires is used.
#[derive(Debug, Clone)]
pub struct RequestCancel(pub CancelToken);

impl<S> FromRequestParts<S> for RequestCancel
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestCancel(
            parts.extensions.get::<CancelToken>().cloned().unwrap_or_default(),
        ))
    }
}
