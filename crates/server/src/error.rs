use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use store::StoreError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Non-standard status used when the client went away before we answered.
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Deliberately silent about which check failed.
    #[error("Invalid or missing API key")]
    Authentication,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub status: u16,
}

/// Marker attached to responses produced by a fault, so the
/// fault-translation stage can record it. Client errors carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The request was cancelled; reported, never logged.
    Cancelled,
    Error,
    Panic,
}

impl Fault {
    pub fn is_cancelled(&self) -> bool {
        self.kind == FaultKind::Cancelled
    }
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Authentication => StatusCode::UNAUTHORIZED,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Store(StoreError::Cancelled) => {
                StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ServerError::Store(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Authentication => "UNAUTHORIZED",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Store(StoreError::Cancelled) => "REQUEST_CANCELLED",
            ServerError::Store(_) | ServerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The fault behind this error, if it is one.
    pub fn fault(&self) -> Option<Fault> {
        let kind = match self {
            ServerError::Authentication | ServerError::BadRequest(_) | ServerError::NotFound => {
                return None
            }
            ServerError::Store(StoreError::Cancelled) => FaultKind::Cancelled,
            ServerError::Store(_) | ServerError::Internal(_) => {
                FaultKind::Error
            }
        };
        Some(Fault {
            kind,
            description: self.to_string(),
        })
    }

    /// Message shown to clients. Faults get a generic text; their details
    /// only go to the log.
    fn public_message(&self) -> String {
        match self {
            ServerError::Store(StoreError::Cancelled) => "Request cancelled".to_string(),
            ServerError::Store(_) | ServerError::Internal(_) => {
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
                status: status.as_u16(),
            },
        });

        let mut response = (status, body).into_response();
        if let Some(fault) = self.fault() {
            response.extensions_mut().insert(fault);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_not_faults() {
        assert!(ServerError::Authentication.fault().is_none());
        assert!(ServerError::NotFound.fault().is_none());
        assert!(ServerError::BadRequest("x".into()).fault().is_none());
    }

    #[test]
    fn test_store_fault_hides_details_from_client() {
        let err = ServerError::Store(StoreError::backend("connection refused"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert!(!err.public_message().contains("connection refused"));

        let fault = err.fault().unwrap();
        assert_eq!(fault.kind, FaultKind::Error);
        assert!(fault.description.contains("connection refused"));
    }

    #[test]
    fn test_cancellation_is_a_distinct_fault() {
        let err = ServerError::Store(StoreError::Cancelled);
        assert_eq!(err.status_code().as_u16(), 499);
        assert!(err.fault().unwrap().is_cancelled());
    }

    #[test]
    fn test_fault_marker_rides_on_response() {
        let response = ServerError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<Fault>().is_some());

        let response = ServerError::NotFound.into_response();
        assert!(response.extensions().get::<Fault>().is_none());
    }
}
