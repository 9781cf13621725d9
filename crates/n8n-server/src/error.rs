//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use n8n_core::ExecutionEngineError;
use serde::Serialize;

/// JSON error body returned by every failing handler.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ExecutionEngineError> for ApiError {
    fn from(e: ExecutionEngineError) -> Self {
        let status = match &e {
            ExecutionEngineError::StartNodeNotFound(_) => StatusCode::NOT_FOUND,
            ExecutionEngineError::Workflow(_)
            | ExecutionEngineError::NoStartNodes
            | ExecutionEngineError::MissingInput(_)
            | ExecutionEngineError::UnknownNodeType(_) => StatusCode::BAD_REQUEST,
            ExecutionEngineError::Canceled | ExecutionEngineError::Timeout(_) => {
                StatusCode::REQUEST_TIMEOUT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            error: e.to_string(),
            status,
        }
    }
}
