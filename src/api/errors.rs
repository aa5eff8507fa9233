use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::sensors::error::{ParamError, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidParameter(String),
    #[error("{0}")]
    InvalidPayload(String),
    #[error("Failed to store sensor data: {0:#}")]
    Ingest(anyhow::Error),
    #[error("Failed to query sensor data: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidParameter(_) | AppError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Ingest(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ParamError> for AppError {
    fn from(e: ParamError) -> Self {
        Self::InvalidParameter(e.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        Self::InvalidPayload(e.to_string())
    }
}

/// Malformed JSON and a missing or wrong `Content-Type` are both payload
/// errors, answered with 400 instead of axum's 415/422.
impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        let msg = match e {
            JsonRejection::MissingJsonContentType(_) => {
                "Content-Type must be application/json".to_owned()
            }
            other => format!("Invalid JSON body: {}", other.body_text()),
        };
        Self::InvalidPayload(msg)
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        Self::InvalidParameter(format!("Invalid query parameters: {}", e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let e = AppError::from(ValidationError::UnknownMetric("voltage".into()));
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert!(e.to_string().contains("voltage"));
    }

    #[test]
    fn param_errors_are_bad_requests() {
        let e = AppError::from(ParamError::DaysOutOfRange(40));
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert!(e.to_string().contains("'days'"));
    }

    #[test]
    fn storage_errors_are_server_errors() {
        let e = AppError::Ingest(anyhow::anyhow!("connection reset"));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "Failed to store sensor data: connection reset");

        let e = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
