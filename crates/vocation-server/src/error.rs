//! Error-to-status mapping for HTTP handlers.
//!
//! This is the only place that chooses status codes.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use vocation_core::{PredictionError, StoreError, ValidationError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("prediction failed: {0}")]
    Prediction(#[from] PredictionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid request body: {0}")]
    Body(String),

    #[error("invalid submission id: {0}")]
    InvalidId(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Body(_) | Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::Prediction(_) => StatusCode::BAD_GATEWAY,
            Self::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Body(_) | Self::InvalidId(_) => "invalid_request",
            Self::Prediction(_) => "prediction_failed",
            Self::Store(StoreError::NotFound { .. }) => "not_found",
            Self::Store(StoreError::Corrupt { .. }) => "storage_corrupt",
            Self::Store(_) => "storage_failed",
            Self::Internal(_) => "internal",
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::Validation(err) if !err.issues().is_empty() => Some(json!(err.issues())),
            Self::Prediction(PredictionError::RemoteRejected { status, body }) => {
                Some(json!({ "status": status, "body": body }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
            details: self.details(),
        };
        (self.status(), Json(body)).into_response()
    }
}
