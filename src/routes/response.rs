//! JSON envelope shared by every API route.
//!
//! Success: `{"status": "ok", "data": ...}`.
//! Failure: `{"status": "<label>", "message": "...", "code": "E_*", "data": {}}`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

use crate::error::ErrorCode;
use crate::services::admin::AdminError;
use crate::services::quiz::QuizError;

/// Wrap `data` in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "status": "ok", "data": data }))
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "E_UNAUTHORIZED", "authentication required")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "E_BAD_REQUEST", message)
    }

    fn internal(err: &dyn ErrorCode) -> Self {
        error!(error = %err, code = err.error_code(), retryable = err.retryable(), "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.error_code(), "internal server error")
    }
}

pub(crate) fn status_label(status: StatusCode) -> &'static str {
    match status {
        StatusCode::OK => "ok",
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        _ => "internal_server_error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": status_label(self.status),
            "message": self.message,
            "code": self.code,
            "data": {},
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        let status = match &err {
            QuizError::Validation(_) => StatusCode::BAD_REQUEST,
            QuizError::Conflict(_) => StatusCode::CONFLICT,
            QuizError::NotFound(_) => StatusCode::NOT_FOUND,
            QuizError::Database(_) => return Self::internal(&err),
        };
        Self::new(status, err.error_code(), err.to_string())
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match &err {
            AdminError::InvalidCredentials => Self::new(StatusCode::UNAUTHORIZED, err.error_code(), err.to_string()),
            AdminError::Database(_) => Self::internal(&err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
