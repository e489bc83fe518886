//! JSON error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::DeskError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &DeskError) -> StatusCode {
    match err {
        DeskError::Validation { .. } => StatusCode::BAD_REQUEST,
        DeskError::DataUnavailable { .. } => StatusCode::BAD_GATEWAY,
        DeskError::Computation { .. }
        | DeskError::ConfigMissing { .. }
        | DeskError::ConfigInvalid { .. }
        | DeskError::ConfigParse { .. }
        | DeskError::Database { .. }
        | DeskError::DatabaseQuery { .. }
        | DeskError::Serialization(_)
        | DeskError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DeskError> for WebError {
    fn from(err: DeskError) -> Self {
        let status = status_from_error(&err);
        let message = match err {
            DeskError::Validation { reason } => reason,
            other => other.to_string(),
        };
        Self::new(status, message)
    }
}

impl From<tokio::task::JoinError> for WebError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("worker failed: {err}"))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::error!("{} {}", self.status, self.message);
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
